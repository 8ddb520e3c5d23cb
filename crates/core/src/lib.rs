//! tms99-core: lossless lexer and parser for TMS9900-family assembly.
//!
//! Source text goes through a region-switching lexer and a recursive-descent
//! parser into a concrete syntax tree that keeps every byte of the input,
//! whitespace and comments included. Malformed lines become `Error` nodes
//! with diagnostics; the rest of the file still parses.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`parse()`] -- parse a source file against a [`GrammarTable`]
//! - [`Dialect`] -- CPU variant and instruction-set extensions
//! - [`GrammarTable`] -- keyword lookup built from a dialect
//! - [`SyntaxTree`], [`NodeRef`], [`TokenRef`] -- the tree and its navigation
//! - [`SyntaxError`] -- parse diagnostic
//! - [`TokenKind`], [`NodeKind`] -- the token and node catalog
//!
//! Typed views over tree nodes live in [`ast`].

pub mod ast;
pub mod dialect;
pub mod error;
pub mod grammar;
pub mod kinds;
pub mod lexer;
pub mod parser;
pub mod tree;

// ── Convenience re-exports: key types ────────────────────────────────

pub use dialect::{Cpu, Dialect, Extension};
pub use error::{ConfigError, ErrorKind, LineIndex, SyntaxError};
pub use grammar::GrammarTable;
pub use kinds::{DirShape, InstrShape, NodeKind, TokenKind};
pub use lexer::{LexState, TextRange, Token};
pub use tree::{Element, NodeId, NodeRef, SyntaxTree, TokenId, TokenRef};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use lexer::lex;
pub use parser::{parse, Parse, ParseResult};
