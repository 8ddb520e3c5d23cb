//! Typed views over the untyped syntax tree.
//!
//! Each view wraps a [`NodeRef`] of one kind and exposes the parts of that
//! construct by name. Views never own data; they borrow the tree.
use serde::Serialize;

use crate::kinds::{DirShape, InstrShape, NodeKind, TokenKind};
use crate::tree::{Element, NodeRef, SyntaxTree, TokenRef};

macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name<'t>(NodeRef<'t>);

        impl<'t> $name<'t> {
            pub fn cast(node: NodeRef<'t>) -> Option<Self> {
                (node.kind() == NodeKind::$kind).then_some($name(node))
            }

            pub fn syntax(self) -> NodeRef<'t> {
                self.0
            }
        }
    };
}

ast_node!(Line, Line);
ast_node!(Instruction, Instruction);
ast_node!(Directive, Directive);
ast_node!(GeneralAddress, OpGa);
ast_node!(Pragma, Pragma);
ast_node!(Preprocessor, Preprocessor);

/// Every line of the file, in order.
pub fn lines(tree: &SyntaxTree) -> impl Iterator<Item = Line<'_>> {
    tree.root().child_nodes().filter_map(Line::cast)
}

// ──────────────────────────────────────────────
// Lines
// ──────────────────────────────────────────────

impl<'t> Line<'t> {
    pub fn label(self) -> Option<TokenRef<'t>> {
        self.0
            .first_child(NodeKind::LabelDefinition)?
            .first_token(TokenKind::Label)
    }

    /// The statement node, if the line has one. Lines that failed to parse
    /// report their `Error` node here.
    pub fn statement(self) -> Option<NodeRef<'t>> {
        self.0.child_nodes().find(|n| n.kind().is_statement())
    }

    /// Trailing comment, or the whole comment of a comment line.
    pub fn comment(self) -> Option<TokenRef<'t>> {
        if let Some(c) = self.0.first_child(NodeKind::LineComment) {
            return c.first_token(TokenKind::LineComment);
        }
        self.0.first_token(TokenKind::Comment).or_else(|| {
            self.pragma()
                .and_then(|p| p.syntax().first_token(TokenKind::Comment))
        })
    }

    pub fn pragma(self) -> Option<Pragma<'t>> {
        self.0.first_child(NodeKind::Pragma).and_then(Pragma::cast)
    }

    pub fn is_comment_line(self) -> bool {
        self.0.first_child(NodeKind::LineComment).is_some()
    }
}

// ──────────────────────────────────────────────
// Statements
// ──────────────────────────────────────────────

impl<'t> Instruction<'t> {
    pub fn mnemonic(self) -> Option<TokenRef<'t>> {
        self.0
            .child_tokens()
            .find(|t| matches!(t.kind(), TokenKind::Instruction(_)))
    }

    pub fn shape(self) -> Option<InstrShape> {
        match self.mnemonic()?.kind() {
            TokenKind::Instruction(shape) => Some(shape),
            _ => None,
        }
    }

    /// `OpGa`, `OpRegister` and `OpValue` nodes in source order.
    pub fn operands(self) -> Vec<NodeRef<'t>> {
        self.0
            .child_nodes()
            .filter(|n| {
                matches!(
                    n.kind(),
                    NodeKind::OpGa | NodeKind::OpRegister | NodeKind::OpValue
                )
            })
            .collect()
    }
}

impl<'t> Directive<'t> {
    pub fn keyword(self) -> Option<TokenRef<'t>> {
        self.0
            .child_tokens()
            .find(|t| matches!(t.kind(), TokenKind::Directive(_)))
    }

    pub fn shape(self) -> Option<DirShape> {
        match self.keyword()?.kind() {
            TokenKind::Directive(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn arguments(self) -> Vec<NodeRef<'t>> {
        self.0.child_nodes().collect()
    }
}

impl<'t> Preprocessor<'t> {
    pub fn keyword(self) -> Option<TokenRef<'t>> {
        self.0
            .child_tokens()
            .find(|t| matches!(t.kind(), TokenKind::PpKeyword | TokenKind::PpMacroCall))
    }

    /// Raw argument text, separators dropped.
    pub fn arguments(self) -> Vec<&'t str> {
        self.0
            .child_tokens()
            .filter(|t| t.kind() == TokenKind::PpArg)
            .map(|t| t.text())
            .collect()
    }
}

// ──────────────────────────────────────────────
// Addressing
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AddressingMode {
    /// `Rn`
    Register,
    /// `*Rn`
    Indirect,
    /// `*Rn+`
    AutoIncrement,
    /// `@addr`
    Symbolic,
    /// `@addr(Rn)`
    Indexed,
    /// `B#value` / `W#value`
    AutoConstant,
}

impl<'t> GeneralAddress<'t> {
    pub fn mode(self) -> AddressingMode {
        let node = self.0;
        if node.first_token(TokenKind::At).is_some() {
            if node.first_child(NodeKind::OpIndex).is_some() {
                AddressingMode::Indexed
            } else {
                AddressingMode::Symbolic
            }
        } else if node.first_token(TokenKind::Asterisk).is_some() {
            if node.first_token(TokenKind::Plus).is_some() {
                AddressingMode::AutoIncrement
            } else {
                AddressingMode::Indirect
            }
        } else if node.first_token(TokenKind::AutoConst).is_some() {
            AddressingMode::AutoConstant
        } else {
            AddressingMode::Register
        }
    }

    /// Register syntax for register, indirect and auto-increment modes:
    /// a `Register` token or an expression node.
    pub fn register(self) -> Option<Element<'t>> {
        match self.mode() {
            AddressingMode::Register => self
                .0
                .first_token(TokenKind::Register)
                .map(Element::Token)
                .or_else(|| {
                    self.0
                        .child_nodes()
                        .find(|n| n.kind().is_expr())
                        .map(Element::Node)
                }),
            AddressingMode::Indirect | AddressingMode::AutoIncrement => {
                register_of(self.0.first_child(NodeKind::OpRegister)?)
            }
            _ => None,
        }
    }

    /// Address expression for symbolic, indexed and auto-constant modes.
    pub fn expr(self) -> Option<NodeRef<'t>> {
        match self.mode() {
            AddressingMode::Symbolic | AddressingMode::Indexed | AddressingMode::AutoConstant => {
                self.0.child_nodes().find(|n| n.kind().is_expr())
            }
            _ => None,
        }
    }

    pub fn index_register(self) -> Option<Element<'t>> {
        let index = self.0.first_child(NodeKind::OpIndex)?;
        register_of(index.first_child(NodeKind::OpRegister)?)
    }
}

/// The register token or expression inside an `OpRegister` node.
fn register_of(op: NodeRef<'_>) -> Option<Element<'_>> {
    op.children().find(|e| match e {
        Element::Token(t) => t.kind() == TokenKind::Register,
        Element::Node(n) => n.kind().is_expr(),
    })
}

// ──────────────────────────────────────────────
// Pragmas
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum PragmaClause<'t> {
    Assign {
        key: TokenRef<'t>,
        value: Option<TokenRef<'t>>,
    },
    Cycles(usize),
}

impl<'t> Pragma<'t> {
    pub fn clauses(self) -> Vec<PragmaClause<'t>> {
        self.0
            .child_nodes()
            .filter_map(|n| match n.kind() {
                NodeKind::PragmaAssign => {
                    let mut terms = n.child_tokens().filter(|t| t.kind() == TokenKind::PgTerm);
                    let key = terms.next()?;
                    Some(PragmaClause::Assign {
                        key,
                        value: terms.next(),
                    })
                }
                NodeKind::PragmaCycles => Some(PragmaClause::Cycles(n.child_tokens().count())),
                _ => None,
            })
            .collect()
    }
}
