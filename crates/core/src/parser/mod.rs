//! Recursive-descent parser producing a lossless [`SyntaxTree`].
//!
//! The parser pulls tokens from the lexer on demand, skips trivia when
//! deciding what to do next, and attaches every token it passes to the node
//! that is open at the time. It never fails: malformed input becomes
//! `Error` nodes plus diagnostics, and recovery is line-granular.
use std::collections::VecDeque;

use crate::error::{ErrorKind, SyntaxError};
use crate::grammar::GrammarTable;
use crate::kinds::{NodeKind, TokenKind};
use crate::lexer::{Lexer, TextRange, Token};
use crate::tree::{Marker, NodeId, SyntaxTree, TreeBuilder};

mod directives;
mod expressions;
mod operands;

/// Result of a whole-file parse: always a complete tree, plus diagnostics.
#[derive(Debug, Clone)]
pub struct Parse {
    pub tree: SyntaxTree,
    pub errors: Vec<SyntaxError>,
}

impl Parse {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Outcome of one grammar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseResult {
    Matched(NodeId),
    /// The rule did not apply; no tokens were consumed.
    NotMatched,
    /// The rule was pinned and then failed; the partial node is kept.
    MatchedWithError(NodeId),
}

impl ParseResult {
    pub fn node(self) -> Option<NodeId> {
        match self {
            ParseResult::Matched(n) | ParseResult::MatchedWithError(n) => Some(n),
            ParseResult::NotMatched => None,
        }
    }

    pub fn is_clean(self) -> bool {
        matches!(self, ParseResult::Matched(_))
    }
}

/// Parse `text` against one dialect's keyword table.
pub fn parse(text: &str, table: &GrammarTable) -> Parse {
    let mut p = Parser::new(text, table);
    p.root();
    let tree = p.builder.finish(text);
    log::debug!(
        "parsed {} bytes: {} nodes, {} errors",
        text.len(),
        tree.node_count(),
        p.errors.len()
    );
    Parse {
        tree,
        errors: p.errors,
    }
}

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    text: &'a str,
    lexer: Lexer<'a>,
    /// Tokens pulled from the lexer but not yet attached, trivia included.
    buffer: VecDeque<Token>,
    builder: TreeBuilder,
    errors: Vec<SyntaxError>,
    depth: usize,
    max_depth: usize,
    /// Set once the nesting limit fires; quiets follow-on pin errors until
    /// the next line.
    limit_hit: bool,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, table: &'a GrammarTable) -> Self {
        Parser {
            text,
            lexer: Lexer::new(text, table),
            buffer: VecDeque::new(),
            builder: TreeBuilder::new(),
            errors: Vec::new(),
            depth: 0,
            max_depth: table.max_depth(),
            limit_hit: false,
        }
    }

    // -- Token access -------------------------------------------

    /// The `n`th upcoming non-trivia token.
    fn nth_token(&mut self, n: usize) -> Option<Token> {
        let mut seen = 0;
        let mut i = 0;
        loop {
            if i == self.buffer.len() {
                let tok = self.lexer.next()?;
                self.buffer.push_back(tok);
            }
            let tok = self.buffer[i];
            if !tok.kind.is_trivia() {
                if seen == n {
                    return Some(tok);
                }
                seen += 1;
            }
            i += 1;
        }
    }

    fn nth(&mut self, n: usize) -> TokenKind {
        self.nth_token(n).map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn current(&mut self) -> TokenKind {
        self.nth(0)
    }

    fn at(&mut self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    fn at_line_end(&mut self) -> bool {
        self.current().is_line_end()
    }

    fn current_text(&mut self) -> &'a str {
        let text = self.text;
        self.nth_token(0).map(|t| t.text(text)).unwrap_or("")
    }

    /// Range used to report a problem at the current position. Line ends
    /// report as an empty range where they start.
    fn current_range(&mut self) -> TextRange {
        match self.nth_token(0) {
            Some(t) if !t.kind.is_line_end() => t.range,
            Some(t) => TextRange::empty(t.range.start),
            None => TextRange::empty(self.text.len()),
        }
    }

    fn flush_trivia(&mut self) {
        while let Some(tok) = self.buffer.front().copied() {
            if !tok.kind.is_trivia() {
                break;
            }
            self.buffer.pop_front();
            self.builder.token(tok);
        }
    }

    /// Attach pending trivia and the next token to the open node.
    fn bump(&mut self) {
        if self.nth_token(0).is_none() {
            self.flush_trivia();
            return;
        }
        self.flush_trivia();
        if let Some(tok) = self.buffer.pop_front() {
            if tok.kind == TokenKind::BadCharacter {
                self.errors.push(SyntaxError::lexical(
                    tok.range,
                    format!("unexpected character {:?}", tok.text(self.text)),
                ));
            }
            self.builder.token(tok);
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    // -- Node construction --------------------------------------

    /// Open a node at the next token. Pending trivia stays outside it.
    fn start(&mut self) -> Marker {
        self.nth_token(0);
        self.flush_trivia();
        self.builder.open()
    }

    fn complete(&mut self, m: Marker, kind: NodeKind) -> NodeId {
        self.builder.complete(m, kind)
    }

    fn abandon(&mut self, m: Marker) {
        self.builder.abandon(m);
    }

    /// Complete `m` and attach every diagnostic raised since `mark` that
    /// does not already belong to a node.
    fn finish_node(&mut self, m: Marker, kind: NodeKind, mark: usize, clean: bool) -> ParseResult {
        let node = self.complete(m, kind);
        for err in &mut self.errors[mark..] {
            if err.node.is_none() && err.kind != ErrorKind::Lexical {
                err.node = Some(node);
            }
        }
        if clean {
            ParseResult::Matched(node)
        } else {
            ParseResult::MatchedWithError(node)
        }
    }

    // -- Diagnostics --------------------------------------------

    fn pin_error(&mut self, message: impl Into<String>) {
        if self.limit_hit {
            return;
        }
        let range = self.current_range();
        let message = message.into();
        log::debug!("pin failure at {}: {}", range, message);
        self.errors.push(SyntaxError::pin(range, message));
    }

    /// Take one nesting level. At the limit, report once and refuse.
    fn enter_level(&mut self) -> bool {
        if self.depth < self.max_depth {
            self.depth += 1;
            return true;
        }
        if !self.limit_hit {
            let range = self.current_range();
            self.errors.push(SyntaxError::new(
                ErrorKind::RecursionLimit,
                range,
                format!("expression nesting exceeds {} levels", self.max_depth),
            ));
            self.limit_hit = true;
        }
        false
    }

    /// Enter one level of expression nesting, failing closed at the limit.
    fn nested(&mut self, rule: impl FnOnce(&mut Self) -> ParseResult) -> ParseResult {
        if !self.enter_level() {
            return ParseResult::NotMatched;
        }
        let result = rule(self);
        self.depth -= 1;
        result
    }

    /// Wrap every remaining token on the line in an `Error` node.
    fn error_to_line_end(&mut self, stop_at_trailer: bool, report: bool) -> NodeId {
        let m = self.start();
        let range = self.current_range();
        let first = self.current_text();
        while !self.at_line_end() && !(stop_at_trailer && self.current().is_trailer()) {
            self.bump();
        }
        let node = self.complete(m, NodeKind::Error);
        if report {
            let range = range.cover(self.builder.node_range(node));
            log::debug!("recovering: skipped {} to end of line", range);
            let mut err = SyntaxError::syntax(range, format!("unexpected '{}'", first));
            err.node = Some(node);
            self.errors.push(err);
        }
        node
    }

    // -- Lines --------------------------------------------------

    fn root(&mut self) {
        let m = self.builder.open();
        while !self.at(TokenKind::Eof) {
            self.line();
        }
        self.flush_trivia();
        self.complete(m, NodeKind::Root);
    }

    fn line(&mut self) {
        self.limit_hit = false;
        let m = self.builder.open();
        if self.at(TokenKind::LineComment) {
            let c = self.start();
            self.bump();
            self.complete(c, NodeKind::LineComment);
        } else {
            self.line_body();
        }
        if !self.at_line_end() {
            self.error_to_line_end(false, true);
        }
        if !self.eat(TokenKind::Eol) {
            self.flush_trivia();
        }
        self.complete(m, NodeKind::Line);
    }

    fn line_body(&mut self) {
        if self.at(TokenKind::Label) {
            self.label_definition();
        }
        let mut failed = false;
        match self.statement() {
            ParseResult::NotMatched => {
                if !self.at_line_end() && !self.current().is_trailer() {
                    self.error_to_line_end(false, true);
                    return;
                }
            }
            ParseResult::MatchedWithError(_) => failed = true,
            ParseResult::Matched(_) => {}
        }
        if !self.at_line_end() && !self.current().is_trailer() {
            self.error_to_line_end(true, !failed);
        }
        if self.at(TokenKind::PgStart) {
            self.pragma();
        }
        self.eat(TokenKind::Comment);
    }

    fn label_definition(&mut self) {
        let m = self.start();
        self.bump();
        self.eat(TokenKind::LabelColon);
        self.complete(m, NodeKind::LabelDefinition);
    }

    fn statement(&mut self) -> ParseResult {
        match self.current() {
            TokenKind::Instruction(shape) => self.instruction(shape),
            TokenKind::Directive(shape) => self.directive(shape),
            TokenKind::PpKeyword | TokenKind::PpMacroCall => self.preprocessor(),
            TokenKind::UnknownMnemonic => self.unknown_mnemonic(),
            _ => ParseResult::NotMatched,
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    pub(super) fn parse_default(src: &str) -> Parse {
        parse(src, &GrammarTable::default())
    }

    #[test]
    fn empty_input_is_bare_root() {
        let p = parse_default("");
        assert_eq!(p.tree.root().kind(), NodeKind::Root);
        assert_eq!(p.tree.root().children().count(), 0);
        assert!(p.errors.is_empty());
    }

    #[test]
    fn each_line_gets_a_node() {
        let src = "L1 NOP\n\n  RT\n";
        let p = parse_default(src);
        let lines: Vec<_> = p.tree.root().child_nodes().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.kind() == NodeKind::Line));
        assert_eq!(lines[1].text(), "\n");
        assert_eq!(p.tree.leaf_text(), src);
    }

    #[test]
    fn last_line_without_terminator() {
        let src = "  NOP";
        let p = parse_default(src);
        assert!(p.errors.is_empty(), "{:?}", p.errors);
        assert_eq!(p.tree.leaf_text(), src);
    }

    #[test]
    fn leading_whitespace_belongs_to_line() {
        let p = parse_default("   CLR R0\n");
        let line = p.tree.root().child_nodes().next().unwrap();
        assert_eq!(line.range().start, 0);
        let stmt = line.first_child(NodeKind::Instruction).unwrap();
        assert_eq!(stmt.range().start, 3);
    }

    #[test]
    fn stray_token_becomes_error_node() {
        let p = parse_default(":\n  NOP\n");
        let first = p.tree.root().child_nodes().next().unwrap();
        assert!(first.first_child(NodeKind::Error).is_some());
        assert_eq!(p.errors.len(), 1);
        assert_eq!(p.errors[0].kind, ErrorKind::Syntax);
    }

    #[test]
    fn leftover_tokens_are_wrapped() {
        let p = parse_default("  LI R1,1,2\n");
        let line = p.tree.root().child_nodes().next().unwrap();
        let err = line.first_child(NodeKind::Error).unwrap();
        assert_eq!(err.text(), ",2");
        assert_eq!(p.errors.len(), 1);
        assert_eq!(p.errors[0].node, Some(err.id()));
    }

    #[test]
    fn pin_failure_keeps_partial_node() {
        let p = parse_default("  LI R1,\n");
        let line = p.tree.root().child_nodes().next().unwrap();
        let instr = line.first_child(NodeKind::Instruction).unwrap();
        assert_eq!(p.errors.len(), 1);
        assert_eq!(p.errors[0].kind, ErrorKind::PinFailure);
        assert_eq!(p.errors[0].node, Some(instr.id()));
        assert_eq!(instr.text(), "LI R1,");
    }

    #[test]
    fn bad_character_is_lexical_error() {
        let p = parse_default("  CLR ?\n");
        assert!(p.errors.iter().any(|e| e.kind == ErrorKind::Lexical));
        assert_eq!(p.tree.leaf_text(), "  CLR ?\n");
    }

    #[test]
    fn nesting_limit_fails_closed() {
        let dialect = Dialect {
            max_depth: 4,
            ..Dialect::default()
        };
        let table = GrammarTable::new(&dialect);
        let src = "  DATA ((((((1))))))\n  NOP\n";
        let p = parse(src, &table);
        let limits: Vec<_> = p
            .errors
            .iter()
            .filter(|e| e.kind == ErrorKind::RecursionLimit)
            .collect();
        assert_eq!(limits.len(), 1);
        assert!(p.errors.iter().all(|e| e.kind != ErrorKind::PinFailure));
        assert_eq!(p.tree.leaf_text(), src);
    }

    #[test]
    fn comment_and_pragma_attach_to_line() {
        let p = parse_default("  INC R1  bump\n  NOP ;: s=1\n");
        let lines: Vec<_> = p.tree.root().child_nodes().collect();
        assert!(lines[0].first_token(TokenKind::Comment).is_some());
        assert!(lines[1].first_child(NodeKind::Pragma).is_some());
        assert!(p.errors.is_empty(), "{:?}", p.errors);
    }
}
