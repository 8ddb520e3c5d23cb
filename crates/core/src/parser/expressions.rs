use super::{ParseResult, Parser};
use crate::kinds::{NodeKind, TokenKind};

/// Which expression language applies at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flavor {
    /// Full expressions: parentheses, `$`, `#n` and `S#` allowed.
    Full,
    /// Address expressions: labels, integers and text only.
    Simple,
}

impl Flavor {
    /// Tokens that can begin a term.
    fn starts_term(self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::Ident | TokenKind::BankPrefix | TokenKind::Int | TokenKind::TextQuote => {
                true
            }
            TokenKind::LParen
            | TokenKind::LocalContext
            | TokenKind::Param
            | TokenKind::LengthOf => self == Flavor::Full,
            _ => false,
        }
    }

    pub(super) fn starts_expr(self, kind: TokenKind) -> bool {
        kind.is_unary_op() || self.starts_term(kind)
    }
}

impl<'a> Parser<'a> {
    // -- Entry points -------------------------------------------

    pub(super) fn expr(&mut self) -> ParseResult {
        self.expression(Flavor::Full)
    }

    pub(super) fn sexpr(&mut self) -> ParseResult {
        self.expression(Flavor::Simple)
    }

    fn expression(&mut self, flavor: Flavor) -> ParseResult {
        if !flavor.starts_expr(self.current()) {
            return ParseResult::NotMatched;
        }
        self.nested(|p| {
            if p.current().is_unary_op() {
                p.unary(flavor, false)
            } else {
                p.binary_chain(flavor)
            }
        })
    }

    /// `op expr` at the head of an expression, `op operand` after a binary
    /// operator.
    fn unary(&mut self, flavor: Flavor, operand_only: bool) -> ParseResult {
        let m = self.start();
        let mark = self.errors.len();
        self.bump();
        let inner = if operand_only {
            self.operand(flavor)
        } else {
            self.expression(flavor)
        };
        if inner == ParseResult::NotMatched {
            self.pin_error("expected operand after unary operator");
        }
        self.finish_node(m, NodeKind::UnaryExpr, mark, inner.is_clean())
    }

    fn operand(&mut self, flavor: Flavor) -> ParseResult {
        if self.current().is_unary_op() {
            self.nested(|p| p.unary(flavor, true))
        } else {
            self.term(flavor)
        }
    }

    /// Terms joined by binary operators, folded left with no precedence.
    ///
    /// Every fold wraps the previous tree one level deeper, so each step
    /// counts against the nesting limit until the chain ends.
    fn binary_chain(&mut self, flavor: Flavor) -> ParseResult {
        let mut lhs = match self.term(flavor) {
            ParseResult::Matched(n) => n,
            other => return other,
        };
        let outer = self.depth;
        let result = loop {
            if !(self.current().is_binary_op() && flavor.starts_expr(self.nth(1))) {
                break ParseResult::Matched(lhs);
            }
            if !self.enter_level() {
                break ParseResult::MatchedWithError(lhs);
            }
            let m = self.builder.precede(lhs);
            let mark = self.errors.len();
            self.bump();
            let rhs = self.operand(flavor);
            if rhs == ParseResult::NotMatched {
                self.pin_error("expected operand after binary operator");
            }
            match self.finish_node(m, NodeKind::BinaryExpr, mark, rhs.is_clean()) {
                ParseResult::Matched(n) => lhs = n,
                other => break other,
            }
        };
        self.depth = outer;
        result
    }

    // -- Terms --------------------------------------------------

    fn term(&mut self, flavor: Flavor) -> ParseResult {
        let kind = self.current();
        if !flavor.starts_term(kind) {
            return ParseResult::NotMatched;
        }
        match kind {
            TokenKind::LParen => self.paren_expr(),
            TokenKind::TextQuote => self.text_literal(),
            TokenKind::Ident => self.leaf(NodeKind::LabelRef),
            TokenKind::Int => self.leaf(NodeKind::IntLiteral),
            TokenKind::LocalContext => self.leaf(NodeKind::LocalContext),
            TokenKind::Param => self.leaf(NodeKind::ParamRef),
            TokenKind::BankPrefix => self.prefixed_label(NodeKind::LabelRef, "X#"),
            TokenKind::LengthOf => self.prefixed_label(NodeKind::LengthOf, "S#"),
            _ => ParseResult::NotMatched,
        }
    }

    fn leaf(&mut self, kind: NodeKind) -> ParseResult {
        let m = self.start();
        self.bump();
        ParseResult::Matched(self.complete(m, kind))
    }

    /// `X#LABEL` or `S#LABEL`.
    fn prefixed_label(&mut self, kind: NodeKind, prefix: &str) -> ParseResult {
        let m = self.start();
        let mark = self.errors.len();
        self.bump();
        let ok = self.eat(TokenKind::Ident);
        if !ok {
            self.pin_error(format!("expected label after '{}'", prefix));
        }
        self.finish_node(m, kind, mark, ok)
    }

    fn paren_expr(&mut self) -> ParseResult {
        let m = self.start();
        let mark = self.errors.len();
        self.bump();
        let inner = self.expr();
        let mut ok = inner.is_clean();
        if inner == ParseResult::NotMatched {
            self.pin_error("expected expression after '('");
        }
        if !self.eat(TokenKind::RParen) {
            if ok {
                self.pin_error("expected ')'");
            }
            ok = false;
        }
        self.finish_node(m, NodeKind::ParenExpr, mark, ok)
    }

    /// Quoted text. An unterminated literal simply ends at the line end.
    pub(super) fn text_literal(&mut self) -> ParseResult {
        let m = self.start();
        self.bump();
        self.eat(TokenKind::Text);
        self.eat(TokenKind::TextQuote);
        ParseResult::Matched(self.complete(m, NodeKind::TextLiteral))
    }
}
