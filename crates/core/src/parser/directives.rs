use super::{ParseResult, Parser};
use crate::error::SyntaxError;
use crate::kinds::{DirShape, NodeKind, TokenKind};

impl<'a> Parser<'a> {
    // -- Directives ---------------------------------------------

    pub(super) fn directive(&mut self, shape: DirShape) -> ParseResult {
        let m = self.start();
        let mark = self.errors.len();
        self.bump();
        let ok = match shape {
            DirShape::Expr => self.required(Self::expr, "expected expression"),
            DirShape::OptExpr => !matches!(self.expr(), ParseResult::MatchedWithError(_)),
            DirShape::ExprList => self.separated(Self::expr, "expected expression"),
            DirShape::SymbolList => self.separated(Self::symbol, "expected symbol"),
            DirShape::SymbolExpr => {
                self.required(Self::symbol, "expected symbol")
                    && self.comma_then(Self::expr, "expected expression")
            }
            DirShape::Filename => self.required(Self::filename, "expected quoted file name"),
            DirShape::TextList => self.separated(Self::text_item, "expected text literal"),
            DirShape::Float => self.required(Self::float_literal, "expected number"),
            DirShape::None => true,
        };
        self.finish_node(m, NodeKind::Directive, mark, ok)
    }

    /// Run a mandatory rule, reporting a pin failure if it does not apply.
    fn required(&mut self, rule: fn(&mut Self) -> ParseResult, message: &str) -> bool {
        match rule(self) {
            ParseResult::Matched(_) => true,
            ParseResult::MatchedWithError(_) => false,
            ParseResult::NotMatched => {
                self.pin_error(message);
                false
            }
        }
    }

    fn comma_then(&mut self, rule: fn(&mut Self) -> ParseResult, message: &str) -> bool {
        if !self.eat(TokenKind::Comma) {
            self.pin_error("expected ','");
            return false;
        }
        self.required(rule, message)
    }

    /// `item (, item)*`
    fn separated(&mut self, rule: fn(&mut Self) -> ParseResult, message: &str) -> bool {
        if !self.required(rule, message) {
            return false;
        }
        while self.eat(TokenKind::Comma) {
            if !self.required(rule, message) {
                return false;
            }
        }
        true
    }

    fn symbol(&mut self) -> ParseResult {
        if !self.at(TokenKind::Ident) {
            return ParseResult::NotMatched;
        }
        let m = self.start();
        self.bump();
        ParseResult::Matched(self.complete(m, NodeKind::SymbolDefinition))
    }

    fn filename(&mut self) -> ParseResult {
        if !self.at(TokenKind::TextQuote) {
            return ParseResult::NotMatched;
        }
        let m = self.start();
        self.text_literal();
        ParseResult::Matched(self.complete(m, NodeKind::Filename))
    }

    /// A text literal, optionally negated with a leading `-`.
    fn text_item(&mut self) -> ParseResult {
        match self.current() {
            TokenKind::TextQuote => self.text_literal(),
            TokenKind::Minus if self.nth(1) == TokenKind::TextQuote => {
                let m = self.start();
                self.bump();
                self.text_literal();
                ParseResult::Matched(self.complete(m, NodeKind::UnaryExpr))
            }
            _ => ParseResult::NotMatched,
        }
    }

    /// `[+|-] digits [. digits]`
    fn float_literal(&mut self) -> ParseResult {
        let kind = self.current();
        let signed = matches!(kind, TokenKind::Plus | TokenKind::Minus);
        if kind != TokenKind::FloatNumber && !signed {
            return ParseResult::NotMatched;
        }
        let m = self.start();
        let mark = self.errors.len();
        if signed {
            self.bump();
        }
        let ok = self.eat(TokenKind::FloatNumber);
        if !ok {
            self.pin_error("expected digits after sign");
        }
        self.finish_node(m, NodeKind::FloatLiteral, mark, ok)
    }

    // -- Preprocessor -------------------------------------------

    /// Keyword followed by opaque arguments; nothing is interpreted here.
    pub(super) fn preprocessor(&mut self) -> ParseResult {
        let m = self.start();
        self.bump();
        while matches!(self.current(), TokenKind::PpArg | TokenKind::PpSep) {
            self.bump();
        }
        ParseResult::Matched(self.complete(m, NodeKind::Preprocessor))
    }

    // -- Unknown mnemonic ---------------------------------------

    /// An unrecognized word in the mnemonic field swallows its operand field.
    pub(super) fn unknown_mnemonic(&mut self) -> ParseResult {
        let m = self.start();
        let range = self.current_range();
        let word = self.current_text();
        while !self.at_line_end() && !self.current().is_trailer() {
            self.bump();
        }
        let node = self.complete(m, NodeKind::UnknownMnemonic);
        log::debug!("unknown mnemonic {:?} at {}", word, range);
        let mut err = SyntaxError::syntax(range, format!("unknown mnemonic '{}'", word));
        err.node = Some(node);
        self.errors.push(err);
        ParseResult::MatchedWithError(node)
    }

    // -- Pragmas ------------------------------------------------

    /// `;:` followed by `key=value` and `+`-run clauses separated by commas.
    pub(super) fn pragma(&mut self) -> ParseResult {
        let m = self.start();
        let mark = self.errors.len();
        self.bump();
        let mut ok = true;
        loop {
            match self.current() {
                TokenKind::PgTerm => ok &= self.pragma_assign(),
                TokenKind::PgCycle => {
                    let c = self.start();
                    while self.eat(TokenKind::PgCycle) {}
                    self.complete(c, NodeKind::PragmaCycles);
                }
                _ => {
                    self.pin_error("expected pragma clause");
                    ok = false;
                }
            }
            if !ok || !self.eat(TokenKind::PgSep) {
                break;
            }
        }
        self.finish_node(m, NodeKind::Pragma, mark, ok)
    }

    fn pragma_assign(&mut self) -> bool {
        let c = self.start();
        self.bump();
        let ok = if !self.eat(TokenKind::PgEq) {
            self.pin_error("expected '=' in pragma");
            false
        } else if !self.eat(TokenKind::PgTerm) {
            self.pin_error("expected value after '='");
            false
        } else {
            true
        };
        self.complete(c, NodeKind::PragmaAssign);
        ok
    }
}
