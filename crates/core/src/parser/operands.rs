use super::expressions::Flavor;
use super::{ParseResult, Parser};
use crate::kinds::{InstrShape, NodeKind, OperandKind, TokenKind};

fn describe(slot: OperandKind) -> &'static str {
    match slot {
        OperandKind::Ga => "general address",
        OperandKind::Register => "register",
        OperandKind::Value => "value",
        OperandKind::Count => "shift count",
    }
}

impl<'a> Parser<'a> {
    // -- Instruction formats ------------------------------------

    /// Keyword followed by the operand slots of `shape`. The keyword pins
    /// the statement and each comma pins the operand after it.
    pub(super) fn instruction(&mut self, shape: InstrShape) -> ParseResult {
        let m = self.start();
        let mark = self.errors.len();
        self.bump();
        let mut ok = true;
        for (i, &slot) in shape.operands().iter().enumerate() {
            if i > 0 && !self.eat(TokenKind::Comma) {
                self.pin_error(format!("expected ',' before {}", describe(slot)));
                ok = false;
                break;
            }
            match self.operand_slot(slot) {
                ParseResult::Matched(_) => {}
                ParseResult::MatchedWithError(_) => {
                    ok = false;
                    break;
                }
                ParseResult::NotMatched => {
                    self.pin_error(format!("expected {}", describe(slot)));
                    ok = false;
                    break;
                }
            }
        }
        self.finish_node(m, NodeKind::Instruction, mark, ok)
    }

    fn operand_slot(&mut self, slot: OperandKind) -> ParseResult {
        match slot {
            OperandKind::Ga => self.general_address(),
            OperandKind::Register => self.register_operand(Flavor::Full),
            OperandKind::Value => self.value_operand(),
            OperandKind::Count => self.count_operand(),
        }
    }

    // -- General address ----------------------------------------

    /// One of `Rn`, `@addr`, `@addr(Rn)`, `*Rn`, `*Rn+`, `B#addr`, or a bare
    /// address expression naming a register.
    pub(super) fn general_address(&mut self) -> ParseResult {
        let kind = self.current();
        let m = match kind {
            TokenKind::Register
            | TokenKind::At
            | TokenKind::Asterisk
            | TokenKind::AutoConst => self.start(),
            _ if Flavor::Simple.starts_expr(kind) => self.start(),
            _ => return ParseResult::NotMatched,
        };
        let mark = self.errors.len();
        let ok = match kind {
            TokenKind::Register => {
                self.bump();
                true
            }
            TokenKind::At => {
                self.bump();
                self.required_sexpr("expected address after '@'")
                    && (!self.at(TokenKind::LParen) || self.index())
            }
            TokenKind::Asterisk => {
                self.bump();
                let ok = self.required_register("expected register after '*'");
                self.eat(TokenKind::Plus);
                ok
            }
            TokenKind::AutoConst => {
                self.bump();
                self.required_sexpr("expected constant after auto-constant prefix")
            }
            _ => self.sexpr().is_clean(),
        };
        self.finish_node(m, NodeKind::OpGa, mark, ok)
    }

    fn required_sexpr(&mut self, message: &str) -> bool {
        match self.sexpr() {
            ParseResult::Matched(_) => true,
            ParseResult::MatchedWithError(_) => false,
            ParseResult::NotMatched => {
                self.pin_error(message);
                false
            }
        }
    }

    /// Register inside `*reg` or `(reg)`, where only address expressions
    /// are allowed.
    fn required_register(&mut self, message: &str) -> bool {
        match self.register_operand(Flavor::Simple) {
            ParseResult::Matched(_) => true,
            ParseResult::MatchedWithError(_) => false,
            ParseResult::NotMatched => {
                self.pin_error(message);
                false
            }
        }
    }

    /// `( register )` after a symbolic address.
    fn index(&mut self) -> bool {
        let m = self.start();
        let mark = self.errors.len();
        self.bump();
        let mut ok = self.required_register("expected index register");
        if ok && !self.eat(TokenKind::RParen) {
            self.pin_error("expected ')' after index register");
            ok = false;
        }
        self.finish_node(m, NodeKind::OpIndex, mark, ok).is_clean()
    }

    // -- Register, value and count ------------------------------

    /// `Rn`, or an expression of `flavor` evaluating to a register number.
    pub(super) fn register_operand(&mut self, flavor: Flavor) -> ParseResult {
        if self.at(TokenKind::Register) {
            let m = self.start();
            self.bump();
            return ParseResult::Matched(self.complete(m, NodeKind::OpRegister));
        }
        self.wrap_expr(NodeKind::OpRegister, flavor)
    }

    pub(super) fn value_operand(&mut self) -> ParseResult {
        self.wrap_expr(NodeKind::OpValue, Flavor::Full)
    }

    /// Shift count: a value, or the register `R0` meaning "count in R0".
    fn count_operand(&mut self) -> ParseResult {
        if !self.at(TokenKind::Register) {
            return self.value_operand();
        }
        let is_r0 = self.current_text().eq_ignore_ascii_case("R0");
        let m = self.start();
        let mark = self.errors.len();
        if !is_r0 {
            self.pin_error("shift count register must be R0");
        }
        self.bump();
        self.finish_node(m, NodeKind::OpRegister, mark, is_r0)
    }

    fn wrap_expr(&mut self, kind: NodeKind, flavor: Flavor) -> ParseResult {
        if !flavor.starts_expr(self.current()) {
            return ParseResult::NotMatched;
        }
        let m = self.start();
        let mark = self.errors.len();
        let inner = match flavor {
            Flavor::Full => self.expr(),
            Flavor::Simple => self.sexpr(),
        };
        if inner == ParseResult::NotMatched {
            // only reachable through the nesting limit
            self.abandon(m);
            return ParseResult::NotMatched;
        }
        self.finish_node(m, kind, mark, inner.is_clean())
    }
}
