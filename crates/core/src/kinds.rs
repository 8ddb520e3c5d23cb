//! Token and node kind catalog.
//!
//! Every terminal the lexer can emit and every node the parser can build is
//! named here. Instruction and directive keywords carry their operand shape
//! inside the token kind, so the parser dispatches on the kind alone and
//! never re-discovers the format from the spelling.

use serde::Serialize;

// ──────────────────────────────────────────────
// Operand shapes
// ──────────────────────────────────────────────

/// Operand pattern of a machine instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InstrShape {
    /// `ga , ga`
    TwoGa,
    /// `register , value`
    RegValue,
    /// `ga , register`
    GaReg,
    /// `register , (value | R0)`
    RegCount,
    /// `ga , value`
    GaValue,
    /// `ga`
    Ga,
    /// `register`
    Reg,
    /// `value`
    Value,
    /// no operands
    None,
    /// `ga , ga , ga` -- count, source, destination
    Move,
}

/// One operand slot in an instruction format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Ga,
    Register,
    Value,
    /// A value, or the literal register `R0` (shift counts).
    Count,
}

impl InstrShape {
    /// Operand slots, in source order.
    pub fn operands(self) -> &'static [OperandKind] {
        use OperandKind::*;
        match self {
            InstrShape::TwoGa => &[Ga, Ga],
            InstrShape::RegValue => &[Register, Value],
            InstrShape::GaReg => &[Ga, Register],
            InstrShape::RegCount => &[Register, Count],
            InstrShape::GaValue => &[Ga, Value],
            InstrShape::Ga => &[Ga],
            InstrShape::Reg => &[Register],
            InstrShape::Value => &[Value],
            InstrShape::None => &[],
            InstrShape::Move => &[Ga, Ga, Ga],
        }
    }
}

/// Argument pattern of an assembler directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DirShape {
    /// single expression
    Expr,
    /// optional expression
    OptExpr,
    /// comma-separated expressions
    ExprList,
    /// comma-separated symbol definitions
    SymbolList,
    /// `symbol , expr`
    SymbolExpr,
    /// quoted file name
    Filename,
    /// comma-separated text literals, each optionally negated
    TextList,
    /// `[+|-] digits [. digits]`
    Float,
    /// no arguments
    None,
}

// ──────────────────────────────────────────────
// Terminals
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Layout
    Whitespace,
    Eol,
    /// `*` in column 0 through end of line
    LineComment,
    /// `;` comment, or free text after the operand field
    Comment,
    BadCharacter,

    // Label field
    Label,
    LabelColon,

    // Mnemonic field
    Instruction(InstrShape),
    Directive(DirShape),
    PpKeyword,
    PpMacroCall,
    UnknownMnemonic,

    // Operand field
    Register,
    Ident,
    Int,
    /// `$`
    LocalContext,
    /// `#1`
    Param,
    /// `S#`
    LengthOf,
    /// `X#`
    BankPrefix,
    /// `B#` / `W#`
    AutoConst,
    At,
    Asterisk,
    Plus,
    Minus,
    /// `~` or `!`
    Not,
    /// `/ // & | ^ **`
    Misc,
    LParen,
    RParen,
    Comma,
    TextQuote,
    Text,
    FloatNumber,

    // Preprocessor arguments
    PpArg,
    PpSep,

    // Pragmas
    PgStart,
    PgTerm,
    PgEq,
    PgSep,
    PgCycle,

    /// Virtual end-of-input marker; never stored in a tree.
    Eof,
}

impl TokenKind {
    /// Tokens the parser skips over and attaches to the enclosing node.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace)
    }

    pub fn is_line_end(self) -> bool {
        matches!(self, TokenKind::Eol | TokenKind::Eof)
    }

    /// Start of the trailing comment-or-pragma slot.
    pub fn is_trailer(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::PgStart)
    }

    pub fn is_binary_op(self) -> bool {
        matches!(
            self,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Asterisk | TokenKind::Misc
        )
    }

    pub fn is_unary_op(self) -> bool {
        matches!(self, TokenKind::Plus | TokenKind::Minus | TokenKind::Not)
    }
}

// ──────────────────────────────────────────────
// Non-terminals
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Root,
    Line,
    LineComment,
    LabelDefinition,

    // Statements
    Instruction,
    Directive,
    Preprocessor,
    UnknownMnemonic,
    Error,

    // Pragmas
    Pragma,
    PragmaAssign,
    PragmaCycles,

    // Operands
    OpGa,
    OpRegister,
    OpValue,
    OpIndex,
    SymbolDefinition,
    Filename,
    FloatLiteral,

    // Expressions
    UnaryExpr,
    BinaryExpr,
    ParenExpr,
    LabelRef,
    LengthOf,
    IntLiteral,
    TextLiteral,
    LocalContext,
    ParamRef,
}

impl NodeKind {
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::Instruction
                | NodeKind::Directive
                | NodeKind::Preprocessor
                | NodeKind::UnknownMnemonic
                | NodeKind::Error
        )
    }

    pub fn is_expr(self) -> bool {
        matches!(
            self,
            NodeKind::UnaryExpr
                | NodeKind::BinaryExpr
                | NodeKind::ParenExpr
                | NodeKind::LabelRef
                | NodeKind::LengthOf
                | NodeKind::IntLiteral
                | NodeKind::TextLiteral
                | NodeKind::LocalContext
                | NodeKind::ParamRef
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operand_slots_match_shape_arity() {
        assert_eq!(InstrShape::TwoGa.operands().len(), 2);
        assert_eq!(InstrShape::Move.operands().len(), 3);
        assert!(InstrShape::None.operands().is_empty());
        assert_eq!(InstrShape::RegCount.operands()[1], OperandKind::Count);
    }

    #[test]
    fn only_whitespace_is_trivia() {
        assert!(TokenKind::Whitespace.is_trivia());
        assert!(!TokenKind::Comment.is_trivia());
        assert!(!TokenKind::Eol.is_trivia());
    }
}
