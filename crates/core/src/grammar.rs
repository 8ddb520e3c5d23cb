//! Keyword table: mnemonic, directive and preprocessor spellings mapped to
//! their token kinds for one dialect.
//!
//! Built once per [`Dialect`] and read-only afterwards; share it between
//! parses with an `Arc`.

use std::collections::HashMap;

use crate::dialect::{Dialect, Extension, MAX_DEPTH_LIMIT};
use crate::kinds::{DirShape, InstrShape, TokenKind};
use crate::lexer::ArgRegion;

/// What a recognized word in the mnemonic field is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Instruction(InstrShape),
    Directive(DirShape),
    Preprocessor,
}

impl Keyword {
    pub fn token_kind(self) -> TokenKind {
        match self {
            Keyword::Instruction(shape) => TokenKind::Instruction(shape),
            Keyword::Directive(shape) => TokenKind::Directive(shape),
            Keyword::Preprocessor => TokenKind::PpKeyword,
        }
    }

    /// Lexical region the argument field is scanned in.
    pub fn region(self) -> ArgRegion {
        match self {
            Keyword::Instruction(InstrShape::None) => ArgRegion::None,
            Keyword::Instruction(_) => ArgRegion::Operands,
            Keyword::Directive(DirShape::None) => ArgRegion::None,
            Keyword::Directive(DirShape::Float) => ArgRegion::Float,
            Keyword::Directive(_) => ArgRegion::Arguments,
            Keyword::Preprocessor => ArgRegion::Preprocessor,
        }
    }
}

// ──────────────────────────────────────────────
// Instruction sets
// ──────────────────────────────────────────────

const TMS9900: &[(&str, InstrShape)] = &[
    ("A", InstrShape::TwoGa),
    ("AB", InstrShape::TwoGa),
    ("C", InstrShape::TwoGa),
    ("CB", InstrShape::TwoGa),
    ("S", InstrShape::TwoGa),
    ("SB", InstrShape::TwoGa),
    ("SOC", InstrShape::TwoGa),
    ("SOCB", InstrShape::TwoGa),
    ("SZC", InstrShape::TwoGa),
    ("SZCB", InstrShape::TwoGa),
    ("MOV", InstrShape::TwoGa),
    ("MOVB", InstrShape::TwoGa),
    ("LI", InstrShape::RegValue),
    ("AI", InstrShape::RegValue),
    ("ANDI", InstrShape::RegValue),
    ("ORI", InstrShape::RegValue),
    ("CI", InstrShape::RegValue),
    ("COC", InstrShape::GaReg),
    ("CZC", InstrShape::GaReg),
    ("XOR", InstrShape::GaReg),
    ("MPY", InstrShape::GaReg),
    ("DIV", InstrShape::GaReg),
    ("SLA", InstrShape::RegCount),
    ("SRA", InstrShape::RegCount),
    ("SRL", InstrShape::RegCount),
    ("SRC", InstrShape::RegCount),
    ("XOP", InstrShape::GaValue),
    ("LDCR", InstrShape::GaValue),
    ("STCR", InstrShape::GaValue),
    ("B", InstrShape::Ga),
    ("BL", InstrShape::Ga),
    ("BLWP", InstrShape::Ga),
    ("CLR", InstrShape::Ga),
    ("SETO", InstrShape::Ga),
    ("INV", InstrShape::Ga),
    ("NEG", InstrShape::Ga),
    ("ABS", InstrShape::Ga),
    ("SWPB", InstrShape::Ga),
    ("INC", InstrShape::Ga),
    ("INCT", InstrShape::Ga),
    ("DEC", InstrShape::Ga),
    ("DECT", InstrShape::Ga),
    ("X", InstrShape::Ga),
    ("STWP", InstrShape::Reg),
    ("STST", InstrShape::Reg),
    ("JMP", InstrShape::Value),
    ("JLT", InstrShape::Value),
    ("JLE", InstrShape::Value),
    ("JEQ", InstrShape::Value),
    ("JHE", InstrShape::Value),
    ("JGT", InstrShape::Value),
    ("JNE", InstrShape::Value),
    ("JNC", InstrShape::Value),
    ("JOC", InstrShape::Value),
    ("JNO", InstrShape::Value),
    ("JL", InstrShape::Value),
    ("JH", InstrShape::Value),
    ("JOP", InstrShape::Value),
    ("SBO", InstrShape::Value),
    ("SBZ", InstrShape::Value),
    ("TB", InstrShape::Value),
    ("LWPI", InstrShape::Value),
    ("LIMI", InstrShape::Value),
    ("IDLE", InstrShape::None),
    ("RSET", InstrShape::None),
    ("RTWP", InstrShape::None),
    ("CKON", InstrShape::None),
    ("CKOF", InstrShape::None),
    ("LREX", InstrShape::None),
    // pseudo-instructions
    ("RT", InstrShape::None),
    ("NOP", InstrShape::None),
];

const TMS9995: &[(&str, InstrShape)] = &[
    ("MPYS", InstrShape::Ga),
    ("DIVS", InstrShape::Ga),
    ("LST", InstrShape::Reg),
    ("LWP", InstrShape::Reg),
];

const TMS99000: &[(&str, InstrShape)] = &[
    ("AM", InstrShape::TwoGa),
    ("SM", InstrShape::TwoGa),
    ("BLSK", InstrShape::RegValue),
    ("SLAM", InstrShape::GaValue),
    ("SRAM", InstrShape::GaValue),
    ("TMB", InstrShape::GaValue),
    ("TCMB", InstrShape::GaValue),
    ("TSMB", InstrShape::GaValue),
    ("BIND", InstrShape::Ga),
    ("LDS", InstrShape::Ga),
    ("LDD", InstrShape::Ga),
    ("EVAD", InstrShape::Ga),
];

const F18A: &[(&str, InstrShape)] = &[
    ("CALL", InstrShape::Ga),
    ("PUSH", InstrShape::Ga),
    ("POP", InstrShape::Ga),
    ("RET", InstrShape::None),
    ("SLC", InstrShape::RegCount),
    ("PIX", InstrShape::TwoGa),
];

const GPL_MOVE: &[(&str, InstrShape)] = &[("MOVE", InstrShape::Move)];

const DIRECTIVES: &[(&str, DirShape)] = &[
    ("EQU", DirShape::Expr),
    ("BSS", DirShape::Expr),
    ("BES", DirShape::Expr),
    ("DORG", DirShape::Expr),
    ("XORG", DirShape::Expr),
    ("AORG", DirShape::OptExpr),
    ("RORG", DirShape::OptExpr),
    ("END", DirShape::OptExpr),
    ("CSEG", DirShape::OptExpr),
    ("DSEG", DirShape::OptExpr),
    ("PSEG", DirShape::OptExpr),
    ("DATA", DirShape::ExprList),
    ("BYTE", DirShape::ExprList),
    ("BANK", DirShape::ExprList),
    ("SAVE", DirShape::ExprList),
    ("DEF", DirShape::SymbolList),
    ("REF", DirShape::SymbolList),
    ("SREF", DirShape::SymbolList),
    ("LOAD", DirShape::SymbolList),
    ("DXOP", DirShape::SymbolExpr),
    ("COPY", DirShape::Filename),
    ("BCOPY", DirShape::Filename),
    ("TEXT", DirShape::TextList),
    ("STRI", DirShape::TextList),
    ("TITL", DirShape::TextList),
    ("IDT", DirShape::TextList),
    ("FLOAT", DirShape::Float),
    ("EVEN", DirShape::None),
    ("PAGE", DirShape::None),
    ("LIST", DirShape::None),
    ("UNL", DirShape::None),
    ("DEND", DirShape::None),
    ("PEND", DirShape::None),
    ("CEND", DirShape::None),
];

const PREPROCESSOR: &[&str] = &[
    ".IFDEF", ".IFNDEF", ".IFEQ", ".IFNE", ".IFGT", ".IFGE", ".ELSE", ".ENDIF", ".DEFM", ".ENDM",
    ".ERROR",
];

// ──────────────────────────────────────────────
// Table
// ──────────────────────────────────────────────

fn add_instructions(keywords: &mut HashMap<String, Keyword>, set: &[(&str, InstrShape)]) {
    for (name, shape) in set {
        keywords.insert((*name).to_owned(), Keyword::Instruction(*shape));
    }
}

/// Nesting bound for a dialect that may not have been validated. An
/// out-of-range value is clamped with a warning instead of being trusted.
fn bounded_depth(dialect: &Dialect) -> usize {
    if let Err(e) = dialect.validate() {
        let depth = dialect.max_depth.clamp(1, MAX_DEPTH_LIMIT);
        log::warn!("{}; using {}", e, depth);
        return depth;
    }
    dialect.max_depth
}

/// Read-only keyword lookup for one dialect.
#[derive(Debug, Clone)]
pub struct GrammarTable {
    keywords: HashMap<String, Keyword>,
    max_depth: usize,
}

impl Default for GrammarTable {
    fn default() -> Self {
        GrammarTable::new(&Dialect::default())
    }
}

impl GrammarTable {
    pub fn new(dialect: &Dialect) -> Self {
        let mut keywords = HashMap::new();
        add_instructions(&mut keywords, TMS9900);
        if dialect.cpu.has_9995_set() {
            add_instructions(&mut keywords, TMS9995);
        }
        if dialect.cpu.has_99000_set() {
            add_instructions(&mut keywords, TMS99000);
        }
        if dialect.has(Extension::F18a) {
            add_instructions(&mut keywords, F18A);
        }
        if dialect.has(Extension::GplMove) {
            add_instructions(&mut keywords, GPL_MOVE);
        }
        for (name, shape) in DIRECTIVES {
            keywords.insert((*name).to_owned(), Keyword::Directive(*shape));
        }
        for name in PREPROCESSOR {
            keywords.insert((*name).to_owned(), Keyword::Preprocessor);
        }
        log::debug!(
            "grammar table for {:?} {:?}: {} keywords",
            dialect.cpu,
            dialect.extensions,
            keywords.len()
        );
        GrammarTable {
            keywords,
            max_depth: bounded_depth(dialect),
        }
    }

    /// Case-insensitive keyword lookup.
    pub fn lookup(&self, word: &str) -> Option<Keyword> {
        if word.bytes().any(|b| b.is_ascii_lowercase()) {
            self.keywords.get(&word.to_ascii_uppercase()).copied()
        } else {
            self.keywords.get(word).copied()
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Cpu;

    #[test]
    fn lookup_is_case_insensitive() {
        let table = GrammarTable::default();
        assert_eq!(table.lookup("mov"), Some(Keyword::Instruction(InstrShape::TwoGa)));
        assert_eq!(table.lookup("Li"), Some(Keyword::Instruction(InstrShape::RegValue)));
        assert_eq!(table.lookup("equ"), Some(Keyword::Directive(DirShape::Expr)));
        assert_eq!(table.lookup(".ifdef"), Some(Keyword::Preprocessor));
        assert_eq!(table.lookup("BADOP"), None);
    }

    #[test]
    fn cpu_variant_controls_mnemonic_set() {
        let base = GrammarTable::new(&Dialect::new(Cpu::Tms9900));
        assert_eq!(base.lookup("MPYS"), None);
        assert_eq!(base.lookup("AM"), None);

        let t9995 = GrammarTable::new(&Dialect::new(Cpu::Tms9995));
        assert_eq!(t9995.lookup("MPYS"), Some(Keyword::Instruction(InstrShape::Ga)));
        assert_eq!(t9995.lookup("AM"), None);

        let t99105 = GrammarTable::new(&Dialect::new(Cpu::Tms99105));
        assert_eq!(t99105.lookup("LWP"), Some(Keyword::Instruction(InstrShape::Reg)));
        assert_eq!(t99105.lookup("AM"), Some(Keyword::Instruction(InstrShape::TwoGa)));
    }

    #[test]
    fn extensions_add_instructions() {
        let plain = GrammarTable::default();
        assert_eq!(plain.lookup("PIX"), None);
        assert_eq!(plain.lookup("MOVE"), None);

        let dialect = Dialect::default()
            .with_extension(Extension::F18a)
            .with_extension(Extension::GplMove);
        let ext = GrammarTable::new(&dialect);
        assert_eq!(ext.lookup("slc"), Some(Keyword::Instruction(InstrShape::RegCount)));
        assert_eq!(ext.lookup("MOVE"), Some(Keyword::Instruction(InstrShape::Move)));
    }

    #[test]
    fn regions_follow_shape() {
        assert_eq!(Keyword::Instruction(InstrShape::None).region(), ArgRegion::None);
        assert_eq!(Keyword::Instruction(InstrShape::Ga).region(), ArgRegion::Operands);
        assert_eq!(Keyword::Directive(DirShape::Float).region(), ArgRegion::Float);
        assert_eq!(Keyword::Directive(DirShape::Expr).region(), ArgRegion::Arguments);
        assert_eq!(Keyword::Preprocessor.region(), ArgRegion::Preprocessor);
    }

    #[test]
    fn unvalidated_depth_is_clamped() {
        let deep = Dialect {
            max_depth: 1_000_000,
            ..Dialect::default()
        };
        assert_eq!(GrammarTable::new(&deep).max_depth(), MAX_DEPTH_LIMIT);
        let zero = Dialect {
            max_depth: 0,
            ..Dialect::default()
        };
        assert_eq!(GrammarTable::new(&zero).max_depth(), 1);
    }

    #[test]
    fn table_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GrammarTable>();
    }
}
