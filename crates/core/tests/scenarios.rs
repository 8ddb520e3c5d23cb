//! End-to-end parser properties: losslessness, error isolation, operand
//! format dispatch and the reference scenarios.

use tms99_core::ast::{self, AddressingMode, Directive, GeneralAddress, Instruction};
use tms99_core::{
    parse, Cpu, Dialect, ErrorKind, Extension, GrammarTable, NodeKind, Parse, TokenKind,
};

fn parse_default(src: &str) -> Parse {
    parse(src, &GrammarTable::default())
}

fn full_table() -> GrammarTable {
    GrammarTable::new(
        &Dialect::new(Cpu::Tms99110)
            .with_extension(Extension::F18a)
            .with_extension(Extension::GplMove),
    )
}

const PROGRAM: &str = "\
********************************
* Sprite mover
********************************
       DEF  START
       REF  VSBW,VMBW
WS     EQU  >8300
COUNT  EQU  8

START  LWPI WS
       LI   R0,>0300          sprite table
       LI   R1,BUFFER
       LI   R2,COUNT*4
       BLWP @VMBW
LOOP:  MOV  @POS(R3),R4
       AI   R4,>0101 ;: cycles=14
       MOV  R4,*R5+
       SLA  R4,R0
       CB   @BUFFER+1,@LIMIT
       JNE  LOOP
       DATA 0,-1,S#BUFFER,(COUNT+1)/2
       BYTE >20,'A'
       TEXT 'it''s done'
       FLOAT -2.5
       COPY \"common.a99\"
.IFDEF DEBUG
       .TRACE R1, 'x'
.ENDIF
       RT
BUFFER BSS  32
       END  START
";

// ──────────────────────────────────────────────
// 1. Losslessness and idempotence
// ──────────────────────────────────────────────

#[test]
fn program_round_trips_without_errors() {
    let p = parse_default(PROGRAM);
    assert!(p.errors.is_empty(), "{:#?}", p.errors);
    assert_eq!(p.tree.leaf_text(), PROGRAM);
}

#[test]
fn malformed_input_still_round_trips() {
    let src = "  LI R1,\n?? ))\n  MOV @,*\n\tTEXT 'open\r\n  CLR é\rLBL: : :\n  DATA (((\n";
    let p = parse_default(src);
    assert!(!p.errors.is_empty());
    assert_eq!(p.tree.leaf_text(), src);
}

#[test]
fn reparse_of_leaf_text_is_identical() {
    let first = parse_default(PROGRAM);
    let text = first.tree.leaf_text();
    let second = parse_default(&text);
    assert_eq!(first.tree.debug_dump(), second.tree.debug_dump());
    assert_eq!(first.errors, second.errors);
}

#[test]
fn node_ranges_nest() {
    let p = parse_default(PROGRAM);
    for node in p.tree.root().descendants() {
        if let Some(parent) = node.parent() {
            assert!(parent.range().start <= node.range().start);
            assert!(node.range().end <= parent.range().end);
        }
    }
}

// ──────────────────────────────────────────────
// 2. Error isolation
// ──────────────────────────────────────────────

#[test]
fn broken_line_does_not_affect_neighbours() {
    let good = "  LI R1,100\n";
    let bad = "  MOV @,)(\n";
    let src = format!("{good}{bad}{good}");
    let p = parse_default(&src);
    let lines: Vec<_> = ast::lines(&p.tree).collect();
    assert_eq!(lines.len(), 3);
    for err in &p.errors {
        assert!(lines[1].syntax().range().start <= err.range.start);
        assert!(err.range.end <= lines[1].syntax().range().end);
    }
    let reference = parse_default(good);
    let expected = ast::lines(&reference.tree).next().unwrap().syntax();
    for line in [lines[0], lines[2]] {
        assert_eq!(
            line.statement().unwrap().kind(),
            expected.first_child(NodeKind::Instruction).unwrap().kind()
        );
        assert_eq!(line.syntax().text(), good);
    }
}

// ──────────────────────────────────────────────
// 3. Format dispatch exactness
// ──────────────────────────────────────────────

#[test]
fn every_instruction_shape_parses_cleanly() {
    let table = full_table();
    for src in [
        "  A    R1,@SUM",
        "  AM   *R1,R2",
        "  LI   R0,>FFFF",
        "  BLSK R3,5",
        "  COC  @MASK(R2),R4",
        "  SRC  R5,3",
        "  SLC  R5,R0",
        "  XOP  @DATA,2",
        "  TMB  @ADDR,7",
        "  CLR  *R9",
        "  CALL @SUB",
        "  STST R7",
        "  LWP  R2",
        "  JMP  $-2",
        "  TB   -1",
        "  RTWP",
        "  RET",
        "  PIX  R0,R1",
        "  MOVE @N,@SRC,@DST",
    ] {
        let p = parse(src, &table);
        assert!(p.errors.is_empty(), "{}: {:?}", src, p.errors);
        let line = ast::lines(&p.tree).next().unwrap();
        let instr = Instruction::cast(line.statement().unwrap()).unwrap();
        let shape = instr.shape().unwrap();
        assert_eq!(instr.operands().len(), shape.operands().len(), "{}", src);
    }
}

#[test]
fn every_directive_shape_parses_cleanly() {
    for src in [
        "L  EQU  1+2",
        "   AORG",
        "   RORG >100",
        "   DATA A,B,C",
        "   DEF  A,B",
        "   DXOP WRITE,12",
        "   BCOPY 'bank.a99'",
        "   TITL 'Demo'",
        "   FLOAT 3",
        "   EVEN",
    ] {
        let p = parse_default(src);
        assert!(p.errors.is_empty(), "{}: {:?}", src, p.errors);
        let line = ast::lines(&p.tree).next().unwrap();
        assert!(Directive::cast(line.statement().unwrap()).is_some(), "{}", src);
    }
}

#[test]
fn dialect_gates_instruction_sets() {
    let src = "  MPYS R1\n";
    let base = parse_default(src);
    assert_eq!(base.errors.len(), 1);
    let line = ast::lines(&base.tree).next().unwrap();
    assert_eq!(line.statement().unwrap().kind(), NodeKind::UnknownMnemonic);

    let table = GrammarTable::new(&Dialect::new(Cpu::Tms9995));
    assert!(parse(src, &table).errors.is_empty());
}

#[test]
fn keywords_are_case_insensitive() {
    let p = parse_default("  li r1,1\n  data 2\n");
    assert!(p.errors.is_empty(), "{:?}", p.errors);
}

// ──────────────────────────────────────────────
// 4. Pathological nesting
// ──────────────────────────────────────────────

#[test]
fn deep_nesting_fails_closed() {
    let depth = 10_000;
    let src = format!("  DATA {}1{}\n  NOP\n", "(".repeat(depth), ")".repeat(depth));
    let p = parse_default(&src);
    assert!(p.errors.iter().any(|e| e.kind == ErrorKind::RecursionLimit));
    assert_eq!(p.tree.leaf_text(), src);
    let lines: Vec<_> = ast::lines(&p.tree).collect();
    assert_eq!(lines[1].statement().unwrap().kind(), NodeKind::Instruction);
}

#[test]
fn long_unary_chain_fails_closed() {
    let src = format!("  DATA {}1\n", "-".repeat(5_000));
    let p = parse_default(&src);
    assert!(p.errors.iter().any(|e| e.kind == ErrorKind::RecursionLimit));
    assert_eq!(p.tree.leaf_text(), src);
}

#[test]
fn long_operator_chain_fails_closed() {
    let src = format!("  DATA {}1\n  NOP\n", "1+".repeat(200_000));
    let p = parse_default(&src);
    assert!(p.errors.iter().any(|e| e.kind == ErrorKind::RecursionLimit));
    assert_eq!(p.tree.leaf_text(), src);
    let dump = p.tree.debug_dump();
    assert!(dump.starts_with("Root@0.."));
    assert_eq!(p.tree.to_json_value()["node"], "Root");
    let lines: Vec<_> = ast::lines(&p.tree).collect();
    assert_eq!(lines[1].statement().unwrap().kind(), NodeKind::Instruction);
}

#[test]
fn short_operator_chain_is_clean() {
    let src = format!("  DATA {}1\n", "1+".repeat(40));
    let p = parse_default(&src);
    assert!(p.errors.is_empty(), "{:?}", p.errors);
}

// ──────────────────────────────────────────────
// 5. Reference scenarios
// ──────────────────────────────────────────────

#[test]
fn scenario_load_immediate() {
    let p = parse_default("      LI   R1,100\n");
    assert!(p.errors.is_empty());
    let line = ast::lines(&p.tree).next().unwrap();
    let instr = Instruction::cast(line.statement().unwrap()).unwrap();
    let ops = instr.operands();
    assert_eq!(ops[0].kind(), NodeKind::OpRegister);
    assert_eq!(ops[0].text(), "R1");
    assert_eq!(ops[1].kind(), NodeKind::OpValue);
    let value = ops[1].child_nodes().next().unwrap();
    assert_eq!(value.kind(), NodeKind::IntLiteral);
    assert_eq!(value.text(), "100");
}

#[test]
fn scenario_comment_line() {
    let p = parse_default("* a comment\n");
    let line = ast::lines(&p.tree).next().unwrap();
    assert!(line.is_comment_line());
    assert!(line.statement().is_none());
    assert!(line.label().is_none());
    assert!(p.errors.is_empty());
}

#[test]
fn scenario_label_and_equate() {
    let p = parse_default("LABEL EQU 100\n");
    let line = ast::lines(&p.tree).next().unwrap();
    assert_eq!(line.label().unwrap().text(), "LABEL");
    let dir = Directive::cast(line.statement().unwrap()).unwrap();
    assert_eq!(dir.keyword().unwrap().text(), "EQU");
    assert_eq!(dir.arguments()[0].text(), "100");
}

#[test]
fn scenario_symbolic_address() {
    let p = parse_default("      BLWP @VSBW\n");
    assert!(p.errors.is_empty());
    let gas: Vec<_> = p
        .tree
        .root()
        .descendants()
        .into_iter()
        .filter_map(GeneralAddress::cast)
        .collect();
    assert_eq!(gas.len(), 1);
    assert_eq!(gas[0].mode(), AddressingMode::Symbolic);
    assert!(gas[0].index_register().is_none());
    assert_eq!(gas[0].expr().unwrap().text(), "VSBW");
}

#[test]
fn scenario_unknown_mnemonic() {
    let p = parse_default("      BADOP X,Y\n      NOP\n");
    let lines: Vec<_> = ast::lines(&p.tree).collect();
    assert_eq!(
        lines[0].statement().unwrap().kind(),
        NodeKind::UnknownMnemonic
    );
    assert_eq!(lines[1].statement().unwrap().kind(), NodeKind::Instruction);
    assert_eq!(p.errors.len(), 1);
}

#[test]
fn scenario_unterminated_text() {
    let p = parse_default("      TEXT 'abc\n      NOP\n");
    let text_tokens = p
        .tree
        .tokens()
        .iter()
        .filter(|t| t.kind == TokenKind::Text)
        .count();
    assert_eq!(text_tokens, 1);
    let lines: Vec<_> = ast::lines(&p.tree).collect();
    assert_eq!(lines[1].statement().unwrap().kind(), NodeKind::Instruction);
    assert!(p.errors.is_empty());
}

// ──────────────────────────────────────────────
// 6. Serialized forms
// ──────────────────────────────────────────────

#[test]
fn json_tree_mirrors_structure() {
    let p = parse_default("  NOP\n");
    let v = p.tree.to_json_value();
    assert_eq!(v["node"], "Root");
    assert_eq!(v["children"][0]["node"], "Line");
    let instr = &v["children"][0]["children"][1];
    assert_eq!(instr["node"], "Instruction");
    assert_eq!(instr["children"][0]["text"], "NOP");
}

#[test]
fn debug_dump_is_indented() {
    let p = parse_default("  NOP\n");
    let dump = p.tree.debug_dump();
    let expected = "\
Root@0..6
  Line@0..6
    Whitespace@0..2 \"  \"
    Instruction@2..5
      Instruction(None)@2..5 \"NOP\"
    Eol@5..6 \"\\n\"
";
    assert_eq!(dump, expected);
}
