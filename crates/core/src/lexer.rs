//! Region-switching scanner.
//!
//! Assembly source is column-oriented: a label field, a mnemonic field, an
//! argument field and free comment text. The lexer tracks which field it is
//! in and changes the set of recognizable tokens accordingly. Every byte of
//! input ends up in exactly one token, and the scanner never fails: bytes
//! no region accepts become `BadCharacter` tokens.

use serde::Serialize;

use crate::grammar::GrammarTable;
use crate::kinds::TokenKind;

/// Half-open byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        TextRange { start, end }
    }

    pub fn empty(at: usize) -> Self {
        TextRange { start: at, end: at }
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Smallest range containing both.
    pub fn cover(self, other: TextRange) -> TextRange {
        TextRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn slice(self, text: &str) -> &str {
        &text[self.start..self.end]
    }
}

impl std::fmt::Display for TextRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Argument field flavour selected by the keyword in the mnemonic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArgRegion {
    /// Instruction operands; `R0`..`R15` lex as registers.
    Operands,
    /// Directive arguments; register names are plain identifiers.
    Arguments,
    /// `FLOAT` arguments.
    Float,
    /// Opaque preprocessor arguments.
    Preprocessor,
    /// The keyword takes no arguments; text after whitespace is comment.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LexState {
    LineStart,
    Mnemonic,
    /// Directly after a keyword, before the separating whitespace.
    AfterMnemonic(ArgRegion),
    Arguments(ArgRegion),
    /// Inside a quoted literal; returns to `Arguments(resume)` at the
    /// closing quote.
    Text { quote: char, resume: ArgRegion },
    /// After the argument field: comment text or a pragma.
    Trailing,
    Preprocessor,
    Pragma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
    /// Lexical state in effect when the token was scanned.
    pub state: LexState,
}

impl Token {
    pub fn text<'t>(&self, source: &'t str) -> &'t str {
        self.range.slice(source)
    }
}

/// Scan the whole input eagerly.
pub fn lex(text: &str, table: &GrammarTable) -> Vec<Token> {
    Lexer::new(text, table).collect()
}

pub struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line_start: usize,
    state: LexState,
    table: &'a GrammarTable,
}

fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn is_eol_byte(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

fn is_register(word: &str) -> bool {
    let bytes = word.as_bytes();
    if bytes.len() < 2 || bytes.len() > 3 || !matches!(bytes[0], b'R' | b'r') {
        return false;
    }
    let digits = &word[1..];
    if digits.len() == 2 && digits.starts_with('0') {
        return false;
    }
    matches!(digits.parse::<u8>(), Ok(n) if n <= 15)
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str, table: &'a GrammarTable) -> Self {
        Lexer {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            line_start: 0,
            state: LexState::LineStart,
            table,
        }
    }

    pub fn state(&self) -> LexState {
        self.state
    }

    fn at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn cur(&self) -> u8 {
        self.bytes[self.pos]
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.pos < self.bytes.len() && pred(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }

    fn eat_to_line_end(&mut self) {
        self.eat_while(|b| !is_eol_byte(b));
    }

    /// Consume one (possibly multi-byte) character.
    fn bad_char(&mut self) -> TokenKind {
        let len = self.text[self.pos..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        self.pos += len;
        TokenKind::BadCharacter
    }

    fn eol_len(&self) -> usize {
        match (self.at(0), self.at(1)) {
            (Some(b'\r'), Some(b'\n')) => 2,
            (Some(b'\n'), _) | (Some(b'\r'), _) => 1,
            _ => 0,
        }
    }

    fn whitespace(&mut self) -> TokenKind {
        self.eat_while(is_blank);
        TokenKind::Whitespace
    }

    /// `;` starts a comment, `;:` a pragma.
    fn comment_or_pragma(&mut self) -> TokenKind {
        if self.at(1) == Some(b':') {
            self.pos += 2;
            self.state = LexState::Pragma;
            TokenKind::PgStart
        } else {
            self.eat_to_line_end();
            TokenKind::Comment
        }
    }

    fn enter(&mut self, region: ArgRegion) {
        self.state = match region {
            ArgRegion::None => LexState::Trailing,
            ArgRegion::Preprocessor => LexState::Preprocessor,
            other => LexState::Arguments(other),
        };
    }

    fn dispatch(&mut self) -> TokenKind {
        match self.state {
            LexState::LineStart => self.lex_line_start(),
            LexState::Mnemonic => self.lex_mnemonic(),
            LexState::AfterMnemonic(region) => {
                if is_blank(self.cur()) {
                    self.enter(region);
                    self.whitespace()
                } else {
                    self.enter(region);
                    self.dispatch()
                }
            }
            LexState::Arguments(region) => self.lex_argument(region),
            LexState::Text { quote, resume } => self.lex_text(quote, resume),
            LexState::Trailing => self.lex_trailing(),
            LexState::Preprocessor => self.lex_preprocessor(),
            LexState::Pragma => self.lex_pragma(),
        }
    }

    // -- Label field --------------------------------------------

    fn lex_line_start(&mut self) -> TokenKind {
        let b = self.cur();
        let col0 = self.pos == self.line_start;
        if col0 && b == b'*' {
            self.eat_to_line_end();
            return TokenKind::LineComment;
        }
        if b == b';' {
            return self.comment_or_pragma();
        }
        if is_blank(b) {
            self.state = LexState::Mnemonic;
            return self.whitespace();
        }
        if col0 && b == b'.' {
            self.state = LexState::Mnemonic;
            return self.lex_mnemonic();
        }
        if is_word_start(b) {
            if !col0 {
                // `LABEL:MNEMONIC` with no blank in between
                self.state = LexState::Mnemonic;
                return self.lex_mnemonic();
            }
            self.eat_while(is_word_byte);
            return TokenKind::Label;
        }
        if b == b':' {
            self.pos += 1;
            return TokenKind::LabelColon;
        }
        self.bad_char()
    }

    // -- Mnemonic field -----------------------------------------

    fn lex_mnemonic(&mut self) -> TokenKind {
        let b = self.cur();
        if is_blank(b) {
            return self.whitespace();
        }
        if b == b';' {
            return self.comment_or_pragma();
        }
        if b == b'.' && self.at(1).is_some_and(is_word_start) {
            let start = self.pos;
            self.pos += 1;
            self.eat_while(is_word_byte);
            let word = &self.text[start..self.pos];
            let kind = match self.table.lookup(word) {
                Some(kw) => kw.token_kind(),
                None => TokenKind::PpMacroCall,
            };
            self.state = LexState::AfterMnemonic(ArgRegion::Preprocessor);
            return kind;
        }
        if is_word_byte(b) {
            let start = self.pos;
            self.eat_while(is_word_byte);
            let word = &self.text[start..self.pos];
            return match self.table.lookup(word) {
                Some(kw) => {
                    self.state = LexState::AfterMnemonic(kw.region());
                    kw.token_kind()
                }
                None => {
                    log::trace!("unknown mnemonic {:?}", word);
                    self.state = LexState::AfterMnemonic(ArgRegion::Operands);
                    TokenKind::UnknownMnemonic
                }
            };
        }
        self.bad_char()
    }

    // -- Argument field -----------------------------------------

    fn lex_argument(&mut self, region: ArgRegion) -> TokenKind {
        let b = self.cur();
        if is_blank(b) {
            self.state = LexState::Trailing;
            return self.whitespace();
        }
        if b == b';' {
            return self.comment_or_pragma();
        }
        if region == ArgRegion::Float {
            return self.lex_float_argument(b);
        }
        match b {
            b'\'' | b'"' => {
                self.pos += 1;
                self.state = LexState::Text {
                    quote: b as char,
                    resume: region,
                };
                TokenKind::TextQuote
            }
            _ if is_word_start(b) => self.lex_word(region),
            b'0'..=b'9' => {
                self.eat_while(|b| b.is_ascii_digit());
                TokenKind::Int
            }
            b'>' if self.at(1).is_some_and(|b| b.is_ascii_hexdigit()) => {
                self.pos += 1;
                self.eat_while(|b| b.is_ascii_hexdigit());
                TokenKind::Int
            }
            b':' if matches!(self.at(1), Some(b'0' | b'1')) => {
                self.pos += 1;
                self.eat_while(|b| b == b'0' || b == b'1');
                TokenKind::Int
            }
            b'#' if self.at(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.pos += 1;
                self.eat_while(|b| b.is_ascii_digit());
                TokenKind::Param
            }
            b'$' => self.single(TokenKind::LocalContext),
            b'@' => self.single(TokenKind::At),
            b'*' if self.at(1) == Some(b'*') => self.double(TokenKind::Misc),
            b'*' => self.single(TokenKind::Asterisk),
            b'/' if self.at(1) == Some(b'/') => self.double(TokenKind::Misc),
            b'/' | b'&' | b'|' | b'^' => self.single(TokenKind::Misc),
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b'~' | b'!' => self.single(TokenKind::Not),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b',' => self.single(TokenKind::Comma),
            _ => self.bad_char(),
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn double(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 2;
        kind
    }

    fn lex_word(&mut self, region: ArgRegion) -> TokenKind {
        if self.at(1) == Some(b'#') {
            let prefix = match self.cur().to_ascii_uppercase() {
                b'S' => Some(TokenKind::LengthOf),
                b'X' => Some(TokenKind::BankPrefix),
                b'B' | b'W' => Some(TokenKind::AutoConst),
                _ => None,
            };
            if let Some(kind) = prefix {
                return self.double(kind);
            }
        }
        let start = self.pos;
        self.eat_while(is_word_byte);
        let word = &self.text[start..self.pos];
        if region == ArgRegion::Operands && is_register(word) {
            TokenKind::Register
        } else {
            TokenKind::Ident
        }
    }

    fn lex_float_argument(&mut self, b: u8) -> TokenKind {
        match b {
            b'+' => self.single(TokenKind::Plus),
            b'-' => self.single(TokenKind::Minus),
            b',' => self.single(TokenKind::Comma),
            b'0'..=b'9' => {
                self.eat_while(|b| b.is_ascii_digit());
                if self.at(0) == Some(b'.') && self.at(1).is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                    self.eat_while(|b| b.is_ascii_digit());
                }
                TokenKind::FloatNumber
            }
            _ => self.bad_char(),
        }
    }

    // -- Text literal region ------------------------------------

    fn lex_text(&mut self, quote: char, resume: ArgRegion) -> TokenKind {
        let q = quote as u8;
        if self.cur() == q && self.at(1) != Some(q) {
            self.pos += 1;
            self.state = LexState::Arguments(resume);
            return TokenKind::TextQuote;
        }
        while self.pos < self.bytes.len() && !is_eol_byte(self.cur()) {
            if self.cur() == q {
                if self.at(1) == Some(q) {
                    self.pos += 2;
                    continue;
                }
                break;
            }
            self.pos += 1;
        }
        TokenKind::Text
    }

    // -- Trailing comment / pragma ------------------------------

    fn lex_trailing(&mut self) -> TokenKind {
        let b = self.cur();
        if is_blank(b) {
            return self.whitespace();
        }
        if b == b';' && self.at(1) == Some(b':') {
            return self.comment_or_pragma();
        }
        self.eat_to_line_end();
        TokenKind::Comment
    }

    fn lex_preprocessor(&mut self) -> TokenKind {
        match self.cur() {
            b if is_blank(b) => self.whitespace(),
            b';' => self.comment_or_pragma(),
            b',' => self.single(TokenKind::PpSep),
            q @ (b'\'' | b'"') => {
                self.pos += 1;
                self.eat_while(|b| b != q && !is_eol_byte(b));
                if self.at(0) == Some(q) {
                    self.pos += 1;
                }
                self.eat_while(|b| !is_blank(b) && !is_eol_byte(b) && b != b',' && b != b';');
                TokenKind::PpArg
            }
            _ => {
                self.eat_while(|b| !is_blank(b) && !is_eol_byte(b) && b != b',' && b != b';');
                TokenKind::PpArg
            }
        }
    }

    fn lex_pragma(&mut self) -> TokenKind {
        match self.cur() {
            b if is_blank(b) => self.whitespace(),
            b';' => {
                self.eat_to_line_end();
                TokenKind::Comment
            }
            b if is_word_byte(b) => {
                self.eat_while(|b| is_word_byte(b) || b == b'-' || b == b'.');
                TokenKind::PgTerm
            }
            b'=' => self.single(TokenKind::PgEq),
            b',' => self.single(TokenKind::PgSep),
            b'+' => self.single(TokenKind::PgCycle),
            _ => self.bad_char(),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        let state = self.state;
        let eol = self.eol_len();
        let kind = if eol > 0 {
            self.pos += eol;
            self.line_start = self.pos;
            self.state = LexState::LineStart;
            TokenKind::Eol
        } else {
            self.dispatch()
        };
        debug_assert!(self.pos > start, "lexer made no progress in {:?}", state);
        let range = TextRange::new(start, self.pos);
        log::trace!("{:?} {} in {:?}", kind, range, state);
        Some(Token { kind, range, state })
    }
}
