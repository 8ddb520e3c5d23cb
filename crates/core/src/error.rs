use serde::Serialize;

use crate::lexer::TextRange;
use crate::tree::NodeId;

/// Category of a syntax diagnostic. There are no severities at this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A character no lexical region accepts.
    Lexical,
    /// No statement alternative matched, or tokens were left over on a line.
    Syntax,
    /// A mandatory separator or keyword was consumed but what follows is
    /// missing or malformed.
    PinFailure,
    /// Expression nesting exceeded the configured depth.
    RecursionLimit,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::PinFailure => "pin failure",
            ErrorKind::RecursionLimit => "recursion limit",
        };
        f.write_str(s)
    }
}

/// A diagnostic produced while building the tree. The tree is still
/// complete; errors only describe where it is malformed.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SyntaxError {
    pub kind: ErrorKind,
    pub range: TextRange,
    pub message: String,
    /// The partial node the error belongs to, when one was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
}

impl SyntaxError {
    pub fn new(kind: ErrorKind, range: TextRange, message: impl Into<String>) -> Self {
        SyntaxError {
            kind,
            range,
            message: message.into(),
            node: None,
        }
    }

    pub fn lexical(range: TextRange, message: impl Into<String>) -> Self {
        SyntaxError::new(ErrorKind::Lexical, range, message)
    }

    pub fn syntax(range: TextRange, message: impl Into<String>) -> Self {
        SyntaxError::new(ErrorKind::Syntax, range, message)
    }

    pub fn pin(range: TextRange, message: impl Into<String>) -> Self {
        SyntaxError::new(ErrorKind::PinFailure, range, message)
    }

    /// JSON form used by the CLI. Always includes every field.
    pub fn to_json_value(&self, lines: &LineIndex<'_>) -> serde_json::Value {
        let (line, col) = lines.line_col(self.range.start);
        serde_json::json!({
            "kind":    self.kind,
            "start":   self.range.start,
            "end":     self.range.end,
            "line":    line,
            "column":  col,
            "message": self.message,
        })
    }
}

/// Line start offsets of a source text, for turning byte offsets into
/// 1-based line and column numbers. Breaks lines at `\n`, `\r\n` and a
/// lone `\r`, the same terminators the lexer recognizes.
#[derive(Debug, Clone)]
pub struct LineIndex<'t> {
    text: &'t str,
    starts: Vec<usize>,
}

impl<'t> LineIndex<'t> {
    pub fn new(text: &'t str) -> Self {
        let bytes = text.as_bytes();
        let mut starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 2;
                    starts.push(i);
                }
                b'\r' | b'\n' => {
                    i += 1;
                    starts.push(i);
                }
                _ => i += 1,
            }
        }
        LineIndex { text, starts }
    }

    /// 1-based line and column of a byte offset. Columns count characters.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.text.len());
        let line = self.starts.partition_point(|&s| s <= offset);
        let start = self.starts[line - 1];
        let col = self.text[start..offset].chars().count() + 1;
        (line as u32, col as u32)
    }
}

/// Failures while loading a dialect configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read dialect file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid dialect file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unknown cpu '{0}' (expected one of tms9900, tms9995, tms99105, tms99110)")]
    UnknownCpu(String),

    #[error("unknown extension '{0}' (expected one of f18a, gpl-move)")]
    UnknownExtension(String),

    #[error("max_depth must be between 1 and {max}, got {value}")]
    DepthOutOfRange { value: usize, max: usize },
}
