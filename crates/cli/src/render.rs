//! Text and JSON renderings of tokens and diagnostics.

use tms99_core::{LineIndex, SyntaxError, Token};

/// `start..end  Kind  State  "text"`
pub(crate) fn token_line(token: &Token, src: &str) -> String {
    format!(
        "{:<10} {:<28} {:<30} {:?}",
        token.range.to_string(),
        format!("{:?}", token.kind),
        format!("{:?}", token.state),
        token.text(src)
    )
}

pub(crate) fn token_json(token: &Token, src: &str) -> serde_json::Value {
    serde_json::json!({
        "kind":  token.kind,
        "state": token.state,
        "range": [token.range.start, token.range.end],
        "text":  token.text(src),
    })
}

/// `file:line:col: kind: message`
pub(crate) fn diagnostic_line(file: &str, err: &SyntaxError, lines: &LineIndex<'_>) -> String {
    let (line, col) = lines.line_col(err.range.start);
    format!("{}:{}:{}: {}: {}", file, line, col, err.kind, err.message)
}
