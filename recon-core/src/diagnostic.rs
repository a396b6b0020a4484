//! Parse diagnostics.
//!
//! Malformed input never panics: every combinator that cannot continue
//! ends in `Parser::Error(Diagnostic)`, carrying the mark where the problem
//! was noticed and a short expectation message.

use memchr::memchr_iter;
use thiserror::Error;

use crate::input::{Input, InputState};
use crate::mark::Mark;

/// A structured parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{}: {}", source_prefix(.id), .mark, .message)]
pub struct Diagnostic {
    pub mark: Mark,
    pub message: String,
    /// Source name of the cursor the error was found on.
    pub id: Option<String>,
}

fn source_prefix(id: &Option<String>) -> String {
    match id {
        Some(id) => format!("{}:", id),
        None => String::new(),
    }
}

/// A caller broke a state precondition (e.g. `head()` on an empty cursor).
///
/// Only ever used as a panic message; it indicates a bug in the calling
/// combinator, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("precondition violated: {operation} on {state} state")]
pub struct PreconditionViolation {
    pub operation: &'static str,
    pub state: &'static str,
}

impl PreconditionViolation {
    pub fn new(operation: &'static str, state: &'static str) -> Self {
        Self { operation, state }
    }
}

impl Diagnostic {
    pub fn at(mark: Mark, message: impl Into<String>) -> Self {
        Self {
            mark,
            message: message.into(),
            id: None,
        }
    }

    fn from_input(input: &dyn Input, message: String) -> Self {
        Self {
            mark: input.mark().clone(),
            message,
            id: input.id().map(str::to_owned),
        }
    }

    /// `expected <what>, but found <head>`
    pub fn expected(what: &str, input: &dyn Input) -> Self {
        let message = format!("expected {}, but found {}", what, found(input));
        Self::from_input(input, message)
    }

    /// `unexpected <head>`
    pub fn unexpected(input: &dyn Input) -> Self {
        let message = format!("unexpected {}", found(input));
        Self::from_input(input, message)
    }

    /// A free-form message at the current mark.
    pub fn message(message: impl Into<String>, input: &dyn Input) -> Self {
        Self::from_input(input, message.into())
    }

    /// The cursor's own error, surfaced at the parser boundary.
    pub fn trap(input: &dyn Input) -> Self {
        match input.trap() {
            Some(error) => Self {
                mark: error.mark().clone(),
                message: error.to_string(),
                id: input.id().map(str::to_owned),
            },
            None => Self::unexpected(input),
        }
    }

    /// Render the offending line of `source` with a caret under the column.
    ///
    /// `source` must be the whole document the mark refers to.
    pub fn render(&self, source: &str) -> String {
        let line_index = self.mark.line.saturating_sub(1) as usize;
        let start = if line_index == 0 {
            0
        } else {
            match memchr_iter(b'\n', source.as_bytes()).nth(line_index - 1) {
                Some(newline) => newline + 1,
                None => source.len(),
            }
        };
        let rest = &source[start..];
        let end = memchr::memchr(b'\n', rest.as_bytes()).unwrap_or(rest.len());
        let text = rest[..end].trim_end_matches('\r');

        let gutter = self.mark.line.to_string();
        let pad = " ".repeat(gutter.len());
        let caret = " ".repeat(self.mark.column.saturating_sub(1) as usize);
        format!("{}\n{} |\n{} | {}\n{} | {}^", self, pad, gutter, text, pad, caret)
    }
}

fn found(input: &dyn Input) -> String {
    match input.state() {
        InputState::Cont => format!("'{}'", input.head().escape_debug()),
        InputState::Empty | InputState::Done => "end of input".to_string(),
        InputState::Error => match input.trap() {
            Some(error) => error.to_string(),
            None => "error".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::StringInput;

    #[test]
    fn test_expected_message() {
        let input = StringInput::new("x").with_id("doc.recon");
        let d = Diagnostic::expected("'@'", &input);
        assert_eq!(d.message, "expected '@', but found 'x'");
        assert_eq!(d.to_string(), "doc.recon:1:1: expected '@', but found 'x'");

        let input = StringInput::new("");
        let d = Diagnostic::expected("'}'", &input);
        assert_eq!(d.message, "expected '}', but found end of input");
    }

    #[test]
    fn test_unexpected_escapes() {
        let input = StringInput::new("\n");
        assert_eq!(Diagnostic::unexpected(&input).message, "unexpected '\\n'");
    }

    #[test]
    fn test_render_points_at_column() {
        let source = "{a:1}\n{b:@}\n";
        let d = Diagnostic::at(Mark::at(10, 2, 5), "expected value");
        let rendered = d.render(source);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "2:5: expected value");
        assert_eq!(lines[2], "2 | {b:@}");
        assert_eq!(lines[3], "  |     ^");
    }
}
