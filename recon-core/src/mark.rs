//! Source positions.
//!
//! A [`Mark`] is an immutable snapshot of where a cursor stands: the
//! codepoint offset from the start of the stream plus 1-based line and
//! column. Marks survive chunk boundaries, so a streaming parse reports the
//! same positions as a whole-document parse.

use std::fmt;

/// Immutable source position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mark {
    /// Codepoints consumed since the start of the stream.
    pub offset: u64,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, counted in codepoints.
    pub column: u32,
    /// Optional annotation carried into diagnostics.
    pub note: Option<String>,
}

impl Mark {
    /// Position of the first codepoint of a stream.
    pub const START: Mark = Mark {
        offset: 0,
        line: 1,
        column: 1,
        note: None,
    };

    pub fn at(offset: u64, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
            note: None,
        }
    }

    /// Copy of this mark carrying `note`.
    pub fn with_note(&self, note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..self.clone()
        }
    }

    /// The mark after stepping over `c`.
    #[inline]
    pub fn advance(&self, c: char) -> Self {
        let mut next = self.clone();
        next.advance_in_place(c);
        next
    }

    #[inline]
    pub(crate) fn advance_in_place(&mut self, c: char) {
        self.offset += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Mark {
    fn default() -> Self {
        Mark::START
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)?;
        if let Some(note) = &self.note {
            write!(f, " ({})", note)?;
        }
        Ok(())
    }
}
