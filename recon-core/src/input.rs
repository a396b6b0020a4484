//! Resumable codepoint cursors.
//!
//! An [`Input`] is a pull-based cursor over one chunk of a codepoint stream.
//! Parsers read it one codepoint at a time and never look further ahead than
//! [`Input::head`]. When a chunk runs dry the cursor reports itself *empty*
//! (more may come) or *done* (the stream ended), and the parser suspends or
//! finishes accordingly.
//!
//! ```text
//!            step()                  chunk exhausted, is_part()
//!   ┌──────┐ ─────▶ ┌──────┐ ─────────────────────────────────▶ ┌───────┐
//!   │ Cont │        │ Cont │                                     │ Empty │
//!   └──────┘        └──────┘ ──────┐                           └───────┘
//!                      │           │ chunk exhausted, !is_part()
//!        decode fault  │           ▼
//!        bad step/seek ▼       ┌──────┐
//!                  ┌───────┐   │ Done │
//!                  │ Error │   └──────┘
//!                  └───────┘
//! ```
//!
//! Refilling is the caller's job: build a new cursor over the next chunk
//! with [`StringInput::with_mark`] (or [`Utf8Input::with_mark`]) set to the
//! mark the previous cursor ended on, and feed the same parser again.

use thiserror::Error;

use crate::diagnostic::PreconditionViolation;
use crate::mark::Mark;

/// Observable cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    /// At least one codepoint is available.
    Cont,
    /// Nothing available yet, but the stream is not finished.
    Empty,
    /// Well-formed end of stream.
    Done,
    /// Unrecoverable; see [`Input::trap`].
    Error,
}

impl InputState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Cont => "cont",
            Self::Empty => "empty",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

/// How malformed UTF-8 is treated by byte-backed cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UtfErrorMode {
    /// A malformed sequence puts the cursor into the error state.
    #[default]
    Fatal,
    /// A malformed sequence reads as U+FFFD.
    Replacement,
}

/// Cursor configuration. Propagates unchanged through refilled cursors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InputSettings {
    pub utf_error_mode: UtfErrorMode,
}

impl InputSettings {
    pub fn with_utf_error_mode(mut self, mode: UtfErrorMode) -> Self {
        self.utf_error_mode = mode;
        self
    }
}

/// Why a cursor entered the error state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid step at {0}")]
    InvalidStep(Mark),
    #[error("invalid seek to {0}")]
    InvalidSeek(Mark),
    #[error("malformed UTF-8 at {0}")]
    Decode(Mark),
}

impl InputError {
    pub fn mark(&self) -> &Mark {
        match self {
            Self::InvalidStep(mark) | Self::InvalidSeek(mark) | Self::Decode(mark) => mark,
        }
    }
}

/// A resumable codepoint cursor.
pub trait Input {
    fn state(&self) -> InputState;

    #[inline]
    fn is_cont(&self) -> bool {
        self.state() == InputState::Cont
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.state() == InputState::Empty
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.state() == InputState::Done
    }

    #[inline]
    fn is_error(&self) -> bool {
        self.state() == InputState::Error
    }

    /// True when this chunk is not the last one.
    fn is_part(&self) -> bool;

    /// The current codepoint.
    ///
    /// # Panics
    ///
    /// When the cursor is not [`InputState::Cont`]. Combinators check
    /// `is_cont()` first; reaching this panic is a bug in the caller.
    fn head(&self) -> char;

    /// The current codepoint, if any.
    #[inline]
    fn peek(&self) -> Option<char> {
        if self.is_cont() {
            Some(self.head())
        } else {
            None
        }
    }

    /// Advance one codepoint. Stepping a cursor that is not continuable
    /// moves it to the error state.
    fn step(&mut self);

    /// Reposition to `mark` within the current chunk, or to the chunk start.
    fn seek(&mut self, mark: Option<&Mark>);

    fn mark(&self) -> &Mark;

    fn id(&self) -> Option<&str>;

    fn settings(&self) -> &InputSettings;

    fn trap(&self) -> Option<&InputError>;
}

#[cold]
fn violated(operation: &'static str, state: InputState) -> ! {
    panic!("{}", PreconditionViolation::new(operation, state.name()))
}

// =============================================================================
// StringInput
// =============================================================================

/// Cursor over an owned text chunk.
#[derive(Debug, Clone)]
pub struct StringInput {
    string: String,
    index: usize,
    mark: Mark,
    base: Mark,
    id: Option<String>,
    settings: InputSettings,
    part: bool,
    trap: Option<InputError>,
}

impl StringInput {
    pub fn new(string: impl Into<String>) -> Self {
        Self {
            string: string.into(),
            index: 0,
            mark: Mark::START,
            base: Mark::START,
            id: None,
            settings: InputSettings::default(),
            part: false,
            trap: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Position of the first codepoint of this chunk.
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.base = mark.clone();
        self.mark = mark;
        self
    }

    pub fn with_settings(mut self, settings: InputSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Mark this chunk as one of several; exhausting it reports empty
    /// instead of done.
    pub fn as_part(mut self, part: bool) -> Self {
        self.part = part;
        self
    }

    /// Unconsumed text of this chunk.
    pub fn remaining(&self) -> &str {
        &self.string[self.index..]
    }
}

impl Input for StringInput {
    fn state(&self) -> InputState {
        if self.trap.is_some() {
            InputState::Error
        } else if self.index < self.string.len() {
            InputState::Cont
        } else if self.part {
            InputState::Empty
        } else {
            InputState::Done
        }
    }

    #[inline]
    fn is_part(&self) -> bool {
        self.part
    }

    #[inline]
    fn head(&self) -> char {
        match self.string[self.index..].chars().next() {
            Some(c) if self.trap.is_none() => c,
            _ => violated("head", self.state()),
        }
    }

    fn step(&mut self) {
        match self.peek() {
            Some(c) => {
                self.index += c.len_utf8();
                self.mark.advance_in_place(c);
            }
            None => {
                if self.trap.is_none() {
                    self.trap = Some(InputError::InvalidStep(self.mark.clone()));
                }
            }
        }
    }

    fn seek(&mut self, mark: Option<&Mark>) {
        self.index = 0;
        self.mark = self.base.clone();
        self.trap = None;
        if let Some(target) = mark {
            while self.mark.offset < target.offset && self.is_cont() {
                self.step();
            }
            if self.mark.offset == target.offset {
                self.mark = target.clone();
            } else {
                self.trap = Some(InputError::InvalidSeek(target.clone()));
            }
        }
    }

    #[inline]
    fn mark(&self) -> &Mark {
        &self.mark
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn settings(&self) -> &InputSettings {
        &self.settings
    }

    fn trap(&self) -> Option<&InputError> {
        self.trap.as_ref()
    }
}

// =============================================================================
// Utf8Input
// =============================================================================

/// Decoded head of a byte cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Decoded {
    Char(char, usize),
    /// Valid prefix of a sequence cut off by the end of a part chunk.
    Incomplete,
    End,
}

/// Cursor over a borrowed UTF-8 byte chunk.
///
/// A multi-byte sequence split across chunks leaves the cursor empty with the
/// partial bytes still in [`Utf8Input::remaining`]; the caller prepends them
/// to the next chunk.
#[derive(Debug, Clone)]
pub struct Utf8Input<'a> {
    bytes: &'a [u8],
    index: usize,
    head: Decoded,
    mark: Mark,
    base: Mark,
    id: Option<String>,
    settings: InputSettings,
    part: bool,
    trap: Option<InputError>,
}

impl<'a> Utf8Input<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let mut input = Self {
            bytes,
            index: 0,
            head: Decoded::End,
            mark: Mark::START,
            base: Mark::START,
            id: None,
            settings: InputSettings::default(),
            part: false,
            trap: None,
        };
        input.decode();
        input
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.base = mark.clone();
        self.mark = mark;
        self
    }

    pub fn with_settings(mut self, settings: InputSettings) -> Self {
        self.settings = settings;
        self.trap = None;
        self.decode();
        self
    }

    pub fn as_part(mut self, part: bool) -> Self {
        self.part = part;
        self.trap = None;
        self.decode();
        self
    }

    /// Bytes not yet consumed, including any incomplete trailing sequence.
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.index..]
    }

    fn decode(&mut self) {
        let rest = &self.bytes[self.index..];
        if rest.is_empty() {
            self.head = Decoded::End;
            return;
        }
        let window = &rest[..rest.len().min(4)];
        let (c, width) = match std::str::from_utf8(window) {
            Ok(s) => first_char(s),
            Err(e) if e.valid_up_to() > 0 => {
                // The window holds at least one complete codepoint.
                match std::str::from_utf8(&window[..e.valid_up_to()]) {
                    Ok(s) => first_char(s),
                    Err(_) => (None, 0),
                }
            }
            Err(e) => match e.error_len() {
                None if self.part => {
                    self.head = Decoded::Incomplete;
                    return;
                }
                None => (None, rest.len()),
                Some(len) => (None, len),
            },
        };
        match c {
            Some(c) => self.head = Decoded::Char(c, width),
            None => match self.settings.utf_error_mode {
                UtfErrorMode::Replacement => {
                    self.head = Decoded::Char(char::REPLACEMENT_CHARACTER, width.max(1))
                }
                UtfErrorMode::Fatal => {
                    self.head = Decoded::End;
                    self.trap = Some(InputError::Decode(self.mark.clone()));
                }
            },
        }
    }
}

fn first_char(s: &str) -> (Option<char>, usize) {
    match s.chars().next() {
        Some(c) => (Some(c), c.len_utf8()),
        None => (None, 0),
    }
}

impl Input for Utf8Input<'_> {
    fn state(&self) -> InputState {
        if self.trap.is_some() {
            return InputState::Error;
        }
        match self.head {
            Decoded::Char(..) => InputState::Cont,
            Decoded::Incomplete => InputState::Empty,
            Decoded::End if self.part => InputState::Empty,
            Decoded::End => InputState::Done,
        }
    }

    #[inline]
    fn is_part(&self) -> bool {
        self.part
    }

    #[inline]
    fn head(&self) -> char {
        match self.head {
            Decoded::Char(c, _) if self.trap.is_none() => c,
            _ => violated("head", self.state()),
        }
    }

    fn step(&mut self) {
        match self.head {
            Decoded::Char(c, width) if self.trap.is_none() => {
                self.index += width;
                self.mark.advance_in_place(c);
                self.decode();
            }
            _ => {
                if self.trap.is_none() {
                    self.trap = Some(InputError::InvalidStep(self.mark.clone()));
                }
            }
        }
    }

    fn seek(&mut self, mark: Option<&Mark>) {
        self.index = 0;
        self.mark = self.base.clone();
        self.trap = None;
        self.decode();
        if let Some(target) = mark {
            while self.mark.offset < target.offset && self.is_cont() {
                self.step();
            }
            if self.mark.offset == target.offset && !self.is_error() {
                self.mark = target.clone();
            } else {
                self.trap = Some(InputError::InvalidSeek(target.clone()));
            }
        }
    }

    #[inline]
    fn mark(&self) -> &Mark {
        &self.mark
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn settings(&self) -> &InputSettings {
        &self.settings
    }

    fn trap(&self) -> Option<&InputError> {
        self.trap.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(input: &mut dyn Input) -> String {
        let mut out = String::new();
        while let Some(c) = input.peek() {
            out.push(c);
            input.step();
        }
        out
    }

    #[test]
    fn test_string_input_states() {
        let mut input = StringInput::new("ab");
        assert!(input.is_cont());
        assert_eq!(input.head(), 'a');
        input.step();
        input.step();
        assert!(input.is_done());

        let input = StringInput::new("").as_part(true);
        assert!(input.is_empty());
    }

    #[test]
    fn test_step_past_end_is_error() {
        let mut input = StringInput::new("x");
        input.step();
        input.step();
        assert!(input.is_error());
        assert!(matches!(input.trap(), Some(InputError::InvalidStep(_))));
        // Terminal: further steps stay in error.
        input.step();
        assert!(input.is_error());
    }

    #[test]
    #[should_panic(expected = "precondition violated")]
    fn test_head_on_done_panics() {
        let input = StringInput::new("");
        input.head();
    }

    #[test]
    fn test_marks_follow_lines() {
        let mut input = StringInput::new("a\nbc");
        drain(&mut input);
        assert_eq!(input.mark(), &Mark::at(4, 2, 3));
    }

    #[test]
    fn test_refill_keeps_mark() {
        let mut first = StringInput::new("a\n").as_part(true);
        drain(&mut first);
        let mut second = StringInput::new("b").with_mark(first.mark().clone());
        second.step();
        assert_eq!(second.mark(), &Mark::at(3, 2, 2));
    }

    #[test]
    fn test_seek() {
        let mut input = StringInput::new("hello");
        input.step();
        input.step();
        let mark = input.mark().clone();
        drain(&mut input);
        input.seek(Some(&mark));
        assert_eq!(input.head(), 'l');
        input.seek(None);
        assert_eq!(input.head(), 'h');
        input.seek(Some(&Mark::at(99, 1, 100)));
        assert!(matches!(input.trap(), Some(InputError::InvalidSeek(_))));
    }

    #[test]
    fn test_utf8_input_decodes() {
        let mut input = Utf8Input::new("añ€😀".as_bytes());
        assert_eq!(drain(&mut input), "añ€😀");
        assert!(input.is_done());
        assert_eq!(input.mark().offset, 4);
    }

    #[test]
    fn test_utf8_split_sequence_is_empty() {
        let bytes = "x€".as_bytes();
        let mut input = Utf8Input::new(&bytes[..2]).as_part(true);
        assert_eq!(drain(&mut input), "x");
        assert!(input.is_empty());
        assert_eq!(input.remaining(), &bytes[1..2]);
    }

    #[test]
    fn test_utf8_truncated_final_chunk_is_error() {
        let bytes = "x€".as_bytes();
        let mut input = Utf8Input::new(&bytes[..2]);
        input.step();
        assert!(input.is_error());
        assert!(matches!(input.trap(), Some(InputError::Decode(_))));
    }

    #[test]
    fn test_utf8_replacement_mode() {
        let settings = InputSettings::default().with_utf_error_mode(UtfErrorMode::Replacement);
        let mut input = Utf8Input::new(b"a\xffb").with_settings(settings);
        assert_eq!(drain(&mut input), "a\u{FFFD}b");
    }

    #[test]
    fn test_utf8_fatal_mode() {
        let mut input = Utf8Input::new(b"a\xffb");
        input.step();
        assert!(input.is_error());
        assert_eq!(input.trap().map(|e| e.mark().offset), Some(1));
    }
}
