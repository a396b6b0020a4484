//! Resumable output sinks.
//!
//! [`Output`] is the dual of [`crate::input::Input`]: writers push one
//! codepoint at a time and stop as soon as the sink is no longer
//! continuable. A *full* sink is backpressure; the writer suspends and is
//! pulled again once the caller has drained the sink. A *done* sink was
//! closed by its owner, and writing to it is an error rather than a silent
//! drop.

use thiserror::Error;

/// Observable sink state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Cont,
    /// No room until the caller drains the sink.
    Full,
    /// Closed by its owner.
    Done,
    Error,
}

/// Sink configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    /// Written by [`Output::writeln`].
    pub line_separator: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            line_separator: "\n".to_string(),
        }
    }
}

impl OutputSettings {
    pub fn with_line_separator(mut self, separator: impl Into<String>) -> Self {
        self.line_separator = separator.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    #[error("write to a full output")]
    Overflow,
    #[error("write to a closed output")]
    Closed,
}

/// A resumable codepoint sink.
pub trait Output {
    fn state(&self) -> OutputState;

    #[inline]
    fn is_cont(&self) -> bool {
        self.state() == OutputState::Cont
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.state() == OutputState::Full
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.state() == OutputState::Done
    }

    #[inline]
    fn is_error(&self) -> bool {
        self.state() == OutputState::Error
    }

    /// Write one codepoint. Writing to a sink that is not continuable moves
    /// it to the error state.
    fn write(&mut self, c: char);

    fn write_str(&mut self, s: &str) {
        for c in s.chars() {
            self.write(c);
        }
    }

    /// Write `line` (if any) followed by the configured line separator.
    fn writeln(&mut self, line: Option<&str>) {
        if let Some(line) = line {
            self.write_str(line);
        }
        let separator = self.settings().line_separator.clone();
        self.write_str(&separator);
    }

    fn settings(&self) -> &OutputSettings;

    fn trap(&self) -> Option<&OutputError>;
}

// =============================================================================
// StringOutput
// =============================================================================

/// Unbounded in-memory text sink. Never full.
#[derive(Debug, Clone, Default)]
pub struct StringOutput {
    string: String,
    settings: OutputSettings,
    closed: bool,
    trap: Option<OutputError>,
}

impl StringOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            string: String::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn with_settings(mut self, settings: OutputSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.string
    }

    /// The accumulated text.
    pub fn bind(self) -> String {
        self.string
    }
}

impl Output for StringOutput {
    fn state(&self) -> OutputState {
        if self.trap.is_some() {
            OutputState::Error
        } else if self.closed {
            OutputState::Done
        } else {
            OutputState::Cont
        }
    }

    #[inline]
    fn write(&mut self, c: char) {
        match self.state() {
            OutputState::Cont => self.string.push(c),
            OutputState::Done => self.trap = Some(OutputError::Closed),
            OutputState::Full | OutputState::Error => {}
        }
    }

    fn write_str(&mut self, s: &str) {
        match self.state() {
            OutputState::Cont => self.string.push_str(s),
            OutputState::Done => self.trap = Some(OutputError::Closed),
            OutputState::Full | OutputState::Error => {}
        }
    }

    fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    fn trap(&self) -> Option<&OutputError> {
        self.trap.as_ref()
    }
}

// =============================================================================
// OutputBuffer
// =============================================================================

/// Fixed-capacity UTF-8 byte sink.
///
/// A codepoint that does not fit in the remaining room is split: the bytes
/// that fit are buffered, the rest are held back and the sink reports full.
/// [`OutputBuffer::drain`] hands the filled bytes to the caller and admits
/// the held-back tail, so no byte is ever dropped.
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    buf: Vec<u8>,
    pending: Vec<u8>,
    capacity: usize,
    settings: OutputSettings,
    closed: bool,
    trap: Option<OutputError>,
}

impl OutputBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: Vec::with_capacity(capacity),
            pending: Vec::new(),
            capacity,
            settings: OutputSettings::default(),
            closed: false,
            trap: None,
        }
    }

    pub fn with_settings(mut self, settings: OutputSettings) -> Self {
        self.settings = settings;
        self
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently buffered.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Take the buffered bytes and make room for more writes.
    pub fn drain(&mut self) -> Vec<u8> {
        let drained = std::mem::replace(&mut self.buf, Vec::with_capacity(self.capacity));
        let take = self.pending.len().min(self.capacity);
        self.buf.extend(self.pending.drain(..take));
        drained
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Everything written, including a held-back tail.
    pub fn bind(mut self) -> Vec<u8> {
        self.buf.append(&mut self.pending);
        self.buf
    }
}

impl Output for OutputBuffer {
    fn state(&self) -> OutputState {
        if self.trap.is_some() {
            OutputState::Error
        } else if self.closed {
            OutputState::Done
        } else if self.buf.len() >= self.capacity || !self.pending.is_empty() {
            OutputState::Full
        } else {
            OutputState::Cont
        }
    }

    fn write(&mut self, c: char) {
        match self.state() {
            OutputState::Cont => {
                let mut scratch = [0u8; 4];
                let bytes = c.encode_utf8(&mut scratch).as_bytes();
                let room = self.capacity - self.buf.len();
                if bytes.len() <= room {
                    self.buf.extend_from_slice(bytes);
                } else {
                    self.buf.extend_from_slice(&bytes[..room]);
                    self.pending.extend_from_slice(&bytes[room..]);
                }
            }
            OutputState::Full => self.trap = Some(OutputError::Overflow),
            OutputState::Done => self.trap = Some(OutputError::Closed),
            OutputState::Error => {}
        }
    }

    fn settings(&self) -> &OutputSettings {
        &self.settings
    }

    fn trap(&self) -> Option<&OutputError> {
        self.trap.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_output() {
        let mut output = StringOutput::new();
        output.write('a');
        output.write_str("bc");
        output.writeln(Some("!"));
        assert_eq!(output.clone().bind(), "abc!\n");
        output.close();
        assert!(output.is_done());
        output.write('x');
        assert_eq!(output.trap(), Some(&OutputError::Closed));
        assert!(output.is_error());
    }

    #[test]
    fn test_line_separator_setting() {
        let mut output =
            StringOutput::new().with_settings(OutputSettings::default().with_line_separator("\r\n"));
        output.writeln(None);
        assert_eq!(output.as_str(), "\r\n");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = StringOutput::new();
        a.write_str("x");
        let mut b = a.clone();
        b.write_str("y");
        assert_eq!(a.as_str(), "x");
        assert_eq!(b.as_str(), "xy");
    }

    #[test]
    fn test_buffer_fills_and_drains() {
        let mut output = OutputBuffer::new(2);
        output.write('a');
        output.write('b');
        assert!(output.is_full());
        assert_eq!(output.drain(), b"ab");
        assert!(output.is_cont());
    }

    #[test]
    fn test_buffer_overflow_is_error() {
        let mut output = OutputBuffer::new(1);
        output.write('a');
        output.write('b');
        assert_eq!(output.trap(), Some(&OutputError::Overflow));
    }

    #[test]
    fn test_buffer_splits_codepoints() {
        let mut output = OutputBuffer::new(2);
        output.write('a');
        output.write('€');
        assert!(output.is_full());
        let mut bytes = output.drain();
        assert!(output.is_full());
        bytes.extend(output.drain());
        assert!(output.is_cont());
        bytes.extend(output.bind());
        assert_eq!(String::from_utf8(bytes).as_deref(), Ok("a€"));
    }
}
