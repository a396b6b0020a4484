//! Chunk-fed document parsing.
//!
//! Text usually arrives in pieces: socket reads, file blocks, editor
//! buffers. [`StreamingParser`] feeds each piece to one suspended document
//! parser, carrying the source position and any UTF-8 sequence split
//! across byte chunks from one call to the next.
//!
//! ```text
//! Chunks            StreamingParser                 Parser tree
//!   │                     │                              │
//!   │──feed(chunk)───────▶│──Input (part, mark)─────────▶│
//!   │                     │◀─────────Cont / Done / Error─│
//!   │──finish()──────────▶│──Input (final)──────────────▶│
//!   │◀──Result<Value>─────│                              │
//! ```

use std::borrow::Cow;

use tracing::{debug, trace, warn};

use crate::diagnostic::Diagnostic;
use crate::input::{Input, InputSettings, StringInput, Utf8Input};
use crate::mark::Mark;
use crate::model::Value;
use crate::parser::{Parser, ReconParser};

/// Result of a feed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedResult {
    /// Bytes of the chunk taken by the parser. Less than the chunk length
    /// only when the document ended in an error inside this chunk.
    pub bytes_consumed: usize,
    /// Whether the parse has reached its outcome; further feeds are ignored.
    pub done: bool,
}

/// Incremental document parser over `&str` or `&[u8]` chunks.
pub struct StreamingParser {
    recon: ReconParser,
    /// Suspended document parser; `None` before the first chunk.
    parser: Option<Parser<Value>>,
    outcome: Option<Result<Value, Diagnostic>>,
    mark: Mark,
    id: Option<String>,
    settings: InputSettings,
    /// Incomplete UTF-8 sequence left over from the last byte chunk.
    tail: Vec<u8>,
    chunks: u64,
}

impl Default for StreamingParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingParser {
    pub fn new() -> Self {
        Self {
            recon: ReconParser,
            parser: None,
            outcome: None,
            mark: Mark::START,
            id: None,
            settings: InputSettings::default(),
            tail: Vec::new(),
            chunks: 0,
        }
    }

    /// Source name reported in diagnostics.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_settings(mut self, settings: InputSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Position just past the last codepoint parsed.
    pub fn mark(&self) -> &Mark {
        &self.mark
    }

    pub fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    /// Feed a text chunk.
    pub fn feed(&mut self, chunk: &str) -> FeedResult {
        if !self.tail.is_empty() {
            // A split sequence from `feed_bytes` completes here.
            return self.feed_bytes(chunk.as_bytes());
        }
        if self.outcome.is_some() {
            return FeedResult { bytes_consumed: 0, done: true };
        }
        let mut input = StringInput::new(chunk)
            .with_mark(self.mark.clone())
            .with_settings(self.settings.clone())
            .as_part(true);
        if let Some(id) = &self.id {
            input = input.with_id(id.clone());
        }
        let done = self.advance(&mut input, chunk.len());
        FeedResult {
            bytes_consumed: chunk.len() - input.remaining().len(),
            done,
        }
    }

    /// Feed a chunk of UTF-8 bytes. A codepoint split at the end of the
    /// chunk is held back until the next one.
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> FeedResult {
        if self.outcome.is_some() {
            return FeedResult { bytes_consumed: 0, done: true };
        }
        let held = self.tail.len();
        let bytes: Cow<'_, [u8]> = if held == 0 {
            Cow::Borrowed(chunk)
        } else {
            let mut joined = std::mem::take(&mut self.tail);
            joined.extend_from_slice(chunk);
            Cow::Owned(joined)
        };
        let mut input = Utf8Input::new(&bytes)
            .with_mark(self.mark.clone())
            .with_settings(self.settings.clone())
            .as_part(true);
        if let Some(id) = &self.id {
            input = input.with_id(id.clone());
        }
        let done = self.advance(&mut input, chunk.len());
        let remaining = input.remaining();
        if done {
            let taken = bytes.len() - remaining.len();
            FeedResult {
                bytes_consumed: taken.saturating_sub(held),
                done,
            }
        } else {
            self.tail = remaining.to_vec();
            FeedResult {
                bytes_consumed: chunk.len(),
                done,
            }
        }
    }

    /// End of input: settle the document.
    pub fn finish(mut self) -> Result<Value, Diagnostic> {
        if let Some(outcome) = self.outcome.take() {
            return outcome;
        }
        let tail = std::mem::take(&mut self.tail);
        let mut input = Utf8Input::new(&tail)
            .with_mark(self.mark.clone())
            .with_settings(self.settings.clone());
        if let Some(id) = &self.id {
            input = input.with_id(id.clone());
        }
        self.advance(&mut input, tail.len());
        match self.outcome.take() {
            Some(outcome) => outcome,
            // A parser fed a finished cursor always settles.
            None => Err(Diagnostic::at(self.mark.clone(), "unexpected end of input")),
        }
    }

    /// Run the document parser over `input`; true once it has an outcome.
    fn advance(&mut self, input: &mut dyn Input, len: usize) -> bool {
        self.chunks += 1;
        trace!(chunk = self.chunks, bytes = len, offset = self.mark.offset, "feeding chunk");
        let recon = self.recon;
        let parser = Parser::resume(self.parser.take(), input, |input| recon.parse_document(input));
        self.mark = input.mark().clone();
        match parser {
            Parser::Done(value) => {
                debug!(chunks = self.chunks, offset = self.mark.offset, "document complete");
                self.outcome = Some(Ok(value));
                true
            }
            Parser::Error(diagnostic) => {
                warn!(%diagnostic, "streaming parse failed");
                self.outcome = Some(Err(diagnostic));
                true
            }
            cont => {
                self.parser = Some(cont);
                false
            }
        }
    }
}
