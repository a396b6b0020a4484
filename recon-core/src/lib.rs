//! Recon Core Parser and Writer
//!
//! Resumable, non-blocking parser and writer for Recon, a structured data
//! notation with attributes, markup, selectors and operator expressions.
//! Parsers suspend when their input runs dry and resume exactly where they
//! stopped; writers suspend when their output fills up.
//!
//! # Architecture
//!
//! - **mark.rs** - Stream positions (offset, line, column)
//! - **input.rs** - Pull-based codepoint cursors over text and UTF-8 chunks
//! - **output.rs** - Codepoint sinks with backpressure
//! - **diagnostic.rs** - Parse errors with rendered source context
//! - **chars.rs** - Character classes and lookup tables
//! - **model/** - Values, records, selectors and builders
//! - **parser/** - One resumable combinator per grammar production
//! - **writer/** - One resumable writer per production, with exact sizes
//! - **streaming.rs** - Chunk-fed document parsing
//! - **recon.rs** - One-call `parse` / `to_string` helpers

pub mod chars;
pub mod diagnostic;
pub mod input;
pub mod mark;
pub mod model;
pub mod output;
pub mod parser;
pub mod recon;
pub mod streaming;
pub mod writer;

pub use diagnostic::{Diagnostic, PreconditionViolation};
pub use input::{Input, InputError, InputSettings, InputState, StringInput, Utf8Input, UtfErrorMode};
pub use mark::Mark;
pub use model::{Attr, BinaryOp, Builder, Item, Num, Record, RecordBuilder, Selector, Slot, UnaryOp, Value, ValueBuilder};
pub use output::{Output, OutputBuffer, OutputError, OutputSettings, OutputState, StringOutput};
pub use parser::{Feed, Level, Parser, ReconParser};
pub use streaming::{FeedResult, StreamingParser};
pub use writer::{Pull, ReconWriter, Writer, WriterError};
