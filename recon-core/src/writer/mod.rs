//! Resumable Recon writers.
//!
//! The mirror image of [`crate::parser`]: every production has a writer
//! struct that borrows the value being written, remembers how far it got
//! (`step`, plus an `index` into the token in flight) and holds at most one
//! sub-writer. When the output fills up, the writer returns
//! `Writer::Cont(self)`; pulling it again after the sink drains continues
//! with the very next character.
//!
//! Every writer also has a pure `size_of` that predicts, in UTF-8 bytes,
//! exactly what its `write` emits. Output buffers can be sized up front.
//!
//! The text produced is canonical: it re-parses to an equal value, with
//! operators parenthesized only where precedence demands it.

/// Write `$token`; on a full output return `$suspend`.
macro_rules! token {
    ($output:ident, $index:ident, $token:expr, $suspend:expr) => {
        match $crate::writer::write_token($output, $token, &mut $index) {
            $crate::writer::Emit::Done => {}
            $crate::writer::Emit::Full => return $suspend,
            $crate::writer::Emit::Fail(error) => return $crate::writer::Writer::Error(error),
        }
    };
}

/// Drive the sub-writer in `$part` (or start one with `$start`) to the end;
/// on a full output park it in `$part` and return `$suspend`.
macro_rules! nested {
    ($output:ident, $part:ident, $start:expr, $suspend:expr) => {
        match $crate::writer::Writer::resume($part.take(), $output, $start) {
            $crate::writer::Writer::Done => {}
            $crate::writer::Writer::Error(error) => return $crate::writer::Writer::Error(error),
            cont => {
                $part = Some(cont);
                return $suspend;
            }
        }
    };
}

mod literal;
mod operator;
mod record;
mod selector;

use std::fmt;

use thiserror::Error;

use crate::model::{Item, Record, Value};
use crate::output::{Output, OutputError, OutputState};
use crate::parser::Level;

pub use literal::format_num;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriterError {
    /// The output was closed before the value was fully written.
    #[error("output closed before the value was fully written")]
    Truncated,
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// A write in progress, or its outcome.
pub enum Writer<'a> {
    /// Waiting for the output to drain.
    Cont(Box<dyn Pull<'a> + 'a>),
    Done,
    Error(WriterError),
}

/// A suspended writer.
pub trait Pull<'a> {
    fn pull(self: Box<Self>, output: &mut dyn Output) -> Writer<'a>;
}

impl<'a> Writer<'a> {
    pub fn cont(next: impl Pull<'a> + 'a) -> Self {
        Writer::Cont(Box::new(next))
    }

    /// Resume a suspended writer. A finished writer is returned unchanged.
    pub fn pull(self, output: &mut dyn Output) -> Writer<'a> {
        match self {
            Writer::Cont(next) => next.pull(output),
            finished => finished,
        }
    }

    #[inline]
    pub fn is_cont(&self) -> bool {
        matches!(self, Writer::Cont(_))
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, Writer::Done)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Writer::Error(_))
    }

    pub fn trap(&self) -> Option<&WriterError> {
        match self {
            Writer::Error(error) => Some(error),
            _ => None,
        }
    }

    /// `Some(Ok)` when done, `Some(Err)` when failed, `None` while suspended.
    pub fn into_result(self) -> Option<Result<(), WriterError>> {
        match self {
            Writer::Cont(_) => None,
            Writer::Done => Some(Ok(())),
            Writer::Error(error) => Some(Err(error)),
        }
    }

    /// Pull the sub-writer in flight, or start one.
    #[inline]
    pub(crate) fn resume(
        part: Option<Writer<'a>>,
        output: &mut dyn Output,
        start: impl FnOnce(&mut dyn Output) -> Writer<'a>,
    ) -> Writer<'a> {
        match part {
            Some(part) => part.pull(output),
            None => start(output),
        }
    }
}

impl fmt::Debug for Writer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Writer::Cont(_) => f.write_str("Cont(..)"),
            Writer::Done => f.write_str("Done"),
            Writer::Error(error) => f.debug_tuple("Error").field(error).finish(),
        }
    }
}

// =============================================================================
// Token output
// =============================================================================

pub(crate) enum Emit {
    Done,
    Full,
    Fail(WriterError),
}

/// Check whether `output` accepts another character.
#[inline]
pub(crate) fn ready(output: &dyn Output) -> Emit {
    match output.state() {
        OutputState::Cont => Emit::Done,
        OutputState::Full => Emit::Full,
        OutputState::Done => Emit::Fail(WriterError::Truncated),
        OutputState::Error => Emit::Fail(WriterError::Output(
            output.trap().cloned().unwrap_or(OutputError::Overflow),
        )),
    }
}

/// Write `token` from byte `index` on. `index` tracks progress across
/// suspensions and is reset once the token is complete.
pub(crate) fn write_token(output: &mut dyn Output, token: &str, index: &mut usize) -> Emit {
    for c in token[*index..].chars() {
        match ready(output) {
            Emit::Done => {}
            other => return other,
        }
        output.write(c);
        *index += c.len_utf8();
    }
    *index = 0;
    Emit::Done
}

// =============================================================================
// ReconWriter
// =============================================================================

/// How a value is framed where it appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Form {
    /// A standalone value.
    Value,
    /// A document: a record may be written as bare items; `Extant` is `()`.
    Block,
    /// Attribute or invocation arguments: like `Block`, but `Extant` is empty.
    BlockValue,
}

/// Writer precedence of prefix operators.
pub const PREFIX_PRECEDENCE: u8 = 11;
/// Writer precedence of invocations and primaries.
pub const PRIMARY_PRECEDENCE: u8 = 12;

/// Grammar dispatcher for writing. Stateless and `Copy`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconWriter;

impl ReconWriter {
    pub fn new() -> Self {
        ReconWriter
    }

    /// How tightly `value` binds; operands binding looser than their
    /// position requires are parenthesized. `Absent` has no text of its own,
    /// so it binds loosest and an operand slot writes it as `()`.
    pub fn precedence(self, value: &Value) -> u8 {
        match value {
            Value::Absent => 0,
            Value::Lambda { .. } => 1,
            Value::Conditional { .. } => 2,
            Value::Binary { op, .. } => Level::of(*op).precedence(),
            Value::Unary { .. } => PREFIX_PRECEDENCE,
            _ => PRIMARY_PRECEDENCE,
        }
    }

    pub fn write_value<'a>(self, value: &'a Value, output: &mut dyn Output) -> Writer<'a> {
        match value {
            Value::Absent => Writer::Done,
            Value::Extant | Value::Bool(_) | Value::Num(_) | Value::Data(_) => {
                literal::TokenWriter::write(output, literal::token_of(value), 0)
            }
            Value::Text(text) => self.write_text(text, output),
            Value::Record(record) => record::RecordWriter::write(output, self, record, false, None, 0, 0, 1),
            Value::Selector(selector) => selector::SelectorWriter::write(output, self, selector, true, None, 0, 1),
            Value::Unary { .. }
            | Value::Binary { .. }
            | Value::Conditional { .. }
            | Value::Invoke { .. }
            | Value::Lambda { .. } => operator::OperatorWriter::write(output, self, value, None, 0, 1),
        }
    }

    pub fn size_of_value(self, value: &Value) -> usize {
        match value {
            Value::Absent => 0,
            Value::Extant | Value::Bool(_) | Value::Num(_) | Value::Data(_) => literal::size_of_token(value),
            Value::Text(text) => self.size_of_text(text),
            Value::Record(record) => record::RecordWriter::size_of(self, record),
            Value::Selector(selector) => selector::SelectorWriter::size_of(self, selector),
            _ => operator::OperatorWriter::size_of(self, value),
        }
    }

    /// A whole document. Records without leading attributes are written as
    /// bare items where that re-parses to the same value.
    pub fn write_block<'a>(self, value: &'a Value, output: &mut dyn Output) -> Writer<'a> {
        self.write_form(value, Form::Block, output)
    }

    pub fn size_of_block(self, value: &Value) -> usize {
        self.size_of_form(value, Form::Block)
    }

    /// The contents of an attribute's or an invocation's parentheses.
    pub fn write_block_value<'a>(self, value: &'a Value, output: &mut dyn Output) -> Writer<'a> {
        self.write_form(value, Form::BlockValue, output)
    }

    pub fn size_of_block_value(self, value: &Value) -> usize {
        self.size_of_form(value, Form::BlockValue)
    }

    /// A quoted string, or the bare text when it reads as an identifier.
    pub fn write_text<'a>(self, text: &'a str, output: &mut dyn Output) -> Writer<'a> {
        literal::TextWriter::write(output, text, 0, 0, 1)
    }

    pub fn size_of_text(self, text: &str) -> usize {
        literal::TextWriter::size_of(text)
    }

    pub(crate) fn write_item<'a>(self, item: &'a Item, output: &mut dyn Output) -> Writer<'a> {
        match item {
            Item::Attr(attr) => record::AttrWriter::write(output, self, attr, None, 0, 1),
            Item::Slot(slot) => record::SlotWriter::write(output, self, slot, None, 0, 1),
            Item::Value(value) => self.write_value(value, output),
        }
    }

    pub(crate) fn size_of_item(self, item: &Item) -> usize {
        match item {
            Item::Attr(attr) => record::AttrWriter::size_of(self, attr),
            Item::Slot(slot) => record::SlotWriter::size_of(self, slot),
            Item::Value(value) => self.size_of_value(value),
        }
    }

    pub(crate) fn write_form<'a>(self, value: &'a Value, form: Form, output: &mut dyn Output) -> Writer<'a> {
        match (value, form) {
            (Value::Extant, Form::BlockValue) => Writer::Done,
            (Value::Record(record), Form::Block | Form::BlockValue) if is_bare_block(record) => {
                record::RecordWriter::write(output, self, record, true, None, 0, 0, 1)
            }
            _ => self.write_value(value, output),
        }
    }

    /// `open value close`, with `value` written in `form`.
    pub(crate) fn write_group<'a>(
        self,
        value: &'a Value,
        form: Form,
        open: &'static str,
        close: &'static str,
        output: &mut dyn Output,
    ) -> Writer<'a> {
        operator::GroupWriter::write(output, self, value, form, open, close, None, 0, 1)
    }

    pub(crate) fn size_of_form(self, value: &Value, form: Form) -> usize {
        match (value, form) {
            (Value::Extant, Form::BlockValue) => 0,
            (Value::Record(record), Form::Block | Form::BlockValue) if is_bare_block(record) => {
                record::RecordWriter::size_of_bare(self, record)
            }
            _ => self.size_of_value(value),
        }
    }
}

/// A record that re-parses to itself when written without braces: not
/// empty, no leading attribute, and not a lone value that the block would
/// unwrap.
fn is_bare_block(record: &Record) -> bool {
    match record.items() {
        [] | [Item::Value(_)] => false,
        [first, ..] => !first.is_attr(),
    }
}
