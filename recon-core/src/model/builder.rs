//! Item accumulators the parser builds values with.
//!
//! Parsers never construct records directly. They push items into a
//! [`Builder`] and `bind` it once the production closes, which lets the same
//! block parser produce either a record (`{...}` bodies) or a bare value
//! (top-level documents, parenthesized groups, attribute arguments).

use super::value::{Item, Record, Value};

/// Accumulates items into a value.
pub trait Builder {
    fn push(&mut self, item: Item);

    /// Number of items pushed so far.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finish building.
    fn bind(self) -> Value;
}

/// Always binds to a [`Value::Record`], even when empty.
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    record: Record,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every item of `record`.
    pub fn push_all(&mut self, record: Record) {
        for item in record.into_items() {
            self.record.push(item);
        }
    }
}

impl Builder for RecordBuilder {
    #[inline]
    fn push(&mut self, item: Item) {
        self.record.push(item);
    }

    #[inline]
    fn len(&self) -> usize {
        self.record.len()
    }

    fn bind(self) -> Value {
        Value::Record(self.record)
    }
}

/// Binds to the simplest value holding the pushed items.
///
/// - no items: [`Value::Absent`]
/// - one plain value item: that value
/// - anything else: a record
#[derive(Debug, Clone, Default)]
pub struct ValueBuilder {
    items: Vec<Item>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Builder for ValueBuilder {
    #[inline]
    fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    #[inline]
    fn len(&self) -> usize {
        self.items.len()
    }

    fn bind(mut self) -> Value {
        match self.items.len() {
            0 => Value::Absent,
            1 if matches!(self.items[0], Item::Value(_)) => match self.items.pop() {
                Some(Item::Value(value)) => value,
                _ => Value::Absent,
            },
            _ => Value::Record(Record::from_items(self.items)),
        }
    }
}
