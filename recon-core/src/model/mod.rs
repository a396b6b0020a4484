//! Value model the parser builds and the writer reads.

mod builder;
mod selector;
mod value;

pub use builder::{Builder, RecordBuilder, ValueBuilder};
pub use selector::Selector;
pub use value::{Attr, BinaryOp, Item, Num, Record, Slot, UnaryOp, Value};
