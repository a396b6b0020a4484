//! Records, attributes and slots.

use super::{Form, Pull, ReconWriter, Writer};
use crate::model::{Attr, Record, Slot, Value};
use crate::output::Output;

// =============================================================================
// Record
// =============================================================================

/// `@attr…{items}`, or bare comma-separated items.
pub(crate) struct RecordWriter<'a> {
    recon: ReconWriter,
    record: &'a Record,
    bare: bool,
    part: Option<Writer<'a>>,
    index: usize,
    item: usize,
    step: u8,
}

impl<'a> RecordWriter<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn write(
        output: &mut dyn Output,
        recon: ReconWriter,
        record: &'a Record,
        bare: bool,
        mut part: Option<Writer<'a>>,
        mut index: usize,
        mut item: usize,
        mut step: u8,
    ) -> Writer<'a> {
        macro_rules! suspended {
            () => {
                Writer::cont(RecordWriter { recon, record, bare, part, index, item, step })
            };
        }
        let items = record.items();
        let attrs = if bare { 0 } else { record.leading_attrs() };
        if step == 1 {
            while item < attrs {
                nested!(output, part, |output| recon.write_item(&items[item], output), suspended!());
                item += 1;
            }
            if bare {
                step = 3;
            } else if attrs < items.len() || items.is_empty() {
                step = 2;
            } else {
                return Writer::Done;
            }
        }
        if step == 2 {
            token!(output, index, "{", suspended!());
            step = 3;
        }
        // 3: separator then item; 4: item
        while item < items.len() {
            if step == 3 {
                if item > attrs {
                    token!(output, index, ",", suspended!());
                }
                step = 4;
            }
            nested!(output, part, |output| recon.write_item(&items[item], output), suspended!());
            item += 1;
            step = 3;
        }
        if !bare {
            token!(output, index, "}", suspended!());
        }
        Writer::Done
    }

    pub(crate) fn size_of(recon: ReconWriter, record: &Record) -> usize {
        let attrs = record.leading_attrs();
        let head: usize = record.items()[..attrs].iter().map(|item| recon.size_of_item(item)).sum();
        if attrs < record.len() || record.is_empty() {
            head + 2 + Self::size_of_items(recon, &record.items()[attrs..])
        } else {
            head
        }
    }

    pub(crate) fn size_of_bare(recon: ReconWriter, record: &Record) -> usize {
        Self::size_of_items(recon, record.items())
    }

    fn size_of_items(recon: ReconWriter, items: &[crate::model::Item]) -> usize {
        let separators = items.len().saturating_sub(1);
        separators + items.iter().map(|item| recon.size_of_item(item)).sum::<usize>()
    }
}

impl<'a> Pull<'a> for RecordWriter<'a> {
    fn pull(self: Box<Self>, output: &mut dyn Output) -> Writer<'a> {
        let RecordWriter { recon, record, bare, part, index, item, step } = *self;
        Self::write(output, recon, record, bare, part, index, item, step)
    }
}

// =============================================================================
// Attr
// =============================================================================

/// `@name` or `@name(block)`.
pub(crate) struct AttrWriter<'a> {
    recon: ReconWriter,
    attr: &'a Attr,
    part: Option<Writer<'a>>,
    index: usize,
    step: u8,
}

/// Attribute values that need no parentheses.
#[inline]
fn is_flag(value: &Value) -> bool {
    matches!(value, Value::Absent | Value::Extant)
}

impl<'a> AttrWriter<'a> {
    pub(crate) fn write(
        output: &mut dyn Output,
        recon: ReconWriter,
        attr: &'a Attr,
        mut part: Option<Writer<'a>>,
        mut index: usize,
        mut step: u8,
    ) -> Writer<'a> {
        macro_rules! suspended {
            () => {
                Writer::cont(AttrWriter { recon, attr, part, index, step })
            };
        }
        if step == 1 {
            token!(output, index, "@", suspended!());
            step = 2;
        }
        if step == 2 {
            nested!(output, part, |output| recon.write_text(&attr.key, output), suspended!());
            if is_flag(&attr.value) {
                return Writer::Done;
            }
            step = 3;
        }
        if step == 3 {
            token!(output, index, "(", suspended!());
            step = 4;
        }
        if step == 4 {
            nested!(output, part, |output| recon.write_block_value(&attr.value, output), suspended!());
            step = 5;
        }
        token!(output, index, ")", suspended!());
        Writer::Done
    }

    pub(crate) fn size_of(recon: ReconWriter, attr: &Attr) -> usize {
        let name = 1 + recon.size_of_text(&attr.key);
        if is_flag(&attr.value) {
            name
        } else {
            name + 2 + recon.size_of_block_value(&attr.value)
        }
    }
}

impl<'a> Pull<'a> for AttrWriter<'a> {
    fn pull(self: Box<Self>, output: &mut dyn Output) -> Writer<'a> {
        let AttrWriter { recon, attr, part, index, step } = *self;
        Self::write(output, recon, attr, part, index, step)
    }
}

// =============================================================================
// Slot
// =============================================================================

/// True when the written key could run into the `:` that follows it, as
/// in `$*:`.
fn ends_with_selector(value: &Value) -> bool {
    match value {
        Value::Selector(_) => true,
        Value::Unary { operand, .. } => ends_with_selector(operand),
        Value::Binary { rhs, .. } => ends_with_selector(rhs),
        Value::Conditional { otherwise, .. } => ends_with_selector(otherwise),
        Value::Lambda { template, .. } => ends_with_selector(template),
        _ => false,
    }
}

/// `key:value`; an `Extant` value is written empty.
pub(crate) struct SlotWriter<'a> {
    recon: ReconWriter,
    slot: &'a Slot,
    part: Option<Writer<'a>>,
    index: usize,
    step: u8,
}

impl<'a> SlotWriter<'a> {
    pub(crate) fn write(
        output: &mut dyn Output,
        recon: ReconWriter,
        slot: &'a Slot,
        mut part: Option<Writer<'a>>,
        mut index: usize,
        mut step: u8,
    ) -> Writer<'a> {
        macro_rules! suspended {
            () => {
                Writer::cont(SlotWriter { recon, slot, part, index, step })
            };
        }
        if step == 1 {
            if ends_with_selector(&slot.key) {
                nested!(
                    output,
                    part,
                    |output| recon.write_group(&slot.key, Form::Value, "(", ")", output),
                    suspended!()
                );
            } else {
                nested!(output, part, |output| recon.write_value(&slot.key, output), suspended!());
            }
            step = 2;
        }
        if step == 2 {
            token!(output, index, ":", suspended!());
            if matches!(slot.value, Value::Extant) {
                return Writer::Done;
            }
            step = 3;
        }
        nested!(output, part, |output| recon.write_value(&slot.value, output), suspended!());
        Writer::Done
    }

    pub(crate) fn size_of(recon: ReconWriter, slot: &Slot) -> usize {
        let key = recon.size_of_value(&slot.key) + if ends_with_selector(&slot.key) { 2 } else { 0 };
        let value = match slot.value {
            Value::Extant => 0,
            ref value => recon.size_of_value(value),
        };
        key + 1 + value
    }
}

impl<'a> Pull<'a> for SlotWriter<'a> {
    fn pull(self: Box<Self>, output: &mut dyn Output) -> Writer<'a> {
        let SlotWriter { recon, slot, part, index, step } = *self;
        Self::write(output, recon, slot, part, index, step)
    }
}
