//! Blocks, records and whole documents.
//!
//! A block is a run of items separated by `,`, `;` or newlines. Each item is
//! a value, or a `key: value` slot. `#` starts a comment that runs to the end
//! of the line. The block ends, without consuming anything, at the first
//! character that can neither start an item nor separate two.

use super::{skip_spaces, skip_whitespace, suspend, Feed, Parser, ReconParser};
use crate::chars::{is_newline, is_whitespace};
use crate::diagnostic::Diagnostic;
use crate::input::{Input, InputState};
use crate::model::{Builder, Item, RecordBuilder, Slot, Value};

pub(crate) struct BlockParser<B> {
    recon: ReconParser,
    builder: B,
    key: Option<Value>,
    operand: Option<Parser<Value>>,
    step: u8,
}

impl<B: Builder + 'static> BlockParser<B> {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        mut builder: B,
        mut key: Option<Value>,
        mut operand: Option<Parser<Value>>,
        mut step: u8,
    ) -> Parser<Value> {
        macro_rules! suspended {
            () => {
                Parser::cont(BlockParser { recon, builder, key, operand, step })
            };
        }
        macro_rules! settle {
            () => {
                match input.state() {
                    InputState::Empty => suspended!(),
                    InputState::Error => Parser::Error(Diagnostic::trap(input)),
                    _ => Parser::Done(builder.bind()),
                }
            };
        }
        loop {
            if step == 1 {
                loop {
                    match input.peek() {
                        Some(c) if is_whitespace(c) => input.step(),
                        Some('#') => {
                            input.step();
                            step = 6;
                            break;
                        }
                        Some(_) => {
                            step = 2;
                            break;
                        }
                        None => return settle!(),
                    }
                }
            }
            if step == 6 {
                loop {
                    match input.peek() {
                        Some(c) if is_newline(c) => {
                            step = 1;
                            break;
                        }
                        Some(_) => input.step(),
                        None => return settle!(),
                    }
                }
                continue;
            }
            if step == 2 {
                match Parser::resume(operand.take(), input, |input| recon.parse_block_expression(input)) {
                    // No item here: the block is over.
                    Parser::Done(value) if !value.is_distinct() => return Parser::Done(builder.bind()),
                    Parser::Done(value) => {
                        key = Some(value);
                        step = 3;
                    }
                    Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                    cont => {
                        operand = Some(cont);
                        return suspended!();
                    }
                }
            }
            if step == 3 {
                skip_spaces(input);
                match input.peek() {
                    Some(':') => {
                        input.step();
                        step = 4;
                    }
                    Some(_) => {
                        builder.push(Item::Value(key.take().unwrap_or_default()));
                        step = 5;
                    }
                    None if input.is_done() => {
                        builder.push(Item::Value(key.take().unwrap_or_default()));
                        return Parser::Done(builder.bind());
                    }
                    None => return settle!(),
                }
            }
            if step == 4 {
                match Parser::resume(operand.take(), input, |input| recon.parse_block_expression(input)) {
                    Parser::Done(value) => {
                        let value = if value.is_distinct() { value } else { Value::Extant };
                        builder.push(Item::Slot(Slot {
                            key: key.take().unwrap_or_default(),
                            value,
                        }));
                        step = 5;
                    }
                    Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                    cont => {
                        operand = Some(cont);
                        return suspended!();
                    }
                }
            }
            if step == 5 {
                skip_spaces(input);
                match input.peek() {
                    Some(',' | ';') => {
                        input.step();
                        step = 1;
                    }
                    Some(c) if is_newline(c) || c == '#' => step = 1,
                    Some(_) => return Parser::Done(builder.bind()),
                    None => return settle!(),
                }
            }
        }
    }
}

impl<B: Builder + 'static> Feed<Value> for BlockParser<B> {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        let BlockParser { recon, builder, key, operand, step } = *self;
        Self::parse(input, recon, builder, key, operand, step)
    }
}

// =============================================================================
// Record
// =============================================================================

/// `{` block `}`, appending to a builder that may already hold attributes.
pub(crate) struct RecordParser {
    recon: ReconParser,
    builder: Option<RecordBuilder>,
    operand: Option<Parser<Value>>,
    value: Option<Value>,
    step: u8,
}

impl RecordParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        mut builder: Option<RecordBuilder>,
        mut operand: Option<Parser<Value>>,
        mut value: Option<Value>,
        mut step: u8,
    ) -> Parser<Value> {
        if step == 1 {
            match input.peek() {
                Some('{') => {
                    input.step();
                    step = 2;
                }
                Some(_) => return Parser::Error(Diagnostic::expected("'{'", input)),
                None => return suspend(input, "'{'", RecordParser { recon, builder, operand, value, step }),
            }
        }
        if step == 2 {
            let items = Parser::resume(operand.take(), input, |input| {
                recon.parse_block_into(input, builder.take().unwrap_or_default())
            });
            match items {
                Parser::Done(record) => {
                    value = Some(record);
                    step = 3;
                }
                Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                cont => {
                    return Parser::cont(RecordParser { recon, builder, operand: Some(cont), value, step });
                }
            }
        }
        skip_whitespace(input);
        match input.peek() {
            Some('}') => {
                input.step();
                Parser::Done(value.unwrap_or_default())
            }
            Some(_) => Parser::Error(Diagnostic::expected("'}'", input)),
            None => suspend(input, "'}'", RecordParser { recon, builder, operand, value, step }),
        }
    }
}

impl Feed<Value> for RecordParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        let RecordParser { recon, builder, operand, value, step } = *self;
        Self::parse(input, recon, builder, operand, value, step)
    }
}

// =============================================================================
// Document
// =============================================================================

/// A block that must reach the end of the stream.
pub(crate) struct DocumentParser {
    recon: ReconParser,
    block: Option<Parser<Value>>,
}

impl DocumentParser {
    pub(crate) fn parse(input: &mut dyn Input, recon: ReconParser, block: Option<Parser<Value>>) -> Parser<Value> {
        match Parser::resume(block, input, |input| recon.parse_block(input)) {
            Parser::Done(_) if input.is_cont() => Parser::Error(Diagnostic::unexpected(input)),
            Parser::Done(value) => Parser::Done(value),
            Parser::Error(diagnostic) => Parser::Error(diagnostic),
            cont => Parser::cont(DocumentParser { recon, block: Some(cont) }),
        }
    }
}

impl Feed<Value> for DocumentParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        Self::parse(input, self.recon, self.block)
    }
}
