//! Markup: `[text @em[inline] more {embedded, items}]`.
//!
//! Text runs become text items. `@attr` starts an inline record that may be
//! followed directly by a `{record}` or a nested `[markup]` body. `{...}`
//! splices its items into the surrounding markup. A markup body holding a
//! single text run is just that text.

use super::literal::unicode_escape;
use super::{suspend, Feed, Parser, ReconParser};
use crate::chars::ESCAPES;
use crate::diagnostic::Diagnostic;
use crate::input::Input;
use crate::model::{Builder, Item, RecordBuilder, Value};

#[derive(Debug, Default)]
pub(crate) struct MarkupState {
    builder: RecordBuilder,
    text: String,
    inline: Option<RecordBuilder>,
    code: u32,
    digits: u8,
}

impl MarkupState {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let text = std::mem::take(&mut self.text);
            self.builder.push(Item::Value(Value::Text(text)));
        }
    }

    fn finish(mut self) -> Value {
        self.flush_text();
        let mut items = match self.builder.bind() {
            Value::Record(record) => record.into_items(),
            other => return other,
        };
        match items.len() {
            0 => Value::Text(String::new()),
            1 if matches!(items[0], Item::Value(Value::Text(_))) => match items.pop() {
                Some(Item::Value(text)) => text,
                _ => Value::Absent,
            },
            _ => Value::record(items),
        }
    }
}

pub(crate) struct MarkupParser {
    recon: ReconParser,
    state: MarkupState,
    attr: Option<Parser<Item>>,
    operand: Option<Parser<Value>>,
    step: u8,
}

impl MarkupParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        mut state: MarkupState,
        mut attr: Option<Parser<Item>>,
        mut operand: Option<Parser<Value>>,
        mut step: u8,
    ) -> Parser<Value> {
        macro_rules! suspended {
            ($what:expr) => {
                suspend(input, $what, MarkupParser { recon, state, attr, operand, step })
            };
        }
        loop {
            match step {
                1 => match input.peek() {
                    Some('[') => {
                        input.step();
                        step = 2;
                    }
                    Some(_) => return Parser::Error(Diagnostic::expected("'['", input)),
                    None => return suspended!("'['"),
                },
                2 => loop {
                    match input.peek() {
                        Some(']') => {
                            input.step();
                            return Parser::Done(state.finish());
                        }
                        Some('\\') => {
                            input.step();
                            step = 3;
                            break;
                        }
                        Some('@') => {
                            state.flush_text();
                            step = 5;
                            break;
                        }
                        Some('{') => {
                            state.flush_text();
                            step = 7;
                            break;
                        }
                        Some(c) => {
                            input.step();
                            state.text.push(c);
                        }
                        None => return suspended!("']'"),
                    }
                },
                3 => match input.peek() {
                    Some('u') => {
                        input.step();
                        state.code = 0;
                        state.digits = 0;
                        step = 4;
                    }
                    Some(c) => match ESCAPES.get(&c) {
                        Some(&unescaped) => {
                            input.step();
                            state.text.push(unescaped);
                            step = 2;
                        }
                        None => return Parser::Error(Diagnostic::expected("escape character", input)),
                    },
                    None => return suspended!("escape character"),
                },
                4 => match unicode_escape(input, &mut state.code, &mut state.digits) {
                    Some(Ok(c)) => {
                        state.text.push(c);
                        step = 2;
                    }
                    Some(Err(diagnostic)) => return Parser::Error(diagnostic),
                    None => return suspended!("hex digit"),
                },
                // inline attribute
                5 => match Parser::resume(attr.take(), input, |input| recon.parse_attr(input)) {
                    Parser::Done(item) => {
                        let mut inline = RecordBuilder::new();
                        inline.push(item);
                        state.inline = Some(inline);
                        step = 6;
                    }
                    Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                    cont => {
                        attr = Some(cont);
                        return Parser::cont(MarkupParser { recon, state, attr, operand, step });
                    }
                },
                // inline body, if any
                6 => match input.peek() {
                    Some('{') => step = 8,
                    Some('[') => step = 9,
                    Some(_) => {
                        let inline = state.inline.take().unwrap_or_default();
                        state.builder.push(Item::Value(inline.bind()));
                        step = 2;
                    }
                    None => return suspended!("']'"),
                },
                // embedded block items
                7 => match Parser::resume(operand.take(), input, |input| recon.parse_record(input, RecordBuilder::new())) {
                    Parser::Done(Value::Record(record)) => {
                        state.builder.push_all(record);
                        step = 2;
                    }
                    Parser::Done(value) => {
                        state.builder.push(Item::Value(value));
                        step = 2;
                    }
                    Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                    cont => {
                        operand = Some(cont);
                        return Parser::cont(MarkupParser { recon, state, attr, operand, step });
                    }
                },
                // inline record body
                8 => {
                    let inline = &mut state.inline;
                    let body = Parser::resume(operand.take(), input, |input| {
                        recon.parse_record(input, inline.take().unwrap_or_default())
                    });
                    match body {
                        Parser::Done(value) => {
                            state.builder.push(Item::Value(value));
                            step = 2;
                        }
                        Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                        cont => {
                            operand = Some(cont);
                            return Parser::cont(MarkupParser { recon, state, attr, operand, step });
                        }
                    }
                }
                // inline markup body
                _ => match Parser::resume(operand.take(), input, |input| recon.parse_markup(input)) {
                    Parser::Done(value) => {
                        let mut inline = state.inline.take().unwrap_or_default();
                        match value {
                            Value::Record(record) => inline.push_all(record),
                            value => inline.push(Item::Value(value)),
                        }
                        state.builder.push(Item::Value(inline.bind()));
                        step = 2;
                    }
                    Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                    cont => {
                        operand = Some(cont);
                        return Parser::cont(MarkupParser { recon, state, attr, operand, step });
                    }
                },
            }
        }
    }
}

impl Feed<Value> for MarkupParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        let MarkupParser { recon, state, attr, operand, step } = *self;
        Self::parse(input, recon, state, attr, operand, step)
    }
}
