//! Primaries and invocation.

use super::literal::ident_value;
use super::{skip_spaces, skip_whitespace, suspend, Feed, Parser, ReconParser};
use crate::chars::is_ident_start;
use crate::diagnostic::Diagnostic;
use crate::input::{Input, InputState};
use crate::model::{Builder, Item, RecordBuilder, Value};

/// True when `c` starts a literal the primary dispatches on.
#[inline]
fn starts_literal(c: char) -> bool {
    matches!(c, '[' | '"' | '\'' | '%' | '$') || c.is_ascii_digit() || is_ident_start(c)
}

fn parse_literal(recon: ReconParser, input: &mut dyn Input) -> Parser<Value> {
    match input.peek() {
        Some('[') => recon.parse_markup(input),
        Some('"' | '\'') => recon.parse_string(input).map(Value::Text),
        Some('%') => recon.parse_data(input),
        Some('$') => recon.parse_selector(input),
        Some(c) if c.is_ascii_digit() => recon.parse_number(input),
        Some(c) if is_ident_start(c) => recon.parse_ident(input).map(ident_value),
        _ => Parser::Done(Value::Absent),
    }
}

/// Merge leading attributes with the value that followed them.
///
/// A record's items are appended to the attributes; any other value becomes
/// one more item.
fn finish(builder: Option<RecordBuilder>, value: Option<Value>) -> Value {
    match (builder, value) {
        (None, value) => value.unwrap_or_default(),
        (Some(mut builder), Some(Value::Record(record))) => {
            builder.push_all(record);
            builder.bind()
        }
        (Some(mut builder), Some(value)) => {
            builder.push(Item::Value(value));
            builder.bind()
        }
        (Some(builder), None) => builder.bind(),
    }
}

// =============================================================================
// Primary
// =============================================================================

/// Attributes followed by a record, markup, literal, selector or group.
pub(crate) struct PrimaryParser {
    recon: ReconParser,
    builder: Option<RecordBuilder>,
    attr: Option<Parser<Item>>,
    operand: Option<Parser<Value>>,
    group: Option<Value>,
    step: u8,
}

impl PrimaryParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        mut builder: Option<RecordBuilder>,
        mut attr: Option<Parser<Item>>,
        mut operand: Option<Parser<Value>>,
        mut group: Option<Value>,
        mut step: u8,
    ) -> Parser<Value> {
        macro_rules! suspended {
            () => {
                Parser::cont(PrimaryParser { recon, builder, attr, operand, group, step })
            };
        }
        if step == 1 {
            loop {
                if attr.is_none() {
                    skip_spaces(input);
                    match input.peek() {
                        Some('@') => {}
                        Some(_) => {
                            step = 2;
                            break;
                        }
                        None => {
                            return match input.state() {
                                InputState::Empty => suspended!(),
                                InputState::Error => Parser::Error(Diagnostic::trap(input)),
                                _ => Parser::Done(finish(builder, None)),
                            }
                        }
                    }
                }
                match Parser::resume(attr.take(), input, |input| recon.parse_attr(input)) {
                    Parser::Done(item) => builder.get_or_insert_with(RecordBuilder::new).push(item),
                    Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                    cont => {
                        attr = Some(cont);
                        return suspended!();
                    }
                }
            }
        }
        if step == 2 {
            match input.peek() {
                Some('{') => return recon.parse_record(input, builder.unwrap_or_default()),
                Some('(') => {
                    input.step();
                    step = 4;
                }
                Some(c) if starts_literal(c) => step = 3,
                // Cannot start a value: nothing consumed beyond spaces.
                Some(_) => return Parser::Done(finish(builder, None)),
                None => {
                    return match input.state() {
                        InputState::Empty => suspended!(),
                        InputState::Error => Parser::Error(Diagnostic::trap(input)),
                        _ => Parser::Done(finish(builder, None)),
                    }
                }
            }
        }
        if step == 3 {
            return match Parser::resume(operand.take(), input, |input| parse_literal(recon, input)) {
                Parser::Done(value) => Parser::Done(finish(builder, Some(value))),
                Parser::Error(diagnostic) => Parser::Error(diagnostic),
                cont => {
                    operand = Some(cont);
                    suspended!()
                }
            };
        }
        if step == 4 {
            match Parser::resume(operand.take(), input, |input| recon.parse_block(input)) {
                Parser::Done(value) => {
                    group = Some(if value.is_distinct() { value } else { Value::Extant });
                    step = 5;
                }
                Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                cont => {
                    operand = Some(cont);
                    return suspended!();
                }
            }
        }
        skip_whitespace(input);
        match input.peek() {
            Some(')') => {
                input.step();
                Parser::Done(finish(builder, group))
            }
            Some(_) => Parser::Error(Diagnostic::expected("')'", input)),
            None => suspend(input, "')'", PrimaryParser { recon, builder, attr, operand, group, step }),
        }
    }
}

impl Feed<Value> for PrimaryParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        let PrimaryParser { recon, builder, attr, operand, group, step } = *self;
        Self::parse(input, recon, builder, attr, operand, group, step)
    }
}

// =============================================================================
// Invoke
// =============================================================================

/// `primary ( '(' block ')' )*`
pub(crate) struct InvokeOperatorParser {
    recon: ReconParser,
    func: Option<Value>,
    args: Option<Value>,
    operand: Option<Parser<Value>>,
    step: u8,
}

impl InvokeOperatorParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        mut func: Option<Value>,
        mut args: Option<Value>,
        mut operand: Option<Parser<Value>>,
        mut step: u8,
    ) -> Parser<Value> {
        macro_rules! suspended {
            () => {
                Parser::cont(InvokeOperatorParser { recon, func, args, operand, step })
            };
        }
        if step == 1 {
            match Parser::resume(operand.take(), input, |input| recon.parse_primary(input)) {
                Parser::Done(value) if !value.is_distinct() => return Parser::Done(value),
                Parser::Done(value) => {
                    func = Some(value);
                    step = 2;
                }
                Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                cont => {
                    operand = Some(cont);
                    return suspended!();
                }
            }
        }
        loop {
            if step == 2 {
                match input.peek() {
                    Some('(') => {
                        input.step();
                        step = 3;
                    }
                    Some(_) => return Parser::Done(func.unwrap_or_default()),
                    None => {
                        return match input.state() {
                            InputState::Empty => suspended!(),
                            InputState::Error => Parser::Error(Diagnostic::trap(input)),
                            _ => Parser::Done(func.unwrap_or_default()),
                        }
                    }
                }
            }
            if step == 3 {
                match Parser::resume(operand.take(), input, |input| recon.parse_block(input)) {
                    Parser::Done(value) => {
                        args = Some(if value.is_distinct() { value } else { Value::Extant });
                        step = 4;
                    }
                    Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                    cont => {
                        operand = Some(cont);
                        return suspended!();
                    }
                }
            }
            skip_whitespace(input);
            match input.peek() {
                Some(')') => {
                    input.step();
                    func = Some(Value::invoke(func.unwrap_or_default(), args.take().unwrap_or_default()));
                    step = 2;
                }
                Some(_) => return Parser::Error(Diagnostic::expected("')'", input)),
                None => return suspend(input, "')'", InvokeOperatorParser { recon, func, args, operand, step }),
            }
        }
    }
}

impl Feed<Value> for InvokeOperatorParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        let InvokeOperatorParser { recon, func, args, operand, step } = *self;
        Self::parse(input, recon, func, args, operand, step)
    }
}
