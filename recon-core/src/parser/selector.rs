//! Selectors: `$`, `$a.b`, `$0`, `$@id`, `$*`, `$**`, `$*:`, `$:*`,
//! `$[predicate]`, `${computed}`.

use super::{skip_whitespace, suspend, Feed, Parser, ReconParser};
use crate::chars::is_ident_start;
use crate::diagnostic::Diagnostic;
use crate::input::{Input, InputState};
use crate::model::{Selector, Value};

#[derive(Default)]
pub(crate) struct SelectorState {
    steps: Vec<Selector>,
    name: Option<Parser<String>>,
    key: Option<Value>,
    index: u64,
}

impl SelectorState {
    fn push(&mut self, step: Selector) {
        self.steps.push(step);
    }

    fn done(self) -> Parser<Value> {
        Parser::Done(Value::Selector(Selector::chain(self.steps)))
    }
}

pub(crate) struct SelectorParser {
    recon: ReconParser,
    state: SelectorState,
    operand: Option<Parser<Value>>,
    step: u8,
}

impl SelectorParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        mut state: SelectorState,
        mut operand: Option<Parser<Value>>,
        mut step: u8,
    ) -> Parser<Value> {
        macro_rules! suspended {
            () => {
                Parser::cont(SelectorParser { recon, state, operand, step })
            };
        }
        // Finish here if the stream ended, suspend if it is only empty.
        macro_rules! settle {
            () => {
                match input.state() {
                    InputState::Empty => suspended!(),
                    InputState::Error => Parser::Error(Diagnostic::trap(input)),
                    _ => state.done(),
                }
            };
        }
        loop {
            match step {
                1 => match input.peek() {
                    Some('$') => {
                        input.step();
                        step = 2;
                    }
                    Some(_) => return Parser::Error(Diagnostic::expected("'$'", input)),
                    None => return suspend(input, "'$'", SelectorParser { recon, state, operand, step }),
                },
                // 2: optional first step; 11: step required after '.'
                2 | 11 => match input.peek() {
                    Some(c) if is_ident_start(c) => step = 3,
                    Some(c) if c.is_ascii_digit() => step = 4,
                    Some(c @ ('@' | '*' | ':' | '[' | '{')) => {
                        input.step();
                        step = match c {
                            '@' => 5,
                            '*' => 6,
                            ':' => 7,
                            '[' => 8,
                            _ => 9,
                        };
                    }
                    Some(_) if step == 11 => return Parser::Error(Diagnostic::expected("selector", input)),
                    Some(_) => return state.done(),
                    None if step == 11 => return suspend(input, "selector", SelectorParser { recon, state, operand, step }),
                    None => return settle!(),
                },
                3 => match Parser::resume(state.name.take(), input, |input| recon.parse_ident(input)) {
                    Parser::Done(key) => {
                        state.push(Selector::get(key));
                        step = 10;
                    }
                    Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                    cont => {
                        state.name = Some(cont);
                        return suspended!();
                    }
                },
                4 => {
                    while let Some(c) = input.peek() {
                        let Some(d) = c.to_digit(10) else { break };
                        match state.index.checked_mul(10).and_then(|i| i.checked_add(d as u64)) {
                            Some(index) => state.index = index,
                            None => return Parser::Error(Diagnostic::message("selector index overflow", input)),
                        }
                        input.step();
                    }
                    if input.is_empty() {
                        return suspended!();
                    }
                    let index = std::mem::take(&mut state.index);
                    state.push(Selector::get_item(index));
                    step = 10;
                }
                5 => {
                    if state.name.is_none() {
                        match input.peek() {
                            Some('"' | '\'') => {}
                            Some(c) if is_ident_start(c) => {}
                            Some(_) => return Parser::Error(Diagnostic::expected("attribute name", input)),
                            None => {
                                return suspend(input, "attribute name", SelectorParser { recon, state, operand, step })
                            }
                        }
                    }
                    let name = Parser::resume(state.name.take(), input, |input| match input.peek() {
                        Some('"' | '\'') => recon.parse_string(input),
                        _ => recon.parse_ident(input),
                    });
                    match name {
                        Parser::Done(key) => {
                            state.push(Selector::get_attr(key));
                            step = 10;
                        }
                        Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                        cont => {
                            state.name = Some(cont);
                            return suspended!();
                        }
                    }
                }
                6 => match input.peek() {
                    Some('*') => {
                        input.step();
                        state.push(Selector::descendants());
                        step = 10;
                    }
                    Some(':') => {
                        input.step();
                        state.push(Selector::keys());
                        step = 10;
                    }
                    Some(_) => {
                        state.push(Selector::children());
                        step = 10;
                    }
                    None if input.is_empty() => return suspended!(),
                    None => {
                        state.push(Selector::children());
                        step = 10;
                    }
                },
                7 => match input.peek() {
                    Some('*') => {
                        input.step();
                        state.push(Selector::values());
                        step = 10;
                    }
                    Some(_) => return Parser::Error(Diagnostic::expected("'*'", input)),
                    None => return suspend(input, "'*'", SelectorParser { recon, state, operand, step }),
                },
                8 | 9 => {
                    let parsed = if step == 8 {
                        Parser::resume(operand.take(), input, |input| recon.parse_block_expression(input))
                    } else {
                        Parser::resume(operand.take(), input, |input| recon.parse_block(input))
                    };
                    match parsed {
                        Parser::Done(value) if !value.is_distinct() => {
                            return Parser::Error(Diagnostic::expected("value", input))
                        }
                        Parser::Done(value) => {
                            state.key = Some(value);
                            step += 4;
                        }
                        Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                        cont => {
                            operand = Some(cont);
                            return suspended!();
                        }
                    }
                }
                // after a step
                10 => match input.peek() {
                    Some('.') => {
                        input.step();
                        step = 11;
                    }
                    Some('[') => {
                        input.step();
                        step = 8;
                    }
                    Some(_) => return state.done(),
                    None => return settle!(),
                },
                // 12: closing ']'; 13: closing '}'
                _ => {
                    let close = if step == 12 { ']' } else { '}' };
                    skip_whitespace(input);
                    match input.peek() {
                        Some(c) if c == close => {
                            input.step();
                            let key = state.key.take().unwrap_or_default();
                            state.push(if step == 12 { Selector::filter(key) } else { Selector::get(key) });
                            step = 10;
                        }
                        Some(_) => {
                            let what = if step == 12 { "']'" } else { "'}'" };
                            return Parser::Error(Diagnostic::expected(what, input));
                        }
                        None => {
                            let what = if step == 12 { "']'" } else { "'}'" };
                            return suspend(input, what, SelectorParser { recon, state, operand, step });
                        }
                    }
                }
            }
        }
    }
}

impl Feed<Value> for SelectorParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        let SelectorParser { recon, state, operand, step } = *self;
        Self::parse(input, recon, state, operand, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::StringInput;
    use crate::model::BinaryOp;

    fn selector(text: &str) -> Value {
        ReconParser.parse_selector(&mut StringInput::new(text)).bind()
    }

    #[test]
    fn test_identity() {
        assert_eq!(selector("$"), Value::Selector(Selector::Identity));
    }

    #[test]
    fn test_paths() {
        assert_eq!(
            selector("$a.0.@id"),
            Value::Selector(
                Selector::get("a")
                    .append(Selector::get_item(0))
                    .append(Selector::get_attr("id"))
            )
        );
        assert_eq!(
            selector("$*.**.*:.:*"),
            Value::Selector(
                Selector::children()
                    .append(Selector::descendants())
                    .append(Selector::keys())
                    .append(Selector::values())
            )
        );
    }

    #[test]
    fn test_filter_and_computed() {
        assert_eq!(
            selector("$a[b > 1]"),
            Value::Selector(
                Selector::get("a").append(Selector::filter(Value::binary(
                    BinaryOp::Gt,
                    Value::text("b"),
                    Value::from(1)
                )))
            )
        );
        assert_eq!(selector("${\"a b\"}"), Value::Selector(Selector::get("a b")));
    }

    #[test]
    fn test_dot_requires_step() {
        let mut input = StringInput::new("$a.");
        assert!(ReconParser.parse_selector(&mut input).is_error());
    }
}
