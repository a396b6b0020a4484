//! `@name` and `@name(args)`.

use super::{skip_whitespace, suspend, Feed, Parser, ReconParser};
use crate::chars::is_ident_start;
use crate::diagnostic::Diagnostic;
use crate::input::{Input, InputState};
use crate::model::{Item, Value};

pub(crate) struct AttrParser {
    recon: ReconParser,
    key: Option<String>,
    name: Option<Parser<String>>,
    operand: Option<Parser<Value>>,
    value: Option<Value>,
    step: u8,
}

impl AttrParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        mut key: Option<String>,
        mut name: Option<Parser<String>>,
        mut operand: Option<Parser<Value>>,
        mut value: Option<Value>,
        mut step: u8,
    ) -> Parser<Item> {
        macro_rules! suspended {
            () => {
                Parser::cont(AttrParser { recon, key, name, operand, value, step })
            };
        }
        if step == 1 {
            match input.peek() {
                Some('@') => {
                    input.step();
                    step = 2;
                }
                Some(_) => return Parser::Error(Diagnostic::expected("'@'", input)),
                None => return suspend(input, "'@'", AttrParser { recon, key, name, operand, value, step }),
            }
        }
        if step == 2 {
            if name.is_none() {
                match input.peek() {
                    Some('"' | '\'') => {}
                    Some(c) if is_ident_start(c) => {}
                    Some(_) => return Parser::Error(Diagnostic::expected("attribute name", input)),
                    None => return suspend(input, "attribute name", AttrParser { recon, key, name, operand, value, step }),
                }
            }
            let parsed = Parser::resume(name.take(), input, |input| match input.peek() {
                Some('"' | '\'') => recon.parse_string(input),
                _ => recon.parse_ident(input),
            });
            match parsed {
                Parser::Done(text) => {
                    key = Some(text);
                    step = 3;
                }
                Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                cont => {
                    name = Some(cont);
                    return suspended!();
                }
            }
        }
        if step == 3 {
            // No whitespace between the name and its arguments.
            match input.peek() {
                Some('(') => {
                    input.step();
                    step = 4;
                }
                Some(_) => return Parser::Done(Item::attr(key.unwrap_or_default(), Value::Extant)),
                None => {
                    return match input.state() {
                        InputState::Empty => suspended!(),
                        InputState::Error => Parser::Error(Diagnostic::trap(input)),
                        _ => Parser::Done(Item::attr(key.unwrap_or_default(), Value::Extant)),
                    }
                }
            }
        }
        if step == 4 {
            skip_whitespace(input);
            match input.peek() {
                Some(')') => {
                    input.step();
                    return Parser::Done(Item::attr(key.unwrap_or_default(), Value::Extant));
                }
                Some(_) => step = 5,
                None => return suspend(input, "')'", AttrParser { recon, key, name, operand, value, step }),
            }
        }
        if step == 5 {
            match Parser::resume(operand.take(), input, |input| recon.parse_block(input)) {
                Parser::Done(parsed) => {
                    value = Some(if parsed.is_distinct() { parsed } else { Value::Extant });
                    step = 6;
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
                Parser::Done(Item::attr(key.unwrap_or_default(), value.unwrap_or(Value::Extant)))
            }
            Some(_) => Parser::Error(Diagnostic::expected("')'", input)),
            None => suspend(input, "')'", AttrParser { recon, key, name, operand, value, step }),
        }
    }
}

impl Feed<Item> for AttrParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Item> {
        let AttrParser { recon, key, name, operand, value, step } = *self;
        Self::parse(input, recon, key, name, operand, value, step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::StringInput;

    fn attr(text: &str) -> Parser<Item> {
        ReconParser.parse_attr(&mut StringInput::new(text))
    }

    #[test]
    fn test_bare_attr() {
        assert_eq!(attr("@tag").bind(), Item::attr("tag", Value::Extant));
        assert_eq!(attr("@tag()").bind(), Item::attr("tag", Value::Extant));
        assert_eq!(attr("@tag( \n )").bind(), Item::attr("tag", Value::Extant));
    }

    #[test]
    fn test_quoted_name() {
        assert_eq!(attr("@\"a b\"(1)").bind(), Item::attr("a b", 1));
    }

    #[test]
    fn test_attr_with_slots() {
        assert_eq!(
            attr("@point(x:1,y:2)").bind(),
            Item::attr(
                "point",
                Value::record(vec![Item::slot("x", 1), Item::slot("y", 2)])
            )
        );
    }

    #[test]
    fn test_attr_errors() {
        assert!(attr("@1").is_error());
        assert!(attr("@a(1").is_error());
        assert!(attr("@a(1 2)").is_error());
    }

    #[test]
    fn test_every_split_point() {
        let text = "@point( x : 1 , y : 2 )";
        let whole = attr(text).bind();
        for split in 1..text.len() {
            let mut first = StringInput::new(&text[..split]).as_part(true);
            let parser = ReconParser.parse_attr(&mut first);
            let parsed = if parser.is_cont() {
                let mut rest = StringInput::new(&text[split..]).with_mark(first.mark().clone());
                parser.feed(&mut rest)
            } else {
                parser
            };
            assert_eq!(parsed.bind(), whole, "split at {}", split);
        }
    }
}
