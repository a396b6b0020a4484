//! `$` followed by the selector's steps.

use super::{Form, Pull, ReconWriter, Writer};
use crate::chars::is_ident;
use crate::model::{Selector, Value};
use crate::output::Output;

/// A `Get` key written as a bare name rather than `{key}`.
fn bare_key(key: &Value) -> Option<&str> {
    match key {
        Value::Text(text) if is_ident(text) => Some(text),
        _ => None,
    }
}

fn symbol(selector: &Selector) -> &'static str {
    match selector {
        Selector::Keys { .. } => "*:",
        Selector::Values { .. } => ":*",
        Selector::Children { .. } => "*",
        Selector::Descendants { .. } => "**",
        _ => "",
    }
}

pub(crate) struct SelectorWriter<'a> {
    recon: ReconWriter,
    /// The step being written.
    current: &'a Selector,
    first: bool,
    part: Option<Writer<'a>>,
    index: usize,
    step: u8,
}

impl<'a> SelectorWriter<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn write(
        output: &mut dyn Output,
        recon: ReconWriter,
        mut current: &'a Selector,
        mut first: bool,
        mut part: Option<Writer<'a>>,
        mut index: usize,
        mut step: u8,
    ) -> Writer<'a> {
        macro_rules! suspended {
            () => {
                Writer::cont(SelectorWriter { recon, current, first, part, index, step })
            };
        }
        if step == 1 {
            token!(output, index, "$", suspended!());
            step = 2;
        }
        loop {
            if step == 2 {
                match current {
                    Selector::Identity => return Writer::Done,
                    Selector::Filter { .. } => {}
                    _ if first => {}
                    _ => token!(output, index, ".", suspended!()),
                }
                step = 3;
            }
            if step == 3 {
                if let Selector::GetAttr { .. } = current {
                    token!(output, index, "@", suspended!());
                }
                step = 4;
            }
            match current {
                Selector::Get { key, .. } => match bare_key(key) {
                    Some(name) => nested!(output, part, |output| recon.write_text(name, output), suspended!()),
                    None => nested!(
                        output,
                        part,
                        |output| recon.write_group(key, Form::Block, "{", "}", output),
                        suspended!()
                    ),
                },
                Selector::GetAttr { key, .. } => {
                    nested!(output, part, |output| recon.write_text(key, output), suspended!())
                }
                Selector::GetItem { index: item, .. } => {
                    token!(output, index, &item.to_string(), suspended!())
                }
                Selector::Filter { predicate, .. } => nested!(
                    output,
                    part,
                    |output| recon.write_group(predicate, Form::Value, "[", "]", output),
                    suspended!()
                ),
                other => token!(output, index, symbol(other), suspended!()),
            }
            match current.then() {
                Some(then) => current = then,
                None => return Writer::Done,
            }
            first = false;
            step = 2;
        }
    }

    pub(crate) fn size_of(recon: ReconWriter, selector: &Selector) -> usize {
        let mut size = 1;
        let mut first = true;
        let mut current = selector;
        while let Some(then) = current.then() {
            if !first && !matches!(current, Selector::Filter { .. }) {
                size += 1;
            }
            size += match current {
                Selector::Get { key, .. } => match bare_key(key) {
                    Some(name) => name.len(),
                    None => 2 + recon.size_of_block(key),
                },
                Selector::GetAttr { key, .. } => 1 + recon.size_of_text(key),
                Selector::GetItem { index, .. } => index.to_string().len(),
                Selector::Filter { predicate, .. } => 2 + recon.size_of_value(predicate),
                other => symbol(other).len(),
            };
            first = false;
            current = then;
        }
        size
    }
}

impl<'a> Pull<'a> for SelectorWriter<'a> {
    fn pull(self: Box<Self>, output: &mut dyn Output) -> Writer<'a> {
        let SelectorWriter { recon, current, first, part, index, step } = *self;
        Self::write(output, recon, current, first, part, index, step)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{BinaryOp, Selector, Value};
    use crate::output::StringOutput;
    use crate::writer::ReconWriter;

    fn write(selector: Selector) -> String {
        let value = Value::Selector(selector);
        let mut output = StringOutput::new();
        assert!(ReconWriter.write_value(&value, &mut output).is_done());
        let text = output.bind();
        assert_eq!(ReconWriter.size_of_value(&value), text.len(), "{}", text);
        text
    }

    #[test]
    fn test_identity() {
        assert_eq!(write(Selector::Identity), "$");
    }

    #[test]
    fn test_steps() {
        let path = Selector::get("a").append(Selector::get_item(10)).append(Selector::get_attr("id"));
        assert_eq!(write(path), "$a.10.@id");
        let wild = Selector::children()
            .append(Selector::descendants())
            .append(Selector::keys())
            .append(Selector::values());
        assert_eq!(write(wild), "$*.**.*:.:*");
        assert_eq!(write(Selector::get("a b")), "${\"a b\"}");
        assert_eq!(write(Selector::get_attr("x y")), "$@\"x y\"");
    }

    #[test]
    fn test_filter() {
        let predicate = Value::binary(BinaryOp::Gt, Value::text("b"), Value::from(1));
        assert_eq!(write(Selector::get("a").append(Selector::filter(predicate.clone()))), "$a[b > 1]");
        assert_eq!(write(Selector::filter(predicate).append(Selector::get("c"))), "$[b > 1].c");
    }
}
