//! Operator writers and parenthesized groups.
//!
//! An operator is written as a short run of segments: fixed tokens, and
//! operands that are parenthesized when they bind looser than their
//! position requires.

use super::{Form, Pull, ReconWriter, Writer, PREFIX_PRECEDENCE, PRIMARY_PRECEDENCE};
use crate::model::{Item, UnaryOp, Value};
use crate::output::Output;
use crate::parser::Level;

fn prefix_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Not => "!",
        UnaryOp::BitwiseNot => "~",
        UnaryOp::Negative => "-",
        UnaryOp::Positive => "+",
    }
}

/// Invocation targets that would otherwise be read differently: `-1(x)`
/// parses as a negative literal and `@a(x)` as an attribute.
fn func_needs_parens(recon: ReconWriter, func: &Value) -> bool {
    match func {
        Value::Num(num) => num.is_negative(),
        Value::Record(record) => matches!(record.items().first(), Some(Item::Attr(_))),
        _ => recon.precedence(func) < PRIMARY_PRECEDENCE,
    }
}

/// True when `value` is written starting with a digit, which a preceding
/// `-` would fold into a negative literal.
fn starts_with_digit(recon: ReconWriter, value: &Value) -> bool {
    match value {
        Value::Num(num) => !num.is_negative(),
        Value::Invoke { func, .. } => !func_needs_parens(recon, func) && starts_with_digit(recon, func),
        _ => false,
    }
}

enum Segment<'a> {
    Token(&'static str),
    /// An operand and whether it needs parentheses.
    Operand(&'a Value, bool),
    /// Invocation arguments.
    Args(&'a Value),
}

fn operand(recon: ReconWriter, value: &Value, min: u8) -> Segment<'_> {
    Segment::Operand(value, recon.precedence(value) < min)
}

/// The `step`th segment of `value`, counting from 1.
fn segment(recon: ReconWriter, value: &Value, step: u8) -> Option<Segment<'_>> {
    let segment = match (value, step) {
        (Value::Unary { op, .. }, 1) => Segment::Token(prefix_symbol(*op)),
        (Value::Unary { op, operand: inner }, 2) => {
            let parens = recon.precedence(inner) < PREFIX_PRECEDENCE
                || (*op == UnaryOp::Negative && starts_with_digit(recon, inner));
            Segment::Operand(inner, parens)
        }
        (Value::Binary { op, lhs, .. }, 1) => operand(recon, lhs, Level::of(*op).precedence()),
        (Value::Binary { .. }, 2 | 4) => Segment::Token(" "),
        (Value::Binary { op, .. }, 3) => Segment::Token(op.symbol()),
        (Value::Binary { op, rhs, .. }, 5) => operand(recon, rhs, Level::of(*op).precedence() + 1),
        (Value::Conditional { test, .. }, 1) => operand(recon, test, Level::Or.precedence()),
        (Value::Conditional { .. }, 2) => Segment::Token(" ? "),
        (Value::Conditional { then, .. }, 3) => operand(recon, then, 2),
        (Value::Conditional { .. }, 4) => Segment::Token(" : "),
        (Value::Conditional { otherwise, .. }, 5) => operand(recon, otherwise, 2),
        (Value::Lambda { bindings, .. }, 1) => operand(recon, bindings, 2),
        (Value::Lambda { .. }, 2) => Segment::Token(" => "),
        (Value::Lambda { template, .. }, 3) => operand(recon, template, 2),
        (Value::Invoke { func, .. }, 1) => Segment::Operand(func, func_needs_parens(recon, func)),
        (Value::Invoke { .. }, 2) => Segment::Token("("),
        (Value::Invoke { args, .. }, 3) => Segment::Args(args),
        (Value::Invoke { .. }, 4) => Segment::Token(")"),
        _ => return None,
    };
    Some(segment)
}

// =============================================================================
// Operators
// =============================================================================

pub(crate) struct OperatorWriter<'a> {
    recon: ReconWriter,
    value: &'a Value,
    part: Option<Writer<'a>>,
    index: usize,
    step: u8,
}

impl<'a> OperatorWriter<'a> {
    pub(crate) fn write(
        output: &mut dyn Output,
        recon: ReconWriter,
        value: &'a Value,
        mut part: Option<Writer<'a>>,
        mut index: usize,
        mut step: u8,
    ) -> Writer<'a> {
        macro_rules! suspended {
            () => {
                Writer::cont(OperatorWriter { recon, value, part, index, step })
            };
        }
        while let Some(segment) = segment(recon, value, step) {
            match segment {
                Segment::Token(token) => token!(output, index, token, suspended!()),
                Segment::Operand(operand, true) => nested!(
                    output,
                    part,
                    |output| recon.write_group(operand, Form::Value, "(", ")", output),
                    suspended!()
                ),
                Segment::Operand(operand, false) => {
                    nested!(output, part, |output| recon.write_value(operand, output), suspended!())
                }
                Segment::Args(args) => {
                    nested!(output, part, |output| recon.write_block_value(args, output), suspended!())
                }
            }
            step += 1;
        }
        Writer::Done
    }

    pub(crate) fn size_of(recon: ReconWriter, value: &Value) -> usize {
        let mut size = 0;
        let mut step = 1;
        while let Some(segment) = segment(recon, value, step) {
            size += match segment {
                Segment::Token(token) => token.len(),
                Segment::Operand(operand, parens) => recon.size_of_value(operand) + if parens { 2 } else { 0 },
                Segment::Args(args) => recon.size_of_block_value(args),
            };
            step += 1;
        }
        size
    }
}

impl<'a> Pull<'a> for OperatorWriter<'a> {
    fn pull(self: Box<Self>, output: &mut dyn Output) -> Writer<'a> {
        let OperatorWriter { recon, value, part, index, step } = *self;
        Self::write(output, recon, value, part, index, step)
    }
}

// =============================================================================
// Groups
// =============================================================================

/// `open value close`.
pub(crate) struct GroupWriter<'a> {
    recon: ReconWriter,
    value: &'a Value,
    form: Form,
    open: &'static str,
    close: &'static str,
    part: Option<Writer<'a>>,
    index: usize,
    step: u8,
}

impl<'a> GroupWriter<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn write(
        output: &mut dyn Output,
        recon: ReconWriter,
        value: &'a Value,
        form: Form,
        open: &'static str,
        close: &'static str,
        mut part: Option<Writer<'a>>,
        mut index: usize,
        mut step: u8,
    ) -> Writer<'a> {
        macro_rules! suspended {
            () => {
                Writer::cont(GroupWriter { recon, value, form, open, close, part, index, step })
            };
        }
        if step == 1 {
            token!(output, index, open, suspended!());
            step = 2;
        }
        if step == 2 {
            nested!(output, part, |output| recon.write_form(value, form, output), suspended!());
            step = 3;
        }
        token!(output, index, close, suspended!());
        Writer::Done
    }
}

impl<'a> Pull<'a> for GroupWriter<'a> {
    fn pull(self: Box<Self>, output: &mut dyn Output) -> Writer<'a> {
        let GroupWriter { recon, value, form, open, close, part, index, step } = *self;
        Self::write(output, recon, value, form, open, close, part, index, step)
    }
}
