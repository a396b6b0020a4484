//! Operator productions: lambda, conditional, the binary cascade, prefix.
//!
//! Two cross-level couplings are load-bearing:
//!
//! - `=>`: the comparison level consumes the `=`, sees `>` and hands its
//!   left operand back. The lambda level only ever sees the `>`.
//! - `||` and `&&`: the bitwise level consumes the first character, sees
//!   the second and hands its left operand back. The logical level then
//!   consumes the single remaining character.

use super::literal::{NumberParser, NumberState};
use super::{skip_spaces, Feed, Parser, ReconParser};
use crate::diagnostic::Diagnostic;
use crate::input::{Input, InputState};
use crate::model::{BinaryOp, UnaryOp, Value};

/// Binary precedence levels, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Or,
    And,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Comparison,
    Additive,
    Multiplicative,
}

impl Level {
    /// The next tighter binary level; `None` below multiplicative, where
    /// operands are prefix expressions.
    pub fn tighter(self) -> Option<Level> {
        match self {
            Level::Or => Some(Level::And),
            Level::And => Some(Level::BitwiseOr),
            Level::BitwiseOr => Some(Level::BitwiseXor),
            Level::BitwiseXor => Some(Level::BitwiseAnd),
            Level::BitwiseAnd => Some(Level::Comparison),
            Level::Comparison => Some(Level::Additive),
            Level::Additive => Some(Level::Multiplicative),
            Level::Multiplicative => None,
        }
    }

    pub fn of(op: BinaryOp) -> Level {
        match op {
            BinaryOp::Or => Level::Or,
            BinaryOp::And => Level::And,
            BinaryOp::BitwiseOr => Level::BitwiseOr,
            BinaryOp::BitwiseXor => Level::BitwiseXor,
            BinaryOp::BitwiseAnd => Level::BitwiseAnd,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Ge | BinaryOp::Gt => {
                Level::Comparison
            }
            BinaryOp::Plus | BinaryOp::Minus => Level::Additive,
            BinaryOp::Times | BinaryOp::Divide | BinaryOp::Modulo => Level::Multiplicative,
        }
    }

    /// Writer precedence of operators at this level.
    pub fn precedence(self) -> u8 {
        match self {
            Level::Or => 3,
            Level::And => 4,
            Level::BitwiseOr => 5,
            Level::BitwiseXor => 6,
            Level::BitwiseAnd => 7,
            Level::Comparison => 8,
            Level::Additive => 9,
            Level::Multiplicative => 10,
        }
    }

    /// What `c` starts at this level.
    fn begin(self, c: char) -> Option<InfixStep> {
        let op = match (self, c) {
            (Level::Or, '|') => BinaryOp::Or,
            (Level::And, '&') => BinaryOp::And,
            (Level::BitwiseOr, '|')
            | (Level::BitwiseAnd, '&')
            | (Level::Comparison, '<' | '>' | '=' | '!') => return Some(InfixStep::Token(c)),
            (Level::BitwiseXor, '^') => BinaryOp::BitwiseXor,
            (Level::Additive, '+') => BinaryOp::Plus,
            (Level::Additive, '-') => BinaryOp::Minus,
            (Level::Multiplicative, '*') => BinaryOp::Times,
            (Level::Multiplicative, '/') => BinaryOp::Divide,
            (Level::Multiplicative, '%') => BinaryOp::Modulo,
            _ => return None,
        };
        Some(InfixStep::Rhs(op))
    }
}

impl ReconParser {
    pub(crate) fn parse_operand(self, input: &mut dyn Input, level: Level) -> Parser<Value> {
        match level.tighter() {
            Some(tighter) => self.parse_infix_operator(input, tighter),
            None => self.parse_prefix_operator(input),
        }
    }
}

// =============================================================================
// Lambda
// =============================================================================

/// `bindings => template`
pub(crate) struct LambdaFuncParser {
    recon: ReconParser,
    bindings: Option<Value>,
    operand: Option<Parser<Value>>,
    step: u8,
}

impl LambdaFuncParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        mut bindings: Option<Value>,
        operand: Option<Parser<Value>>,
        mut step: u8,
    ) -> Parser<Value> {
        let mut operand = operand;
        if step == 1 {
            match Parser::resume(operand.take(), input, |input| recon.parse_conditional_operator(input)) {
                Parser::Done(value) if !value.is_distinct() => return Parser::Done(value),
                Parser::Done(value) => {
                    bindings = Some(value);
                    step = 2;
                }
                Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                cont => return Parser::cont(LambdaFuncParser { recon, bindings, operand: Some(cont), step }),
            }
        }
        if step == 2 {
            skip_spaces(input);
            match input.peek() {
                // `=` was consumed by the comparison level.
                Some('>') => {
                    input.step();
                    step = 3;
                }
                Some(_) => return Parser::Done(bindings.unwrap_or_default()),
                None => {
                    return match input.state() {
                        InputState::Empty => Parser::cont(LambdaFuncParser { recon, bindings, operand, step }),
                        InputState::Error => Parser::Error(Diagnostic::trap(input)),
                        _ => Parser::Done(bindings.unwrap_or_default()),
                    }
                }
            }
        }
        match Parser::resume(operand, input, |input| recon.parse_conditional_operator(input)) {
            Parser::Done(template) if template.is_distinct() => {
                Parser::Done(Value::lambda(bindings.unwrap_or_default(), template))
            }
            Parser::Done(_) => Parser::Error(Diagnostic::expected("lambda template", input)),
            Parser::Error(diagnostic) => Parser::Error(diagnostic),
            cont => Parser::cont(LambdaFuncParser { recon, bindings, operand: Some(cont), step }),
        }
    }
}

impl Feed<Value> for LambdaFuncParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        let LambdaFuncParser { recon, bindings, operand, step } = *self;
        Self::parse(input, recon, bindings, operand, step)
    }
}

// =============================================================================
// Conditional
// =============================================================================

/// `test ? then : otherwise`
pub(crate) struct ConditionalOperatorParser {
    recon: ReconParser,
    test: Option<Value>,
    then: Option<Value>,
    operand: Option<Parser<Value>>,
    step: u8,
}

impl ConditionalOperatorParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        mut test: Option<Value>,
        mut then: Option<Value>,
        mut operand: Option<Parser<Value>>,
        mut step: u8,
    ) -> Parser<Value> {
        macro_rules! suspended {
            ($operand:expr) => {
                Parser::cont(ConditionalOperatorParser { recon, test, then, operand: $operand, step })
            };
        }
        if step == 1 {
            match Parser::resume(operand.take(), input, |input| recon.parse_or_operator(input)) {
                Parser::Done(value) if !value.is_distinct() => return Parser::Done(value),
                Parser::Done(value) => {
                    test = Some(value);
                    step = 2;
                }
                Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                cont => return suspended!(Some(cont)),
            }
        }
        if step == 2 {
            skip_spaces(input);
            match input.peek() {
                Some('?') => {
                    input.step();
                    step = 3;
                }
                Some(_) => return Parser::Done(test.unwrap_or_default()),
                None => {
                    return match input.state() {
                        InputState::Empty => suspended!(None),
                        InputState::Error => Parser::Error(Diagnostic::trap(input)),
                        _ => Parser::Done(test.unwrap_or_default()),
                    }
                }
            }
        }
        if step == 3 {
            match Parser::resume(operand.take(), input, |input| recon.parse_conditional_operator(input)) {
                Parser::Done(value) if !value.is_distinct() => {
                    return Parser::Error(Diagnostic::expected("value", input))
                }
                Parser::Done(value) => {
                    then = Some(value);
                    step = 4;
                }
                Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                cont => return suspended!(Some(cont)),
            }
        }
        if step == 4 {
            skip_spaces(input);
            match input.peek() {
                Some(':') => {
                    input.step();
                    step = 5;
                }
                Some(_) => return Parser::Error(Diagnostic::expected("':'", input)),
                None => return super::suspend(input, "':'", ConditionalOperatorParser { recon, test, then, operand, step }),
            }
        }
        match Parser::resume(operand, input, |input| recon.parse_conditional_operator(input)) {
            Parser::Done(otherwise) if otherwise.is_distinct() => Parser::Done(Value::conditional(
                test.unwrap_or_default(),
                then.unwrap_or_default(),
                otherwise,
            )),
            Parser::Done(_) => Parser::Error(Diagnostic::expected("value", input)),
            Parser::Error(diagnostic) => Parser::Error(diagnostic),
            cont => suspended!(Some(cont)),
        }
    }
}

impl Feed<Value> for ConditionalOperatorParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        let ConditionalOperatorParser { recon, test, then, operand, step } = *self;
        Self::parse(input, recon, test, then, operand, step)
    }
}

// =============================================================================
// Binary cascade
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InfixStep {
    /// Parsing the leftmost operand.
    Lhs,
    /// Looking for this level's operator.
    Operator,
    /// First character of a two-character token consumed.
    Token(char),
    /// Operator committed; parsing the right operand.
    Rhs(BinaryOp),
}

/// One left-associative binary level.
pub(crate) struct InfixOperatorParser {
    recon: ReconParser,
    level: Level,
    lhs: Value,
    operand: Option<Parser<Value>>,
    step: InfixStep,
}

impl InfixOperatorParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        level: Level,
        mut lhs: Value,
        mut operand: Option<Parser<Value>>,
        mut step: InfixStep,
    ) -> Parser<Value> {
        loop {
            match step {
                InfixStep::Lhs => {
                    match Parser::resume(operand.take(), input, |input| recon.parse_operand(input, level)) {
                        // Nothing here; let the caller decide.
                        Parser::Done(value) if !value.is_distinct() => return Parser::Done(value),
                        Parser::Done(value) => {
                            lhs = value;
                            step = InfixStep::Operator;
                        }
                        Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                        cont => {
                            return Parser::cont(InfixOperatorParser { recon, level, lhs, operand: Some(cont), step })
                        }
                    }
                }
                InfixStep::Operator => {
                    skip_spaces(input);
                    match input.peek() {
                        Some(c) => match level.begin(c) {
                            Some(next) => {
                                input.step();
                                step = next;
                            }
                            None => return Parser::Done(lhs),
                        },
                        None => {
                            return match input.state() {
                                InputState::Empty => {
                                    Parser::cont(InfixOperatorParser { recon, level, lhs, operand, step })
                                }
                                InputState::Error => Parser::Error(Diagnostic::trap(input)),
                                _ => Parser::Done(lhs),
                            }
                        }
                    }
                }
                InfixStep::Token(first) => {
                    if input.is_empty() {
                        return Parser::cont(InfixOperatorParser { recon, level, lhs, operand, step });
                    }
                    let next = input.peek();
                    let op = match (first, next) {
                        // `||` and `&&` belong to the logical levels.
                        ('|', Some('|')) | ('&', Some('&')) => return Parser::Done(lhs),
                        ('|', _) => BinaryOp::BitwiseOr,
                        ('&', _) => BinaryOp::BitwiseAnd,
                        // `=>` belongs to the lambda level.
                        ('=', Some('>')) => return Parser::Done(lhs),
                        ('=', Some('=')) => BinaryOp::Eq,
                        ('!', Some('=')) => BinaryOp::Ne,
                        ('<', Some('=')) => BinaryOp::Le,
                        ('>', Some('=')) => BinaryOp::Ge,
                        ('<', _) => BinaryOp::Lt,
                        ('>', _) => BinaryOp::Gt,
                        ('=', _) => return Parser::Error(Diagnostic::expected("'=' or '>'", input)),
                        _ => return Parser::Error(Diagnostic::expected("'='", input)),
                    };
                    if matches!(op, BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Le | BinaryOp::Ge) {
                        input.step();
                    }
                    step = InfixStep::Rhs(op);
                }
                InfixStep::Rhs(op) => {
                    match Parser::resume(operand.take(), input, |input| recon.parse_operand(input, level)) {
                        Parser::Done(rhs) if !rhs.is_distinct() => {
                            return Parser::Error(Diagnostic::expected("value", input))
                        }
                        Parser::Done(rhs) => {
                            lhs = Value::binary(op, lhs, rhs);
                            step = InfixStep::Operator;
                        }
                        Parser::Error(diagnostic) => return Parser::Error(diagnostic),
                        cont => {
                            return Parser::cont(InfixOperatorParser { recon, level, lhs, operand: Some(cont), step })
                        }
                    }
                }
            }
        }
    }
}

impl Feed<Value> for InfixOperatorParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        let InfixOperatorParser { recon, level, lhs, operand, step } = *self;
        Self::parse(input, recon, level, lhs, operand, step)
    }
}

// =============================================================================
// Prefix
// =============================================================================

/// `! ~ - +` applied right-recursively.
pub(crate) struct PrefixOperatorParser {
    recon: ReconParser,
    op: Option<UnaryOp>,
    operand: Option<Parser<Value>>,
}

impl PrefixOperatorParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        recon: ReconParser,
        op: Option<UnaryOp>,
        operand: Option<Parser<Value>>,
    ) -> Parser<Value> {
        let op = match op {
            Some(op) => op,
            None => {
                skip_spaces(input);
                match input.peek().and_then(UnaryOp::from_char) {
                    Some(op) => {
                        input.step();
                        op
                    }
                    None if input.is_empty() => {
                        return Parser::cont(PrefixOperatorParser { recon, op: None, operand: None })
                    }
                    // Not an operator: fall through without consuming.
                    None => return recon.parse_invoke_operator(input),
                }
            }
        };
        if op == UnaryOp::Negative && operand.is_none() {
            match input.peek() {
                Some(c) if c.is_ascii_digit() => return NumberParser::parse(input, NumberState::negative(), 2),
                None if input.is_empty() => {
                    return Parser::cont(PrefixOperatorParser { recon, op: Some(op), operand: None })
                }
                _ => {}
            }
        }
        match Parser::resume(operand, input, |input| recon.parse_prefix_operator(input)) {
            Parser::Done(value) if value.is_distinct() => Parser::Done(Value::unary(op, value)),
            Parser::Done(_) => Parser::Error(Diagnostic::expected("value", input)),
            Parser::Error(diagnostic) => Parser::Error(diagnostic),
            cont => Parser::cont(PrefixOperatorParser { recon, op: Some(op), operand: Some(cont) }),
        }
    }
}

impl Feed<Value> for PrefixOperatorParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        Self::parse(input, self.recon, self.op, self.operand)
    }
}
