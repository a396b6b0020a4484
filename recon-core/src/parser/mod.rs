//! Resumable Recon parser combinators.
//!
//! Every grammar production is a small struct holding its partial state and
//! a `step` tag. Its associated `parse` function advances as far as the
//! cursor allows and returns one of:
//!
//! - `Parser::Done(value)` once the production matched,
//! - `Parser::Error(diagnostic)` on malformed input,
//! - `Parser::Cont(self)` when the cursor ran empty mid-production.
//!
//! Feeding a suspended parser a refilled cursor picks up exactly where it
//! stopped, so a document split at any codepoint parses to the same value
//! as the whole text.
//!
//! # Precedence cascade
//!
//! ```text
//! block ─▶ lambda ─▶ conditional ─▶ or ─▶ and ─▶ bit-or ─▶ bit-xor ─▶ bit-and
//!                                                                       │
//!           primary ◀─ invoke ◀─ prefix ◀─ multiplicative ◀─ additive ◀─ comparison
//! ```
//!
//! Each level parses its operand with the next tighter level and falls
//! through without consuming anything when its own operator does not
//! follow. Primaries return `Value::Absent` on a character that cannot
//! start a value; that is how blocks, records and argument lists find
//! their end.

mod attr;
mod block;
mod literal;
mod markup;
mod operator;
mod primary;
mod selector;

use std::fmt;

pub use operator::Level;

use crate::chars::{is_space, is_whitespace};
use crate::diagnostic::{Diagnostic, PreconditionViolation};
use crate::input::{Input, InputState};
use crate::model::{Item, RecordBuilder, Value, ValueBuilder};

/// A parse in progress, or its outcome.
pub enum Parser<T> {
    /// Needs more input.
    Cont(Box<dyn Feed<T>>),
    Done(T),
    Error(Diagnostic),
}

/// A suspended production.
pub trait Feed<T> {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<T>;
}

impl<T> Parser<T> {
    pub fn cont(next: impl Feed<T> + 'static) -> Self {
        Parser::Cont(Box::new(next))
    }

    /// Resume a suspended parser.
    ///
    /// Feeding a parser that already finished is a caller bug; debug builds
    /// assert, release builds hand the finished parser back unchanged.
    pub fn feed(self, input: &mut dyn Input) -> Parser<T> {
        match self {
            Parser::Cont(next) => next.feed(input),
            finished => {
                debug_assert!(false, "{}", PreconditionViolation::new("feed", finished.state_name()));
                finished
            }
        }
    }

    #[inline]
    pub fn is_cont(&self) -> bool {
        matches!(self, Parser::Cont(_))
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        matches!(self, Parser::Done(_))
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self, Parser::Error(_))
    }

    /// The diagnostic of a failed parser.
    pub fn trap(&self) -> Option<&Diagnostic> {
        match self {
            Parser::Error(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }

    /// The parsed value.
    ///
    /// # Panics
    ///
    /// When the parser is not done.
    pub fn bind(self) -> T {
        match self {
            Parser::Done(value) => value,
            other => panic!("{}", PreconditionViolation::new("bind", other.state_name())),
        }
    }

    /// `Some(Ok)` when done, `Some(Err)` when failed, `None` while suspended.
    pub fn into_result(self) -> Option<Result<T, Diagnostic>> {
        match self {
            Parser::Cont(_) => None,
            Parser::Done(value) => Some(Ok(value)),
            Parser::Error(diagnostic) => Some(Err(diagnostic)),
        }
    }

    pub fn map<U: 'static>(self, f: fn(T) -> U) -> Parser<U>
    where
        T: 'static,
    {
        match self {
            Parser::Done(value) => Parser::Done(f(value)),
            Parser::Error(diagnostic) => Parser::Error(diagnostic),
            cont => Parser::cont(MapParser { parser: cont, f }),
        }
    }

    fn state_name(&self) -> &'static str {
        match self {
            Parser::Cont(_) => "cont",
            Parser::Done(_) => "done",
            Parser::Error(_) => "error",
        }
    }

    /// Feed the sub-parser in flight, or start one.
    #[inline]
    pub(crate) fn resume(
        parser: Option<Parser<T>>,
        input: &mut dyn Input,
        start: impl FnOnce(&mut dyn Input) -> Parser<T>,
    ) -> Parser<T> {
        match parser {
            Some(parser) => parser.feed(input),
            None => start(input),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Parser<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parser::Cont(_) => f.write_str("Cont(..)"),
            Parser::Done(value) => f.debug_tuple("Done").field(value).finish(),
            Parser::Error(diagnostic) => f.debug_tuple("Error").field(diagnostic).finish(),
        }
    }
}

struct MapParser<T, U> {
    parser: Parser<T>,
    f: fn(T) -> U,
}

impl<T: 'static, U: 'static> Feed<U> for MapParser<T, U> {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<U> {
        let MapParser { parser, f } = *self;
        parser.feed(input).map(f)
    }
}

// =============================================================================
// Shared step helpers
// =============================================================================

#[inline]
pub(crate) fn skip_spaces(input: &mut dyn Input) {
    while let Some(c) = input.peek() {
        if !is_space(c) {
            break;
        }
        input.step();
    }
}

#[inline]
pub(crate) fn skip_whitespace(input: &mut dyn Input) {
    while let Some(c) = input.peek() {
        if !is_whitespace(c) {
            break;
        }
        input.step();
    }
}

/// Suspend on an empty cursor, otherwise fail expecting `what`.
pub(crate) fn suspend<T>(input: &dyn Input, what: &str, next: impl Feed<T> + 'static) -> Parser<T> {
    match input.state() {
        InputState::Empty => Parser::cont(next),
        InputState::Error => Parser::Error(Diagnostic::trap(input)),
        InputState::Cont | InputState::Done => Parser::Error(Diagnostic::expected(what, input)),
    }
}

// =============================================================================
// ReconParser
// =============================================================================

/// Grammar dispatcher. Stateless and `Copy`; every combinator carries one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconParser;

impl ReconParser {
    pub fn new() -> Self {
        ReconParser
    }

    /// A whole document: block items up to the end of the stream.
    pub fn parse_document(self, input: &mut dyn Input) -> Parser<Value> {
        block::DocumentParser::parse(input, self, None)
    }

    /// Block items, bound to the simplest value that holds them.
    pub fn parse_block(self, input: &mut dyn Input) -> Parser<Value> {
        block::BlockParser::parse(input, self, ValueBuilder::new(), None, None, 1)
    }

    /// Block items pushed into `builder`.
    pub fn parse_block_into<B>(self, input: &mut dyn Input, builder: B) -> Parser<Value>
    where
        B: crate::model::Builder + 'static,
    {
        block::BlockParser::parse(input, self, builder, None, None, 1)
    }

    /// A single value, lambdas included.
    pub fn parse_value(self, input: &mut dyn Input) -> Parser<Value> {
        self.parse_block_expression(input)
    }

    pub fn parse_block_expression(self, input: &mut dyn Input) -> Parser<Value> {
        self.parse_lambda_func(input)
    }

    pub fn parse_lambda_func(self, input: &mut dyn Input) -> Parser<Value> {
        operator::LambdaFuncParser::parse(input, self, None, None, 1)
    }

    pub fn parse_conditional_operator(self, input: &mut dyn Input) -> Parser<Value> {
        operator::ConditionalOperatorParser::parse(input, self, None, None, None, 1)
    }

    pub fn parse_infix_operator(self, input: &mut dyn Input, level: Level) -> Parser<Value> {
        operator::InfixOperatorParser::parse(input, self, level, Value::Absent, None, operator::InfixStep::Lhs)
    }

    pub fn parse_or_operator(self, input: &mut dyn Input) -> Parser<Value> {
        self.parse_infix_operator(input, Level::Or)
    }

    pub fn parse_prefix_operator(self, input: &mut dyn Input) -> Parser<Value> {
        operator::PrefixOperatorParser::parse(input, self, None, None)
    }

    pub fn parse_invoke_operator(self, input: &mut dyn Input) -> Parser<Value> {
        primary::InvokeOperatorParser::parse(input, self, None, None, None, 1)
    }

    pub fn parse_primary(self, input: &mut dyn Input) -> Parser<Value> {
        primary::PrimaryParser::parse(input, self, None, None, None, None, 1)
    }

    pub fn parse_attr(self, input: &mut dyn Input) -> Parser<Item> {
        attr::AttrParser::parse(input, self, None, None, None, None, 1)
    }

    /// `{` block `}` with items appended to `builder`.
    pub fn parse_record(self, input: &mut dyn Input, builder: RecordBuilder) -> Parser<Value> {
        block::RecordParser::parse(input, self, Some(builder), None, None, 1)
    }

    pub fn parse_markup(self, input: &mut dyn Input) -> Parser<Value> {
        markup::MarkupParser::parse(input, self, markup::MarkupState::default(), None, None, 1)
    }

    pub fn parse_string(self, input: &mut dyn Input) -> Parser<String> {
        literal::StringParser::parse(input, String::new(), '"', 0, 0, 1)
    }

    pub fn parse_ident(self, input: &mut dyn Input) -> Parser<String> {
        literal::IdentParser::parse(input, String::new(), 1)
    }

    pub fn parse_number(self, input: &mut dyn Input) -> Parser<Value> {
        literal::NumberParser::parse(input, literal::NumberState::default(), 1)
    }

    pub fn parse_data(self, input: &mut dyn Input) -> Parser<Value> {
        literal::DataParser::parse(input, literal::DataState::default(), 1)
    }

    pub fn parse_selector(self, input: &mut dyn Input) -> Parser<Value> {
        selector::SelectorParser::parse(input, self, selector::SelectorState::default(), None, 1)
    }
}
