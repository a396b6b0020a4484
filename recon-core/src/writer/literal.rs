//! Literal writers: text, numbers, booleans, data.

use std::borrow::Cow;

use super::{ready, write_token, Emit, Pull, Writer};
use crate::chars::{is_ident, short_escape, BASE64_DIGITS};
use crate::model::{Num, Value};
use crate::output::Output;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Canonical text of a number: decimal integers, and floats in their
/// shortest round-trip form (always with a `.` or an exponent).
pub fn format_num(num: Num) -> String {
    match num {
        Num::Int(i) => i.to_string(),
        Num::Float(f) => format!("{:?}", f),
    }
}

fn encode_data(data: &[u8]) -> String {
    let mut text = String::with_capacity(size_of_data(data.len()));
    text.push('%');
    for chunk in data.chunks(3) {
        let byte = |i: usize| chunk.get(i).copied().unwrap_or(0) as u32;
        let triple = byte(0) << 16 | byte(1) << 8 | byte(2);
        for i in 0..4 {
            if i <= chunk.len() {
                let sextet = (triple >> (18 - 6 * i)) & 0x3F;
                text.push(BASE64_DIGITS[sextet as usize] as char);
            } else {
                text.push('=');
            }
        }
    }
    text
}

#[inline]
fn size_of_data(len: usize) -> usize {
    1 + 4 * ((len + 2) / 3)
}

/// The whole token for a scalar literal.
pub(crate) fn token_of(value: &Value) -> Cow<'static, str> {
    match value {
        Value::Extant => Cow::Borrowed("()"),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::Num(num) => Cow::Owned(format_num(*num)),
        Value::Data(data) => Cow::Owned(encode_data(data)),
        _ => Cow::Borrowed(""),
    }
}

pub(crate) fn size_of_token(value: &Value) -> usize {
    match value {
        Value::Extant => 2,
        Value::Bool(true) => 4,
        Value::Bool(false) => 5,
        Value::Num(num) => format_num(*num).len(),
        Value::Data(data) => size_of_data(data.len()),
        _ => 0,
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// One fixed token.
pub(crate) struct TokenWriter<'a> {
    token: Cow<'a, str>,
    index: usize,
}

impl<'a> TokenWriter<'a> {
    pub(crate) fn write(output: &mut dyn Output, token: Cow<'a, str>, mut index: usize) -> Writer<'a> {
        match write_token(output, &token, &mut index) {
            Emit::Done => Writer::Done,
            Emit::Full => Writer::cont(TokenWriter { token, index }),
            Emit::Fail(error) => Writer::Error(error),
        }
    }
}

impl<'a> Pull<'a> for TokenWriter<'a> {
    fn pull(self: Box<Self>, output: &mut dyn Output) -> Writer<'a> {
        let TokenWriter { token, index } = *self;
        Self::write(output, token, index)
    }
}

// =============================================================================
// Text
// =============================================================================

/// How one character of a quoted string is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escaped {
    Plain(char),
    Short(char),
    Unicode(u8),
}

impl Escaped {
    fn of(c: char) -> Self {
        match short_escape(c) {
            Some(letter) => Escaped::Short(letter),
            // Every control character is in the first 256 codepoints.
            None if c.is_control() => Escaped::Unicode(c as u32 as u8),
            None => Escaped::Plain(c),
        }
    }

    fn nth(self, i: usize) -> Option<char> {
        match (self, i) {
            (Escaped::Plain(c), 0) => Some(c),
            (Escaped::Short(_) | Escaped::Unicode(_), 0) => Some('\\'),
            (Escaped::Short(letter), 1) => Some(letter),
            (Escaped::Unicode(_), 1) => Some('u'),
            (Escaped::Unicode(_), 2 | 3) => Some('0'),
            (Escaped::Unicode(code), 4) => Some(HEX_DIGITS[(code >> 4) as usize] as char),
            (Escaped::Unicode(code), 5) => Some(HEX_DIGITS[(code & 0xF) as usize] as char),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            Escaped::Plain(c) => c.len_utf8(),
            Escaped::Short(_) => 2,
            Escaped::Unicode(_) => 6,
        }
    }
}

/// Bare identifier, or a double-quoted string.
pub(crate) struct TextWriter<'a> {
    text: &'a str,
    /// Byte offset into the current token, or into `text` while quoting.
    index: usize,
    /// Characters of the current escape already written.
    escape: usize,
    step: u8,
}

impl<'a> TextWriter<'a> {
    pub(crate) fn write(
        output: &mut dyn Output,
        text: &'a str,
        mut index: usize,
        mut escape: usize,
        mut step: u8,
    ) -> Writer<'a> {
        macro_rules! suspended {
            () => {
                Writer::cont(TextWriter { text, index, escape, step })
            };
        }
        if step == 1 {
            step = if is_ident(text) { 5 } else { 2 };
        }
        if step == 5 {
            token!(output, index, text, suspended!());
            return Writer::Done;
        }
        if step == 2 {
            token!(output, index, "\"", suspended!());
            step = 3;
        }
        if step == 3 {
            while let Some(c) = text[index..].chars().next() {
                let escaped = Escaped::of(c);
                while let Some(e) = escaped.nth(escape) {
                    match ready(output) {
                        Emit::Done => {}
                        Emit::Full => return suspended!(),
                        Emit::Fail(error) => return Writer::Error(error),
                    }
                    output.write(e);
                    escape += 1;
                }
                escape = 0;
                index += c.len_utf8();
            }
            index = 0;
            step = 4;
        }
        token!(output, index, "\"", suspended!());
        Writer::Done
    }

    pub(crate) fn size_of(text: &str) -> usize {
        if is_ident(text) {
            text.len()
        } else {
            2 + text.chars().map(|c| Escaped::of(c).size()).sum::<usize>()
        }
    }
}

impl<'a> Pull<'a> for TextWriter<'a> {
    fn pull(self: Box<Self>, output: &mut dyn Output) -> Writer<'a> {
        let TextWriter { text, index, escape, step } = *self;
        Self::write(output, text, index, escape, step)
    }
}
