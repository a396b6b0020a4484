//! Literal productions: strings, identifiers, numbers, data.

use super::{suspend, Feed, Parser};
use crate::chars::{base64_value, hex_value, is_ident_char, is_ident_start, ESCAPES};
use crate::diagnostic::Diagnostic;
use crate::input::{Input, InputState};
use crate::model::{Num, Value};

// =============================================================================
// Strings
// =============================================================================

/// `"text"` or `'text'` with backslash escapes.
pub(crate) struct StringParser {
    text: String,
    quote: char,
    code: u32,
    digits: u8,
    step: u8,
}

impl StringParser {
    pub(crate) fn parse(
        input: &mut dyn Input,
        mut text: String,
        mut quote: char,
        mut code: u32,
        mut digits: u8,
        mut step: u8,
    ) -> Parser<String> {
        if step == 1 {
            match input.peek() {
                Some(c @ ('"' | '\'')) => {
                    input.step();
                    quote = c;
                    step = 2;
                }
                Some(_) => return Parser::Error(Diagnostic::expected("string", input)),
                None => {
                    let next = StringParser { text, quote, code, digits, step };
                    return suspend(input, "string", next);
                }
            }
        }
        loop {
            if step == 2 {
                while let Some(c) = input.peek() {
                    input.step();
                    if c == quote {
                        return Parser::Done(text);
                    } else if c == '\\' {
                        step = 3;
                        break;
                    } else {
                        text.push(c);
                    }
                }
            }
            if step == 3 {
                match input.peek() {
                    Some('u') => {
                        input.step();
                        code = 0;
                        digits = 0;
                        step = 4;
                    }
                    Some(c) => match ESCAPES.get(&c) {
                        Some(&unescaped) => {
                            input.step();
                            text.push(unescaped);
                            step = 2;
                            continue;
                        }
                        None => return Parser::Error(Diagnostic::expected("escape character", input)),
                    },
                    None => {}
                }
            }
            if step == 4 {
                match unicode_escape(input, &mut code, &mut digits) {
                    Some(Ok(c)) => {
                        text.push(c);
                        step = 2;
                        continue;
                    }
                    Some(Err(diagnostic)) => return Parser::Error(diagnostic),
                    None => {}
                }
            }
            break;
        }
        let what = match step {
            3 => "escape character",
            4 => "hex digit",
            _ => "closing quote",
        };
        suspend(input, what, StringParser { text, quote, code, digits, step })
    }
}

impl Feed<String> for StringParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<String> {
        let StringParser { text, quote, code, digits, step } = *self;
        Self::parse(input, text, quote, code, digits, step)
    }
}

/// Accumulate the four hex digits of a `\u` escape.
///
/// Returns `None` when the cursor ran out first.
pub(crate) fn unicode_escape(
    input: &mut dyn Input,
    code: &mut u32,
    digits: &mut u8,
) -> Option<Result<char, Diagnostic>> {
    while *digits < 4 {
        let c = input.peek()?;
        match hex_value(c) {
            Some(d) => {
                input.step();
                *code = (*code << 4) | d;
                *digits += 1;
            }
            None => return Some(Err(Diagnostic::expected("hex digit", input))),
        }
    }
    Some(char::from_u32(*code).ok_or_else(|| {
        Diagnostic::message(format!("invalid unicode escape \\u{:04X}", code), input)
    }))
}

// =============================================================================
// Identifiers
// =============================================================================

pub(crate) struct IdentParser {
    text: String,
    step: u8,
}

impl IdentParser {
    pub(crate) fn parse(input: &mut dyn Input, mut text: String, mut step: u8) -> Parser<String> {
        if step == 1 {
            match input.peek() {
                Some(c) if is_ident_start(c) => {
                    input.step();
                    text.push(c);
                    step = 2;
                }
                Some(_) => return Parser::Error(Diagnostic::expected("identifier", input)),
                None => return suspend(input, "identifier", IdentParser { text, step }),
            }
        }
        while let Some(c) = input.peek() {
            if !is_ident_char(c) {
                return Parser::Done(text);
            }
            input.step();
            text.push(c);
        }
        match input.state() {
            InputState::Empty => Parser::cont(IdentParser { text, step }),
            InputState::Error => Parser::Error(Diagnostic::trap(input)),
            _ => Parser::Done(text),
        }
    }
}

impl Feed<String> for IdentParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<String> {
        Self::parse(input, self.text, self.step)
    }
}

/// `true`/`false` read as booleans; any other identifier is text.
pub(crate) fn ident_value(ident: String) -> Value {
    match crate::chars::KEYWORDS.get(ident.as_str()) {
        Some(&b) => Value::Bool(b),
        None => Value::Text(ident),
    }
}

// =============================================================================
// Numbers
// =============================================================================

#[derive(Debug, Clone, Default)]
pub(crate) struct NumberState {
    negative: bool,
    /// Integer accumulator, signed as it goes so `i64::MIN` fits.
    value: i64,
    /// Literal text for the float path.
    text: String,
    float: bool,
    hex_digits: u32,
}

impl NumberState {
    /// State after a `-` that the prefix parser already consumed.
    pub(crate) fn negative() -> Self {
        Self {
            negative: true,
            text: "-".to_string(),
            ..Self::default()
        }
    }

    fn push_digit(&mut self, c: char) {
        self.text.push(c);
        if self.float {
            return;
        }
        let d = c as i64 - '0' as i64;
        let next = self.value.checked_mul(10).and_then(|v| {
            if self.negative {
                v.checked_sub(d)
            } else {
                v.checked_add(d)
            }
        });
        match next {
            Some(v) => self.value = v,
            // Too large for i64: fall back to a float literal.
            None => self.float = true,
        }
    }

    fn finish(self, input: &dyn Input) -> Parser<Value> {
        if self.float {
            match self.text.parse::<f64>() {
                Ok(f) => Parser::Done(Value::Num(Num::Float(f))),
                Err(_) => Parser::Error(Diagnostic::message(format!("invalid number {}", self.text), input)),
            }
        } else {
            Parser::Done(Value::Num(Num::Int(self.value)))
        }
    }
}

/// Decimal integers and floats, and `0x` hexadecimal integers.
pub(crate) struct NumberParser {
    state: NumberState,
    step: u8,
}

impl NumberParser {
    pub(crate) fn parse(input: &mut dyn Input, mut state: NumberState, mut step: u8) -> Parser<Value> {
        loop {
            let Some(c) = input.peek() else { break };
            match step {
                // sign
                1 => {
                    if c == '-' {
                        input.step();
                        state.negative = true;
                        state.text.push('-');
                    }
                    step = 2;
                }
                // first digit
                2 => {
                    if !c.is_ascii_digit() {
                        return Parser::Error(Diagnostic::expected("digit", input));
                    }
                    input.step();
                    state.push_digit(c);
                    step = if c == '0' { 3 } else { 4 };
                }
                // after a leading zero
                3 => {
                    if c == 'x' {
                        input.step();
                        step = 10;
                    } else {
                        step = 4;
                    }
                }
                // integer digits
                4 => {
                    if c.is_ascii_digit() {
                        input.step();
                        state.push_digit(c);
                    } else if c == '.' {
                        input.step();
                        state.text.push('.');
                        state.float = true;
                        step = 5;
                    } else if c == 'e' || c == 'E' {
                        input.step();
                        state.text.push('e');
                        state.float = true;
                        step = 7;
                    } else {
                        return state.finish(input);
                    }
                }
                // first fraction digit
                5 => {
                    if !c.is_ascii_digit() {
                        return Parser::Error(Diagnostic::expected("digit", input));
                    }
                    input.step();
                    state.text.push(c);
                    step = 6;
                }
                // fraction digits
                6 => {
                    if c.is_ascii_digit() {
                        input.step();
                        state.text.push(c);
                    } else if c == 'e' || c == 'E' {
                        input.step();
                        state.text.push('e');
                        step = 7;
                    } else {
                        return state.finish(input);
                    }
                }
                // exponent sign
                7 => {
                    if c == '+' || c == '-' {
                        input.step();
                        state.text.push(c);
                    }
                    step = 8;
                }
                // first exponent digit
                8 => {
                    if !c.is_ascii_digit() {
                        return Parser::Error(Diagnostic::expected("digit", input));
                    }
                    input.step();
                    state.text.push(c);
                    step = 9;
                }
                // exponent digits
                9 => {
                    if !c.is_ascii_digit() {
                        return state.finish(input);
                    }
                    input.step();
                    state.text.push(c);
                }
                // hex digits
                _ => match hex_value(c) {
                    Some(d) => {
                        input.step();
                        let d = d as i64;
                        let next = state.value.checked_mul(16).and_then(|v| {
                            if state.negative {
                                v.checked_sub(d)
                            } else {
                                v.checked_add(d)
                            }
                        });
                        match next {
                            Some(v) => state.value = v,
                            None => return Parser::Error(Diagnostic::message("hex literal overflow", input)),
                        }
                        state.hex_digits += 1;
                    }
                    None if state.hex_digits == 0 => {
                        return Parser::Error(Diagnostic::expected("hex digit", input));
                    }
                    None => return state.finish(input),
                },
            }
        }
        match input.state() {
            InputState::Empty => Parser::cont(NumberParser { state, step }),
            InputState::Error => Parser::Error(Diagnostic::trap(input)),
            _ => match step {
                3 | 4 | 6 | 9 => state.finish(input),
                10 if state.hex_digits > 0 => state.finish(input),
                10 => Parser::Error(Diagnostic::expected("hex digit", input)),
                _ => Parser::Error(Diagnostic::expected("digit", input)),
            },
        }
    }
}

impl Feed<Value> for NumberParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        Self::parse(input, self.state, self.step)
    }
}

// =============================================================================
// Data
// =============================================================================

#[derive(Debug, Clone, Default)]
pub(crate) struct DataState {
    data: Vec<u8>,
    quad: [u8; 4],
    count: usize,
}

impl DataState {
    fn flush(&mut self, count: usize) {
        let q = &self.quad;
        self.data.push((q[0] << 2) | (q[1] >> 4));
        if count > 2 {
            self.data.push((q[1] << 4) | (q[2] >> 2));
        }
        if count > 3 {
            self.data.push((q[2] << 6) | q[3]);
        }
        self.count = 0;
    }
}

/// `%` followed by padded Base64.
pub(crate) struct DataParser {
    state: DataState,
    step: u8,
}

impl DataParser {
    pub(crate) fn parse(input: &mut dyn Input, mut state: DataState, mut step: u8) -> Parser<Value> {
        if step == 1 {
            match input.peek() {
                Some('%') => {
                    input.step();
                    step = 2;
                }
                Some(_) => return Parser::Error(Diagnostic::expected("'%'", input)),
                None => return suspend(input, "'%'", DataParser { state, step }),
            }
        }
        if step == 2 {
            while let Some(c) = input.peek() {
                if let Some(sextet) = base64_value(c) {
                    input.step();
                    state.quad[state.count] = sextet;
                    state.count += 1;
                    if state.count == 4 {
                        state.flush(4);
                    }
                } else if c == '=' && state.count >= 2 {
                    input.step();
                    if state.count == 3 {
                        state.quad[3] = 0;
                        state.flush(3);
                        return Parser::Done(Value::Data(state.data));
                    }
                    step = 3;
                    break;
                } else if state.count == 0 {
                    return Parser::Done(Value::Data(state.data));
                } else {
                    return Parser::Error(Diagnostic::expected("base64 digit", input));
                }
            }
            if step == 2 {
                return match input.state() {
                    InputState::Empty => Parser::cont(DataParser { state, step }),
                    InputState::Error => Parser::Error(Diagnostic::trap(input)),
                    _ if state.count == 0 => Parser::Done(Value::Data(state.data)),
                    _ => Parser::Error(Diagnostic::expected("base64 digit", input)),
                };
            }
        }
        match input.peek() {
            Some('=') => {
                input.step();
                state.quad[2] = 0;
                state.quad[3] = 0;
                state.flush(2);
                Parser::Done(Value::Data(state.data))
            }
            Some(_) => Parser::Error(Diagnostic::expected("'='", input)),
            None => suspend(input, "'='", DataParser { state, step }),
        }
    }
}

impl Feed<Value> for DataParser {
    fn feed(self: Box<Self>, input: &mut dyn Input) -> Parser<Value> {
        Self::parse(input, self.state, self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::StringInput;
    use crate::parser::ReconParser;

    fn number(text: &str) -> Parser<Value> {
        ReconParser.parse_number(&mut StringInput::new(text))
    }

    #[test]
    fn test_integers() {
        assert_eq!(number("0").bind(), Value::from(0));
        assert_eq!(number("-17").bind(), Value::from(-17));
        assert_eq!(number("0x1F").bind(), Value::from(31));
        assert_eq!(number("-9223372036854775808").bind(), Value::from(i64::MIN));
    }

    #[test]
    fn test_floats() {
        assert_eq!(number("1.5").bind(), Value::from(1.5));
        assert_eq!(number("2e3").bind(), Value::from(2000.0));
        assert_eq!(number("-1.25E-2").bind(), Value::from(-0.0125));
        assert_eq!(number("99999999999999999999").bind(), Value::from(1e20));
    }

    #[test]
    fn test_number_errors() {
        assert!(number("1.").is_error());
        assert!(number("1e").is_error());
        assert!(number("0x").is_error());
        assert!(number("-").is_error());
    }

    #[test]
    fn test_number_stops_at_non_digit() {
        let mut input = StringInput::new("12,");
        assert_eq!(ReconParser.parse_number(&mut input).bind(), Value::from(12));
        assert_eq!(input.head(), ',');
    }

    #[test]
    fn test_strings() {
        let parse = |text: &str| ReconParser.parse_string(&mut StringInput::new(text));
        assert_eq!(parse(r#""a\"b""#).bind(), "a\"b");
        assert_eq!(parse(r#"'it\'s'"#).bind(), "it's");
        assert_eq!(parse(r#""é\n""#).bind(), "é\n");
        assert!(parse(r#""\q""#).is_error());
        assert!(parse(r#""open"#).is_error());
    }

    #[test]
    fn test_string_escape_split_across_chunks() {
        let mut input = StringInput::new("\"a\\u00").as_part(true);
        let parser = ReconParser.parse_string(&mut input);
        assert!(parser.is_cont());
        let mut input = StringInput::new("41\"");
        assert_eq!(parser.feed(&mut input).bind(), "aA");
    }

    #[test]
    fn test_ident_keywords() {
        assert_eq!(ident_value("true".into()), Value::Bool(true));
        assert_eq!(ident_value("truth".into()), Value::text("truth"));
    }

    #[test]
    fn test_data() {
        let data = |text: &str| ReconParser.parse_data(&mut StringInput::new(text));
        assert_eq!(data("%").bind(), Value::Data(vec![]));
        assert_eq!(data("%AAEC").bind(), Value::Data(vec![0, 1, 2]));
        assert_eq!(data("%AAE=").bind(), Value::Data(vec![0, 1]));
        assert_eq!(data("%AA==").bind(), Value::Data(vec![0]));
        assert_eq!(data("%aGVsbG8=").bind(), Value::Data(b"hello".to_vec()));
        assert!(data("%AAE").is_error());
        assert!(data("%A=").is_error());
    }
}
