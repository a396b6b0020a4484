//! One-call helpers over the parser and writer.
//!
//! ```
//! use recon_core::recon;
//!
//! let value = recon::parse("@point(x:1,y:2){}").unwrap();
//! assert_eq!(recon::to_string(&value), "@point(x:1,y:2)");
//! ```

use std::fmt;

use crate::diagnostic::Diagnostic;
use crate::input::{Input, StringInput};
use crate::model::Value;
use crate::output::StringOutput;
use crate::parser::{skip_whitespace, Parser, ReconParser};
use crate::writer::ReconWriter;

fn settle(parsed: Parser<Value>, input: &dyn Input) -> Result<Value, Diagnostic> {
    match parsed {
        Parser::Done(value) => Ok(value),
        Parser::Error(diagnostic) => Err(diagnostic),
        Parser::Cont(_) => Err(Diagnostic::at(input.mark().clone(), "unexpected end of input")),
    }
}

/// Parse a whole document.
pub fn parse(text: &str) -> Result<Value, Diagnostic> {
    let mut input = StringInput::new(text);
    let parsed = ReconParser.parse_document(&mut input);
    settle(parsed, &input)
}

/// Parse exactly one value, surrounded by nothing but whitespace.
pub fn parse_value(text: &str) -> Result<Value, Diagnostic> {
    let mut input = StringInput::new(text);
    skip_whitespace(&mut input);
    let value = settle(ReconParser.parse_value(&mut input), &input)?;
    skip_whitespace(&mut input);
    if input.is_cont() {
        return Err(Diagnostic::unexpected(&input));
    }
    Ok(value)
}

/// Canonical document text of `value`.
pub fn to_string(value: &Value) -> String {
    let mut output = StringOutput::with_capacity(size_of(value));
    // An unbounded string sink never fills or fails.
    let _ = ReconWriter.write_block(value, &mut output);
    output.bind()
}

/// Byte length of [`to_string`]'s result, without writing it.
pub fn size_of(value: &Value) -> usize {
    ReconWriter.size_of_block(value)
}

/// Writes the value form: records keep their braces, unlike [`to_string`].
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = StringOutput::with_capacity(ReconWriter.size_of_value(self));
        match ReconWriter.write_value(self, &mut output) {
            crate::writer::Writer::Done => f.write_str(output.as_str()),
            _ => Err(fmt::Error),
        }
    }
}
