//! Property-based tests for the parser and writer
//!
//! These verify invariants that must hold for ANY input, not just crafted
//! examples. proptest generates inputs and shrinks failures to minimal cases.

use proptest::prelude::*;
use recon_core::{recon, BinaryOp, Item, OutputBuffer, ReconWriter, StreamingParser, UnaryOp, Value};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 200,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    }
}

// =============================================================================
// Strategies
// =============================================================================

fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z_][a-z0-9_-]{0,8}",
        "[ -~]{0,12}",
        any::<String>().prop_map(|s| s.chars().take(12).collect()),
    ]
}

/// Scalars the writer reproduces exactly.
fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e12..1.0e12f64).prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..12).prop_map(Value::Data),
        text().prop_map(Value::text),
    ]
}

/// Values that round-trip exactly. `Absent` has no text of its own and is
/// never generated.
fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 48, 6, |inner| {
        let attr = ("[a-z][a-z0-9]{0,6}", prop_oneof![Just(Value::Extant), inner.clone()])
            .prop_map(|(key, value)| Item::attr(key, value));
        let item = prop_oneof![
            (text(), prop_oneof![Just(Value::Extant), inner.clone()]).prop_map(|(key, value)| Item::slot(key, value)),
            inner.prop_map(Item::value),
        ];
        (prop::collection::vec(attr, 0..3), prop::collection::vec(item, 0..5)).prop_map(|(attrs, items)| {
            let mut all = attrs;
            all.extend(items);
            Value::record(all)
        })
    })
}

/// Operator trees whose operands may be `Absent`. These are written as
/// valid text but do not round-trip: `Absent` comes back as `Extant`.
fn operation() -> impl Strategy<Value = Value> {
    let operand = prop_oneof![
        Just(Value::Absent),
        Just(Value::Extant),
        any::<i32>().prop_map(Value::from),
        "[a-z][a-z0-9]{0,5}".prop_map(Value::text),
    ];
    operand.prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(lhs, rhs)| Value::binary(BinaryOp::Plus, lhs, rhs)),
            inner.clone().prop_map(|operand| Value::unary(UnaryOp::Not, operand)),
            (inner.clone(), inner).prop_map(|(func, args)| Value::invoke(func, args)),
        ]
    })
}

// =============================================================================
// Property: Parser Never Panics
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// Any text yields a value or a diagnostic.
    #[test]
    fn parser_never_panics(input in any::<String>()) {
        let _ = recon::parse(&input);
    }

    /// Recon-heavy alphabet, much more likely to reach deep states.
    #[test]
    fn parser_never_panics_recon_alphabet(input in "[a-z0-9 @$%#:,;(){}\\[\\]<>=!|&^+*/.?\"'\\\\\n-]{0,200}") {
        let _ = recon::parse(&input);
    }

    /// Arbitrary bytes through the streaming parser, malformed UTF-8 included.
    #[test]
    fn streaming_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..200), split in 0usize..200) {
        let split = split.min(bytes.len());
        let mut parser = StreamingParser::new();
        parser.feed_bytes(&bytes[..split]);
        parser.feed_bytes(&bytes[split..]);
        let _ = parser.finish();
    }
}

// =============================================================================
// Property: Writer and Parser Agree
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// Written text parses back to the value it was written from.
    #[test]
    fn written_text_parses_back(value in value()) {
        let text = recon::to_string(&value);
        let parsed = recon::parse(&text);
        prop_assert_eq!(parsed.as_ref(), Ok(&value), "text: {}", text);
    }

    /// Operators with missing operands still write text that parses.
    #[test]
    fn operators_write_parseable_text(value in operation()) {
        let text = recon::to_string(&value);
        prop_assert!(recon::parse_value(&text).is_ok(), "text: {}", text);
        prop_assert_eq!(recon::size_of(&value), text.len());
    }

    /// Size prediction matches the bytes actually written.
    #[test]
    fn size_matches_written_length(value in value()) {
        prop_assert_eq!(recon::size_of(&value), recon::to_string(&value).len());
        prop_assert_eq!(ReconWriter.size_of_value(&value), value.to_string().len());
    }

    /// A bounded buffer produces the same bytes as an unbounded one.
    #[test]
    fn suspension_does_not_change_output(value in value(), capacity in 1usize..8) {
        let mut output = OutputBuffer::new(capacity);
        let mut writer = ReconWriter.write_block(&value, &mut output);
        let mut bytes = Vec::new();
        while writer.is_cont() {
            bytes.extend(output.drain());
            writer = writer.pull(&mut output);
        }
        prop_assert!(writer.is_done());
        bytes.extend(output.bind());
        prop_assert_eq!(String::from_utf8(bytes).unwrap(), recon::to_string(&value));
    }

    /// Parsing a document split anywhere matches parsing it whole.
    #[test]
    fn split_parse_matches_whole(value in value(), cut in any::<prop::sample::Index>()) {
        let text = recon::to_string(&value);
        let at = cut.index(text.len() + 1);
        let mut parser = StreamingParser::new();
        parser.feed_bytes(&text.as_bytes()[..at]);
        parser.feed_bytes(&text.as_bytes()[at..]);
        prop_assert_eq!(parser.finish(), recon::parse(&text));
    }
}
