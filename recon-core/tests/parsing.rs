//! Parsing through the public API

use pretty_assertions::assert_eq;
use recon_core::{
    recon, BinaryOp, Input, InputSettings, Item, Parser, ReconParser, Selector, StreamingParser, StringInput, UnaryOp,
    Utf8Input, UtfErrorMode, Value,
};

fn t(s: &str) -> Value {
    Value::text(s)
}

#[test]
fn test_document_of_slots() {
    let value = recon::parse("name: \"Ada\"\nborn: 1815\nalive: false").unwrap();
    let record = value.as_record().unwrap();
    assert_eq!(record.get("name"), Some(&t("Ada")));
    assert_eq!(record.get("born").and_then(Value::as_i64), Some(1815));
    assert_eq!(record.get("alive").and_then(Value::as_bool), Some(false));
    assert_eq!(record.get("missing"), None);
}

#[test]
fn test_attributed_record() {
    let value = recon::parse("@event(id: 7) { kind: click, at: {x: 3, y: 4} }").unwrap();
    let record = value.as_record().unwrap();
    let head = record.head_attr().unwrap();
    assert_eq!(head.key, "event");
    assert_eq!(head.value, Value::record(vec![Item::slot("id", 7)]));
    assert_eq!(record.leading_attrs(), 1);
    assert_eq!(record.get("kind"), Some(&t("click")));
}

#[test]
fn test_lambda_arrow_is_not_a_comparison() {
    // `=` is read by the comparison level and `>` by the lambda level; a
    // regression here turns every lambda into a parse error.
    assert_eq!(
        recon::parse("x => x >= 1").unwrap(),
        Value::lambda(t("x"), Value::binary(BinaryOp::Ge, t("x"), Value::from(1)))
    );
    assert_eq!(
        recon::parse("a == b => c").unwrap(),
        Value::lambda(Value::binary(BinaryOp::Eq, t("a"), t("b")), t("c"))
    );
    assert!(recon::parse("a = b").is_err());
}

#[test]
fn test_logical_and_bitwise_share_characters() {
    assert_eq!(
        recon::parse("a | b || c & d && e").unwrap(),
        Value::binary(
            BinaryOp::Or,
            Value::binary(BinaryOp::BitwiseOr, t("a"), t("b")),
            Value::binary(BinaryOp::And, Value::binary(BinaryOp::BitwiseAnd, t("c"), t("d")), t("e"))
        )
    );
}

#[test]
fn test_negative_literal_versus_operator() {
    assert_eq!(recon::parse("-5").unwrap(), Value::from(-5));
    assert_eq!(recon::parse("-x").unwrap(), Value::unary(UnaryOp::Negative, t("x")));
    assert_eq!(
        recon::parse("3 - -5").unwrap(),
        Value::binary(BinaryOp::Minus, Value::from(3), Value::from(-5))
    );
}

#[test]
fn test_selector_value() {
    assert_eq!(
        recon::parse("$users.0.@id").unwrap(),
        Value::Selector(Selector::get("users").append(Selector::get_item(0)).append(Selector::get_attr("id")))
    );
}

#[test]
fn test_parse_value_helper() {
    assert_eq!(recon::parse_value(" {a, b} ").unwrap(), Value::record(vec![Item::value("a"), Item::value("b")]));
    let error = recon::parse_value("1 2").unwrap_err();
    assert_eq!(error.message, "unexpected '2'");
}

#[test]
fn test_diagnostic_marks_and_render() {
    let source = "a: 1\nb: (2\nc: 3";
    let error = recon::parse(source).unwrap_err();
    assert_eq!(error.mark.line, 3);
    let rendered = error.render(source);
    assert!(rendered.contains("3 | c: 3"), "{}", rendered);
    assert!(rendered.lines().last().unwrap().ends_with('^'));
}

#[test]
fn test_diagnostic_carries_source_id() {
    let mut input = StringInput::new("{").with_id("config.recon");
    let error = ReconParser.parse_document(&mut input).into_result().unwrap().unwrap_err();
    assert_eq!(error.id.as_deref(), Some("config.recon"));
    assert!(error.to_string().starts_with("config.recon:1:2: "), "{}", error);
}

#[test]
fn test_combinators_are_individually_usable() {
    let mut input = StringInput::new("\"hi\\n\" rest");
    assert_eq!(ReconParser.parse_string(&mut input).bind(), "hi\n");

    let mut input = StringInput::new("ident-1 rest");
    assert_eq!(ReconParser.parse_ident(&mut input).bind(), "ident-1");

    let mut input = StringInput::new("@a(1)");
    assert_eq!(ReconParser.parse_attr(&mut input).bind(), Item::attr("a", 1));
}

#[test]
fn test_suspended_parser_resumes_on_new_input() {
    let mut first = StringInput::new("{a: 1,").as_part(true);
    let parser = ReconParser.parse_document(&mut first);
    assert!(parser.is_cont());

    let mut second = StringInput::new(" b: 2}").with_mark(first.mark().clone());
    let value = parser.feed(&mut second).bind();
    assert_eq!(value, Value::record(vec![Item::slot("a", 1), Item::slot("b", 2)]));
}

#[test]
fn test_parser_outcome_accessors() {
    let parser: Parser<Value> = ReconParser.parse_document(&mut StringInput::new("}"));
    assert!(parser.is_error());
    assert!(parser.trap().is_some());
    assert!(parser.into_result().unwrap().is_err());
}

#[test]
fn test_malformed_utf8_modes() {
    let bytes = b"\"a\xFFb\"";
    let mut input = Utf8Input::new(bytes);
    assert!(ReconParser.parse_document(&mut input).is_error());

    let settings = InputSettings::default().with_utf_error_mode(UtfErrorMode::Replacement);
    let mut input = Utf8Input::new(bytes).with_settings(settings.clone());
    assert_eq!(ReconParser.parse_document(&mut input).bind(), t("a\u{FFFD}b"));

    let mut parser = StreamingParser::new().with_settings(settings);
    parser.feed_bytes(&bytes[..3]);
    parser.feed_bytes(&bytes[3..]);
    assert_eq!(parser.finish().unwrap(), t("a\u{FFFD}b"));
}

#[test]
fn test_streaming_reports_progress() {
    let mut parser = StreamingParser::new();
    parser.feed("a: 1\nb: ");
    assert_eq!(parser.mark().line, 2);
    assert_eq!(parser.mark().column, 4);
    assert!(!parser.is_done());
    parser.feed("2");
    assert_eq!(parser.finish().unwrap(), Value::record(vec![Item::slot("a", 1), Item::slot("b", 2)]));
}
