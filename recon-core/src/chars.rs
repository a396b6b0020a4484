//! Character classes shared by the parser and the writer.

use phf::phf_map;
use unicode_xid::UnicodeXID;

/// Inline whitespace: space and tab. Newlines separate block items.
#[inline]
pub fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[inline]
pub fn is_newline(c: char) -> bool {
    c == '\n' || c == '\r'
}

#[inline]
pub fn is_whitespace(c: char) -> bool {
    is_space(c) || is_newline(c)
}

#[inline]
pub fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_xid_start()
}

#[inline]
pub fn is_ident_char(c: char) -> bool {
    c == '-' || c == '_' || c.is_xid_continue()
}

/// True when `s` can be written without quotes.
///
/// `true` and `false` are identifiers lexically but read back as booleans,
/// so they do not count.
pub fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => {}
        _ => return false,
    }
    chars.all(is_ident_char) && !KEYWORDS.contains_key(s)
}

/// Identifiers that read as literals.
pub static KEYWORDS: phf::Map<&'static str, bool> = phf_map! {
    "true" => true,
    "false" => false,
};

/// Single-character escapes after `\` in quoted strings and markup.
pub static ESCAPES: phf::Map<char, char> = phf_map! {
    '"' => '"',
    '\'' => '\'',
    '\\' => '\\',
    '/' => '/',
    '@' => '@',
    '[' => '[',
    ']' => ']',
    '{' => '{',
    '}' => '}',
    'b' => '\u{8}',
    'f' => '\u{c}',
    'n' => '\n',
    'r' => '\r',
    't' => '\t',
};

/// The escape letter the writer uses for `c`, if it has a short form.
#[inline]
pub fn short_escape(c: char) -> Option<char> {
    match c {
        '"' => Some('"'),
        '\\' => Some('\\'),
        '\u{8}' => Some('b'),
        '\u{c}' => Some('f'),
        '\n' => Some('n'),
        '\r' => Some('r'),
        '\t' => Some('t'),
        _ => None,
    }
}

#[inline]
pub fn hex_value(c: char) -> Option<u32> {
    c.to_digit(16)
}

#[inline]
pub fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/'
}

/// Sextet value of a Base64 digit.
#[inline]
pub fn base64_value(c: char) -> Option<u8> {
    match c {
        'A'..='Z' => Some(c as u8 - b'A'),
        'a'..='z' => Some(c as u8 - b'a' + 26),
        '0'..='9' => Some(c as u8 - b'0' + 52),
        '+' => Some(62),
        '/' => Some(63),
        _ => None,
    }
}

pub const BASE64_DIGITS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
