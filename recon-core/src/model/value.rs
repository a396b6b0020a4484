//! Recon values.
//!
//! Plain immutable data with derived structural equality. Operators and
//! selectors are kept as structure; nothing here evaluates them.

use super::selector::Selector;

/// A Recon value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value at all. Parsers return it when nothing matched.
    #[default]
    Absent,
    /// Present but empty: `()`, `@attr`, `key:`.
    Extant,
    Bool(bool),
    Num(Num),
    Text(String),
    /// Binary blob: `%AAEC`
    Data(Vec<u8>),
    Record(Record),
    Selector(Selector),

    // ========== Expressions ==========
    Unary {
        op: UnaryOp,
        operand: Box<Value>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Value>,
        rhs: Box<Value>,
    },
    Conditional {
        test: Box<Value>,
        then: Box<Value>,
        otherwise: Box<Value>,
    },
    Invoke {
        func: Box<Value>,
        args: Box<Value>,
    },
    Lambda {
        bindings: Box<Value>,
        template: Box<Value>,
    },
}

/// Numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    #[inline]
    pub fn is_negative(self) -> bool {
        match self {
            Num::Int(i) => i < 0,
            Num::Float(f) => f.is_sign_negative(),
        }
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    BitwiseNot,
    Negative,
    Positive,
}

impl UnaryOp {
    pub fn symbol(self) -> char {
        match self {
            Self::Not => '!',
            Self::BitwiseNot => '~',
            Self::Negative => '-',
            Self::Positive => '+',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '!' => Some(Self::Not),
            '~' => Some(Self::BitwiseNot),
            '-' => Some(Self::Negative),
            '+' => Some(Self::Positive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
    Plus,
    Minus,
    Times,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Or => "||",
            Self::And => "&&",
            Self::BitwiseOr => "|",
            Self::BitwiseXor => "^",
            Self::BitwiseAnd => "&",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
        }
    }
}

/// One entry of a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Attr(Attr),
    Slot(Slot),
    Value(Value),
}

/// `@key(value)`
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

/// `key: value`
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub key: Value,
    pub value: Value,
}

impl Item {
    pub fn attr(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Item::Attr(Attr {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn slot(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Item::Slot(Slot {
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Item::Value(value.into())
    }

    #[inline]
    pub fn is_attr(&self) -> bool {
        matches!(self, Item::Attr(_))
    }
}

/// Ordered sequence of items.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    items: Vec<Item>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self { items }
    }

    #[inline]
    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    #[inline]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// The first item, when it is an attribute.
    pub fn head_attr(&self) -> Option<&Attr> {
        match self.items.first() {
            Some(Item::Attr(attr)) => Some(attr),
            _ => None,
        }
    }

    /// Number of leading attributes.
    pub fn leading_attrs(&self) -> usize {
        self.items.iter().take_while(|item| item.is_attr()).count()
    }

    /// Value of the first attribute or text-keyed slot named `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.iter().find_map(|item| match item {
            Item::Attr(attr) if attr.key == key => Some(&attr.value),
            Item::Slot(slot) if slot.key.as_text() == Some(key) => Some(&slot.value),
            _ => None,
        })
    }
}

impl FromIterator<Item> for Record {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn record(items: Vec<Item>) -> Self {
        Value::Record(Record::from_items(items))
    }

    pub fn unary(op: UnaryOp, operand: Value) -> Self {
        Value::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Self {
        Value::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn conditional(test: Value, then: Value, otherwise: Value) -> Self {
        Value::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn invoke(func: Value, args: Value) -> Self {
        Value::Invoke {
            func: Box::new(func),
            args: Box::new(args),
        }
    }

    pub fn lambda(bindings: Value, template: Value) -> Self {
        Value::Lambda {
            bindings: Box::new(bindings),
            template: Box::new(template),
        }
    }

    /// Anything but [`Value::Absent`].
    #[inline]
    pub fn is_distinct(&self) -> bool {
        !matches!(self, Value::Absent)
    }

    /// Neither absent nor extant.
    #[inline]
    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Absent | Value::Extant)
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_num(&self) -> Option<Num> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Num(Num::Int(i)) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Num(Num::Int(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Num(Num::Int(i as i64))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Num(Num::Float(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Selector> for Value {
    fn from(s: Selector) -> Self {
        Value::Selector(s)
    }
}
