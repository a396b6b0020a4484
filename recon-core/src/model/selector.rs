//! Selector paths: `$a.b`, `$*.@id`, `$[x > 1]`.

use super::value::Value;

/// A chain of selection steps ending in [`Selector::Identity`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Selector {
    /// `$`
    #[default]
    Identity,
    /// `$key` or `${key}`
    Get { key: Box<Value>, then: Box<Selector> },
    /// `$@key`
    GetAttr { key: String, then: Box<Selector> },
    /// `$0`
    GetItem { index: u64, then: Box<Selector> },
    /// `$*:`
    Keys { then: Box<Selector> },
    /// `$:*`
    Values { then: Box<Selector> },
    /// `$*`
    Children { then: Box<Selector> },
    /// `$**`
    Descendants { then: Box<Selector> },
    /// `$[predicate]`
    Filter {
        predicate: Box<Value>,
        then: Box<Selector>,
    },
}

impl Selector {
    pub fn get(key: impl Into<Value>) -> Self {
        Selector::Get {
            key: Box::new(key.into()),
            then: Box::default(),
        }
    }

    pub fn get_attr(key: impl Into<String>) -> Self {
        Selector::GetAttr {
            key: key.into(),
            then: Box::default(),
        }
    }

    pub fn get_item(index: u64) -> Self {
        Selector::GetItem {
            index,
            then: Box::default(),
        }
    }

    pub fn keys() -> Self {
        Selector::Keys { then: Box::default() }
    }

    pub fn values() -> Self {
        Selector::Values { then: Box::default() }
    }

    pub fn children() -> Self {
        Selector::Children { then: Box::default() }
    }

    pub fn descendants() -> Self {
        Selector::Descendants { then: Box::default() }
    }

    pub fn filter(predicate: Value) -> Self {
        Selector::Filter {
            predicate: Box::new(predicate),
            then: Box::default(),
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        matches!(self, Selector::Identity)
    }

    /// The step after this one, or `None` at the end of the chain.
    pub fn then(&self) -> Option<&Selector> {
        match self {
            Selector::Identity => None,
            Selector::Get { then, .. }
            | Selector::GetAttr { then, .. }
            | Selector::GetItem { then, .. }
            | Selector::Keys { then }
            | Selector::Values { then }
            | Selector::Children { then }
            | Selector::Descendants { then }
            | Selector::Filter { then, .. } => Some(then),
        }
    }

    fn then_mut(&mut self) -> Option<&mut Box<Selector>> {
        match self {
            Selector::Identity => None,
            Selector::Get { then, .. }
            | Selector::GetAttr { then, .. }
            | Selector::GetItem { then, .. }
            | Selector::Keys { then }
            | Selector::Values { then }
            | Selector::Children { then }
            | Selector::Descendants { then }
            | Selector::Filter { then, .. } => Some(then),
        }
    }

    /// This step followed by `next`, dropping whatever followed it before.
    fn with_then(mut self, next: Selector) -> Selector {
        match self.then_mut() {
            Some(then) => **then = next,
            None => return next,
        }
        self
    }

    /// Links `steps` into one chain, in order. The `then` of each step is
    /// replaced.
    pub fn chain<I>(steps: I) -> Selector
    where
        I: IntoIterator<Item = Selector>,
        I::IntoIter: DoubleEndedIterator,
    {
        steps
            .into_iter()
            .rev()
            .fold(Selector::Identity, |then, step| step.with_then(then))
    }

    /// Append `step` to the end of this chain. The `then` of `step` is
    /// replaced by whatever followed it.
    pub fn append(self, step: Selector) -> Selector {
        let mut steps = Vec::new();
        let mut rest = self;
        while let Some(then) = rest.then_mut() {
            let next = std::mem::take(&mut **then);
            steps.push(rest);
            rest = next;
        }
        steps.into_iter().rev().fold(step, |then, step| step.with_then(then))
    }
}
