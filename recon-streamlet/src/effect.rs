//! Per-key change classification for map streams.

/// What happened to one entry of a map stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyEffect<K> {
    /// The entry was inserted or its value changed.
    Update(K),
    /// The entry no longer exists.
    Remove(K),
}

impl<K> KeyEffect<K> {
    pub fn key(&self) -> &K {
        match self {
            KeyEffect::Update(key) | KeyEffect::Remove(key) => key,
        }
    }

    pub fn into_key(self) -> K {
        match self {
            KeyEffect::Update(key) | KeyEffect::Remove(key) => key,
        }
    }

    pub fn is_update(&self) -> bool {
        matches!(self, KeyEffect::Update(_))
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, KeyEffect::Remove(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_access() {
        let update = KeyEffect::Update("n");
        let remove = KeyEffect::Remove("m");
        assert_eq!(*update.key(), "n");
        assert_eq!(remove.clone().into_key(), "m");
        assert!(update.is_update() && !update.is_remove());
        assert!(remove.is_remove() && !remove.is_update());
        assert_ne!(KeyEffect::Update(1), KeyEffect::Remove(1));
    }
}
