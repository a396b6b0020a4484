//! Map streams: ports that propagate which keys changed, not just that
//! something did.
//!
//! Decoherence travels as [`KeyEffect`]s. Every map node records the effects
//! pending against it and, when recohered, recomputes only those keys. A
//! whole-map decohere (binding a new source, say) marks the node stale and
//! its next recohere rebuilds every key.
//!
//! ```text
//!  MapInput ──decohere_output_key(Update(k))──▶ operator ──▶ KeyOutlet(k)
//!     │                                           │               │
//!     │◀────────recohere_output_key(k, v)─────────│◀──────────────│  backward
//!     │─────────recohere_input_key(k, v)─────────▶│──────────────▶│  forward
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::effect::KeyEffect;
use crate::port::{Inlet, InletEdge, Outlet, Outputs};

/// A port that publishes a map, entry by entry.
pub trait MapOutlet<K, V> {
    fn get_key(&self, key: &K) -> Option<V>;

    fn keys(&self) -> Vec<K>;

    /// The whole map as of the last recohere.
    fn get(&self) -> BTreeMap<K, V>
    where
        K: Ord,
    {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get_key(&key).map(|value| (key, value)))
            .collect()
    }

    /// Records `inlet` as a reader. Only the back-reference is stored; use
    /// [`MapInlet::bind_output`] to connect both sides.
    fn bind_map_input(&self, inlet: Weak<dyn MapInlet<K, V>>);

    fn unbind_map_input(&self, inlet: &Weak<dyn MapInlet<K, V>>);

    fn unbind_map_inputs(&self);

    /// Marks one entry stale and fans the effect out to every reader.
    fn decohere_output_key(&self, effect: KeyEffect<K>);

    /// Marks every entry stale.
    fn decohere_output(&self);

    /// Brings one entry up to date. This is a pull: readers other than the
    /// caller are not notified.
    fn recohere_output_key(&self, key: &K, version: u64);

    fn recohere_output(&self, version: u64);
}

/// A port that consumes a map stream.
pub trait MapInlet<K, V> {
    fn input(&self) -> Option<Rc<dyn MapOutlet<K, V>>>;

    /// Reads from `outlet`, replacing any previous binding. Every entry is
    /// marked stale.
    fn bind_output(&self, outlet: &Rc<dyn MapOutlet<K, V>>);

    fn unbind_output(&self);

    fn decohere_input_key(&self, effect: KeyEffect<K>);

    fn decohere_input(&self);

    fn recohere_input_key(&self, key: &K, version: u64);

    fn recohere_input(&self, version: u64);
}

/// Per-key hooks of a map stage.
pub trait KeyOperator<K, I, O> {
    /// Veto (`None`) or reclassify a pending effect before it is applied.
    /// `input` is the stage's source, already coherent for the key.
    fn will_recohere_input_key(
        &self,
        effect: KeyEffect<K>,
        input: &dyn MapOutlet<K, I>,
        version: u64,
    ) -> Option<KeyEffect<K>> {
        let _ = (input, version);
        Some(effect)
    }

    /// Output value for an updated entry.
    fn evaluate(&self, key: &K, value: I) -> O;
}

/// Passes entries through unchanged.
pub struct Identity;

impl<K, V> KeyOperator<K, V, V> for Identity {
    fn evaluate(&self, _key: &K, value: V) -> V {
        value
    }
}

// =============================================================================
// Keyed state
// =============================================================================

/// Source edge, pending effects and cached entries of a map reader.
pub(crate) struct KeyedState<K, I, O> {
    input: InletEdge<dyn MapOutlet<K, I>>,
    effects: RefCell<BTreeMap<K, KeyEffect<K>>>,
    /// Every entry needs recomputing.
    stale: Cell<bool>,
    /// Entries already recomputed since the node went stale.
    fresh: RefCell<BTreeSet<K>>,
    state: RefCell<BTreeMap<K, O>>,
}

impl<K, I, O> KeyedState<K, I, O>
where
    K: Ord + Clone + fmt::Debug + 'static,
    I: 'static,
    O: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            input: InletEdge::new(),
            effects: RefCell::new(BTreeMap::new()),
            stale: Cell::new(true),
            fresh: RefCell::new(BTreeSet::new()),
            state: RefCell::new(BTreeMap::new()),
        }
    }

    pub(crate) fn input(&self) -> &InletEdge<dyn MapOutlet<K, I>> {
        &self.input
    }

    pub(crate) fn get_key(&self, key: &K) -> Option<O> {
        self.state.borrow().get(key).cloned()
    }

    pub(crate) fn keys(&self) -> Vec<K> {
        self.state.borrow().keys().cloned().collect()
    }

    /// Records a pending effect; false when it was already pending.
    pub(crate) fn decohere_key(&self, effect: KeyEffect<K>) -> bool {
        let mut effects = self.effects.borrow_mut();
        if effects.get(effect.key()) == Some(&effect) {
            return false;
        }
        effects.insert(effect.key().clone(), effect);
        true
    }

    /// Marks every entry stale; false when it already was.
    pub(crate) fn decohere_all(&self) -> bool {
        self.fresh.borrow_mut().clear();
        !self.stale.replace(true)
    }

    /// Recomputes `key` if it has a pending effect, or if the node is stale
    /// and the key has not been recomputed since, pulling it from the source
    /// first. Returns the effect applied.
    pub(crate) fn recohere_key(
        &self,
        key: &K,
        version: u64,
        op: &dyn KeyOperator<K, I, O>,
    ) -> Option<KeyEffect<K>> {
        let pending = self.effects.borrow_mut().remove(key);
        let stale = self.stale.get();
        let refreshed = stale && !self.fresh.borrow_mut().insert(key.clone());
        let effect = match pending {
            Some(effect) => effect,
            None if stale && !refreshed => KeyEffect::Update(key.clone()),
            None => return None,
        };
        let input = self.input.get();
        if let Some(input) = &input {
            input.recohere_output_key(key, version);
        }
        self.apply(effect, input.as_deref(), version, op)
    }

    /// Recomputes every pending key, or every key when stale. The source
    /// must already be coherent. Returns the number of keys recomputed.
    pub(crate) fn recohere_all(&self, version: u64, op: &dyn KeyOperator<K, I, O>) -> usize {
        let input = self.input.get();
        if self.stale.replace(false) {
            let fresh = std::mem::take(&mut *self.fresh.borrow_mut());
            let effects = std::mem::take(&mut *self.effects.borrow_mut());
            let mut keys: BTreeSet<K> = self.state.borrow().keys().cloned().collect();
            if let Some(input) = &input {
                keys.extend(input.keys());
            }
            keys.retain(|key| effects.contains_key(key) || !fresh.contains(key));
            let count = keys.len();
            for key in keys {
                self.apply(KeyEffect::Update(key), input.as_deref(), version, op);
            }
            count
        } else {
            let pending: Vec<K> = self.effects.borrow().keys().cloned().collect();
            let mut count = 0;
            for key in &pending {
                if self.recohere_key(key, version, op).is_some() {
                    count += 1;
                }
            }
            count
        }
    }

    fn apply(
        &self,
        effect: KeyEffect<K>,
        input: Option<&dyn MapOutlet<K, I>>,
        version: u64,
        op: &dyn KeyOperator<K, I, O>,
    ) -> Option<KeyEffect<K>> {
        let effect = match input {
            Some(input) => op.will_recohere_input_key(effect, input, version)?,
            None => KeyEffect::Remove(effect.into_key()),
        };
        let value = match &effect {
            KeyEffect::Update(key) => input
                .and_then(|input| input.get_key(key))
                .map(|value| op.evaluate(key, value)),
            KeyEffect::Remove(_) => None,
        };
        debug!(key = ?effect.key(), version, update = value.is_some(), "recompute key");
        let mut state = self.state.borrow_mut();
        match value {
            Some(value) => state.insert(effect.key().clone(), value),
            None => state.remove(effect.key()),
        };
        Some(effect)
    }
}

// =============================================================================
// MapInput
// =============================================================================

/// A map source edited by caller code.
///
/// Edits decohere the affected keys; the caller drives the wave as with
/// [`ValueInput`](crate::ValueInput).
pub struct MapInput<K, V> {
    outputs: Outputs<dyn MapInlet<K, V>>,
    version: Cell<Option<u64>>,
    effects: RefCell<BTreeMap<K, KeyEffect<K>>>,
    state: RefCell<BTreeMap<K, V>>,
}

impl<K, V> MapInput<K, V>
where
    K: Ord + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    pub fn new() -> Rc<Self> {
        Self::from_map(BTreeMap::new())
    }

    pub fn from_map(state: BTreeMap<K, V>) -> Rc<Self> {
        Rc::new(Self {
            outputs: Outputs::new(),
            version: Cell::new(None),
            effects: RefCell::new(BTreeMap::new()),
            state: RefCell::new(state),
        })
    }

    pub fn put(&self, key: K, value: V) -> Option<V> {
        let old = self.state.borrow_mut().insert(key.clone(), value);
        self.decohere_output_key(KeyEffect::Update(key));
        old
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let old = self.state.borrow_mut().remove(key);
        if old.is_some() {
            self.decohere_output_key(KeyEffect::Remove(key.clone()));
        }
        old
    }

    /// Replaces the whole map: missing keys are removed, all others updated.
    pub fn set(&self, map: BTreeMap<K, V>) {
        let old = self.state.replace(map);
        let removed: Vec<K> = {
            let state = self.state.borrow();
            old.into_keys().filter(|key| !state.contains_key(key)).collect()
        };
        let updated = self.keys();
        for key in removed {
            self.decohere_output_key(KeyEffect::Remove(key));
        }
        for key in updated {
            self.decohere_output_key(KeyEffect::Update(key));
        }
    }

    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }
}

impl<K, V> MapOutlet<K, V> for MapInput<K, V>
where
    K: Ord + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    fn get_key(&self, key: &K) -> Option<V> {
        self.state.borrow().get(key).cloned()
    }

    fn keys(&self) -> Vec<K> {
        self.state.borrow().keys().cloned().collect()
    }

    fn bind_map_input(&self, inlet: Weak<dyn MapInlet<K, V>>) {
        self.outputs.bind(inlet);
    }

    fn unbind_map_input(&self, inlet: &Weak<dyn MapInlet<K, V>>) {
        self.outputs.unbind(inlet);
    }

    fn unbind_map_inputs(&self) {
        for inlet in self.outputs.take() {
            inlet.unbind_output();
        }
    }

    fn decohere_output_key(&self, effect: KeyEffect<K>) {
        {
            let mut effects = self.effects.borrow_mut();
            if effects.get(effect.key()) == Some(&effect) {
                return;
            }
            effects.insert(effect.key().clone(), effect.clone());
        }
        self.version.set(None);
        trace!(node = "MapInput", key = ?effect.key(), "decohere key");
        for inlet in self.outputs.snapshot() {
            inlet.decohere_input_key(effect.clone());
        }
    }

    fn decohere_output(&self) {
        self.version.set(None);
        trace!(node = "MapInput", outputs = self.outputs.len(), "decohere");
        for inlet in self.outputs.snapshot() {
            inlet.decohere_input();
        }
    }

    fn recohere_output_key(&self, key: &K, _version: u64) {
        self.effects.borrow_mut().remove(key);
    }

    fn recohere_output(&self, version: u64) {
        if self.version.get().is_some() {
            return;
        }
        self.version.set(Some(version));
        let effects = std::mem::take(&mut *self.effects.borrow_mut());
        trace!(node = "MapInput", version, keys = effects.len(), "recohere");
        let inlets = self.outputs.snapshot();
        for key in effects.keys() {
            for inlet in &inlets {
                inlet.recohere_input_key(key, version);
            }
        }
        for inlet in &inlets {
            inlet.recohere_input(version);
        }
    }
}

// =============================================================================
// MapOutput
// =============================================================================

/// A map sink caching the last coherent entries of its source.
pub struct MapOutput<K, V> {
    this: Weak<Self>,
    keyed: KeyedState<K, V, V>,
    version: Cell<Option<u64>>,
}

impl<K, V> MapOutput<K, V>
where
    K: Ord + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            keyed: KeyedState::new(),
            version: Cell::new(None),
        })
    }

    pub fn get_key(&self, key: &K) -> Option<V> {
        self.keyed.get_key(key)
    }

    pub fn keys(&self) -> Vec<K> {
        self.keyed.keys()
    }

    pub fn get(&self) -> BTreeMap<K, V> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get_key(&key).map(|value| (key, value)))
            .collect()
    }

    pub fn is_coherent(&self) -> bool {
        self.version.get().is_some()
    }
}

impl<K, V> MapInlet<K, V> for MapOutput<K, V>
where
    K: Ord + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    fn input(&self) -> Option<Rc<dyn MapOutlet<K, V>>> {
        self.keyed.input().get()
    }

    fn bind_output(&self, outlet: &Rc<dyn MapOutlet<K, V>>) {
        self.unbind_output();
        self.keyed.input().set(outlet);
        let this: Weak<dyn MapInlet<K, V>> = self.this.clone();
        outlet.bind_map_input(this);
        self.decohere_input();
    }

    fn unbind_output(&self) {
        if let Some(outlet) = self.keyed.input().clear() {
            let this: Weak<dyn MapInlet<K, V>> = self.this.clone();
            outlet.unbind_map_input(&this);
        }
    }

    fn decohere_input_key(&self, effect: KeyEffect<K>) {
        if self.keyed.decohere_key(effect) {
            self.version.set(None);
        }
    }

    fn decohere_input(&self) {
        self.keyed.decohere_all();
        self.version.set(None);
    }

    fn recohere_input_key(&self, key: &K, version: u64) {
        self.keyed.recohere_key(key, version, &Identity);
    }

    fn recohere_input(&self, version: u64) {
        if self.version.get().is_some() {
            return;
        }
        self.version.set(Some(version));
        if let Some(input) = self.keyed.input().get() {
            input.recohere_output(version);
        }
        let count = self.keyed.recohere_all(version, &Identity);
        trace!(node = "MapOutput", version, keys = count, "recohere");
    }
}

// =============================================================================
// KeyOutlet
// =============================================================================

/// One entry of a map stream, published as a scalar stream.
///
/// Only effects on its own key decohere it.
pub struct KeyOutlet<K, V> {
    this: Weak<Self>,
    key: K,
    input: InletEdge<dyn MapOutlet<K, V>>,
    outputs: Outputs<dyn Inlet<V>>,
    version: Cell<Option<u64>>,
    state: RefCell<Option<V>>,
}

impl<K, V> KeyOutlet<K, V>
where
    K: Ord + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    pub fn new(key: K) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            key,
            input: InletEdge::new(),
            outputs: Outputs::new(),
            version: Cell::new(None),
            state: RefCell::new(None),
        })
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Binds to `outlet` and keeps it alive while bound.
    pub(crate) fn bind_owned(&self, outlet: Rc<dyn MapOutlet<K, V>>) {
        self.bind_output(&outlet);
        self.input.hold(outlet);
    }
}

impl<K, V> MapInlet<K, V> for KeyOutlet<K, V>
where
    K: Ord + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    fn input(&self) -> Option<Rc<dyn MapOutlet<K, V>>> {
        self.input.get()
    }

    fn bind_output(&self, outlet: &Rc<dyn MapOutlet<K, V>>) {
        self.unbind_output();
        self.input.set(outlet);
        let this: Weak<dyn MapInlet<K, V>> = self.this.clone();
        outlet.bind_map_input(this);
        MapInlet::decohere_input(self);
    }

    fn unbind_output(&self) {
        if let Some(outlet) = self.input.clear() {
            let this: Weak<dyn MapInlet<K, V>> = self.this.clone();
            outlet.unbind_map_input(&this);
        }
    }

    fn decohere_input_key(&self, effect: KeyEffect<K>) {
        if *effect.key() == self.key {
            MapInlet::decohere_input(self);
        }
    }

    fn decohere_input(&self) {
        if self.version.take().is_some() {
            trace!(node = "KeyOutlet", key = ?self.key, "decohere");
            for inlet in self.outputs.snapshot() {
                inlet.decohere_input();
            }
        }
    }

    fn recohere_input_key(&self, key: &K, version: u64) {
        if *key == self.key {
            MapInlet::recohere_input(self, version);
        }
    }

    fn recohere_input(&self, version: u64) {
        if self.version.get().is_some() {
            return;
        }
        self.version.set(Some(version));
        let value = self.input.get().and_then(|input| {
            input.recohere_output_key(&self.key, version);
            input.get_key(&self.key)
        });
        trace!(node = "KeyOutlet", key = ?self.key, version, "recohere");
        *self.state.borrow_mut() = value;
        for inlet in self.outputs.snapshot() {
            inlet.recohere_input(version);
        }
    }
}

impl<K, V> Outlet<V> for KeyOutlet<K, V>
where
    K: Ord + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    fn get(&self) -> Option<V> {
        self.state.borrow().clone()
    }

    fn bind_input(&self, inlet: Weak<dyn Inlet<V>>) {
        self.outputs.bind(inlet);
    }

    fn unbind_input(&self, inlet: &Weak<dyn Inlet<V>>) {
        self.outputs.unbind(inlet);
    }

    fn unbind_inputs(&self) {
        for inlet in self.outputs.take() {
            inlet.unbind_output();
        }
    }

    fn decohere_output(&self) {
        MapInlet::decohere_input(self);
    }

    fn recohere_output(&self, version: u64) {
        MapInlet::recohere_input(self, version);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    type Source = Rc<dyn MapOutlet<&'static str, i32>>;

    fn map(entries: &[(&'static str, i32)]) -> BTreeMap<&'static str, i32> {
        entries.iter().copied().collect()
    }

    fn bound_output(input: &Rc<MapInput<&'static str, i32>>) -> Rc<MapOutput<&'static str, i32>> {
        let output = MapOutput::new();
        output.bind_output(&(input.clone() as Source));
        output
    }

    #[test]
    fn test_output_mirrors_input() {
        let input = MapInput::from_map(map(&[("a", 1), ("b", 2)]));
        let output = bound_output(&input);
        input.recohere_output(1);
        assert_eq!(output.get(), map(&[("a", 1), ("b", 2)]));

        input.put("c", 3);
        input.remove(&"a");
        assert!(!output.is_coherent());
        input.recohere_output(2);
        assert_eq!(output.get(), map(&[("b", 2), ("c", 3)]));
    }

    #[test]
    fn test_set_diffs_keys() {
        let input = MapInput::from_map(map(&[("a", 1), ("b", 2)]));
        let output = bound_output(&input);
        output.recohere_input(1);
        input.set(map(&[("b", 5), ("c", 6)]));
        output.recohere_input(2);
        assert_eq!(output.get(), map(&[("b", 5), ("c", 6)]));
        assert_eq!(input.len(), 2);
        assert!(!input.is_empty());
    }

    #[test]
    fn test_key_outlet_ignores_other_keys() {
        let input = MapInput::from_map(map(&[("a", 1), ("b", 2)]));
        let a = KeyOutlet::new("a");
        a.bind_output(&(input.clone() as Source));
        input.recohere_output(1);
        assert_eq!(Outlet::get(&*a), Some(1));

        input.put("b", 20);
        assert_eq!(a.version.get(), Some(1));
        input.put("a", 10);
        assert_eq!(a.version.get(), None);
        Outlet::recohere_output(&*a, 2);
        assert_eq!(Outlet::get(&*a), Some(10));
        assert_eq!(a.key(), &"a");
    }

    #[test]
    fn test_removed_key() {
        let input = MapInput::from_map(map(&[("a", 1)]));
        let a = KeyOutlet::new("a");
        a.bind_output(&(input.clone() as Source));
        input.recohere_output(1);
        assert_eq!(input.remove(&"a"), Some(1));
        assert_eq!(input.remove(&"a"), None);
        input.recohere_output(2);
        assert_eq!(Outlet::get(&*a), None);
    }

    #[test]
    fn test_rebinding_rebuilds_every_key() {
        let first = MapInput::from_map(map(&[("a", 1), ("b", 2)]));
        let second = MapInput::from_map(map(&[("b", 3)]));
        let output = bound_output(&first);
        first.recohere_output(1);
        output.bind_output(&(second.clone() as Source));
        output.recohere_input(2);
        assert_eq!(output.get(), map(&[("b", 3)]));
        assert!(first.outputs.snapshot().is_empty());
    }
}
