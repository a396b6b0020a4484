//! Map-to-map operators.
//!
//! [`MapOperator`] carries the per-key recoherence; the [`KeyOperator`] it
//! wraps decides what each entry becomes. Only entries with a pending
//! effect are recomputed. A key pushed from the source is pushed on to every
//! reader; a key pulled by one reader is recomputed for that reader alone.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::effect::KeyEffect;
use crate::map::{KeyOperator, KeyedState, MapInlet, MapOutlet};
use crate::port::Outputs;

/// A map stage reading a `K → I` stream and publishing a `K → O` stream.
pub struct MapOperator<K, I, O, F> {
    this: Weak<Self>,
    keyed: KeyedState<K, I, O>,
    outputs: Outputs<dyn MapInlet<K, O>>,
    version: Cell<Option<u64>>,
    op: F,
}

/// Maps every value of a map stream, keeping its keys.
pub type MapFieldValuesOperator<K, I, O> = MapOperator<K, I, O, FieldValues<I, O>>;

/// Keeps the entries of a map stream that satisfy a predicate.
pub type FilterFieldsOperator<K, V> = MapOperator<K, V, V, FilterFields<K, V>>;

impl<K, I, O, F> MapOperator<K, I, O, F>
where
    K: Ord + Clone + fmt::Debug + 'static,
    I: Clone + 'static,
    O: Clone + 'static,
    F: KeyOperator<K, I, O> + 'static,
{
    pub fn with_operator(op: F) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            keyed: KeyedState::new(),
            outputs: Outputs::new(),
            version: Cell::new(None),
            op,
        })
    }

    pub fn operator(&self) -> &F {
        &self.op
    }

    /// Binds to `outlet` and keeps it alive while bound.
    pub(crate) fn bind_owned(&self, outlet: Rc<dyn MapOutlet<K, I>>) {
        self.bind_output(&outlet);
        self.keyed.input().hold(outlet);
    }
}

impl<K, I, O> MapFieldValuesOperator<K, I, O>
where
    K: Ord + Clone + fmt::Debug + 'static,
    I: Clone + 'static,
    O: Clone + 'static,
{
    pub fn new<F>(func: F) -> Rc<Self>
    where
        F: Fn(&I) -> O + 'static,
    {
        Self::with_operator(FieldValues { func: Box::new(func) })
    }
}

impl<K, V> FilterFieldsOperator<K, V>
where
    K: Ord + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
{
    pub fn new<P>(predicate: P) -> Rc<Self>
    where
        P: Fn(&K, &V) -> bool + 'static,
    {
        Self::with_operator(FilterFields { predicate: Box::new(predicate) })
    }
}

impl<K, I, O, F> MapInlet<K, I> for MapOperator<K, I, O, F>
where
    K: Ord + Clone + fmt::Debug + 'static,
    I: Clone + 'static,
    O: Clone + 'static,
    F: KeyOperator<K, I, O> + 'static,
{
    fn input(&self) -> Option<Rc<dyn MapOutlet<K, I>>> {
        self.keyed.input().get()
    }

    fn bind_output(&self, outlet: &Rc<dyn MapOutlet<K, I>>) {
        self.unbind_output();
        self.keyed.input().set(outlet);
        let this: Weak<dyn MapInlet<K, I>> = self.this.clone();
        outlet.bind_map_input(this);
        self.decohere_input();
    }

    fn unbind_output(&self) {
        if let Some(outlet) = self.keyed.input().clear() {
            let this: Weak<dyn MapInlet<K, I>> = self.this.clone();
            outlet.unbind_map_input(&this);
        }
    }

    fn decohere_input_key(&self, effect: KeyEffect<K>) {
        if self.keyed.decohere_key(effect.clone()) {
            self.version.set(None);
            trace!(node = "MapOperator", key = ?effect.key(), "decohere key");
            for inlet in self.outputs.snapshot() {
                inlet.decohere_input_key(effect.clone());
            }
        }
    }

    fn decohere_input(&self) {
        if self.keyed.decohere_all() {
            self.version.set(None);
            trace!(node = "MapOperator", outputs = self.outputs.len(), "decohere");
            for inlet in self.outputs.snapshot() {
                inlet.decohere_input();
            }
        }
    }

    /// Recomputes `key` and pushes it on to every reader.
    fn recohere_input_key(&self, key: &K, version: u64) {
        if let Some(effect) = self.keyed.recohere_key(key, version, &self.op) {
            for inlet in self.outputs.snapshot() {
                inlet.recohere_input_key(effect.key(), version);
            }
        }
    }

    fn recohere_input(&self, version: u64) {
        if self.version.get().is_some() {
            return;
        }
        self.version.set(Some(version));
        if let Some(input) = self.keyed.input().get() {
            input.recohere_output(version);
        }
        let count = self.keyed.recohere_all(version, &self.op);
        trace!(node = "MapOperator", version, keys = count, "recohere");
        for inlet in self.outputs.snapshot() {
            inlet.recohere_input(version);
        }
    }
}

impl<K, I, O, F> MapOutlet<K, O> for MapOperator<K, I, O, F>
where
    K: Ord + Clone + fmt::Debug + 'static,
    I: Clone + 'static,
    O: Clone + 'static,
    F: KeyOperator<K, I, O> + 'static,
{
    fn get_key(&self, key: &K) -> Option<O> {
        self.keyed.get_key(key)
    }

    fn keys(&self) -> Vec<K> {
        self.keyed.keys()
    }

    fn bind_map_input(&self, inlet: Weak<dyn MapInlet<K, O>>) {
        self.outputs.bind(inlet);
    }

    fn unbind_map_input(&self, inlet: &Weak<dyn MapInlet<K, O>>) {
        self.outputs.unbind(inlet);
    }

    fn unbind_map_inputs(&self) {
        for inlet in self.outputs.take() {
            inlet.unbind_output();
        }
    }

    fn decohere_output_key(&self, effect: KeyEffect<K>) {
        self.decohere_input_key(effect);
    }

    fn decohere_output(&self) {
        self.decohere_input();
    }

    fn recohere_output_key(&self, key: &K, version: u64) {
        self.keyed.recohere_key(key, version, &self.op);
    }

    fn recohere_output(&self, version: u64) {
        self.recohere_input(version);
    }
}

// =============================================================================
// Operators
// =============================================================================

pub struct FieldValues<I, O> {
    func: Box<dyn Fn(&I) -> O>,
}

impl<K, I, O> KeyOperator<K, I, O> for FieldValues<I, O> {
    fn evaluate(&self, _key: &K, value: I) -> O {
        (self.func)(&value)
    }
}

pub struct FilterFields<K, V> {
    predicate: Box<dyn Fn(&K, &V) -> bool>,
}

impl<K: Clone, V> KeyOperator<K, V, V> for FilterFields<K, V> {
    /// An update whose new value fails the predicate becomes a removal.
    fn will_recohere_input_key(
        &self,
        effect: KeyEffect<K>,
        input: &dyn MapOutlet<K, V>,
        _version: u64,
    ) -> Option<KeyEffect<K>> {
        match effect {
            KeyEffect::Update(key) => match input.get_key(&key) {
                Some(value) if (self.predicate)(&key, &value) => Some(KeyEffect::Update(key)),
                _ => Some(KeyEffect::Remove(key)),
            },
            remove => Some(remove),
        }
    }

    fn evaluate(&self, _key: &K, value: V) -> V {
        value
    }
}
