//! Scalar streams: a settable source, a caching sink, and a mapping stage.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::port::{Inlet, InletEdge, Outlet, Outputs};

// =============================================================================
// ValueInput
// =============================================================================

/// A scalar source set by caller code.
///
/// Setting the value only decoheres the graph below; the caller then drives
/// a wave with [`Outlet::recohere_output`] on this input (forward) or with a
/// recohere on any sink (backward).
pub struct ValueInput<V> {
    outputs: Outputs<dyn Inlet<V>>,
    version: Cell<Option<u64>>,
    state: RefCell<Option<V>>,
}

impl<V: Clone + 'static> ValueInput<V> {
    pub fn new(value: V) -> Rc<Self> {
        Self::with_state(Some(value))
    }

    pub fn empty() -> Rc<Self> {
        Self::with_state(None)
    }

    fn with_state(state: Option<V>) -> Rc<Self> {
        Rc::new(Self {
            outputs: Outputs::new(),
            version: Cell::new(None),
            state: RefCell::new(state),
        })
    }

    /// Replaces the value, returning the previous one.
    pub fn set(&self, value: V) -> Option<V> {
        let old = self.state.replace(Some(value));
        self.decohere_output();
        old
    }

    pub fn clear(&self) -> Option<V> {
        let old = self.state.take();
        self.decohere_output();
        old
    }
}

impl<V: Clone + 'static> Outlet<V> for ValueInput<V> {
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
        if self.version.take().is_some() {
            trace!(node = "ValueInput", outputs = self.outputs.len(), "decohere");
            for inlet in self.outputs.snapshot() {
                inlet.decohere_input();
            }
        }
    }

    fn recohere_output(&self, version: u64) {
        if self.version.get().is_none() {
            self.version.set(Some(version));
            trace!(node = "ValueInput", version, "recohere");
            for inlet in self.outputs.snapshot() {
                inlet.recohere_input(version);
            }
        }
    }
}

// =============================================================================
// ValueOutput
// =============================================================================

/// A scalar sink caching the last coherent value of its source.
pub struct ValueOutput<V> {
    this: Weak<Self>,
    input: InletEdge<dyn Outlet<V>>,
    version: Cell<Option<u64>>,
    state: RefCell<Option<V>>,
}

impl<V: Clone + 'static> ValueOutput<V> {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            input: InletEdge::new(),
            version: Cell::new(None),
            state: RefCell::new(None),
        })
    }

    /// Value as of the last recohere.
    pub fn get(&self) -> Option<V> {
        self.state.borrow().clone()
    }

    pub fn is_coherent(&self) -> bool {
        self.version.get().is_some()
    }
}

impl<V: Clone + 'static> Inlet<V> for ValueOutput<V> {
    fn input(&self) -> Option<Rc<dyn Outlet<V>>> {
        self.input.get()
    }

    fn bind_output(&self, outlet: &Rc<dyn Outlet<V>>) {
        self.unbind_output();
        self.input.set(outlet);
        let this: Weak<dyn Inlet<V>> = self.this.clone();
        outlet.bind_input(this);
        self.decohere_input();
    }

    fn unbind_output(&self) {
        if let Some(outlet) = self.input.clear() {
            let this: Weak<dyn Inlet<V>> = self.this.clone();
            outlet.unbind_input(&this);
        }
    }

    fn decohere_input(&self) {
        if self.version.take().is_some() {
            trace!(node = "ValueOutput", "decohere");
        }
    }

    fn recohere_input(&self, version: u64) {
        if self.version.get().is_some() {
            return;
        }
        self.version.set(Some(version));
        let value = self.input.get().and_then(|input| {
            input.recohere_output(version);
            input.get()
        });
        trace!(node = "ValueOutput", version, "recohere");
        *self.state.borrow_mut() = value;
    }
}

// =============================================================================
// MapValueOperator
// =============================================================================

/// Applies a function to every value flowing through a scalar stream.
pub struct MapValueOperator<I, O> {
    this: Weak<Self>,
    input: InletEdge<dyn Outlet<I>>,
    outputs: Outputs<dyn Inlet<O>>,
    version: Cell<Option<u64>>,
    func: Box<dyn Fn(&I) -> O>,
    state: RefCell<Option<O>>,
}

impl<I: Clone + 'static, O: Clone + 'static> MapValueOperator<I, O> {
    pub fn new<F>(func: F) -> Rc<Self>
    where
        F: Fn(&I) -> O + 'static,
    {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            input: InletEdge::new(),
            outputs: Outputs::new(),
            version: Cell::new(None),
            func: Box::new(func),
            state: RefCell::new(None),
        })
    }

    /// Binds to `outlet` and keeps it alive while bound.
    pub(crate) fn bind_owned(&self, outlet: Rc<dyn Outlet<I>>) {
        self.bind_output(&outlet);
        self.input.hold(outlet);
    }
}

impl<I: Clone + 'static, O: Clone + 'static> Inlet<I> for MapValueOperator<I, O> {
    fn input(&self) -> Option<Rc<dyn Outlet<I>>> {
        self.input.get()
    }

    fn bind_output(&self, outlet: &Rc<dyn Outlet<I>>) {
        self.unbind_output();
        self.input.set(outlet);
        let this: Weak<dyn Inlet<I>> = self.this.clone();
        outlet.bind_input(this);
        self.decohere_input();
    }

    fn unbind_output(&self) {
        if let Some(outlet) = self.input.clear() {
            let this: Weak<dyn Inlet<I>> = self.this.clone();
            outlet.unbind_input(&this);
        }
    }

    fn decohere_input(&self) {
        if self.version.take().is_some() {
            trace!(node = "MapValueOperator", outputs = self.outputs.len(), "decohere");
            for inlet in self.outputs.snapshot() {
                inlet.decohere_input();
            }
        }
    }

    fn recohere_input(&self, version: u64) {
        if self.version.get().is_some() {
            return;
        }
        self.version.set(Some(version));
        let value = self.input.get().and_then(|input| {
            input.recohere_output(version);
            input.get()
        });
        let value = value.map(|value| (self.func)(&value));
        trace!(node = "MapValueOperator", version, "recohere");
        *self.state.borrow_mut() = value;
        for inlet in self.outputs.snapshot() {
            inlet.recohere_input(version);
        }
    }
}

impl<I: Clone + 'static, O: Clone + 'static> Outlet<O> for MapValueOperator<I, O> {
    fn get(&self) -> Option<O> {
        self.state.borrow().clone()
    }

    fn bind_input(&self, inlet: Weak<dyn Inlet<O>>) {
        self.outputs.bind(inlet);
    }

    fn unbind_input(&self, inlet: &Weak<dyn Inlet<O>>) {
        self.outputs.unbind(inlet);
    }

    fn unbind_inputs(&self) {
        for inlet in self.outputs.take() {
            inlet.unbind_output();
        }
    }

    fn decohere_output(&self) {
        self.decohere_input();
    }

    fn recohere_output(&self, version: u64) {
        self.recohere_input(version);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn sink<V: Clone + 'static>(outlet: Rc<dyn Outlet<V>>) -> Rc<ValueOutput<V>> {
        let output = ValueOutput::new();
        output.bind_output(&outlet);
        output
    }

    #[test]
    fn test_forward_wave() {
        let input = ValueInput::new(3);
        let double = MapValueOperator::new(|x: &i32| x * 2);
        double.bind_output(&(input.clone() as Rc<dyn Outlet<i32>>));
        let output = sink(double.clone() as Rc<dyn Outlet<i32>>);

        input.recohere_output(1);
        assert_eq!(output.get(), Some(6));
        assert!(output.is_coherent());

        input.set(5);
        assert!(!output.is_coherent());
        assert_eq!(output.get(), Some(6));
        input.recohere_output(2);
        assert_eq!(output.get(), Some(10));
    }

    #[test]
    fn test_backward_pull() {
        let input = ValueInput::new(3);
        let double = MapValueOperator::new(|x: &i32| x * 2);
        double.bind_output(&(input.clone() as Rc<dyn Outlet<i32>>));
        let output = sink(double.clone() as Rc<dyn Outlet<i32>>);

        output.recohere_input(1);
        assert_eq!(output.get(), Some(6));
        assert_eq!(double.get(), Some(6));
    }

    #[test]
    fn test_recohere_is_idempotent() {
        let calls = Rc::new(Cell::new(0));
        let counted = calls.clone();
        let input = ValueInput::new(1);
        let op = MapValueOperator::new(move |x: &i32| {
            counted.set(counted.get() + 1);
            x + 1
        });
        op.bind_output(&(input.clone() as Rc<dyn Outlet<i32>>));
        input.recohere_output(1);
        input.recohere_output(1);
        op.recohere_output(2);
        assert_eq!(calls.get(), 1);
        input.set(2);
        op.recohere_output(3);
        op.recohere_output(3);
        assert_eq!(calls.get(), 2);
        assert_eq!(op.get(), Some(3));
    }

    #[test]
    fn test_unbind() {
        let input = ValueInput::new(4);
        let output = sink(input.clone() as Rc<dyn Outlet<i32>>);
        assert!(output.input().is_some());
        input.unbind_inputs();
        assert!(output.input().is_none());
        output.recohere_input(1);
        assert_eq!(output.get(), None);

        output.bind_output(&(input.clone() as Rc<dyn Outlet<i32>>));
        output.recohere_input(2);
        assert_eq!(output.get(), Some(4));
        output.unbind_output();
        input.set(9);
        input.recohere_output(3);
        assert_eq!(output.get(), Some(4));
    }

    #[test]
    fn test_cleared_input() {
        let input = ValueInput::new("a".to_string());
        let output = sink(input.clone() as Rc<dyn Outlet<String>>);
        input.recohere_output(1);
        assert_eq!(output.get().as_deref(), Some("a"));
        assert_eq!(input.clear().as_deref(), Some("a"));
        input.recohere_output(2);
        assert_eq!(output.get(), None);
    }
}
