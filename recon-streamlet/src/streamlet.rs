//! Streamlets with named ports.
//!
//! A streamlet recomputes once per wave, after every one of its inlets is
//! coherent, and then recoheres all of its outlets together.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use thiserror::Error;
use tracing::trace;

use crate::port::{Inlet, InletEdge, Outlet, Outputs};

/// Port lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamletError {
    #[error("unknown inlet '{0}'")]
    UnknownInlet(String),
    #[error("unknown outlet '{0}'")]
    UnknownOutlet(String),
}

/// A node owning named inlets and outlets.
pub trait Streamlet<V> {
    fn inlet(&self, name: &str) -> Result<Rc<dyn Inlet<V>>, StreamletError>;

    fn outlet(&self, name: &str) -> Result<Rc<dyn Outlet<V>>, StreamletError>;

    /// Value of the named outlet as of the last recohere.
    fn get_output(&self, name: &str) -> Result<Option<V>, StreamletError> {
        Ok(self.outlet(name)?.get())
    }

    /// Binds the named inlet to `outlet`.
    fn bind_inlet(&self, name: &str, outlet: &Rc<dyn Outlet<V>>) -> Result<(), StreamletError> {
        self.inlet(name)?.bind_output(outlet);
        Ok(())
    }

    fn decohere(&self);

    fn recohere(&self, version: u64);
}

type Compute<V> = Box<dyn Fn(&BTreeMap<String, V>) -> BTreeMap<String, V>>;

/// A streamlet computed by a closure.
///
/// The closure receives the current value of every bound inlet that has
/// one, keyed by inlet name, and returns values keyed by outlet name.
/// Outlets it leaves out become empty.
pub struct FnStreamlet<V> {
    inlets: BTreeMap<String, Rc<StreamletInlet<V>>>,
    outlets: BTreeMap<String, Rc<StreamletOutlet<V>>>,
    version: Cell<Option<u64>>,
    compute: Compute<V>,
}

impl<V: Clone + 'static> FnStreamlet<V> {
    pub fn new<F>(inlets: &[&str], outlets: &[&str], compute: F) -> Rc<Self>
    where
        F: Fn(&BTreeMap<String, V>) -> BTreeMap<String, V> + 'static,
    {
        Rc::new_cyclic(|owner: &Weak<Self>| Self {
            inlets: inlets
                .iter()
                .map(|name| (name.to_string(), StreamletInlet::new(owner.clone())))
                .collect(),
            outlets: outlets
                .iter()
                .map(|name| (name.to_string(), StreamletOutlet::new(owner.clone())))
                .collect(),
            version: Cell::new(None),
            compute: Box::new(compute),
        })
    }

    pub fn inlet_names(&self) -> impl Iterator<Item = &str> {
        self.inlets.keys().map(String::as_str)
    }

    pub fn outlet_names(&self) -> impl Iterator<Item = &str> {
        self.outlets.keys().map(String::as_str)
    }
}

impl<V: Clone + 'static> Streamlet<V> for FnStreamlet<V> {
    fn inlet(&self, name: &str) -> Result<Rc<dyn Inlet<V>>, StreamletError> {
        match self.inlets.get(name) {
            Some(inlet) => Ok(inlet.clone()),
            None => Err(StreamletError::UnknownInlet(name.to_string())),
        }
    }

    fn outlet(&self, name: &str) -> Result<Rc<dyn Outlet<V>>, StreamletError> {
        match self.outlets.get(name) {
            Some(outlet) => Ok(outlet.clone()),
            None => Err(StreamletError::UnknownOutlet(name.to_string())),
        }
    }

    fn decohere(&self) {
        if self.version.take().is_some() {
            trace!(node = "FnStreamlet", "decohere");
            for outlet in self.outlets.values() {
                outlet.decohere_output();
            }
        }
    }

    fn recohere(&self, version: u64) {
        if self.version.get().is_some() {
            return;
        }
        self.version.set(Some(version));
        for inlet in self.inlets.values() {
            inlet.recohere_input(version);
        }
        let args: BTreeMap<String, V> = self
            .inlets
            .iter()
            .filter_map(|(name, inlet)| inlet.value().map(|value| (name.clone(), value)))
            .collect();
        let mut results = (self.compute)(&args);
        trace!(node = "FnStreamlet", version, inputs = args.len(), "recohere");
        for (name, outlet) in &self.outlets {
            outlet.settle(results.remove(name), version);
        }
    }
}

// =============================================================================
// Ports
// =============================================================================

/// An inlet owned by a streamlet.
pub struct StreamletInlet<V> {
    this: Weak<Self>,
    owner: Weak<FnStreamlet<V>>,
    input: InletEdge<dyn Outlet<V>>,
    version: Cell<Option<u64>>,
}

impl<V: Clone + 'static> StreamletInlet<V> {
    fn new(owner: Weak<FnStreamlet<V>>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            owner,
            input: InletEdge::new(),
            version: Cell::new(None),
        })
    }

    fn value(&self) -> Option<V> {
        self.input.get().and_then(|input| input.get())
    }
}

impl<V: Clone + 'static> Inlet<V> for StreamletInlet<V> {
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
        self.version.set(None);
        if let Some(owner) = self.owner.upgrade() {
            owner.decohere();
        }
    }

    fn recohere_input(&self, version: u64) {
        if self.version.get().is_some() {
            return;
        }
        self.version.set(Some(version));
        if let Some(input) = self.input.get() {
            input.recohere_output(version);
        }
        if let Some(owner) = self.owner.upgrade() {
            owner.recohere(version);
        }
    }
}

/// An outlet owned by a streamlet.
pub struct StreamletOutlet<V> {
    owner: Weak<FnStreamlet<V>>,
    outputs: Outputs<dyn Inlet<V>>,
    version: Cell<Option<u64>>,
    state: RefCell<Option<V>>,
}

impl<V: Clone + 'static> StreamletOutlet<V> {
    fn new(owner: Weak<FnStreamlet<V>>) -> Rc<Self> {
        Rc::new(Self {
            owner,
            outputs: Outputs::new(),
            version: Cell::new(None),
            state: RefCell::new(None),
        })
    }

    /// Stores a freshly computed value and pushes the wave on.
    fn settle(&self, value: Option<V>, version: u64) {
        *self.state.borrow_mut() = value;
        self.finish(version);
    }

    fn finish(&self, version: u64) {
        if self.version.get().is_none() {
            self.version.set(Some(version));
            for inlet in self.outputs.snapshot() {
                inlet.recohere_input(version);
            }
        }
    }
}

impl<V: Clone + 'static> Outlet<V> for StreamletOutlet<V> {
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
            for inlet in self.outputs.snapshot() {
                inlet.decohere_input();
            }
        }
    }

    fn recohere_output(&self, version: u64) {
        if self.version.get().is_some() {
            return;
        }
        if let Some(owner) = self.owner.upgrade() {
            owner.recohere(version);
        }
        self.finish(version);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::value::{ValueInput, ValueOutput};

    fn sum() -> Rc<FnStreamlet<i64>> {
        FnStreamlet::new(&["a", "b"], &["sum", "diff"], |args: &BTreeMap<String, i64>| {
            let a = args.get("a").copied().unwrap_or(0);
            let b = args.get("b").copied().unwrap_or(0);
            [("sum".to_string(), a + b), ("diff".to_string(), a - b)].into_iter().collect()
        })
    }

    fn source(value: i64) -> (Rc<ValueInput<i64>>, Rc<dyn Outlet<i64>>) {
        let input = ValueInput::new(value);
        let outlet: Rc<dyn Outlet<i64>> = input.clone();
        (input, outlet)
    }

    #[test]
    fn test_unknown_ports() {
        let streamlet = sum();
        assert_eq!(streamlet.inlet("c").err(), Some(StreamletError::UnknownInlet("c".to_string())));
        assert_eq!(streamlet.outlet("x").err(), Some(StreamletError::UnknownOutlet("x".to_string())));
        assert_eq!(
            StreamletError::UnknownOutlet("x".to_string()).to_string(),
            "unknown outlet 'x'"
        );
        assert_eq!(streamlet.inlet_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(streamlet.outlet_names().collect::<Vec<_>>(), vec!["diff", "sum"]);
    }

    #[test]
    fn test_named_ports() {
        let streamlet = sum();
        let (a, a_out) = source(7);
        let (b, b_out) = source(2);
        streamlet.bind_inlet("a", &a_out).unwrap();
        streamlet.bind_inlet("b", &b_out).unwrap();

        a.recohere_output(1);
        assert_eq!(streamlet.get_output("sum").unwrap(), Some(9));
        assert_eq!(streamlet.get_output("diff").unwrap(), Some(5));

        b.set(10);
        b.recohere_output(2);
        assert_eq!(streamlet.get_output("sum").unwrap(), Some(17));
        assert_eq!(streamlet.get_output("diff").unwrap(), Some(-3));
        assert!(streamlet.get_output("nope").is_err());
    }

    #[test]
    fn test_recomputes_once_per_wave() {
        let calls = Rc::new(Cell::new(0));
        let counted = calls.clone();
        let streamlet = FnStreamlet::new(&["a", "b"], &["out"], move |args: &BTreeMap<String, i64>| {
            counted.set(counted.get() + 1);
            [("out".to_string(), args.values().sum())].into_iter().collect()
        });
        let (a, a_out) = source(1);
        let (b, b_out) = source(2);
        streamlet.bind_inlet("a", &a_out).unwrap();
        streamlet.bind_inlet("b", &b_out).unwrap();
        let output = ValueOutput::new();
        output.bind_output(&streamlet.outlet("out").unwrap());

        a.recohere_output(1);
        b.recohere_output(1);
        assert_eq!(calls.get(), 1);
        assert_eq!(output.get(), Some(3));

        a.set(5);
        b.set(6);
        output.recohere_input(2);
        assert_eq!(calls.get(), 2);
        assert_eq!(output.get(), Some(11));
    }

    #[test]
    fn test_unbound_inlet_is_missing_from_args() {
        let streamlet = sum();
        let (a, a_out) = source(4);
        streamlet.bind_inlet("a", &a_out).unwrap();
        a.recohere_output(1);
        assert_eq!(streamlet.get_output("diff").unwrap(), Some(4));

        streamlet.inlet("a").unwrap().unbind_output();
        streamlet.outlet("sum").unwrap().recohere_output(2);
        assert_eq!(streamlet.get_output("sum").unwrap(), Some(4));
        streamlet.decohere();
        streamlet.recohere(3);
        assert_eq!(streamlet.get_output("sum").unwrap(), Some(0));
    }
}
