//! Scalar ports and the edge bookkeeping every node shares.
//!
//! An [`Outlet`] publishes a value; an [`Inlet`] consumes one. Propagation
//! runs in two phases. `decohere_*` marks a port stale and fans the mark out
//! downstream without computing anything. `recohere_*(version)` brings a
//! stale port up to date, pulling its sources first, and is a no-op on a
//! port that is already coherent.
//!
//! Ports are named from their own side: `Inlet::bind_output` attaches the
//! inlet to an outlet, and `Outlet::bind_input` records an inlet that reads
//! from it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A port that publishes values of type `V`.
pub trait Outlet<V> {
    /// Last coherent value, if any.
    fn get(&self) -> Option<V>;

    /// Records `inlet` as a reader. Only the back-reference is stored; use
    /// [`Inlet::bind_output`] to connect both sides.
    fn bind_input(&self, inlet: Weak<dyn Inlet<V>>);

    fn unbind_input(&self, inlet: &Weak<dyn Inlet<V>>);

    /// Detaches every reader.
    fn unbind_inputs(&self);

    fn decohere_output(&self);

    fn recohere_output(&self, version: u64);
}

/// A port that consumes values of type `V`.
pub trait Inlet<V> {
    /// The outlet this inlet reads from, while it is alive.
    fn input(&self) -> Option<Rc<dyn Outlet<V>>>;

    /// Reads from `outlet`, replacing any previous binding. The inlet is
    /// decohered so the next wave recomputes it.
    fn bind_output(&self, outlet: &Rc<dyn Outlet<V>>);

    fn unbind_output(&self);

    fn decohere_input(&self);

    fn recohere_input(&self, version: u64);
}

// =============================================================================
// Edges
// =============================================================================

/// The inlet side of an edge: a weak reference to the source, plus an
/// optional strong hold for sources nobody else owns.
pub(crate) struct InletEdge<T: ?Sized> {
    input: RefCell<Option<Weak<T>>>,
    held: RefCell<Option<Rc<T>>>,
}

impl<T: ?Sized> InletEdge<T> {
    pub(crate) fn new() -> Self {
        Self {
            input: RefCell::new(None),
            held: RefCell::new(None),
        }
    }

    pub(crate) fn get(&self) -> Option<Rc<T>> {
        self.input.borrow().as_ref().and_then(Weak::upgrade)
    }

    pub(crate) fn set(&self, outlet: &Rc<T>) {
        *self.input.borrow_mut() = Some(Rc::downgrade(outlet));
    }

    /// Keeps `outlet` alive for as long as this edge is bound.
    pub(crate) fn hold(&self, outlet: Rc<T>) {
        *self.held.borrow_mut() = Some(outlet);
    }

    /// Clears the edge, returning the source if it is still alive.
    pub(crate) fn clear(&self) -> Option<Rc<T>> {
        let input = self.input.borrow_mut().take();
        let held = self.held.borrow_mut().take();
        held.or_else(|| input.and_then(|input| input.upgrade()))
    }
}

/// The outlet side of an edge: weak references to every reader.
pub(crate) struct Outputs<T: ?Sized> {
    inlets: RefCell<Vec<Weak<T>>>,
}

impl<T: ?Sized> Outputs<T> {
    pub(crate) fn new() -> Self {
        Self { inlets: RefCell::new(Vec::new()) }
    }

    pub(crate) fn bind(&self, inlet: Weak<T>) {
        let mut inlets = self.inlets.borrow_mut();
        if !inlets.iter().any(|bound| same(bound, &inlet)) {
            inlets.push(inlet);
        }
    }

    pub(crate) fn unbind(&self, inlet: &Weak<T>) {
        self.inlets.borrow_mut().retain(|bound| !same(bound, inlet));
    }

    /// Removes every reader, returning the ones still alive.
    pub(crate) fn take(&self) -> Vec<Rc<T>> {
        let inlets = std::mem::take(&mut *self.inlets.borrow_mut());
        inlets.iter().filter_map(Weak::upgrade).collect()
    }

    /// Live readers, in binding order. Dead references are pruned.
    pub(crate) fn snapshot(&self) -> Vec<Rc<T>> {
        let mut inlets = self.inlets.borrow_mut();
        inlets.retain(|inlet| inlet.strong_count() > 0);
        inlets.iter().filter_map(Weak::upgrade).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.inlets.borrow().iter().filter(|inlet| inlet.strong_count() > 0).count()
    }
}

/// Identity of two port references, ignoring vtables.
fn same<T: ?Sized>(a: &Weak<T>, b: &Weak<T>) -> bool {
    std::ptr::addr_eq(a.as_ptr(), b.as_ptr())
}
