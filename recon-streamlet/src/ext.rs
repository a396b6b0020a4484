//! Fluent graph building.
//!
//! Each combinator creates a node, binds it to the receiver and returns it:
//!
//! ```
//! use std::rc::Rc;
//! use recon_streamlet::{MapInput, MapOutlet, MapOutletExt, Outlet};
//!
//! let input: Rc<MapInput<&str, i64>> = MapInput::new();
//! let n = input.map_values(|x: &i64| x * x).outlet("n");
//! input.put("n", 2);
//! input.recohere_output(1);
//! assert_eq!(n.get(), Some(4));
//! ```
//!
//! A node built this way holds its source alive, so only the end of the
//! chain needs an owner. The source does not hold the node.

use std::fmt;
use std::rc::Rc;

use crate::map::{KeyOutlet, MapOutlet};
use crate::operator::{FilterFieldsOperator, MapFieldValuesOperator};
use crate::port::Outlet;
use crate::value::MapValueOperator;

/// Combinators over scalar outlets.
pub trait OutletExt<V> {
    /// Applies `func` to every value.
    fn map<O, F>(&self, func: F) -> Rc<MapValueOperator<V, O>>
    where
        O: Clone + 'static,
        F: Fn(&V) -> O + 'static;
}

impl<V, T> OutletExt<V> for Rc<T>
where
    V: Clone + 'static,
    T: Outlet<V> + 'static,
{
    fn map<O, F>(&self, func: F) -> Rc<MapValueOperator<V, O>>
    where
        O: Clone + 'static,
        F: Fn(&V) -> O + 'static,
    {
        let operator = MapValueOperator::new(func);
        operator.bind_owned(self.clone());
        operator
    }
}

/// Combinators over map outlets.
pub trait MapOutletExt<K, V> {
    /// Applies `func` to every value, keeping keys.
    fn map_values<O, F>(&self, func: F) -> Rc<MapFieldValuesOperator<K, V, O>>
    where
        O: Clone + 'static,
        F: Fn(&V) -> O + 'static;

    /// Keeps the entries satisfying `predicate`.
    fn filter<P>(&self, predicate: P) -> Rc<FilterFieldsOperator<K, V>>
    where
        P: Fn(&K, &V) -> bool + 'static;

    /// The entry at `key`, as a scalar outlet.
    fn outlet(&self, key: impl Into<K>) -> Rc<KeyOutlet<K, V>>;
}

impl<K, V, T> MapOutletExt<K, V> for Rc<T>
where
    K: Ord + Clone + fmt::Debug + 'static,
    V: Clone + 'static,
    T: MapOutlet<K, V> + 'static,
{
    fn map_values<O, F>(&self, func: F) -> Rc<MapFieldValuesOperator<K, V, O>>
    where
        O: Clone + 'static,
        F: Fn(&V) -> O + 'static,
    {
        let operator = MapFieldValuesOperator::new(func);
        operator.bind_owned(self.clone());
        operator
    }

    fn filter<P>(&self, predicate: P) -> Rc<FilterFieldsOperator<K, V>>
    where
        P: Fn(&K, &V) -> bool + 'static,
    {
        let operator = FilterFieldsOperator::new(predicate);
        operator.bind_owned(self.clone());
        operator
    }

    fn outlet(&self, key: impl Into<K>) -> Rc<KeyOutlet<K, V>> {
        let outlet = KeyOutlet::new(key.into());
        outlet.bind_owned(self.clone());
        outlet
    }
}
