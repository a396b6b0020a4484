//! Recon Streamlet Engine
//!
//! Incremental dataflow over a graph of inlets and outlets. Sources mark
//! what changed (decohere) and a later wave recomputes only what depends on
//! it (recohere), either pushed forward from the sources or pulled backward
//! from the sinks. Both directions settle on the same values.
//!
//! # Architecture
//!
//! - **port.rs** - `Inlet`/`Outlet` traits and weak edge bookkeeping
//! - **effect.rs** - `KeyEffect`, the per-key change tag
//! - **value.rs** - Scalar source, sink and mapping stage
//! - **map.rs** - Map ports, sources, sinks and single-key outlets
//! - **operator.rs** - Per-key map operators (field values, filter)
//! - **streamlet.rs** - Named-port streamlets computed by a closure
//! - **ext.rs** - Fluent combinators (`map`, `map_values`, `filter`, `outlet`)
//!
//! # Threading
//!
//! Nodes use `Rc`, `Cell` and `RefCell` and are neither `Send` nor `Sync`.
//! The graph must be acyclic; a cycle recurses without bound.

pub mod effect;
pub mod ext;
pub mod map;
pub mod operator;
pub mod port;
pub mod streamlet;
pub mod value;

pub use effect::KeyEffect;
pub use ext::{MapOutletExt, OutletExt};
pub use map::{Identity, KeyOperator, KeyOutlet, MapInlet, MapInput, MapOutlet, MapOutput};
pub use operator::{FieldValues, FilterFields, FilterFieldsOperator, MapFieldValuesOperator, MapOperator};
pub use port::{Inlet, Outlet};
pub use streamlet::{FnStreamlet, Streamlet, StreamletError, StreamletInlet, StreamletOutlet};
pub use value::{MapValueOperator, ValueInput, ValueOutput};
