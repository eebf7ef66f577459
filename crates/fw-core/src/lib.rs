//! Core building blocks for Faultwerk: state blocks, faults, flows, and
//! sub-components.
//!
//! A system model is a set of functions connected by flows. This crate holds
//! the pieces those functions are made of; wiring them into a model and
//! stepping it over time lives in `fw-model`.

/// Fault-bearing state shared by functions and sub-components.
pub mod block;
/// Sub-components: redundant units owned by a function.
pub mod component;
/// Error types used throughout the crate.
pub mod error;
/// Fault identifiers, fault sets, and fault-mode metadata.
pub mod fault;
/// Flows and the per-model flow table.
pub mod flow;
pub mod ops;
/// Named elapsed-time counters.
pub mod timer;
/// Typed field values and declared field maps.
pub mod value;

/// Re-export block types.
pub use block::{BlockSnapshot, StateBlock};
/// Re-export component types.
pub use component::{ComponentBehavior, SubComponent};
/// Re-export error types.
pub use error::{FwError, FwResult};
/// Re-export fault types.
pub use fault::{FaultId, FaultMode, FaultModes, FaultSet};
/// Re-export flow types.
pub use flow::{Flow, FlowId, FlowTable};
/// Re-export the timer type.
pub use timer::Timer;
/// Re-export value types.
pub use value::{FieldValue, Fields};
