//! Function–flow models and fault propagation for Faultwerk.
//!
//! A [`Model`] registers [`Flow`](fw_core::Flow)s and functions, binds each
//! function to the flows it reads and writes, and steps them in registration
//! order. Faults injected into one function change what it writes to its
//! flows, and so what every function sharing those flows computes next.
//! [`Model::copy`] branches a scenario into a model that shares nothing with
//! the original; [`Model::snapshot_state_graph`] and
//! [`Model::snapshot_fault_modes`] extract plain data for offline analysis.

/// Simulation clock mapping ticks onto model time.
pub mod clock;
/// Configuration types for models.
pub mod config;
/// Mutable context passed to function behaviors each update.
pub mod context;
/// Error types for the model crate.
pub mod error;
/// Model event types and the event log.
pub mod event;
/// Function behaviors, definitions, and bound function nodes.
pub mod function;
/// Bipartite function–flow graph and its function projection.
pub mod graph;
/// The model orchestrator.
pub mod model;
/// Fault injections per step and per tick.
pub mod schedule;
/// Alias-free snapshots of model state and active faults.
pub mod snapshot;

/// Re-export of [`clock::SimClock`].
pub use clock::SimClock;
/// Re-export of [`config::ModelConfig`].
pub use config::ModelConfig;
/// Re-export of [`context::FunctionContext`].
pub use context::FunctionContext;
/// Re-exports of [`error::ModelError`] and [`error::ModelResult`].
pub use error::{ModelError, ModelResult};
/// Re-exports of [`event::EventLog`], [`event::ModelEvent`], and [`event::ModelEventKind`].
pub use event::{EventLog, ModelEvent, ModelEventKind};
/// Re-exports of the function types.
pub use function::{FaultDelta, FunctionBehavior, FunctionDef, FunctionNode};
/// Re-exports of the graph types.
pub use graph::{BipartiteGraph, FunctionGraph, ModelGraph};
/// Re-exports of [`model::Model`] and [`model::ModelId`].
pub use model::{Model, ModelId};
/// Re-exports of [`schedule::FaultSchedule`] and [`schedule::Injections`].
pub use schedule::{FaultSchedule, Injections};
/// Re-exports of the snapshot types.
pub use snapshot::{EdgeState, FaultModeReport, FunctionFaults, StateGraph};
