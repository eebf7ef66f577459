use std::fmt;

use fw_core::{FaultId, FaultSet, Fields, Flow, FlowId, FlowTable};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use uuid::Uuid;

use crate::clock::SimClock;
use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use crate::event::{EventLog, ModelEvent, ModelEventKind};
use crate::function::{FaultDelta, FunctionBehavior, FunctionDef, FunctionNode};
use crate::graph::ModelGraph;
use crate::schedule::{FaultSchedule, Injections};
use crate::snapshot::{EdgeState, FaultModeReport, FunctionFaults, StateGraph};

/// Unique identifier for a model instance. Every copy gets a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(pub Uuid);

impl ModelId {
    /// Generate a new random model ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModelId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A network of functions exchanging flows.
///
/// Flows and functions are registered once, in order. That order is part of
/// the results: [`step_all`](Self::step_all) updates every function exactly
/// once per call, in registration order, and a function sees the flow values
/// written by functions registered before it in the same step. Flow values
/// written by later functions (including around cycles in the function
/// graph) are seen on the next step; there is no iteration to a fixed point
/// within a step.
pub struct Model {
    id: ModelId,
    config: ModelConfig,
    flows: FlowTable,
    functions: IndexMap<String, FunctionNode>,
    timely: IndexSet<String>,
    graph: ModelGraph,
    clock: SimClock,
    events: EventLog,
    time: f64,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("time", &self.time)
            .field("flows", &self.flows.len())
            .field("functions", &self.functions.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl Model {
    /// Create an empty model.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            id: ModelId::new(),
            clock: SimClock::from_config(&config),
            events: EventLog::new(config.max_events),
            time: config.start_time,
            config,
            flows: FlowTable::new(),
            functions: IndexMap::new(),
            timely: IndexSet::new(),
            graph: ModelGraph::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Register a flow with its initial field values.
    pub fn add_flow(
        &mut self,
        name: impl Into<String>,
        kind: impl Into<String>,
        fields: Fields,
    ) -> ModelResult<FlowId> {
        let name = name.into();
        let id = self
            .flows
            .insert(Flow::new(name.clone(), kind, fields))
            .ok_or_else(|| ModelError::DuplicateFlow(name.clone()))?;
        debug!(model = %self.id, flow = %name, %id, "flow registered");
        self.build_graph();
        Ok(id)
    }

    /// Register a function bound to already-registered flows.
    ///
    /// If `def` declares ports, `flows` binds to them positionally; otherwise
    /// each flow is reachable under its own name.
    pub fn add_function(
        &mut self,
        name: impl Into<String>,
        flows: &[&str],
        def: FunctionDef,
    ) -> ModelResult<()> {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return Err(ModelError::DuplicateFunction(name));
        }

        let mut ids = Vec::with_capacity(flows.len());
        for flow in flows {
            let id = self.flows.id_of(flow).ok_or_else(|| ModelError::UnknownFlow {
                function: name.clone(),
                flow: flow.to_string(),
            })?;
            ids.push(id);
        }

        let declared = def.declared_ports();
        let ports: IndexMap<String, FlowId> = if declared.is_empty() {
            flows.iter().map(|f| f.to_string()).zip(ids).collect()
        } else if declared.len() == flows.len() {
            declared.iter().cloned().zip(ids).collect()
        } else {
            return Err(ModelError::PortMismatch {
                function: name,
                expected: declared.len(),
                found: flows.len(),
            });
        };

        let mut flow_names: Vec<String> = Vec::with_capacity(flows.len());
        for flow in flows {
            if !flow_names.iter().any(|f| f == flow) {
                flow_names.push(flow.to_string());
            }
        }

        let node = def.into_node(&name, ports, flow_names)?;
        if node.is_timely() {
            self.timely.insert(name.clone());
        }
        debug!(model = %self.id, function = %name, timely = node.is_timely(), "function registered");
        self.functions.insert(name, node);
        self.build_graph();
        Ok(())
    }

    /// Rebuild the bipartite graph and its function projection from the
    /// current registrations.
    pub fn build_graph(&mut self) {
        self.graph = ModelGraph::build(
            self.flows.names(),
            self.functions
                .iter()
                .map(|(name, node)| (name.as_str(), node.flow_names())),
        );
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Update every function once at `time`, in registration order.
    ///
    /// Each function receives the faults `injections` holds for it (or
    /// `{nominal}`), conditions faults, then runs its behavior. Injections
    /// naming an unregistered function are rejected before anything runs.
    ///
    /// If a function's update fails, the functions before it have already
    /// written their flows and logged their events, and the model time is
    /// left unchanged. Reset or discard the model after such an error.
    #[instrument(level = "debug", skip_all, fields(model = %self.id, time = time))]
    pub fn step_all(&mut self, time: f64, injections: &Injections) -> ModelResult<()> {
        self.check_targets(injections.functions())?;

        let nominal = FaultSet::nominal();
        for (name, node) in &mut self.functions {
            let faults = injections.get(name).unwrap_or(&nominal);
            let delta = node.update(&mut self.flows, faults, time)?;
            trace!(function = %name, faults = ?node.aggregate_fault_modes(), "function updated");
            record_delta(&mut self.events, name, time, &delta);
        }
        self.time = time;
        Ok(())
    }

    /// Step every tick of the configured time range, applying the schedule's
    /// injections at their ticks.
    ///
    /// The clock is rewound first; it is left on the last tick.
    #[instrument(skip_all, fields(model = %self.id, steps = self.config.step_count()))]
    pub fn run(&mut self, schedule: &FaultSchedule) -> ModelResult<()> {
        for tick in schedule.ticks() {
            if let Some(injections) = schedule.injections_at(tick) {
                self.check_targets(injections.functions())?;
            }
        }

        let none = Injections::new();
        self.clock.rewind();
        for step in 0..self.config.step_count() {
            if step > 0 {
                self.clock.advance();
            }
            let (tick, time) = (self.clock.tick(), self.clock.time());
            let injections = schedule.injections_at(tick).unwrap_or(&none);
            self.step_all(time, injections)?;
        }
        info!(model = %self.id, time = self.time, "run finished");
        Ok(())
    }

    fn check_targets<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> ModelResult<()> {
        for name in names {
            if !self.functions.contains_key(name) {
                return Err(ModelError::UnknownFunction(name.to_string()));
            }
        }
        Ok(())
    }

    /// Restore every flow, then every function, to its initial state.
    ///
    /// Flows go first: each function re-derives its nominal outputs at time 0
    /// from the flow values it reads.
    pub fn reset_all(&mut self) -> ModelResult<()> {
        self.flows.reset();
        for node in self.functions.values_mut() {
            node.reset(&mut self.flows)?;
        }
        self.clock.rewind();
        self.time = self.config.start_time;
        self.events
            .push(ModelEvent::new(self.time, ModelEventKind::Reset, "model reset"));
        info!(model = %self.id, "model reset");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// The function graph annotated with each function's fields and faults
    /// and, per edge, the current values of every shared flow.
    pub fn snapshot_state_graph(&self) -> StateGraph {
        let nodes = self
            .functions
            .iter()
            .map(|(name, node)| (name.clone(), node.snapshot()))
            .collect();
        let edges = self
            .graph
            .functions
            .edges()
            .map(|(a, b, shared)| EdgeState {
                a: a.to_string(),
                b: b.to_string(),
                flows: shared
                    .iter()
                    .filter_map(|f| Some((f.clone(), self.flows.by_name(f)?.status())))
                    .collect(),
            })
            .collect();
        StateGraph {
            time: self.time,
            nodes,
            edges,
        }
    }

    /// Active non-nominal faults per function, component faults included,
    /// with their declared metadata.
    pub fn snapshot_fault_modes(&self) -> FaultModeReport {
        let functions = self
            .functions
            .iter()
            .map(|(name, node)| {
                let active: Vec<FaultId> = node.aggregate_fault_modes().active().cloned().collect();
                let modes = active
                    .iter()
                    .filter_map(|id| Some((id.clone(), node.fault_mode(id)?.clone())))
                    .collect();
                (name.clone(), FunctionFaults { active, modes })
            })
            .collect();
        FaultModeReport {
            time: self.time,
            functions,
        }
    }

    // -----------------------------------------------------------------------
    // Branching
    // -----------------------------------------------------------------------

    /// An independent model with the same current state.
    ///
    /// Flows are copied first; each function's bindings are then resolved by
    /// flow name against the copies, so nothing is shared with `self`. The
    /// copy's event log starts with a single `Branched` event.
    pub fn copy(&self) -> ModelResult<Model> {
        let flows = self.flows.copy();
        let mut functions = IndexMap::with_capacity(self.functions.len());
        for (name, node) in &self.functions {
            let mut ports = IndexMap::new();
            for (port, id) in node.ports() {
                let flow = self
                    .flows
                    .get(id)
                    .and_then(|f| flows.id_of(f.name()))
                    .ok_or_else(|| ModelError::UnknownFlow {
                        function: name.clone(),
                        flow: id.to_string(),
                    })?;
                ports.insert(port.to_string(), flow);
            }
            functions.insert(name.clone(), node.copy(ports)?);
        }

        let id = ModelId::new();
        let mut events = EventLog::new(self.config.max_events);
        events.push(ModelEvent::new(
            self.time,
            ModelEventKind::Branched { parent: self.id },
            format!("copied from model {}", self.id),
        ));

        let mut model = Model {
            id,
            config: self.config.clone(),
            flows,
            functions,
            timely: self.timely.clone(),
            graph: ModelGraph::default(),
            clock: self.clock.clone(),
            events,
            time: self.time,
        };
        model.build_graph();
        info!(model = %id, parent = %self.id, "model copied");
        Ok(model)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// This model's identifier.
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// The configuration this model was created with.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Time of the most recent step or reset.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The clock driven by [`run`](Self::run).
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Recorded fault, reset, and branch events.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The structure built by [`build_graph`](Self::build_graph).
    pub fn graph(&self) -> &ModelGraph {
        &self.graph
    }

    /// All flows in registration order.
    pub fn flows(&self) -> &FlowTable {
        &self.flows
    }

    /// A flow by name.
    pub fn flow(&self, name: &str) -> Option<&Flow> {
        self.flows.by_name(name)
    }

    /// A flow by name, mutably, e.g. to set up an external condition.
    pub fn flow_mut(&mut self, name: &str) -> Option<&mut Flow> {
        self.flows.by_name_mut(name)
    }

    /// A function by name.
    pub fn function(&self, name: &str) -> Option<&FunctionNode> {
        self.functions.get(name)
    }

    /// A function by name, mutably.
    pub fn function_mut(&mut self, name: &str) -> Option<&mut FunctionNode> {
        self.functions.get_mut(name)
    }

    /// All functions in registration order.
    pub fn functions(&self) -> impl Iterator<Item = &FunctionNode> {
        self.functions.values()
    }

    /// Names of the timely functions in registration order.
    pub fn timely_functions(&self) -> impl Iterator<Item = &str> {
        self.timely.iter().map(String::as_str)
    }

    /// Access a function's behavior by downcasting to a concrete type.
    pub fn behavior<T: FunctionBehavior + 'static>(&self, function: &str) -> Option<&T> {
        self.functions.get(function)?.behavior::<T>()
    }

    /// Access a function's behavior mutably by downcasting to a concrete type.
    pub fn behavior_mut<T: FunctionBehavior + 'static>(&mut self, function: &str) -> Option<&mut T> {
        self.functions.get_mut(function)?.behavior_mut::<T>()
    }
}

fn record_delta(events: &mut EventLog, function: &str, time: f64, delta: &FaultDelta) {
    for fault in &delta.injected {
        debug!(%function, %fault, time, "fault injected");
        events.push(ModelEvent::new(
            time,
            ModelEventKind::FaultInjected {
                function: function.to_string(),
                fault: fault.clone(),
            },
            format!("{fault} injected into {function}"),
        ));
    }
    for fault in &delta.raised {
        debug!(%function, %fault, time, "fault raised");
        events.push(ModelEvent::new(
            time,
            ModelEventKind::FaultRaised {
                function: function.to_string(),
                fault: fault.clone(),
            },
            format!("{function} raised {fault}"),
        ));
    }
    for fault in &delta.cleared {
        debug!(%function, %fault, time, "fault cleared");
        events.push(ModelEvent::new(
            time,
            ModelEventKind::FaultCleared {
                function: function.to_string(),
                fault: fault.clone(),
            },
            format!("{fault} cleared from {function}"),
        ));
    }
}
