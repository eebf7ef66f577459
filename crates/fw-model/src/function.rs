use std::any::Any;
use std::fmt;

use fw_core::{
    BlockSnapshot, FaultId, FaultMode, FaultModes, FaultSet, FieldValue, Fields, FlowId,
    FlowTable, FwError, StateBlock, SubComponent,
};
use indexmap::IndexMap;

use crate::context::FunctionContext;
use crate::error::{ModelError, ModelResult};

/// The per-step logic of a function.
///
/// Each update runs [`condition_faults`](Self::condition_faults) and then
/// [`behavior`](Self::behavior), in that order, so a fault discovered at
/// time `t` always shapes the behavior at `t`.
pub trait FunctionBehavior: fmt::Debug + Send {
    /// Inspect flows and state and raise any faults they imply.
    ///
    /// Must not assume `behavior` has already run in this update.
    fn condition_faults(&mut self, _ctx: &mut FunctionContext<'_>) -> ModelResult<()> {
        Ok(())
    }

    /// Compute this function's outputs into its flows.
    fn behavior(&mut self, _ctx: &mut FunctionContext<'_>) -> ModelResult<()> {
        Ok(())
    }

    /// Clear any state kept outside the function's state block. Optional hook.
    fn reset(&mut self) {}

    /// Clone into a new box. Used when a scenario branch is copied.
    fn clone_box(&self) -> Box<dyn FunctionBehavior>;

    /// Support downcasting to concrete types for inspection.
    fn as_any(&self) -> &dyn Any;

    /// Support downcasting to concrete types for inspection.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl Clone for Box<dyn FunctionBehavior> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Everything needed to construct a function, short of its flow bindings.
///
/// Passed to [`Model::add_function`](crate::Model::add_function).
#[derive(Debug)]
pub struct FunctionDef {
    logic: Box<dyn FunctionBehavior>,
    ports: Vec<String>,
    fields: Fields,
    modes: FaultModes,
    timers: Vec<String>,
    timely: bool,
    components: Vec<SubComponent>,
}

impl FunctionDef {
    /// A timely function with no ports, state, modes, or components.
    pub fn new(logic: impl FunctionBehavior + 'static) -> Self {
        Self {
            logic: Box::new(logic),
            ports: Vec::new(),
            fields: Fields::new(),
            modes: FaultModes::new(),
            timers: Vec::new(),
            timely: true,
            components: Vec::new(),
        }
    }

    /// Declare local port names. Flows passed to `add_function` bind to
    /// these positionally. Without ports, the flow names are the port names.
    pub fn ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ports = ports.into_iter().map(Into::into).collect();
        self
    }

    /// Declare a state field and its initial value.
    pub fn state(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.declare(name, value);
        self
    }

    /// Mark the function as timely (default) or not.
    pub fn timely(mut self, timely: bool) -> Self {
        self.timely = timely;
        self
    }

    /// Declare a fault mode.
    pub fn mode(mut self, id: impl Into<FaultId>, mode: FaultMode) -> Self {
        self.modes.insert(id, mode);
        self
    }

    /// Declare several fault modes.
    pub fn modes(mut self, modes: FaultModes) -> Self {
        for (id, mode) in modes.iter() {
            self.modes.insert(id.clone(), mode.clone());
        }
        self
    }

    /// Add a named timer.
    pub fn timer(mut self, name: impl Into<String>) -> Self {
        self.timers.push(name.into());
        self
    }

    /// Add a sub-component.
    pub fn component(mut self, component: SubComponent) -> Self {
        self.components.push(component);
        self
    }

    pub(crate) fn declared_ports(&self) -> &[String] {
        &self.ports
    }

    pub(crate) fn into_node(
        self,
        name: &str,
        ports: IndexMap<String, FlowId>,
        flow_names: Vec<String>,
    ) -> ModelResult<FunctionNode> {
        let mut block = StateBlock::new(self.fields)
            .with_owner(name)
            .with_timely(self.timely)
            .with_modes(self.modes);
        for timer in self.timers {
            block = block.with_timer(timer);
        }

        let mut components = IndexMap::new();
        for component in self.components {
            let cname = component.name().to_string();
            if components.insert(cname.clone(), component).is_some() {
                return Err(FwError::Validation(format!(
                    "duplicate component \"{cname}\" on {name}"
                ))
                .into());
            }
        }

        Ok(FunctionNode {
            name: name.to_string(),
            block,
            components,
            ports,
            flow_names,
            logic: self.logic,
        })
    }
}

/// Faults that changed on a function during one update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaultDelta {
    /// Faults that arrived through injection.
    pub injected: Vec<FaultId>,
    /// Faults the function raised itself while conditioning or behaving.
    pub raised: Vec<FaultId>,
    /// Faults present before the update (or injected) but gone afterwards.
    pub cleared: Vec<FaultId>,
}

impl FaultDelta {
    /// Return `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.injected.is_empty() && self.raised.is_empty() && self.cleared.is_empty()
    }
}

/// A function bound to a fixed set of flows, with its own state, fault set,
/// and optional sub-components.
#[derive(Debug, Clone)]
pub struct FunctionNode {
    name: String,
    block: StateBlock,
    components: IndexMap<String, SubComponent>,
    ports: IndexMap<String, FlowId>,
    flow_names: Vec<String>,
    logic: Box<dyn FunctionBehavior>,
}

impl FunctionNode {
    /// Function name, unique within a model.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The function's own state.
    pub fn state(&self) -> &StateBlock {
        &self.block
    }

    /// The function's own state, mutably.
    pub fn state_mut(&mut self) -> &mut StateBlock {
        &mut self.block
    }

    /// Whether the function tracks the time of its last update.
    pub fn is_timely(&self) -> bool {
        self.block.is_timely()
    }

    /// A named sub-component.
    pub fn component(&self, name: &str) -> Option<&SubComponent> {
        self.components.get(name)
    }

    /// Sub-components in declaration order.
    pub fn components(&self) -> impl Iterator<Item = &SubComponent> {
        self.components.values()
    }

    /// Port names and the flows they are bound to, in binding order.
    pub fn ports(&self) -> impl Iterator<Item = (&str, FlowId)> {
        self.ports.iter().map(|(p, id)| (p.as_str(), *id))
    }

    /// Model flow names this function is bound to, in binding order.
    pub fn flow_names(&self) -> &[String] {
        &self.flow_names
    }

    /// The concrete behavior, if it has type `T`.
    pub fn behavior<T: FunctionBehavior + 'static>(&self) -> Option<&T> {
        self.logic.as_any().downcast_ref::<T>()
    }

    /// The concrete behavior, mutably, if it has type `T`.
    pub fn behavior_mut<T: FunctionBehavior + 'static>(&mut self) -> Option<&mut T> {
        self.logic.as_any_mut().downcast_mut::<T>()
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Run the fault-conditioning phase alone.
    pub fn condition_faults(&mut self, flows: &mut FlowTable, time: f64) -> ModelResult<()> {
        let Self {
            name,
            block,
            components,
            ports,
            logic,
            ..
        } = self;
        let mut ctx = FunctionContext {
            function: name,
            block,
            components,
            ports,
            flows,
            time,
        };
        logic.condition_faults(&mut ctx)
    }

    /// Run the behavior phase alone.
    pub fn evaluate_behavior(&mut self, flows: &mut FlowTable, time: f64) -> ModelResult<()> {
        let Self {
            name,
            block,
            components,
            ports,
            logic,
            ..
        } = self;
        let mut ctx = FunctionContext {
            function: name,
            block,
            components,
            ports,
            flows,
            time,
        };
        logic.behavior(&mut ctx)
    }

    /// Union injected faults, condition faults, evaluate behavior, then
    /// record `time` (timely functions only).
    ///
    /// Scoped ids such as `cell01/short` are routed to the named component;
    /// the `nominal` sentinel is ignored.
    pub fn update(
        &mut self,
        flows: &mut FlowTable,
        faults: &FaultSet,
        time: f64,
    ) -> ModelResult<FaultDelta> {
        let before = self.aggregate_fault_modes();
        self.inject(faults);
        let injected = self.aggregate_fault_modes();

        self.condition_faults(flows, time)?;
        self.evaluate_behavior(flows, time)?;
        self.block.set_time(time);

        let after = self.aggregate_fault_modes();
        Ok(FaultDelta {
            injected: injected.active().filter(|f| !before.has(f)).cloned().collect(),
            raised: after.active().filter(|f| !injected.has(f)).cloned().collect(),
            cleared: injected.active().filter(|f| !after.has(f)).cloned().collect(),
        })
    }

    fn inject(&mut self, faults: &FaultSet) {
        if faults.has(&FaultId::nominal()) {
            self.block.add_fault(FaultId::nominal());
        }
        for fault in faults.active() {
            match fault
                .split_scope()
                .and_then(|(component, local)| Some((self.components.get_mut(component)?, local)))
            {
                Some((component, local)) => component.state_mut().add_fault(local),
                None => self.block.add_fault(fault.clone()),
            }
        }
    }

    /// Restore initial state, reset components, then re-derive nominal
    /// outputs with an update at time 0.
    ///
    /// Flows must be reset before this is called.
    pub fn reset(&mut self, flows: &mut FlowTable) -> ModelResult<()> {
        self.block.reset();
        self.components.values_mut().for_each(SubComponent::reset);
        self.logic.reset();
        self.update(flows, &FaultSet::nominal(), 0.0)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Own faults plus every component's active faults, namespaced by
    /// component name.
    pub fn aggregate_fault_modes(&self) -> FaultSet {
        let mut set = self.block.faults().clone();
        for component in self.components.values() {
            set.add_all(component.scoped_faults());
        }
        set
    }

    /// Declared metadata for an own or scoped component fault.
    pub fn fault_mode(&self, id: &FaultId) -> Option<&FaultMode> {
        self.block.mode(id).or_else(|| {
            let (component, local) = id.split_scope()?;
            self.components.get(component)?.state().mode(&local)
        })
    }

    /// Independent copies of the function's own fields and faults.
    pub fn snapshot(&self) -> BlockSnapshot {
        self.block.snapshot()
    }

    // -----------------------------------------------------------------------
    // Branching
    // -----------------------------------------------------------------------

    /// A new function bound to `ports` (already resolved against copied
    /// flows), carrying this function's current faults, fields, time,
    /// timers, and component states.
    pub fn copy(&self, ports: IndexMap<String, FlowId>) -> ModelResult<FunctionNode> {
        if ports.len() != self.ports.len() || !ports.keys().eq(self.ports.keys()) {
            return Err(ModelError::PortMismatch {
                function: self.name.clone(),
                expected: self.ports.len(),
                found: ports.len(),
            });
        }

        Ok(FunctionNode {
            name: self.name.clone(),
            block: self.block.clone(),
            components: self.components.clone(),
            ports,
            flow_names: self.flow_names.clone(),
            logic: self.logic.clone_box(),
        })
    }
}
