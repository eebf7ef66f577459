use fw_core::{
    FaultId, FieldValue, Flow, FlowId, FlowTable, FwError, StateBlock, SubComponent, Timer,
};
use indexmap::IndexMap;

use crate::error::{ModelError, ModelResult};

/// Mutable context passed to a function's behavior during an update.
///
/// Gives access to the function's own state and components, and to exactly
/// the flows it is bound to, by port name.
pub struct FunctionContext<'a> {
    pub(crate) function: &'a str,
    pub(crate) block: &'a mut StateBlock,
    pub(crate) components: &'a mut IndexMap<String, SubComponent>,
    pub(crate) ports: &'a IndexMap<String, FlowId>,
    pub(crate) flows: &'a mut FlowTable,
    pub(crate) time: f64,
}

impl FunctionContext<'_> {
    /// Name of the function being updated.
    pub fn function(&self) -> &str {
        self.function
    }

    /// Time of the current update.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Time of the previous update, or `None` if the function is not timely.
    pub fn last_time(&self) -> Option<f64> {
        self.block.time()
    }

    /// Time elapsed since the previous update; 0 if the function is not
    /// timely or time has not moved forward.
    pub fn elapsed(&self) -> f64 {
        match self.block.time() {
            Some(last) if self.time > last => self.time - last,
            _ => 0.0,
        }
    }

    /// Whether time moved forward since the previous update of a timely function.
    pub fn advanced(&self) -> bool {
        self.elapsed() > 0.0
    }

    // -----------------------------------------------------------------------
    // Flows
    // -----------------------------------------------------------------------

    fn resolve(&self, port: &str) -> ModelResult<FlowId> {
        self.ports
            .get(port)
            .copied()
            .ok_or_else(|| self.unbound(port))
    }

    fn unbound(&self, port: &str) -> ModelError {
        ModelError::UnboundPort {
            function: self.function.to_string(),
            port: port.to_string(),
        }
    }

    /// The flow bound to `port`.
    pub fn flow(&self, port: &str) -> ModelResult<&Flow> {
        let id = self.resolve(port)?;
        self.flows.get(id).ok_or_else(|| self.unbound(port))
    }

    /// The flow bound to `port`, mutably.
    pub fn flow_mut(&mut self, port: &str) -> ModelResult<&mut Flow> {
        let id = self.resolve(port)?;
        let err = self.unbound(port);
        self.flows.get_mut(id).ok_or(err)
    }

    /// Read a numeric field of the flow bound to `port`.
    pub fn read(&self, port: &str, field: &str) -> ModelResult<f64> {
        Ok(self.flow(port)?.get_f64(field)?)
    }

    /// Write a field of the flow bound to `port`.
    pub fn write(&mut self, port: &str, field: &str, value: impl Into<FieldValue>) -> ModelResult<()> {
        Ok(self.flow_mut(port)?.set(field, value)?)
    }

    // -----------------------------------------------------------------------
    // Own state
    // -----------------------------------------------------------------------

    /// The function's own state.
    pub fn state(&self) -> &StateBlock {
        self.block
    }

    /// The function's own state, mutably.
    pub fn state_mut(&mut self) -> &mut StateBlock {
        self.block
    }

    /// Read a numeric field of the function's own state.
    pub fn get(&self, field: &str) -> ModelResult<f64> {
        Ok(self.block.get_f64(field)?)
    }

    /// Write a field of the function's own state.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> ModelResult<()> {
        Ok(self.block.set(field, value)?)
    }

    /// Whether the function has `fault` active.
    pub fn has_fault(&self, fault: impl Into<FaultId>) -> bool {
        self.block.has_fault(fault)
    }

    /// Raise a fault on the function.
    pub fn add_fault(&mut self, fault: impl Into<FaultId>) {
        self.block.add_fault(fault);
    }

    /// Replace an active fault on the function with another.
    pub fn replace_fault(
        &mut self,
        old: impl Into<FaultId>,
        new: impl Into<FaultId>,
    ) -> ModelResult<()> {
        Ok(self.block.replace_fault(old, new)?)
    }

    /// A named timer on the function.
    pub fn timer(&mut self, name: &str) -> ModelResult<&mut Timer> {
        let owner = self.function.to_string();
        self.block.timer_mut(name).ok_or_else(|| {
            ModelError::Block(FwError::Validation(format!(
                "unknown timer \"{name}\" on {owner}"
            )))
        })
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    /// A named sub-component.
    pub fn component(&mut self, name: &str) -> ModelResult<&mut SubComponent> {
        let owner = self.function.to_string();
        self.components.get_mut(name).ok_or_else(|| {
            ModelError::Block(FwError::UnknownComponent {
                owner,
                component: name.to_string(),
            })
        })
    }

    /// All sub-components in declaration order.
    pub fn components(&mut self) -> impl Iterator<Item = &mut SubComponent> {
        self.components.values_mut()
    }
}
