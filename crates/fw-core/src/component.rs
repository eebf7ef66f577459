use std::fmt;

use crate::block::StateBlock;
use crate::error::FwResult;
use crate::fault::{FaultId, FaultModes};
use crate::value::Fields;

/// The step logic of a sub-component.
///
/// Implementations keep their mutable state in the [`StateBlock`] they are
/// handed, so a component can be reset and copied without knowing its
/// concrete type. Inputs are whatever the owning function passes in,
/// typically flow values and command signals; outputs are written to the
/// block's fields.
pub trait ComponentBehavior: fmt::Debug + Send {
    /// Advance the component to `time`.
    ///
    /// `block.time()` still holds the previous update time while this runs.
    fn behavior(&mut self, block: &mut StateBlock, inputs: &Fields, time: f64) -> FwResult<()>;

    /// Clone into a new box. Used when a scenario branch is copied.
    fn clone_box(&self) -> Box<dyn ComponentBehavior>;
}

impl Clone for Box<dyn ComponentBehavior> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A redundant or replaceable unit inside a function, e.g. one battery cell.
///
/// Owned by exactly one function; has no direct access to flows.
#[derive(Debug, Clone)]
pub struct SubComponent {
    name: String,
    block: StateBlock,
    logic: Box<dyn ComponentBehavior>,
}

impl SubComponent {
    /// Create a timely component with the given initial fields.
    pub fn new(
        name: impl Into<String>,
        fields: Fields,
        logic: impl ComponentBehavior + 'static,
    ) -> Self {
        let name = name.into();
        Self {
            block: StateBlock::new(fields).with_owner(name.clone()),
            name,
            logic: Box::new(logic),
        }
    }

    /// Mark the component as timely or not.
    pub fn with_timely(mut self, timely: bool) -> Self {
        self.block = self.block.with_timely(timely);
        self
    }

    /// Declare the component's fault modes, by local id.
    pub fn with_modes(mut self, modes: FaultModes) -> Self {
        self.block = self.block.with_modes(modes);
        self
    }

    /// Component name, unique within its function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The component's state.
    pub fn state(&self) -> &StateBlock {
        &self.block
    }

    /// The component's state, mutably.
    pub fn state_mut(&mut self) -> &mut StateBlock {
        &mut self.block
    }

    /// Run one step and return the resulting fields.
    pub fn behavior(&mut self, inputs: &Fields, time: f64) -> FwResult<&Fields> {
        self.logic.behavior(&mut self.block, inputs, time)?;
        self.block.set_time(time);
        Ok(self.block.fields())
    }

    /// Active non-nominal faults, namespaced with the component name.
    pub fn scoped_faults(&self) -> impl Iterator<Item = FaultId> + '_ {
        self.block
            .faults()
            .active()
            .map(|f| FaultId::scoped(&self.name, f))
    }

    /// Restore the component to its initial state.
    pub fn reset(&mut self) {
        self.block.reset();
    }
}
