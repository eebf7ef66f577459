use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FwError, FwResult};
use crate::fault::{FaultId, FaultMode, FaultModes, FaultSet};
use crate::timer::Timer;
use crate::value::{FieldValue, Fields};

/// A point-in-time copy of a block's fields and faults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSnapshot {
    /// Field values at the time of the snapshot.
    pub fields: Fields,
    /// Active faults at the time of the snapshot, including `nominal`.
    pub faults: FaultSet,
}

/// Mutable state shared by functions and sub-components: declared fields,
/// the active fault set, declared fault modes, timers, and (for timely
/// blocks) the time of the last update.
#[derive(Debug, Clone, PartialEq)]
pub struct StateBlock {
    owner: String,
    fields: Fields,
    initial: Fields,
    faults: FaultSet,
    modes: FaultModes,
    timers: IndexMap<String, Timer>,
    time: Option<f64>,
}

impl StateBlock {
    /// Create a timely block. `fields` becomes the initial snapshot.
    pub fn new(fields: Fields) -> Self {
        Self {
            owner: String::new(),
            initial: fields.clone(),
            fields,
            faults: FaultSet::nominal(),
            modes: FaultModes::new(),
            timers: IndexMap::new(),
            time: Some(0.0),
        }
    }

    /// Set the name reported in errors.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Mark the block as timely (tracks last update time) or not.
    pub fn with_timely(mut self, timely: bool) -> Self {
        self.time = timely.then_some(0.0);
        self
    }

    /// Attach declared fault modes.
    pub fn with_modes(mut self, modes: FaultModes) -> Self {
        self.modes = modes;
        self
    }

    /// Add a named timer.
    pub fn with_timer(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.timers.insert(name.clone(), Timer::new(name));
        self
    }

    /// Name reported in errors.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    // -----------------------------------------------------------------------
    // Faults
    // -----------------------------------------------------------------------

    /// Whether `fault` is active.
    pub fn has_fault(&self, fault: impl Into<FaultId>) -> bool {
        self.faults.has(&fault.into())
    }

    /// Whether any of `faults` is active.
    pub fn has_any_fault<I, F>(&self, faults: I) -> bool
    where
        I: IntoIterator<Item = F>,
        F: Into<FaultId>,
    {
        faults.into_iter().any(|f| self.faults.has(&f.into()))
    }

    /// Union a fault into the active set. Idempotent.
    pub fn add_fault(&mut self, fault: impl Into<FaultId>) {
        self.faults.add(fault);
    }

    /// Union several faults into the active set.
    pub fn add_faults<I, F>(&mut self, faults: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<FaultId>,
    {
        self.faults.add_all(faults);
    }

    /// Remove `old` and add `new`.
    ///
    /// Fails with [`FwError::FaultNotPresent`] if `old` is not active; the
    /// fault set is left unchanged in that case.
    pub fn replace_fault(
        &mut self,
        old: impl Into<FaultId>,
        new: impl Into<FaultId>,
    ) -> FwResult<()> {
        let old = old.into();
        if self.faults.replace(&old, new.into()) {
            Ok(())
        } else {
            Err(FwError::FaultNotPresent {
                owner: self.owner.clone(),
                fault: old,
            })
        }
    }

    /// The active fault set.
    pub fn faults(&self) -> &FaultSet {
        &self.faults
    }

    /// Declared fault modes.
    pub fn modes(&self) -> &FaultModes {
        &self.modes
    }

    /// Metadata for a declared mode.
    pub fn mode(&self, id: &FaultId) -> Option<&FaultMode> {
        self.modes.get(id)
    }

    // -----------------------------------------------------------------------
    // Fields
    // -----------------------------------------------------------------------

    /// Current field values.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Field values captured at construction.
    pub fn initial_fields(&self) -> &Fields {
        &self.initial
    }

    /// Look up a field value.
    pub fn get(&self, name: &str) -> FwResult<&FieldValue> {
        self.fields.require(&self.owner, name)
    }

    /// Read a numeric field.
    pub fn get_f64(&self, name: &str) -> FwResult<f64> {
        self.fields.get_f64(&self.owner, name)
    }

    /// Read a text field.
    pub fn get_str(&self, name: &str) -> FwResult<&str> {
        self.fields.get_str(&self.owner, name)
    }

    /// Overwrite a declared field.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> FwResult<()> {
        self.fields.set(&self.owner, name, value)
    }

    // -----------------------------------------------------------------------
    // Time and timers
    // -----------------------------------------------------------------------

    /// Whether this block tracks the time of its last update.
    pub fn is_timely(&self) -> bool {
        self.time.is_some()
    }

    /// Time of the last update. `None` for blocks that are not timely.
    pub fn time(&self) -> Option<f64> {
        self.time
    }

    /// Record the time of an update. Ignored by blocks that are not timely.
    pub fn set_time(&mut self, time: f64) {
        if let Some(t) = self.time.as_mut() {
            *t = time;
        }
    }

    /// A named timer.
    pub fn timer(&self, name: &str) -> Option<&Timer> {
        self.timers.get(name)
    }

    /// A named timer, mutably.
    pub fn timer_mut(&mut self, name: &str) -> Option<&mut Timer> {
        self.timers.get_mut(name)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Restore initial fields, clear faults to `{nominal}`, zero timers and time.
    pub fn reset(&mut self) {
        self.fields = self.initial.clone();
        self.faults.clear();
        self.timers.values_mut().for_each(Timer::reset);
        self.set_time(0.0);
    }

    /// Independent copies of the current fields and faults.
    pub fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot {
            fields: self.fields.clone(),
            faults: self.faults.clone(),
        }
    }
}
