use std::collections::BTreeMap;

use fw_core::{FaultId, FaultSet};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Faults to union into functions before one step, keyed by function name.
///
/// Functions without an entry are updated with `{nominal}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Injections {
    faults: IndexMap<String, FaultSet>,
}

impl Injections {
    /// No injections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject `fault` into `function`, builder style.
    pub fn with(mut self, function: impl Into<String>, fault: impl Into<FaultId>) -> Self {
        self.insert(function, fault);
        self
    }

    /// Inject `fault` into `function`. Faults for the same function accumulate.
    pub fn insert(&mut self, function: impl Into<String>, fault: impl Into<FaultId>) {
        self.faults
            .entry(function.into())
            .or_default()
            .add(fault);
    }

    /// Faults for `function`, if any were scheduled.
    pub fn get(&self, function: &str) -> Option<&FaultSet> {
        self.faults.get(function)
    }

    /// Target function names in insertion order.
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.faults.keys().map(String::as_str)
    }

    /// `(function, faults)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FaultSet)> {
        self.faults.iter().map(|(name, set)| (name.as_str(), set))
    }

    /// Return `true` if nothing is injected.
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Injections keyed by clock tick, for [`Model::run`](crate::Model::run).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultSchedule {
    ticks: BTreeMap<u64, Injections>,
}

impl FaultSchedule {
    /// A schedule with no injections (a nominal run).
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject `fault` into `function` at `tick`, builder style.
    pub fn at(
        mut self,
        tick: u64,
        function: impl Into<String>,
        fault: impl Into<FaultId>,
    ) -> Self {
        self.insert(tick, function, fault);
        self
    }

    /// Inject `fault` into `function` at `tick`.
    pub fn insert(&mut self, tick: u64, function: impl Into<String>, fault: impl Into<FaultId>) {
        self.ticks.entry(tick).or_default().insert(function, fault);
    }

    /// Injections scheduled for `tick`.
    pub fn injections_at(&self, tick: u64) -> Option<&Injections> {
        self.ticks.get(&tick)
    }

    /// Ticks that carry injections, ascending.
    pub fn ticks(&self) -> impl Iterator<Item = u64> + '_ {
        self.ticks.keys().copied()
    }

    /// Number of ticks that carry injections.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Return `true` if no injections are scheduled.
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
