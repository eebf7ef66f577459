use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Separator between a component name and its local fault name.
pub const SCOPE_SEPARATOR: char = '/';

/// Identifier of a fault mode, e.g. `"short"` or `"cell01/short"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultId(String);

impl FaultId {
    /// Name of the sentinel carried by every block that has no real fault.
    pub const NOMINAL: &'static str = "nominal";

    /// Create a fault id from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The `nominal` sentinel.
    pub fn nominal() -> Self {
        Self(Self::NOMINAL.to_string())
    }

    /// A fault owned by a named sub-component, e.g. `cell01/short`.
    pub fn scoped(component: &str, fault: &FaultId) -> Self {
        Self(format!("{component}{SCOPE_SEPARATOR}{}", fault.0))
    }

    /// Return `true` for the `nominal` sentinel.
    pub fn is_nominal(&self) -> bool {
        self.0 == Self::NOMINAL
    }

    /// Split a scoped id into `(component, local fault)`.
    pub fn split_scope(&self) -> Option<(&str, FaultId)> {
        self.0
            .split_once(SCOPE_SEPARATOR)
            .map(|(component, fault)| (component, FaultId::new(fault)))
    }

    /// The raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FaultId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FaultId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The set of faults active on a block.
///
/// Never empty: a fresh set holds only `nominal`. Adding faults is a union,
/// so `nominal` stays in the set next to real faults unless it is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultSet {
    faults: BTreeSet<FaultId>,
}

impl Default for FaultSet {
    fn default() -> Self {
        Self::nominal()
    }
}

impl FaultSet {
    /// A set holding only the `nominal` sentinel.
    pub fn nominal() -> Self {
        Self {
            faults: BTreeSet::from([FaultId::nominal()]),
        }
    }

    /// A set holding `nominal` plus the given faults.
    pub fn with_faults<I, F>(faults: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FaultId>,
    {
        let mut set = Self::nominal();
        set.add_all(faults);
        set
    }

    /// Whether `fault` is present.
    pub fn has(&self, fault: &FaultId) -> bool {
        self.faults.contains(fault)
    }

    /// Whether any of `faults` is present.
    pub fn has_any<'a>(&self, faults: impl IntoIterator<Item = &'a FaultId>) -> bool {
        faults.into_iter().any(|f| self.faults.contains(f))
    }

    /// Union a single fault into the set.
    pub fn add(&mut self, fault: impl Into<FaultId>) {
        self.faults.insert(fault.into());
    }

    /// Union several faults into the set.
    pub fn add_all<I, F>(&mut self, faults: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<FaultId>,
    {
        self.faults.extend(faults.into_iter().map(Into::into));
    }

    /// Remove `old` and insert `new`. Returns `false` (and leaves the set
    /// untouched) if `old` was not present.
    pub fn replace(&mut self, old: &FaultId, new: FaultId) -> bool {
        if !self.faults.remove(old) {
            return false;
        }
        self.faults.insert(new);
        true
    }

    /// Back to `{nominal}`.
    pub fn clear(&mut self) {
        *self = Self::nominal();
    }

    /// Faults other than the `nominal` sentinel.
    pub fn active(&self) -> impl Iterator<Item = &FaultId> {
        self.faults.iter().filter(|f| !f.is_nominal())
    }

    /// Return `true` if no real fault is present.
    pub fn is_nominal(&self) -> bool {
        self.active().next().is_none()
    }

    /// All ids including the sentinel, in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &FaultId> {
        self.faults.iter()
    }

    /// Number of ids including the sentinel.
    pub fn len(&self) -> usize {
        self.faults.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }
}

impl<'a> IntoIterator for &'a FaultSet {
    type Item = &'a FaultId;
    type IntoIter = std::collections::btree_set::Iter<'a, FaultId>;

    fn into_iter(self) -> Self::IntoIter {
        self.faults.iter()
    }
}

/// Declared metadata for a fault mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaultMode {
    /// Occurrence rate.
    pub rate: f64,
    /// Relative repair cost.
    pub rcost: f64,
    /// Per-phase share of the rate (opportunity vector); may be empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub opportunity: Vec<f64>,
}

impl FaultMode {
    /// A mode with a rate and repair cost only.
    pub fn new(rate: f64, rcost: f64) -> Self {
        Self {
            rate,
            rcost,
            opportunity: Vec::new(),
        }
    }

    /// Attach a per-phase opportunity vector.
    pub fn with_opportunity(mut self, opportunity: Vec<f64>) -> Self {
        self.opportunity = opportunity;
        self
    }
}

/// The fault modes declared on one block, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultModes {
    modes: IndexMap<FaultId, FaultMode>,
}

impl FaultModes {
    /// No declared modes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build modes from a block failure rate and a distribution over modes.
    ///
    /// Each entry is `(id, share, opportunity, rcost)`; the mode's rate is
    /// `failrate * share`.
    pub fn from_distribution<I, F>(failrate: f64, entries: I) -> Self
    where
        I: IntoIterator<Item = (F, f64, Vec<f64>, f64)>,
        F: Into<FaultId>,
    {
        let modes = entries
            .into_iter()
            .map(|(id, share, opportunity, rcost)| {
                (
                    id.into(),
                    FaultMode::new(failrate * share, rcost).with_opportunity(opportunity),
                )
            })
            .collect();
        Self { modes }
    }

    /// Declare a mode, builder style.
    pub fn with(mut self, id: impl Into<FaultId>, mode: FaultMode) -> Self {
        self.insert(id, mode);
        self
    }

    /// Declare or overwrite a mode.
    pub fn insert(&mut self, id: impl Into<FaultId>, mode: FaultMode) {
        self.modes.insert(id.into(), mode);
    }

    /// Metadata for a declared mode.
    pub fn get(&self, id: &FaultId) -> Option<&FaultMode> {
        self.modes.get(id)
    }

    /// Whether a mode with this id is declared.
    pub fn contains(&self, id: &FaultId) -> bool {
        self.modes.contains_key(id)
    }

    /// Sum of the declared rates.
    pub fn total_rate(&self) -> f64 {
        self.modes.values().map(|m| m.rate).sum()
    }

    /// Declared modes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&FaultId, &FaultMode)> {
        self.modes.iter()
    }

    /// Number of declared modes.
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    /// Return `true` if no modes are declared.
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}
