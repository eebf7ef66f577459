use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::FwResult;
use crate::value::{FieldValue, Fields};

/// Index of a flow inside its [`FlowTable`].
///
/// Functions hold `FlowId`s rather than references, so every function bound
/// to the same flow name resolves to the same record, and copying a table
/// needs no pointer fix-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlowId(pub usize);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow#{}", self.0)
    }
}

/// A named record exchanged between functions.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    name: String,
    kind: String,
    fields: Fields,
    initial: Fields,
}

impl Flow {
    /// Create a flow. `fields` becomes the initial snapshot.
    pub fn new(name: impl Into<String>, kind: impl Into<String>, fields: Fields) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            initial: fields.clone(),
            fields,
        }
    }

    /// Flow name, unique within a model.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form type tag, e.g. `"EE"` or `"Force"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Look up a field value.
    pub fn get(&self, field: &str) -> FwResult<&FieldValue> {
        self.fields.require(&self.name, field)
    }

    /// Read a numeric field.
    pub fn get_f64(&self, field: &str) -> FwResult<f64> {
        self.fields.get_f64(&self.name, field)
    }

    /// Read a text field.
    pub fn get_str(&self, field: &str) -> FwResult<&str> {
        self.fields.get_str(&self.name, field)
    }

    /// Overwrite a declared field.
    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) -> FwResult<()> {
        self.fields.set(&self.name, field, value)
    }

    /// Restore the initial field values.
    pub fn reset(&mut self) {
        self.fields = self.initial.clone();
    }

    /// A copy of the current field values.
    pub fn status(&self) -> Fields {
        self.fields.clone()
    }

    /// Field values captured at construction.
    pub fn initial_fields(&self) -> &Fields {
        &self.initial
    }

    /// An independent flow with the same current values and the same
    /// initial snapshot, so resetting the copy reproduces the original's
    /// initial state.
    pub fn copy(&self) -> Flow {
        Flow {
            name: self.name.clone(),
            kind: self.kind.clone(),
            fields: self.fields.clone(),
            initial: self.initial.clone(),
        }
    }
}

/// The flows of one model, addressable by name or [`FlowId`], in
/// registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowTable {
    flows: IndexMap<String, Flow>,
}

impl FlowTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flow. Returns `None` if a flow with the same name exists.
    pub fn insert(&mut self, flow: Flow) -> Option<FlowId> {
        if self.flows.contains_key(flow.name()) {
            return None;
        }
        let (index, _) = self.flows.insert_full(flow.name().to_string(), flow);
        Some(FlowId(index))
    }

    /// Resolve a flow name.
    pub fn id_of(&self, name: &str) -> Option<FlowId> {
        self.flows.get_index_of(name).map(FlowId)
    }

    /// A flow by id.
    pub fn get(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get_index(id.0).map(|(_, f)| f)
    }

    /// A flow by id, mutably.
    pub fn get_mut(&mut self, id: FlowId) -> Option<&mut Flow> {
        self.flows.get_index_mut(id.0).map(|(_, f)| f)
    }

    /// A flow by name.
    pub fn by_name(&self, name: &str) -> Option<&Flow> {
        self.flows.get(name)
    }

    /// A flow by name, mutably.
    pub fn by_name_mut(&mut self, name: &str) -> Option<&mut Flow> {
        self.flows.get_mut(name)
    }

    /// Reset every flow to its initial values.
    pub fn reset(&mut self) {
        self.flows.values_mut().for_each(Flow::reset);
    }

    /// Copy every flow into a new, independent table. Ids are preserved.
    pub fn copy(&self) -> FlowTable {
        FlowTable {
            flows: self
                .flows
                .iter()
                .map(|(name, flow)| (name.clone(), flow.copy()))
                .collect(),
        }
    }

    /// Flows in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Flow> {
        self.flows.values()
    }

    /// Flow names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.flows.keys().map(String::as_str)
    }

    /// Number of flows.
    pub fn len(&self) -> usize {
        self.flows.len()
    }

    /// Return `true` if no flows are registered.
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}
