use fw_core::{BlockSnapshot, FaultId, FaultMode, Fields};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;

/// One edge of a [`StateGraph`]: two functions and the status of every flow
/// they share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeState {
    /// The earlier-registered function.
    pub a: String,
    /// The later-registered function.
    pub b: String,
    /// Field values of each shared flow, keyed by flow name.
    pub flows: IndexMap<String, Fields>,
}

/// The function graph annotated with state at one point in time.
///
/// Holds no references into the model it was taken from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateGraph {
    /// Model time when the snapshot was taken.
    pub time: f64,
    /// Per function, its own fields and faults.
    pub nodes: IndexMap<String, BlockSnapshot>,
    /// Per function pair sharing flows, those flows' fields.
    pub edges: Vec<EdgeState>,
}

impl StateGraph {
    /// The snapshot of one function.
    pub fn node(&self, function: &str) -> Option<&BlockSnapshot> {
        self.nodes.get(function)
    }

    /// The edge between two functions, in either order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&EdgeState> {
        self.edges
            .iter()
            .find(|e| (e.a == a && e.b == b) || (e.a == b && e.b == a))
    }

    /// Functions whose fault set differs from `{nominal}`.
    pub fn faulty_functions(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|(_, snap)| !snap.faults.is_nominal())
            .map(|(name, _)| name.as_str())
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Active faults on one function with their declared metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionFaults {
    /// Active non-nominal faults, component faults scoped by component name.
    pub active: Vec<FaultId>,
    /// Declared metadata for each active fault that has any.
    pub modes: IndexMap<FaultId, FaultMode>,
}

impl FunctionFaults {
    /// Sum of the declared rates of the active faults.
    pub fn total_rate(&self) -> f64 {
        self.modes.values().map(|m| m.rate).sum()
    }

    /// Sum of the declared repair costs of the active faults.
    pub fn total_rcost(&self) -> f64 {
        self.modes.values().map(|m| m.rcost).sum()
    }
}

/// Active faults across a model, per function in registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaultModeReport {
    /// Model time when the report was taken.
    pub time: f64,
    /// Faults keyed by function name. Every function is listed.
    pub functions: IndexMap<String, FunctionFaults>,
}

impl FaultModeReport {
    /// Whether no function has an active fault.
    pub fn is_nominal(&self) -> bool {
        self.functions.values().all(|f| f.active.is_empty())
    }

    /// Faults of one function.
    pub fn function(&self, name: &str) -> Option<&FunctionFaults> {
        self.functions.get(name)
    }

    /// Every `(function, fault)` pair, in registration then fault order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &FaultId)> {
        self.functions
            .iter()
            .flat_map(|(name, f)| f.active.iter().map(move |id| (name.as_str(), id)))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use fw_core::FaultSet;

    use super::*;

    fn graph() -> StateGraph {
        let mut nodes = IndexMap::new();
        nodes.insert(
            "StoreEE".to_string(),
            BlockSnapshot {
                fields: Fields::new().with("soc", 100.0),
                faults: FaultSet::nominal(),
            },
        );
        nodes.insert(
            "DistEE".to_string(),
            BlockSnapshot {
                fields: Fields::new(),
                faults: FaultSet::with_faults(["short"]),
            },
        );
        StateGraph {
            time: 2.0,
            nodes,
            edges: vec![EdgeState {
                a: "StoreEE".into(),
                b: "DistEE".into(),
                flows: IndexMap::from([("ee_1".to_string(), Fields::new().with("rate", 1.0))]),
            }],
        }
    }

    #[test]
    fn edge_lookup_is_symmetric() {
        let g = graph();
        assert!(g.edge("DistEE", "StoreEE").is_some());
        assert!(g.edge("StoreEE", "DistEE").is_some());
        assert!(g.edge("StoreEE", "Motor").is_none());
    }

    #[test]
    fn faulty_functions_skip_nominal() {
        let g = graph();
        assert_eq!(g.faulty_functions().collect::<Vec<_>>(), vec!["DistEE"]);
    }

    #[test]
    fn state_graph_json_round_trip() {
        let g = graph();
        let json = g.to_json().unwrap();
        assert!(json.contains("\"ee_1\""));
        let back: StateGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn report_totals() {
        let mut functions = IndexMap::new();
        functions.insert(
            "DistEE".to_string(),
            FunctionFaults {
                active: vec!["short".into(), "c0/open".into()],
                modes: IndexMap::from([
                    ("short".into(), FaultMode::new(1e-5, 100.0)),
                    ("c0/open".into(), FaultMode::new(2e-5, 50.0)),
                ]),
            },
        );
        functions.insert("StoreEE".to_string(), FunctionFaults::default());
        let report = FaultModeReport {
            time: 0.0,
            functions,
        };
        assert!(!report.is_nominal());
        let dist = report.function("DistEE").unwrap();
        assert!((dist.total_rate() - 3e-5).abs() < 1e-12);
        assert_eq!(dist.total_rcost(), 150.0);
        assert_eq!(report.active().count(), 2);
        assert!(report.to_json().unwrap().contains("c0/open"));
    }
}
