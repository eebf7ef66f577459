use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};

/// Function–flow ownership: one node per function and per flow, one edge per
/// (function, flow) binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BipartiteGraph {
    functions: IndexMap<String, IndexSet<String>>,
    flows: IndexMap<String, IndexSet<String>>,
}

impl BipartiteGraph {
    /// Build from flow names and `(function, flows)` bindings, both in
    /// registration order.
    pub fn new<'a, F, B>(flows: F, bindings: B) -> Self
    where
        F: IntoIterator<Item = &'a str>,
        B: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let mut graph = Self {
            functions: IndexMap::new(),
            flows: flows
                .into_iter()
                .map(|f| (f.to_string(), IndexSet::new()))
                .collect(),
        };
        for (function, flows) in bindings {
            let bound = graph.functions.entry(function.to_string()).or_default();
            for flow in flows {
                bound.insert(flow.clone());
                graph
                    .flows
                    .entry(flow.clone())
                    .or_default()
                    .insert(function.to_string());
            }
        }
        graph
    }

    /// Function nodes in registration order.
    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Flow nodes in registration order.
    pub fn flows(&self) -> impl Iterator<Item = &str> {
        self.flows.keys().map(String::as_str)
    }

    /// Flows bound to `function`.
    pub fn flows_of<'a>(&'a self, function: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.functions
            .get(function)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// Functions bound to `flow`.
    pub fn functions_of<'a>(&'a self, flow: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.flows
            .get(flow)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// All (function, flow) edges.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.functions
            .iter()
            .flat_map(|(f, flows)| flows.iter().map(move |flow| (f.as_str(), flow.as_str())))
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.functions.values().map(IndexSet::len).sum()
    }
}

/// Projection of a [`BipartiteGraph`] onto its function nodes.
///
/// Two functions are adjacent iff they share at least one flow; the edge is
/// labeled with every shared flow name. Edges are undirected and stored once,
/// with the earlier-registered function first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionGraph {
    nodes: IndexSet<String>,
    edges: IndexMap<(usize, usize), BTreeSet<String>>,
}

impl FunctionGraph {
    /// Project a bipartite graph.
    pub fn project(bipartite: &BipartiteGraph) -> Self {
        let nodes: IndexSet<String> = bipartite.functions().map(str::to_string).collect();
        let mut edges: IndexMap<(usize, usize), BTreeSet<String>> = IndexMap::new();

        for (flow, users) in &bipartite.flows {
            let idx: Vec<usize> = users.iter().filter_map(|u| nodes.get_index_of(u)).collect();
            for (i, &a) in idx.iter().enumerate() {
                for &b in &idx[i + 1..] {
                    let key = if a < b { (a, b) } else { (b, a) };
                    edges.entry(key).or_default().insert(flow.clone());
                }
            }
        }
        edges.sort_keys();

        Self { nodes, edges }
    }

    /// Function nodes in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Number of function nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn key(&self, a: &str, b: &str) -> Option<(usize, usize)> {
        let a = self.nodes.get_index_of(a)?;
        let b = self.nodes.get_index_of(b)?;
        Some(if a < b { (a, b) } else { (b, a) })
    }

    /// Shared flow names between `a` and `b`, in either order.
    pub fn edge(&self, a: &str, b: &str) -> Option<&BTreeSet<String>> {
        self.edges.get(&self.key(a, b)?)
    }

    /// Whether `a` and `b` share a flow.
    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edge(a, b).is_some()
    }

    /// Every edge as `(a, b, shared flows)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &BTreeSet<String>)> {
        self.edges.iter().filter_map(|(&(a, b), flows)| {
            Some((
                self.nodes.get_index(a)?.as_str(),
                self.nodes.get_index(b)?.as_str(),
                flows,
            ))
        })
    }

    /// Functions sharing at least one flow with `function`.
    pub fn neighbors<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges().filter_map(move |(a, b, _)| {
            if a == function {
                Some(b)
            } else if b == function {
                Some(a)
            } else {
                None
            }
        })
    }
}

/// Both views of a model's structure, rebuilt together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelGraph {
    /// Function–flow ownership.
    pub bipartite: BipartiteGraph,
    /// Function-only projection.
    pub functions: FunctionGraph,
}

impl ModelGraph {
    /// Build the bipartite graph and its projection.
    pub fn build<'a, F, B>(flows: F, bindings: B) -> Self
    where
        F: IntoIterator<Item = &'a str>,
        B: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let bipartite = BipartiteGraph::new(flows, bindings);
        let functions = FunctionGraph::project(&bipartite);
        Self {
            bipartite,
            functions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn chain() -> ModelGraph {
        let store = names(&["ee_1"]);
        let dist = names(&["ee_1", "ee_mot", "ctl"]);
        let motor = names(&["ee_mot", "ctl"]);
        let sensor = names(&["env"]);
        ModelGraph::build(
            ["ee_1", "ee_mot", "ctl", "env"],
            [
                ("StoreEE", store.as_slice()),
                ("DistEE", dist.as_slice()),
                ("Motor", motor.as_slice()),
                ("Sense", sensor.as_slice()),
            ],
        )
    }

    #[test]
    fn bipartite_edges_match_bindings() {
        let g = chain();
        assert_eq!(g.bipartite.edge_count(), 7);
        assert_eq!(
            g.bipartite.functions_of("ctl").collect::<Vec<_>>(),
            vec!["DistEE", "Motor"]
        );
        assert_eq!(
            g.bipartite.flows_of("DistEE").collect::<Vec<_>>(),
            vec!["ee_1", "ee_mot", "ctl"]
        );
        assert_eq!(g.bipartite.flows_of("Nobody").count(), 0);
    }

    #[test]
    fn projection_labels_shared_flows() {
        let g = chain();
        assert_eq!(g.functions.node_count(), 4);
        assert_eq!(g.functions.edge_count(), 2);
        let label = g.functions.edge("Motor", "DistEE").unwrap();
        assert_eq!(label.iter().collect::<Vec<_>>(), vec!["ctl", "ee_mot"]);
        assert!(g.functions.has_edge("StoreEE", "DistEE"));
        assert!(!g.functions.has_edge("StoreEE", "Motor"));
    }

    #[test]
    fn isolated_function_has_no_neighbors() {
        let g = chain();
        assert_eq!(g.functions.neighbors("Sense").count(), 0);
        let mut n: Vec<_> = g.functions.neighbors("DistEE").collect();
        n.sort();
        assert_eq!(n, vec!["Motor", "StoreEE"]);
    }

    #[test]
    fn edges_put_earlier_function_first() {
        let g = chain();
        let edges: Vec<_> = g.functions.edges().map(|(a, b, _)| (a, b)).collect();
        assert_eq!(edges, vec![("StoreEE", "DistEE"), ("DistEE", "Motor")]);
    }

    proptest! {
        #[test]
        fn edge_iff_shared_flow(
            bindings in prop::collection::vec(
                prop::collection::btree_set(0usize..5, 0..4),
                1..7,
            )
        ) {
            let flow_names: Vec<String> = (0..5).map(|i| format!("f{i}")).collect();
            let fn_names: Vec<String> = (0..bindings.len()).map(|i| format!("fn{i}")).collect();
            let bound: Vec<Vec<String>> = bindings
                .iter()
                .map(|set| set.iter().map(|i| flow_names[*i].clone()).collect())
                .collect();

            let g = ModelGraph::build(
                flow_names.iter().map(String::as_str),
                fn_names.iter().map(String::as_str).zip(bound.iter().map(Vec::as_slice)),
            );

            for i in 0..bindings.len() {
                for j in 0..bindings.len() {
                    if i == j {
                        continue;
                    }
                    let shared: BTreeSet<String> = bindings[i]
                        .intersection(&bindings[j])
                        .map(|k| flow_names[*k].clone())
                        .collect();
                    match g.functions.edge(&fn_names[i], &fn_names[j]) {
                        Some(label) => prop_assert_eq!(label, &shared),
                        None => prop_assert!(shared.is_empty()),
                    }
                }
            }
        }
    }
}
