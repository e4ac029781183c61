use std::collections::{BTreeMap, BTreeSet};

use genesis_ir::types::{CallKind, ComponentDescriptor, EdgeInput};
use genesis_ir::violation::{Location, Violation, ViolationCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Identity of a bond. Edges with the same key are merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BondKey {
    pub source: String,
    pub target: String,
    pub call_kind: CallKind,
}

/// A directed, weighted dependency between two components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bond {
    pub source: String,
    pub target: String,
    pub call_kind: CallKind,
    pub weight: u64,
}

impl Bond {
    pub fn key(&self) -> BondKey {
        BondKey {
            source: self.source.clone(),
            target: self.target.clone(),
            call_kind: self.call_kind,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Unknown component '{name}' referenced by edge {from} -> {to}")]
    UnknownComponent {
        name: String,
        from: String,
        to: String,
    },

    #[error("Unknown component '{name}'")]
    NotInGraph { name: String },
}

impl GraphError {
    /// Name of the component the error is about.
    pub fn component(&self) -> &str {
        match self {
            GraphError::UnknownComponent { name, .. } | GraphError::NotInGraph { name } => name,
        }
    }

    pub fn to_violation(&self) -> Violation {
        Violation::error(
            ViolationCode::UnknownComponent,
            Location::Component {
                name: self.component().to_string(),
            },
            self.to_string(),
        )
    }
}

/// Components and merged bonds.
///
/// Both collections are kept sorted by name/key so iteration order, and
/// everything derived from it, is deterministic. Per-component adjacency
/// holds positions into `bonds` and is built once in `finish`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyGraph {
    components: BTreeMap<String, ComponentDescriptor>,
    bonds: Vec<Bond>,
    outgoing: BTreeMap<String, Vec<usize>>,
    incoming: BTreeMap<String, Vec<usize>>,
}

/// Single-pass accumulator for a `DependencyGraph`.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    components: BTreeMap<String, ComponentDescriptor>,
    weights: BTreeMap<BondKey, u64>,
}

impl GraphBuilder {
    /// Start from the declared components. The first declaration of a
    /// name wins.
    pub fn new<'a>(components: impl IntoIterator<Item = &'a ComponentDescriptor>) -> Self {
        let mut declared = BTreeMap::new();
        for component in components {
            if declared.contains_key(&component.name) {
                warn!(component = %component.name, "duplicate component declaration ignored");
                continue;
            }
            declared.insert(component.name.clone(), component.clone());
        }
        Self {
            components: declared,
            weights: BTreeMap::new(),
        }
    }

    /// Merge one edge into the graph, summing weights of identical keys.
    pub fn add_edge(&mut self, edge: &EdgeInput) -> Result<(), GraphError> {
        for name in [&edge.source, &edge.target] {
            if !self.components.contains_key(name) {
                return Err(GraphError::UnknownComponent {
                    name: name.clone(),
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                });
            }
        }
        let key = BondKey {
            source: edge.source.clone(),
            target: edge.target.clone(),
            call_kind: edge.call_kind,
        };
        let weight = self.weights.entry(key).or_insert(0);
        *weight = weight.saturating_add(edge.weight);
        Ok(())
    }

    pub fn finish(self) -> DependencyGraph {
        let bonds: Vec<Bond> = self
            .weights
            .into_iter()
            .map(|(key, weight)| Bond {
                source: key.source,
                target: key.target,
                call_kind: key.call_kind,
                weight,
            })
            .collect();

        let mut outgoing: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut incoming: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, bond) in bonds.iter().enumerate() {
            outgoing.entry(bond.source.clone()).or_default().push(i);
            incoming.entry(bond.target.clone()).or_default().push(i);
        }

        DependencyGraph {
            components: self.components,
            bonds,
            outgoing,
            incoming,
        }
    }
}

impl DependencyGraph {
    /// Build a graph, failing on the first edge that names an undeclared
    /// component.
    pub fn build(
        components: &[ComponentDescriptor],
        edges: &[EdgeInput],
    ) -> Result<Self, GraphError> {
        let mut builder = GraphBuilder::new(components);
        for edge in edges {
            builder.add_edge(edge)?;
        }
        Ok(builder.finish())
    }

    /// Build a graph from every valid edge and return the rejected ones'
    /// errors alongside it.
    pub fn build_lenient(
        components: &[ComponentDescriptor],
        edges: &[EdgeInput],
    ) -> (Self, Vec<GraphError>) {
        let mut builder = GraphBuilder::new(components);
        let errors: Vec<GraphError> = edges
            .iter()
            .filter_map(|edge| builder.add_edge(edge).err())
            .collect();
        for err in &errors {
            warn!(error = %err, "edge rejected");
        }
        let graph = builder.finish();
        debug!(
            components = graph.component_count(),
            bonds = graph.bond_count(),
            rejected = errors.len(),
            "dependency graph built"
        );
        (graph, errors)
    }

    pub fn components(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.components.values()
    }

    pub fn component(&self, name: &str) -> Option<&ComponentDescriptor> {
        self.components.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    pub fn bond(&self, key: &BondKey) -> Option<&Bond> {
        self.bonds
            .binary_search_by(|b| {
                (&b.source, &b.target, b.call_kind).cmp(&(&key.source, &key.target, key.call_kind))
            })
            .ok()
            .map(|i| &self.bonds[i])
    }

    /// Positions in `bonds()` of every bond touching `component`, in
    /// bond-key order. A self-loop appears once.
    pub fn bond_positions(&self, component: &str) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .outgoing
            .get(component)
            .into_iter()
            .chain(self.incoming.get(component))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    pub fn outgoing<'a>(&'a self, component: &str) -> impl Iterator<Item = &'a Bond> + 'a {
        self.indexed(&self.outgoing, component)
    }

    pub fn incoming<'a>(&'a self, component: &str) -> impl Iterator<Item = &'a Bond> + 'a {
        self.indexed(&self.incoming, component)
    }

    fn indexed<'a>(
        &'a self,
        index: &'a BTreeMap<String, Vec<usize>>,
        component: &str,
    ) -> impl Iterator<Item = &'a Bond> + 'a {
        index
            .get(component)
            .into_iter()
            .flatten()
            .map(move |&i| &self.bonds[i])
    }

    /// Total weight of every outgoing bond, self-loops included.
    pub fn out_weight(&self, component: &str) -> u64 {
        self.outgoing(component)
            .fold(0u64, |acc, b| acc.saturating_add(b.weight))
    }

    /// Distinct components `component` depends on, itself excluded.
    pub fn successors(&self, component: &str) -> BTreeSet<&str> {
        self.outgoing(component)
            .filter(|b| !b.is_self_loop())
            .map(|b| b.target.as_str())
            .collect()
    }

    /// Distinct components depending on `component`, itself excluded.
    pub fn predecessors(&self, component: &str) -> BTreeSet<&str> {
        self.incoming(component)
            .filter(|b| !b.is_self_loop())
            .map(|b| b.source.as_str())
            .collect()
    }

    pub fn out_degree(&self, component: &str) -> usize {
        self.successors(component).len()
    }

    pub fn in_degree(&self, component: &str) -> usize {
        self.predecessors(component).len()
    }
}
