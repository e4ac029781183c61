//! Bond toxicity: coupling concentration, cycles and hubs.
//!
//! Everything here is recomputed from the current graph on every call.

use std::collections::{BTreeMap, BTreeSet};

use genesis_ir::types::CallKind;
use genesis_ir::violation::{Location, Violation, ViolationCode};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cycles::{cyclic_bonds, direct_call_cycles};
use crate::graph::{Bond, BondKey, DependencyGraph};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicityConfig {
    /// Coupling strength above which a bond is toxic.
    pub toxicity_threshold: f64,
}

impl Default for ToxicityConfig {
    fn default() -> Self {
        Self {
            toxicity_threshold: 0.6,
        }
    }
}

/// Toxicity of one bond.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BondToxicity {
    pub source: String,
    pub target: String,
    pub call_kind: CallKind,
    pub weight: u64,
    /// Share of the source's outbound weight carried by this bond.
    pub coupling_strength: f64,
    pub exceeds_threshold: bool,
    pub on_cycle: bool,
    pub self_loop: bool,
    pub is_toxic: bool,
}

impl BondToxicity {
    pub fn location(&self) -> Location {
        Location::Bond {
            source: self.source.clone(),
            target: self.target.clone(),
            call_kind: self.call_kind,
        }
    }

    /// Findings for this bond, attributed to its source component.
    pub fn violations(&self) -> Vec<Violation> {
        let mut found = Vec::new();
        if self.on_cycle {
            found.push(Violation::error(
                ViolationCode::CyclicDependency,
                self.location(),
                format!(
                    "{} -> {} lies on a direct-call cycle",
                    self.source, self.target
                ),
            ));
        }
        if self.exceeds_threshold {
            found.push(Violation::warning(
                ViolationCode::ToxicBond,
                self.location(),
                format!(
                    "{} sends {:.0}% of its calls to {}",
                    self.source,
                    self.coupling_strength * 100.0,
                    self.target
                ),
            ));
        }
        if self.self_loop {
            found.push(Violation::warning(
                ViolationCode::SelfDependency,
                self.location(),
                format!("{} calls itself", self.source),
            ));
        }
        found
    }
}

/// Result of analyzing one dependency graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ToxicityAnalysis {
    /// One entry per bond, in bond-key order.
    pub bonds: Vec<BondToxicity>,
    pub hub_concentration: BTreeMap<String, f64>,
    /// Direct-call cycles, each sorted by member name.
    pub cycles: Vec<Vec<String>>,
    /// Positions in `bonds` touching each component.
    by_component: BTreeMap<String, Vec<usize>>,
}

impl ToxicityAnalysis {
    /// Bonds in which `component` is source or target, in bond-key order.
    pub fn bonds_of<'a>(&'a self, component: &str) -> impl Iterator<Item = &'a BondToxicity> + 'a {
        self.by_component
            .get(component)
            .into_iter()
            .flatten()
            .map(move |&i| &self.bonds[i])
    }

    pub fn hub_concentration(&self, component: &str) -> f64 {
        self.hub_concentration.get(component).copied().unwrap_or(0.0)
    }

    /// Bond findings whose source is `component`.
    pub fn violations_for(&self, component: &str) -> Vec<Violation> {
        self.bonds_of(component)
            .filter(|b| b.source == component)
            .flat_map(BondToxicity::violations)
            .collect()
    }
}

pub fn analyze(graph: &DependencyGraph, config: &ToxicityConfig) -> ToxicityAnalysis {
    let cycles = direct_call_cycles(graph);
    let on_cycle = cyclic_bonds(graph, &cycles);

    let out_weights: BTreeMap<&str, u64> = graph
        .components()
        .map(|c| (c.name.as_str(), graph.out_weight(&c.name)))
        .collect();

    // Totals are fixed above; each bond is now independent.
    let bonds: Vec<BondToxicity> = graph
        .bonds()
        .par_iter()
        .map(|bond| score_bond(bond, &out_weights, &on_cycle, config))
        .collect();

    // Same order as the graph's bonds, so its positions carry over.
    let by_component = graph
        .components()
        .map(|c| (c.name.clone(), graph.bond_positions(&c.name)))
        .collect();

    let hub_concentration = hub_concentrations(graph);

    debug!(
        bonds = bonds.len(),
        toxic = bonds.iter().filter(|b| b.is_toxic).count(),
        cycles = cycles.len(),
        "bond toxicity analyzed"
    );

    ToxicityAnalysis {
        bonds,
        hub_concentration,
        cycles,
        by_component,
    }
}

fn score_bond(
    bond: &Bond,
    out_weights: &BTreeMap<&str, u64>,
    on_cycle: &BTreeSet<BondKey>,
    config: &ToxicityConfig,
) -> BondToxicity {
    let total = out_weights.get(bond.source.as_str()).copied().unwrap_or(0);
    let coupling_strength = if total == 0 {
        0.0
    } else {
        bond.weight as f64 / total as f64
    };
    let exceeds_threshold = coupling_strength > config.toxicity_threshold;
    let cyclic = on_cycle.contains(&bond.key());

    BondToxicity {
        source: bond.source.clone(),
        target: bond.target.clone(),
        call_kind: bond.call_kind,
        weight: bond.weight,
        coupling_strength,
        exceeds_threshold,
        on_cycle: cyclic,
        self_loop: bond.is_self_loop(),
        is_toxic: exceeds_threshold || cyclic,
    }
}

/// `(in-degree + out-degree) / (2 × (n − 1))` over distinct neighbours.
fn hub_concentrations(graph: &DependencyGraph) -> BTreeMap<String, f64> {
    let n = graph.component_count();
    graph
        .components()
        .map(|c| {
            let concentration = if n <= 1 {
                0.0
            } else {
                let degree = graph.in_degree(&c.name) + graph.out_degree(&c.name);
                (degree as f64 / (2 * (n - 1)) as f64).clamp(0.0, 1.0)
            };
            (c.name.clone(), concentration)
        })
        .collect()
}
