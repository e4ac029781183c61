//! Cycle detection over the direct-call subgraph.
//!
//! Uses Tarjan's strongly connected components with an explicit work
//! stack, so traversal depth is bounded by heap rather than call stack.
//! Event-driven and shared-state bonds never form cycles here, and
//! self-loops are excluded.

use std::collections::{BTreeSet, HashMap};

use genesis_ir::types::CallKind;

use crate::graph::{BondKey, DependencyGraph};

const UNVISITED: usize = usize::MAX;

/// Strongly connected components (two or more members) of the
/// direct-call subgraph. Members and components are sorted by name.
pub fn direct_call_cycles(graph: &DependencyGraph) -> Vec<Vec<String>> {
    let names: Vec<&str> = graph.components().map(|c| c.name.as_str()).collect();
    let index_of: HashMap<&str, usize> = names.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    let mut adjacency = vec![Vec::new(); names.len()];
    for bond in graph.bonds() {
        if bond.call_kind != CallKind::DirectCall || bond.is_self_loop() {
            continue;
        }
        if let (Some(&from), Some(&to)) = (
            index_of.get(bond.source.as_str()),
            index_of.get(bond.target.as_str()),
        ) {
            adjacency[from].push(to);
        }
    }
    for targets in &mut adjacency {
        targets.sort_unstable();
        targets.dedup();
    }

    let mut cycles: Vec<Vec<String>> = strongly_connected(&adjacency)
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut members: Vec<String> = scc.into_iter().map(|i| names[i].to_string()).collect();
            members.sort();
            members
        })
        .collect();
    cycles.sort();
    cycles
}

/// Direct-call bonds whose endpoints share a cycle.
pub fn cyclic_bonds(graph: &DependencyGraph, cycles: &[Vec<String>]) -> BTreeSet<BondKey> {
    let cycle_of: HashMap<&str, usize> = cycles
        .iter()
        .enumerate()
        .flat_map(|(i, members)| members.iter().map(move |m| (m.as_str(), i)))
        .collect();

    graph
        .bonds()
        .iter()
        .filter(|b| b.call_kind == CallKind::DirectCall && !b.is_self_loop())
        .filter(|b| {
            matches!(
                (cycle_of.get(b.source.as_str()), cycle_of.get(b.target.as_str())),
                (Some(s), Some(t)) if s == t
            )
        })
        .map(|b| b.key())
        .collect()
}

/// Tarjan's algorithm over an adjacency list.
fn strongly_connected(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut components = Vec::new();
    let mut next_index = 0usize;
    // (node, position of the next edge to explore)
    let mut work: Vec<(usize, usize)> = Vec::new();

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }
        work.push((root, 0));

        while let Some((v, pos)) = work.pop() {
            if index[v] == UNVISITED {
                index[v] = next_index;
                lowlink[v] = next_index;
                next_index += 1;
                stack.push(v);
                on_stack[v] = true;
            }

            if let Some(&w) = adjacency[v].get(pos) {
                work.push((v, pos + 1));
                if index[w] == UNVISITED {
                    work.push((w, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            if lowlink[v] == index[v] {
                let mut component = Vec::new();
                while let Some(w) = stack.pop() {
                    on_stack[w] = false;
                    component.push(w);
                    if w == v {
                        break;
                    }
                }
                components.push(component);
            }

            if let Some(&(parent, _)) = work.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[v]);
            }
        }
    }

    components
}
