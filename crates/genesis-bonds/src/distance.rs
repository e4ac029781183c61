//! Architectural distance: the number of bonds on the shortest directed
//! path between two components.

use std::collections::{HashSet, VecDeque};

use crate::graph::{DependencyGraph, GraphError};

impl DependencyGraph {
    /// Breadth-first hop count from `from` to `to` over bonds of any call
    /// kind. `Ok(None)` when `to` is unreachable.
    pub fn hops(&self, from: &str, to: &str) -> Result<Option<usize>, GraphError> {
        for name in [from, to] {
            if !self.contains(name) {
                return Err(GraphError::NotInGraph {
                    name: name.to_string(),
                });
            }
        }
        if from == to {
            return Ok(Some(0));
        }

        let mut queue = VecDeque::from([(from, 0usize)]);
        let mut visited = HashSet::from([from]);

        while let Some((current, distance)) = queue.pop_front() {
            for next in self.successors(current) {
                if next == to {
                    return Ok(Some(distance + 1));
                }
                if visited.insert(next) {
                    queue.push_back((next, distance + 1));
                }
            }
        }

        Ok(None)
    }
}
