// src/dag/graph.rs

//! Whole-graph checks over `(name, dependencies)` pairs.
//!
//! Used both for graph manifests before any work is bound and for a fully
//! registered [`Registry`](crate::dag::Registry).

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::engine::TaskName;
use crate::errors::{DagrunError, Result};

/// Order `nodes` so that every task comes after all of its dependencies.
///
/// Fails with `UnknownDependency` for a dependency that is not one of the
/// nodes, and with `CircularDependency` (naming a task on the cycle) when no
/// such order exists. A task listing itself is a cycle.
pub fn topological_order<'a, I>(nodes: I) -> Result<Vec<&'a str>>
where
    I: IntoIterator<Item = (&'a str, &'a [TaskName])>,
{
    let nodes: Vec<(&str, &[TaskName])> = nodes.into_iter().collect();
    let edge_count = nodes.iter().map(|(_, deps)| deps.len()).sum();
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::with_capacity(nodes.len(), edge_count);

    for &(name, _) in &nodes {
        graph.add_node(name);
    }

    for &(name, deps) in &nodes {
        for dep in deps {
            if !graph.contains_node(dep.as_str()) {
                return Err(DagrunError::UnknownDependency {
                    task: name.to_string(),
                    dependency: dep.clone(),
                });
            }
            // dep -> dependent
            graph.add_edge(dep.as_str(), name, ());
        }
    }

    toposort(&graph, None)
        .map_err(|cycle| DagrunError::CircularDependency(cycle.node_id().to_string()))
}
