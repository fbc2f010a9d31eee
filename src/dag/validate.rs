// src/dag/validate.rs

use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::{DiGraphMap, NodeTrait};

use crate::errors::{EngineError, Result};
use crate::task::{Task, TaskIndex};

fn build_graph<N: NodeTrait>(
    nodes: impl IntoIterator<Item = N>,
    edges: impl IntoIterator<Item = (N, N)>,
) -> DiGraphMap<N, ()> {
    let mut graph = DiGraphMap::new();
    for node in nodes {
        graph.add_node(node);
    }
    for (from, to) in edges {
        graph.add_edge(from, to, ());
    }
    graph
}

/// Return a node that lies on a cycle, if the graph has one.
///
/// Edges point from a dependency to its dependent. Self-loops count.
pub fn find_cycle<N: NodeTrait>(
    nodes: impl IntoIterator<Item = N>,
    edges: impl IntoIterator<Item = (N, N)>,
) -> Option<N> {
    let graph = build_graph(nodes, edges);
    toposort(&graph, None).err().map(|cycle| cycle.node_id())
}

/// Reject a task table whose dependency edges form a cycle.
pub fn ensure_acyclic(tasks: &[Arc<dyn Task>]) -> Result<()> {
    let edges = tasks.iter().enumerate().flat_map(|(i, task)| {
        task.base()
            .outputs()
            .into_iter()
            .map(move |output: TaskIndex| (i, output.get()))
    });

    match find_cycle(0..tasks.len(), edges) {
        None => Ok(()),
        Some(node) => {
            let label = tasks
                .get(node)
                .map(|t| t.base().label())
                .unwrap_or_else(|| format!("#{node}"));
            Err(EngineError::DagCycle(format!(
                "cycle detected in task graph involving task '{label}'"
            )))
        }
    }
}
