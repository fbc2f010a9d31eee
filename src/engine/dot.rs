// src/engine/dot.rs

//! Graphviz export of a task graph and its current states.

use std::fmt::Write;
use std::sync::Arc;

use crate::task::Task;

/// Render `tasks` as a `digraph`: one box per task, colored by state, and
/// one edge per dependency (from a task to each of its outputs).
pub(crate) fn render(tasks: &[Arc<dyn Task>]) -> String {
    let mut dot = String::from("digraph template {\n");

    for (i, task) in tasks.iter().enumerate() {
        let base = task.base();
        let state = base.state();
        let _ = writeln!(
            dot,
            "\"node_{i}\" [label=\"{}\\n{}\\n{}\", color={}, style=filled, shape=box];",
            escape(base.name().as_deref().unwrap_or_default()),
            escape(base.description().as_deref().unwrap_or_default()),
            state.text(),
            state.dot_color(),
        );
    }

    for (i, task) in tasks.iter().enumerate() {
        for output in task.base().outputs() {
            if output.get() < tasks.len() {
                let _ = writeln!(dot, "\"node_{i}\" -> \"node_{}\"", output.get());
            }
        }
    }

    dot.push_str("}\n");
    dot
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
