use crate::core::graph::ResourceAllocationGraph;
use std::fmt::Write;

/// Convert a graph to Graphviz DOT source
///
/// Nodes are emitted sorted by label so the output is stable for a given
/// graph. Nodes listed in `highlight` are filled and outlined in red; labels
/// in `highlight` that are not in the graph are ignored.
pub fn to_dot(graph: &ResourceAllocationGraph, highlight: &[String]) -> String {
    let mut nodes = graph.nodes();
    nodes.sort_unstable();

    let mut edges = graph.edges();
    edges.sort_unstable();

    let mut out = String::new();
    out.push_str("digraph RAG {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=ellipse, fontsize=12, style=filled, fillcolor=white];\n");

    for node in nodes {
        let shape = if node.starts_with('R') { ", shape=box" } else { "" };
        if highlight.iter().any(|h| h == node) {
            let _ = writeln!(
                out,
                "  \"{}\" [fillcolor=\"/pastel13/1\", color=red, fontcolor=black, penwidth=2{}];",
                escape(node),
                shape
            );
        } else if shape.is_empty() {
            let _ = writeln!(out, "  \"{}\";", escape(node));
        } else {
            let _ = writeln!(out, "  \"{}\" [shape=box];", escape(node));
        }
    }

    for (from, to) in edges {
        let _ = writeln!(out, "  \"{}\" -> \"{}\";", escape(from), escape(to));
    }

    out.push_str("}\n");
    out
}

/// Escape a label for use inside a quoted DOT identifier
fn escape(label: &str) -> String {
    label.replace('\\', "\\\\").replace('"', "\\\"")
}
