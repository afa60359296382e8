use crate::graph::ClosureGraph;
use crate::types::{PathInfoMap, SizeClass, SizeThresholds, TitleLookup};
use crate::units::human_size;

/// Serialize a closure into a Mermaid flowchart.
///
/// Identical input always produces byte-identical output.
pub fn render_mermaid(
    paths: &PathInfoMap,
    titles: &TitleLookup,
    thresholds: SizeThresholds,
) -> String {
    write_graph(&ClosureGraph::build(paths, titles, thresholds))
}

/// Serialize an already built closure graph.
pub fn write_graph(graph: &ClosureGraph) -> String {
    let mut lines =
        Vec::with_capacity(1 + SizeClass::ALL.len() + graph.node_count() * 2 + graph.edge_count());
    lines.push("graph TD".to_string());

    for class in SizeClass::ALL {
        lines.push(format!("classDef {} {}", class.as_str(), class.style()));
    }

    for (idx, node) in graph.nodes() {
        let node_id = ClosureGraph::node_id(idx);
        let label = node_label(&node.title, node.nar_size, node.closure_size);
        lines.push(format!("{node_id}[\"{label}\"]"));
        lines.push(format!("class {node_id} {}", node.class.as_str()));
    }

    for (from, to) in graph.edges() {
        lines.push(format!(
            "{} --- {}",
            ClosureGraph::node_id(from),
            ClosureGraph::node_id(to)
        ));
    }

    lines.join("\n")
}

/// Three-line node label. `\n` is Mermaid's escaped line break, and double
/// quotes would terminate the quoted label.
fn node_label(title: &str, nar_size: Option<u64>, closure_size: Option<u64>) -> String {
    format!(
        "{title}\\nsize {}\\nclosure {}",
        human_size(nar_size),
        human_size(closure_size)
    )
    .replace('"', "'")
}
