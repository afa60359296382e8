use crate::classify::class_for_size;
use crate::types::{PathInfoMap, SizeClass, SizeThresholds, TitleLookup};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

/// Node in the closure graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureNode {
    pub path: String,

    /// Derivation title, or the store path name when none is known
    pub title: String,

    pub nar_size: Option<u64>,
    pub closure_size: Option<u64>,
    pub class: SizeClass,
}

/// Dependency graph of a closure.
///
/// Nodes are inserted in lexicographic path order, so a node's index doubles
/// as its stable diagram identifier. Edges point from a path to a reference
/// and only exist when both ends are part of the closure.
pub struct ClosureGraph {
    pub graph: DiGraph<ClosureNode, ()>,

    /// Store path -> NodeIndex mapping
    pub path_index: HashMap<String, NodeIndex>,
}

impl ClosureGraph {
    pub fn build(paths: &PathInfoMap, titles: &TitleLookup, thresholds: SizeThresholds) -> Self {
        let mut graph = DiGraph::with_capacity(paths.len(), paths.len());
        let mut path_index = HashMap::with_capacity(paths.len());

        for (path, record) in paths {
            let title = titles
                .get(path)
                .filter(|title| !title.is_empty())
                .cloned()
                .unwrap_or_else(|| record.name_suffix().to_string());
            let idx = graph.add_node(ClosureNode {
                path: path.clone(),
                title,
                nar_size: record.nar_size,
                closure_size: record.closure_size,
                class: class_for_size(record.closure_size, thresholds),
            });
            path_index.insert(path.clone(), idx);
        }

        for (path, record) in paths {
            let from = path_index[path];
            for reference in &record.references {
                match path_index.get(reference) {
                    Some(&to) => {
                        graph.add_edge(from, to, ());
                    }
                    None => log::debug!("Dropping reference {path} -> {reference}: outside closure"),
                }
            }
        }

        log::info!(
            "Built closure graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Self { graph, path_index }
    }

    /// Diagram identifier for a node (`n0`, `n1`, ...)
    pub fn node_id(idx: NodeIndex) -> String {
        format!("n{}", idx.index())
    }

    /// Nodes in path order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &ClosureNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// Edges in insertion order (source path order, then reference order)
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex)> + '_ {
        self.graph
            .edge_references()
            .map(|edge| (edge.source(), edge.target()))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
