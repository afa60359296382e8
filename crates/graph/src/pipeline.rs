use crate::classify::quantile_thresholds;
use crate::diagnostics::DiagnosticSink;
use crate::error::Result;
use crate::graph::ClosureGraph;
use crate::loader::load_path_info;
use crate::mermaid::write_graph;
use crate::runner::{CommandRunner, StoreCommands};
use crate::titles::title_map_for_paths;

/// Produce the Mermaid diagram for the closure of `root`.
///
/// Runs, in order: the closure query, deriver and derivation lookups,
/// threshold computation, then serialization. The first failure aborts.
pub fn generate_mermaid(
    root: &str,
    runner: &dyn CommandRunner,
    commands: &StoreCommands,
    sink: &dyn DiagnosticSink,
) -> Result<String> {
    let path_info = load_path_info(root, runner, commands, sink)?;
    log::info!("Closure of {root} has {} paths", path_info.len());

    let paths: Vec<String> = path_info.keys().cloned().collect();
    let title_map = title_map_for_paths(&paths, runner, commands, sink)?;
    log::info!("Resolved titles for {} of {} paths", title_map.len(), paths.len());

    let closure_sizes: Vec<u64> = path_info
        .values()
        .filter_map(|record| record.closure_size)
        .collect();
    let thresholds = quantile_thresholds(&closure_sizes)?;
    log::debug!(
        "Size thresholds: low={} high={}",
        thresholds.low,
        thresholds.high
    );

    let graph = ClosureGraph::build(&path_info, &title_map, thresholds);
    Ok(write_graph(&graph))
}
