use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::error::{GraphError, Result};
use crate::path_info::parse_path_info_json;
use crate::runner::{CommandRunner, StoreCommands};
use crate::types::PathInfoMap;
use serde_json::Value;

/// Load path records for the full closure of `root`.
pub fn load_path_info(
    root: &str,
    runner: &dyn CommandRunner,
    commands: &StoreCommands,
    sink: &dyn DiagnosticSink,
) -> Result<PathInfoMap> {
    let output = runner.run(&commands.path_info(root), None)?;

    let parsed = decode_json(&output).and_then(|raw| parse_path_info_json(&raw));
    let path_map = parsed.inspect_err(|err| {
        sink.emit(
            DiagnosticEvent::error("invalid path info")
                .with("root", root)
                .with("error", err.to_string()),
        );
    })?;

    log::debug!("Loaded {} path records for {root}", path_map.len());
    Ok(path_map)
}

pub(crate) fn decode_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| GraphError::Format(format!("invalid json: {e}")))
}
