use closure_graph::{GraphError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_DIR: &str = "/nix/store";

/// Resolve `value` (following symlinks such as `./result`) and require it to
/// live inside `store_dir`.
pub fn resolve_store_path(value: &Path, store_dir: &Path) -> Result<PathBuf> {
    let resolved = fs::canonicalize(value).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => GraphError::Input("store path does not exist".to_string()),
        _ => GraphError::Input(format!("cannot resolve store path: {err}")),
    })?;

    let store_dir = fs::canonicalize(store_dir).unwrap_or_else(|_| store_dir.to_path_buf());
    if resolved == store_dir || !resolved.starts_with(&store_dir) {
        return Err(GraphError::Input(format!(
            "path is not in {}",
            store_dir.display()
        )));
    }

    Ok(resolved)
}
