use crate::error::{GraphError, Result};
use crate::path_info::json_kind;
use crate::types::TitleLookup;
use serde_json::{Map, Value};

/// Build output-path titles from `nix derivation show` JSON.
///
/// Entries that do not look like derivations are skipped; only a non-object
/// top level is an error.
pub fn parse_derivation_json(raw: &Value) -> Result<TitleLookup> {
    let Value::Object(derivations) = raw else {
        return Err(GraphError::Format(format!(
            "derivation json is not an object: {}",
            json_kind(raw)
        )));
    };

    let empty = Map::new();
    let mut title_map = TitleLookup::new();

    for (drv_path, drv_info) in derivations {
        let Value::Object(drv_info) = drv_info else {
            log::debug!("Skipping derivation {drv_path}: not an object");
            continue;
        };
        let (Some(env), Some(outputs)) = (
            object_or_empty(drv_info.get("env"), &empty),
            object_or_empty(drv_info.get("outputs"), &empty),
        ) else {
            log::debug!("Skipping derivation {drv_path}: malformed env/outputs");
            continue;
        };

        let title = build_title(
            str_field(env, "pname"),
            str_field(env, "version"),
            str_field(env, "name"),
        );

        for output in outputs.values() {
            if let Some(output_path) = output.get("path").and_then(Value::as_str) {
                title_map.insert(output_path.to_string(), title.clone());
            }
        }
    }

    Ok(title_map)
}

/// Pick a node title from derivation env fields.
pub fn build_title(pname: Option<&str>, version: Option<&str>, name: Option<&str>) -> String {
    match (pname, version, name) {
        (Some(pname), Some(version), _) => format!("{pname} {version}"),
        (Some(pname), None, _) => pname.to_string(),
        (None, _, Some(name)) => name.to_string(),
        (None, _, None) => "unknown".to_string(),
    }
}

fn object_or_empty<'a>(
    value: Option<&'a Value>,
    empty: &'a Map<String, Value>,
) -> Option<&'a Map<String, Value>> {
    match value {
        None => Some(empty),
        Some(value) => value.as_object(),
    }
}

fn str_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
