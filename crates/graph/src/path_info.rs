//! Decoding of `nix path-info --json` output.
//!
//! Older Nix releases print a list of records carrying their own `path`;
//! newer ones print an object keyed by store path, and some versions nest the
//! path inside a descriptor object. All shapes normalise into a [`PathInfoMap`].

use crate::error::{GraphError, Result};
use crate::types::{PathInfoMap, PathRecord};
use crate::units::coerce_size;
use serde_json::{Map, Value};

/// Top-level payload shape
#[derive(Debug)]
enum PathInfoPayload<'a> {
    /// `[{"path": ..., ...}, ...]`
    List(&'a [Value]),

    /// `{"/nix/store/...": {...}, ...}`
    Map(&'a Map<String, Value>),
}

impl<'a> PathInfoPayload<'a> {
    fn classify(raw: &'a Value) -> Result<Self> {
        match raw {
            Value::Array(items) => Ok(Self::List(items)),
            Value::Object(entries) => Ok(Self::Map(entries)),
            other => Err(GraphError::Format(format!(
                "unsupported path info json format: expected list or object, got {}",
                json_kind(other)
            ))),
        }
    }
}

/// Shape of a record's `path` field
#[derive(Debug)]
enum PathDescriptor<'a> {
    Plain(&'a str),
    Nested(&'a Map<String, Value>),
    Invalid,
}

impl<'a> PathDescriptor<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::String(path)) => Self::Plain(path),
            Some(Value::Object(fields)) => Self::Nested(fields),
            _ => Self::Invalid,
        }
    }

    fn resolve(self) -> Result<String> {
        let path = match self {
            Self::Plain(path) => Some(path),
            Self::Nested(fields) => match fields.get("path") {
                None | Some(Value::Null) => fields.get("name").and_then(Value::as_str),
                Some(Value::String(path)) if path.is_empty() => {
                    fields.get("name").and_then(Value::as_str)
                }
                Some(Value::String(path)) => Some(path.as_str()),
                Some(other) => {
                    return Err(GraphError::Format(format!(
                        "nested path value is not a string: {}",
                        json_kind(other)
                    )))
                }
            },
            Self::Invalid => None,
        };
        match path {
            Some(path) if !path.is_empty() => Ok(path.to_string()),
            _ => Err(GraphError::Format("path value is missing".to_string())),
        }
    }
}

/// Parse decoded path-info JSON into records keyed by store path.
pub fn parse_path_info_json(raw: &Value) -> Result<PathInfoMap> {
    let mut path_map = PathInfoMap::new();

    match PathInfoPayload::classify(raw)? {
        PathInfoPayload::List(items) => {
            for item in items {
                let Value::Object(fields) = item else {
                    return Err(GraphError::Format(format!(
                        "path info item is not an object: {}",
                        json_kind(item)
                    )));
                };
                let path = PathDescriptor::of(fields.get("path")).resolve()?;
                let record = parse_record(path, fields)?;
                path_map.insert(record.path.clone(), record);
            }
        }
        PathInfoPayload::Map(entries) => {
            for (path, info) in entries {
                let Value::Object(fields) = info else {
                    return Err(GraphError::Format(format!(
                        "path info entry for {path} is not an object"
                    )));
                };
                let path = PathDescriptor::Plain(path).resolve()?;
                let record = parse_record(path, fields)?;
                path_map.insert(record.path.clone(), record);
            }
        }
    }

    Ok(path_map)
}

fn parse_record(path: String, fields: &Map<String, Value>) -> Result<PathRecord> {
    let references = match fields.get("references") {
        None => Vec::new(),
        Some(Value::Array(refs)) => refs
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(other) => {
            return Err(GraphError::Format(format!(
                "references of {path} is not a list: {}",
                json_kind(other)
            )))
        }
    };

    // A zero or empty narSize means the store did not report one.
    let own_size = match fields.get("narSize") {
        Some(value) if !is_unreported_size(value) => value,
        _ => fields.get("size").unwrap_or(&Value::Null),
    };
    let nar_size = coerce_size(own_size)?;
    let closure_size = coerce_size(fields.get("closureSize").unwrap_or(&Value::Null))?;

    Ok(PathRecord {
        path,
        nar_size,
        closure_size,
        references,
    })
}

fn is_unreported_size(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn list_payload() -> Value {
        json!([
            {
                "path": "/nix/store/aaaaa-foo-1.0",
                "narSize": 100,
                "closureSize": 400,
                "references": ["/nix/store/bbbbb-bar-2.0"]
            },
            {
                "path": "/nix/store/bbbbb-bar-2.0",
                "narSize": 200,
                "closureSize": 200,
                "references": []
            }
        ])
    }

    fn map_payload() -> Value {
        json!({
            "/nix/store/aaaaa-foo-1.0": {
                "narSize": 100,
                "closureSize": 400,
                "references": ["/nix/store/bbbbb-bar-2.0"]
            },
            "/nix/store/bbbbb-bar-2.0": {
                "narSize": 200,
                "closureSize": 200,
                "references": []
            }
        })
    }

    #[test]
    fn list_and_map_shapes_agree() {
        let from_list = parse_path_info_json(&list_payload()).unwrap();
        let from_map = parse_path_info_json(&map_payload()).unwrap();

        assert_eq!(from_list, from_map);
        let foo = &from_list["/nix/store/aaaaa-foo-1.0"];
        assert_eq!(foo.nar_size, Some(100));
        assert_eq!(foo.closure_size, Some(400));
        assert_eq!(foo.references, vec!["/nix/store/bbbbb-bar-2.0".to_string()]);
    }

    #[test]
    fn nested_path_descriptor_is_resolved() {
        let raw = json!([
            {"path": {"path": "/nix/store/ddddd-qux-4.0"}, "narSize": 10, "closureSize": 10},
            {"path": {"name": "/nix/store/eeeee-quux-5.0"}}
        ]);
        let path_map = parse_path_info_json(&raw).unwrap();

        assert!(path_map.contains_key("/nix/store/ddddd-qux-4.0"));
        assert!(path_map.contains_key("/nix/store/eeeee-quux-5.0"));
        assert!(path_map["/nix/store/eeeee-quux-5.0"].references.is_empty());
    }

    #[test]
    fn size_falls_back_to_alternate_key() {
        let raw = json!([
            {"path": "/nix/store/a-a", "size": "42", "closureSize": 42.7},
            {"path": "/nix/store/b-b", "narSize": null, "size": 7}
        ]);
        let path_map = parse_path_info_json(&raw).unwrap();

        assert_eq!(path_map["/nix/store/a-a"].nar_size, Some(42));
        assert_eq!(path_map["/nix/store/a-a"].closure_size, Some(42));
        assert_eq!(path_map["/nix/store/b-b"].nar_size, Some(7));
        assert_eq!(path_map["/nix/store/b-b"].closure_size, None);
    }

    #[test]
    fn zero_nar_size_falls_back_to_size() {
        let raw = json!([
            {"path": "/nix/store/a-a", "narSize": 0, "size": 5},
            {"path": "/nix/store/b-b", "narSize": 0},
            {"path": "/nix/store/c-c", "narSize": "", "size": "9"},
            {"path": "/nix/store/d-d", "narSize": 3, "size": 5}
        ]);
        let path_map = parse_path_info_json(&raw).unwrap();

        assert_eq!(path_map["/nix/store/a-a"].nar_size, Some(5));
        assert_eq!(path_map["/nix/store/b-b"].nar_size, None);
        assert_eq!(path_map["/nix/store/c-c"].nar_size, Some(9));
        assert_eq!(path_map["/nix/store/d-d"].nar_size, Some(3));
    }

    #[test]
    fn nested_path_of_wrong_type_is_rejected() {
        let raw = json!([{"path": {"path": 7, "name": "/nix/store/x-x"}}]);
        assert!(matches!(parse_path_info_json(&raw), Err(GraphError::Format(_))));

        let raw = json!([{"path": {"path": "", "name": "/nix/store/x-x"}}]);
        assert!(parse_path_info_json(&raw).unwrap().contains_key("/nix/store/x-x"));
    }

    #[test]
    fn non_string_references_are_dropped() {
        let raw = json!([{"path": "/nix/store/a-a", "references": ["/nix/store/b-b", 3, null]}]);
        let path_map = parse_path_info_json(&raw).unwrap();

        assert_eq!(path_map["/nix/store/a-a"].references, vec!["/nix/store/b-b".to_string()]);
    }

    #[test]
    fn structural_mismatches_are_format_errors() {
        let cases = [
            json!("bad"),
            json!(12),
            json!([{"references": []}]),
            json!([{"path": ""}]),
            json!([{"path": 7}]),
            json!([{"path": "/nix/store/x", "references": 1}]),
            json!(["bad-item"]),
            json!({"/nix/store/x": "not-an-object"}),
            json!([{"path": "/nix/store/x", "narSize": "big"}]),
            json!([{"path": "/nix/store/x", "closureSize": [1]}]),
        ];
        for raw in cases {
            assert!(
                matches!(parse_path_info_json(&raw), Err(GraphError::Format(_))),
                "accepted {raw}"
            );
        }
    }
}
