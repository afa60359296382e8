use crate::derivation::parse_derivation_json;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::error::{GraphError, Result};
use crate::loader::decode_json;
use crate::runner::{CommandRunner, StoreCommands};
use crate::types::TitleLookup;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// Paths per `nix-store --query --deriver` invocation, bounded by argv limits.
pub const DERIVER_BATCH_SIZE: usize = 200;

/// Printed by `nix-store --query --deriver` when no derivation is known.
pub const UNKNOWN_DERIVER: &str = "unknown-deriver";

/// Split `paths` into consecutive batches of at most `size` entries.
pub fn chunk_paths(paths: &[String], size: usize) -> Result<Vec<Vec<String>>> {
    if size == 0 {
        return Err(GraphError::Execution(
            "chunk size must be non-zero".to_string(),
        ));
    }
    Ok(paths.chunks(size).map(<[String]>::to_vec).collect())
}

/// Resolve the deriver of every path. `None` marks an unknown deriver.
pub fn load_derivers(
    paths: &[String],
    runner: &dyn CommandRunner,
    commands: &StoreCommands,
    sink: &dyn DiagnosticSink,
) -> Result<BTreeMap<String, Option<String>>> {
    let mut derivers = BTreeMap::new();

    for (batch_index, chunk) in chunk_paths(paths, DERIVER_BATCH_SIZE)?.iter().enumerate() {
        let output = runner.run(&commands.query_derivers(chunk), None)?;
        let lines: Vec<&str> = output.trim().lines().collect();

        if lines.len() != chunk.len() {
            sink.emit(
                DiagnosticEvent::error("deriver output mismatch")
                    .with("batch", batch_index)
                    .with("expected", chunk.len())
                    .with("actual", lines.len()),
            );
            return Err(GraphError::Execution(format!(
                "deriver output mismatch in batch {batch_index}: expected {} lines, got {}",
                chunk.len(),
                lines.len()
            )));
        }

        for (path, line) in chunk.iter().zip(lines) {
            let deriver = (line != UNKNOWN_DERIVER).then(|| line.to_string());
            derivers.insert(path.clone(), deriver);
        }
    }

    log::debug!(
        "Resolved derivers for {} paths in {} batches",
        derivers.len(),
        paths.len().div_ceil(DERIVER_BATCH_SIZE)
    );
    Ok(derivers)
}

/// Fetch `nix derivation show` output for the given derivations in one call.
pub fn load_derivations(
    drv_paths: &[String],
    runner: &dyn CommandRunner,
    commands: &StoreCommands,
    sink: &dyn DiagnosticSink,
) -> Result<Value> {
    if drv_paths.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let mut input = drv_paths.join("\n");
    input.push('\n');
    let output = runner.run(&commands.show_derivations(), Some(&input))?;

    decode_json(&output).inspect_err(|err| {
        sink.emit(
            DiagnosticEvent::error("invalid derivation json")
                .with("derivations", drv_paths.len())
                .with("error", err.to_string()),
        );
    })
}

/// Resolve display titles for as many of `paths` as possible.
pub fn title_map_for_paths(
    paths: &[String],
    runner: &dyn CommandRunner,
    commands: &StoreCommands,
    sink: &dyn DiagnosticSink,
) -> Result<TitleLookup> {
    let derivers = load_derivers(paths, runner, commands, sink)?;
    // Sorted so the stdin handed to nix is stable across runs.
    let drv_paths: Vec<String> = derivers
        .into_values()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let derivation_data = load_derivations(&drv_paths, runner, commands, sink)?;
    parse_derivation_json(&derivation_data).inspect_err(|err| {
        sink.emit(DiagnosticEvent::error("invalid derivation json").with("error", err.to_string()));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    fn paths(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn chunk_paths_splits_and_rejects_zero() {
        assert!(chunk_paths(&paths(&["a"]), 0).is_err());
        assert_eq!(
            chunk_paths(&paths(&["a", "b", "c"]), 2).unwrap(),
            vec![paths(&["a", "b"]), paths(&["c"])]
        );
        assert!(chunk_paths(&[], 2).unwrap().is_empty());
    }

    #[test]
    fn derivers_map_sentinel_to_none() {
        let runner = |args: &[String], _input: Option<&str>| -> Result<String> {
            let lines: Vec<&str> = args[3..]
                .iter()
                .map(|path| match path.as_str() {
                    "a" => "/nix/store/a.drv",
                    _ => UNKNOWN_DERIVER,
                })
                .collect();
            Ok(lines.join("\n") + "\n")
        };
        let sink = MemorySink::new();

        let derivers =
            load_derivers(&paths(&["a", "b"]), &runner, &StoreCommands::default(), &sink).unwrap();

        assert_eq!(derivers["a"].as_deref(), Some("/nix/store/a.drv"));
        assert_eq!(derivers["b"], None);
    }

    #[test]
    fn empty_path_list_makes_no_call() {
        let runner = |_args: &[String], _input: Option<&str>| -> Result<String> {
            panic!("runner must not be called")
        };
        let sink = MemorySink::new();

        assert!(load_derivers(&[], &runner, &StoreCommands::default(), &sink)
            .unwrap()
            .is_empty());
        assert_eq!(
            load_derivations(&[], &runner, &StoreCommands::default(), &sink).unwrap(),
            json!({})
        );
    }

    #[test]
    fn batches_are_bounded() {
        let all: Vec<String> = (0..450).map(|i| format!("/nix/store/p{i:03}-x")).collect();
        let batch_sizes = RefCell::new(Vec::new());
        let runner = |args: &[String], _input: Option<&str>| -> Result<String> {
            batch_sizes.borrow_mut().push(args.len() - 3);
            Ok(vec![UNKNOWN_DERIVER; args.len() - 3].join("\n"))
        };
        let sink = MemorySink::new();

        let derivers = load_derivers(&all, &runner, &StoreCommands::default(), &sink).unwrap();

        assert_eq!(derivers.len(), 450);
        assert_eq!(*batch_sizes.borrow(), vec![200, 200, 50]);
    }

    #[test]
    fn line_count_mismatch_fails_in_any_batch() {
        let all: Vec<String> = (0..401).map(|i| format!("/nix/store/p{i:03}-x")).collect();
        for bad_batch in 0..3 {
            let calls = Cell::new(0usize);
            let runner = |args: &[String], _input: Option<&str>| -> Result<String> {
                let batch = calls.get();
                calls.set(batch + 1);
                let mut count = args.len() - 3;
                if batch == bad_batch {
                    count -= 1;
                }
                Ok(vec!["/nix/store/d.drv"; count].join("\n"))
            };
            let sink = MemorySink::new();

            let err = load_derivers(&all, &runner, &StoreCommands::default(), &sink).unwrap_err();

            assert!(matches!(err, GraphError::Execution(_)));
            assert_eq!(calls.get(), bad_batch + 1);
            let events = sink.events();
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].message, "deriver output mismatch");
            assert_eq!(events[0].field("batch"), Some(&json!(bad_batch)));
        }
    }

    #[test]
    fn derivations_are_fed_through_stdin() {
        let seen_input = RefCell::new(None);
        let runner = |args: &[String], input: Option<&str>| -> Result<String> {
            assert_eq!(args[1..], ["derivation", "show", "--stdin", "--no-pretty"]);
            *seen_input.borrow_mut() = input.map(str::to_string);
            Ok("{}".to_string())
        };
        let sink = MemorySink::new();

        load_derivations(
            &paths(&["/nix/store/a.drv", "/nix/store/b.drv"]),
            &runner,
            &StoreCommands::default(),
            &sink,
        )
        .unwrap();

        assert_eq!(
            seen_input.borrow().as_deref(),
            Some("/nix/store/a.drv\n/nix/store/b.drv\n")
        );
    }

    #[test]
    fn title_map_dedups_and_sorts_derivers() {
        let seen_input = RefCell::new(String::new());
        let runner = |args: &[String], input: Option<&str>| -> Result<String> {
            if args[..3] == ["nix-store", "--query", "--deriver"] {
                let lines: Vec<&str> = args[3..]
                    .iter()
                    .map(|path| match path.as_str() {
                        "/nix/store/aaaaa-foo-1.0" | "/nix/store/ccccc-foo-1.0-dev" => {
                            "/nix/store/zzz-foo-1.0.drv"
                        }
                        "/nix/store/bbbbb-bar-2.0" => "/nix/store/eee-bar-2.0.drv",
                        _ => UNKNOWN_DERIVER,
                    })
                    .collect();
                return Ok(lines.join("\n"));
            }
            *seen_input.borrow_mut() = input.unwrap_or_default().to_string();
            Ok(json!({
                "/nix/store/zzz-foo-1.0.drv": {
                    "env": {"pname": "foo", "version": "1.0"},
                    "outputs": {"out": {"path": "/nix/store/aaaaa-foo-1.0"}}
                }
            })
            .to_string())
        };
        let sink = MemorySink::new();

        let title_map = title_map_for_paths(
            &paths(&[
                "/nix/store/aaaaa-foo-1.0",
                "/nix/store/bbbbb-bar-2.0",
                "/nix/store/ccccc-foo-1.0-dev",
                "/nix/store/ddddd-src",
            ]),
            &runner,
            &StoreCommands::default(),
            &sink,
        )
        .unwrap();

        assert_eq!(
            *seen_input.borrow(),
            "/nix/store/eee-bar-2.0.drv\n/nix/store/zzz-foo-1.0.drv\n"
        );
        assert_eq!(title_map.len(), 1);
        assert_eq!(title_map["/nix/store/aaaaa-foo-1.0"], "foo 1.0");
    }
}
