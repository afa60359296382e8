use closure_graph::{CommandRunner, DiagnosticEvent, DiagnosticSink, GraphError, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

/// Runs store queries as child processes.
pub struct ProcessRunner<'a> {
    sink: &'a dyn DiagnosticSink,
}

impl<'a> ProcessRunner<'a> {
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self { sink }
    }
}

impl CommandRunner for ProcessRunner<'_> {
    fn run(&self, args: &[String], input: Option<&str>) -> Result<String> {
        let Some((program, rest)) = args.split_first() else {
            return Err(GraphError::Execution("empty command".to_string()));
        };
        log::debug!("Running {program} with {} arguments", rest.len());

        let spawned = Command::new(program)
            .args(rest)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(err) => {
                self.sink.emit(
                    DiagnosticEvent::error("command spawn failed")
                        .with("command", args.to_vec())
                        .with("error", err.to_string()),
                );
                return Err(GraphError::Execution(format!("failed to run {program}: {err}")));
            }
        };

        // stdin is fed from its own thread while the output pipes drain, so a
        // child that writes before it finishes reading cannot block us.
        let output = thread::scope(|scope| {
            let writer = match (input, child.stdin.take()) {
                (Some(text), Some(mut stdin)) => {
                    Some(scope.spawn(move || stdin.write_all(text.as_bytes())))
                }
                _ => None,
            };
            let output = child.wait_with_output();
            if let Some(Ok(Err(err))) = writer.map(|handle| handle.join()) {
                self.sink.emit(
                    DiagnosticEvent::warn("command stdin write failed")
                        .with("command", args.to_vec())
                        .with("error", err.to_string()),
                );
            }
            output
        })
        .map_err(|err| GraphError::Execution(format!("failed to wait for {program}: {err}")))?;

        if !output.status.success() {
            self.sink.emit(
                DiagnosticEvent::error("command failed")
                    .with("command", args.to_vec())
                    .with("return_code", output.status.code())
                    .with(
                        "stderr",
                        String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    ),
            );
            return Err(GraphError::Execution(format!(
                "command failed: {program} ({})",
                output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
