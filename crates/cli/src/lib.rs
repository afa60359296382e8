use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use closure_graph::{
    generate_mermaid, DiagnosticEvent, DiagnosticSink, GraphError, JsonLineSink, StoreCommands,
};
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

mod process;
mod store_path;

pub use process::ProcessRunner;
pub use store_path::{resolve_store_path, DEFAULT_STORE_DIR};

/// Exit status for a store path that fails validation
pub const EXIT_INVALID_INPUT: u8 = 2;

/// Exit status for every other failure
pub const EXIT_FAILURE: u8 = 1;

/// Write the diagram followed by a newline. A closed reader is not an error.
fn write_diagram(mut out: impl Write, diagram: &str) -> io::Result<()> {
    let written = writeln!(out, "{diagram}").and_then(|_| out.flush());
    match written {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            log::debug!("Output closed before the diagram was written");
            Ok(())
        }
        other => other,
    }
}

#[derive(Parser)]
#[command(name = "nix-path-mermaid")]
#[command(about = "Render the dependency closure of a Nix store path as a Mermaid diagram", long_about = None)]
#[command(version)]
struct Cli {
    /// Store path (or a symlink into the store, e.g. ./result)
    store_path: PathBuf,

    /// `nix` executable used for path-info and derivation queries
    #[arg(long, default_value = "nix")]
    nix: String,

    /// `nix-store` executable used for deriver queries
    #[arg(long, default_value = "nix-store")]
    nix_store: String,

    /// Store directory the path must resolve into (overrides NIX_STORE_DIR)
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: only errors are logged (diagnostic events are always written)
    #[arg(long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn store_dir(cli: &Cli) -> PathBuf {
    cli.store_dir
        .clone()
        .or_else(|| env::var_os("NIX_STORE_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let sink = JsonLineSink::stderr();
    let store_dir = store_dir(&cli);

    let root = resolve_store_path(&cli.store_path, &store_dir)
        .and_then(|root| match root.to_str() {
            Some(text) => Ok(text.to_string()),
            None => Err(GraphError::Input(format!(
                "store path is not valid UTF-8: {}",
                root.display()
            ))),
        })
        .inspect_err(|err| {
            sink.emit(DiagnosticEvent::error("invalid store path").with("error", input_message(err)));
        })?;
    log::debug!("Resolved {} to {root}", cli.store_path.display());

    let commands = StoreCommands::new(cli.nix, cli.nix_store);
    let runner = ProcessRunner::new(&sink);
    let mermaid = generate_mermaid(&root, &runner, &commands, &sink)
        .with_context(|| format!("Failed to render closure of {root}"))?;

    write_diagram(io::stdout().lock(), &mermaid).context("Failed to write diagram")
}

/// Map a failed run to the process exit status.
pub fn exit_status_for(err: &anyhow::Error) -> u8 {
    let input_error = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<GraphError>())
        .any(GraphError::is_input);
    if input_error {
        EXIT_INVALID_INPUT
    } else {
        EXIT_FAILURE
    }
}

fn input_message(err: &GraphError) -> String {
    match err {
        GraphError::Input(message) => message.clone(),
        other => other.to_string(),
    }
}
