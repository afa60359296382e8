//! # Closure Graph
//!
//! Dependency-closure diagrams for Nix store paths.
//!
//! ## Architecture
//!
//! ```text
//! store path
//!     │
//!     ├──> Closure loader (nix path-info --recursive --json)
//!     │      └─ list / map / nested-path payloads -> PathRecord map
//!     │
//!     ├──> Title resolution
//!     │      ├─ nix-store --query --deriver (batches of 200)
//!     │      └─ nix derivation show --stdin -> output path titles
//!     │
//!     ├──> Size classifier (tertiles over closure sizes)
//!     │
//!     └──> Closure graph (petgraph) -> Mermaid flowchart
//! ```
//!
//! External commands go through [`CommandRunner`] and failures are reported
//! through a [`DiagnosticSink`], so the whole pipeline runs against fakes in
//! tests.

mod classify;
mod derivation;
mod diagnostics;
mod error;
mod graph;
mod loader;
mod mermaid;
mod path_info;
mod pipeline;
mod runner;
mod titles;
mod types;
mod units;

pub use classify::{class_for_size, quantile_thresholds};
pub use derivation::{build_title, parse_derivation_json};
pub use diagnostics::{DiagnosticEvent, DiagnosticSink, JsonLineSink, Level, MemorySink};
pub use error::{GraphError, Result};
pub use graph::{ClosureGraph, ClosureNode};
pub use loader::load_path_info;
pub use mermaid::{render_mermaid, write_graph};
pub use path_info::parse_path_info_json;
pub use pipeline::generate_mermaid;
pub use runner::{CommandRunner, StoreCommands};
pub use titles::{
    chunk_paths, load_derivations, load_derivers, title_map_for_paths, DERIVER_BATCH_SIZE,
    UNKNOWN_DERIVER,
};
pub use types::{PathInfoMap, PathRecord, SizeClass, SizeThresholds, TitleLookup};
pub use units::{coerce_size, human_size};
