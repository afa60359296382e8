use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata for one store path in a closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    /// Store path (e.g., "/nix/store/aaaa-foo-1.0")
    pub path: String,

    /// Size of the path's own NAR serialisation
    pub nar_size: Option<u64>,

    /// Size of the path plus everything it references transitively
    pub closure_size: Option<u64>,

    /// Direct references, in payload order
    pub references: Vec<String>,
}

impl PathRecord {
    /// Name part of the store path: everything after the first `-`.
    pub fn name_suffix(&self) -> &str {
        self.path
            .split_once('-')
            .map_or(self.path.as_str(), |(_, rest)| rest)
    }
}

/// Store path -> record. Sorted so every downstream walk is deterministic.
pub type PathInfoMap = BTreeMap<String, PathRecord>;

/// Output path -> human readable title
pub type TitleLookup = BTreeMap<String, String>;

/// Size bucket used to pick a node style
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    Unknown,
}

impl SizeClass {
    pub const ALL: [SizeClass; 4] = [
        SizeClass::Small,
        SizeClass::Medium,
        SizeClass::Large,
        SizeClass::Unknown,
    ];

    /// Mermaid class name
    pub const fn as_str(self) -> &'static str {
        match self {
            SizeClass::Small => "sizeGreen",
            SizeClass::Medium => "sizeYellow",
            SizeClass::Large => "sizeRed",
            SizeClass::Unknown => "sizeUnknown",
        }
    }

    /// Mermaid style body for the `classDef` line
    pub const fn style(self) -> &'static str {
        match self {
            SizeClass::Small => "fill:#8fd694,stroke:#333,stroke-width:1px",
            SizeClass::Medium => "fill:#ffe08a,stroke:#333,stroke-width:1px",
            SizeClass::Large => "fill:#f4a6a6,stroke:#333,stroke-width:1px",
            SizeClass::Unknown => "fill:#dddddd,stroke:#333,stroke-width:1px",
        }
    }
}

/// Lower and upper tertile boundaries over the known closure sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeThresholds {
    pub low: u64,
    pub high: u64,
}
