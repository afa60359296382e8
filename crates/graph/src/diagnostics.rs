//! Structured diagnostic events.
//!
//! Failures are reported as single-line JSON objects
//! (`{"level": ..., "message": ..., ...fields}`) through an injected
//! [`DiagnosticSink`], never through the diagram output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub level: Level,
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DiagnosticEvent {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    /// An event for a failure the run recovered from.
    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(Level::Warn, message)
    }

    /// Attach a field; `level` and `message` cannot be shadowed.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if key != "level" && key != "message" {
            self.fields.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Receiver for diagnostic events
pub trait DiagnosticSink {
    fn emit(&self, event: DiagnosticEvent);
}

/// Writes one JSON object per line to the wrapped writer.
pub struct JsonLineSink<W: Write> {
    writer: RefCell<W>,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLineSink<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> DiagnosticSink for JsonLineSink<W> {
    fn emit(&self, event: DiagnosticEvent) {
        let line = match serde_json::to_string(&event) {
            Ok(line) => line,
            Err(err) => {
                log::warn!("Failed to serialize diagnostic event: {err}");
                return;
            }
        };
        let mut writer = self.writer.borrow_mut();
        if let Err(err) = writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush())
        {
            log::warn!("Failed to write diagnostic event: {err}");
        }
    }
}

/// Keeps events in memory so callers can inspect them.
#[derive(Default)]
pub struct MemorySink {
    events: RefCell<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|event| event.message.clone())
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, event: DiagnosticEvent) {
        self.events.borrow_mut().push(event);
    }
}
