//! Structured diagnostics: event schema, severity model and sinks.
//!
//! Every deviation the pipeline makes from its input (clamps, fallbacks,
//! defaults, strategy picks) is published as an [`Event`] on a
//! [`DiagnosticsSink`]. Builds never fail because of a bad field; they
//! deviate and leave a trail here instead.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Event severity. Ordinal values are part of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info = 0,
    Warn = 1,
    Error = 2,
    Fatal = 3,
}

impl Severity {
    pub fn from_i64(value: i64) -> Self {
        match value.clamp(0, 3) {
            0 => Self::Info,
            1 => Self::Warn,
            2 => Self::Error,
            _ => Self::Fatal,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_i64())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(Self::from_i64(raw))
    }
}

/// Pipeline stage an event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Resolve,
    Layout,
    Build,
    Debug,
}

impl Stage {
    /// Out-of-vocabulary strings normalize to `Build`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "resolve" => Self::Resolve,
            "layout" => Self::Layout,
            "debug" => Self::Debug,
            _ => Self::Build,
        }
    }
}

/// Subsystem that emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Resolver,
    Layout,
    SeatFrame,
    SeatSlats,
    Back,
    Arms,
    Legs,
    Builder,
}

impl Component {
    /// Out-of-vocabulary strings normalize to `Builder`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "resolver" => Self::Resolver,
            "layout" => Self::Layout,
            "seat_frame" => Self::SeatFrame,
            "seat_slats" => Self::SeatSlats,
            "back" => Self::Back,
            "arms" => Self::Arms,
            "legs" => Self::Legs,
            _ => Self::Builder,
        }
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Supplied directly in the raw request document.
    Raw,
    Preset,
    Global,
    Fallback,
    Computed,
}

impl Source {
    /// Out-of-vocabulary strings normalize to `Computed`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "raw" | "ir" => Self::Raw,
            "preset" => Self::Preset,
            "global" => Self::Global,
            "fallback" => Self::Fallback,
            _ => Self::Computed,
        }
    }
}

/// Unified diagnostics event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub ts: String,
    pub run_id: String,
    pub stage: Stage,
    pub component: Component,
    pub code: String,
    pub severity: Severity,
    pub path: String,
    pub source: Source,
    pub input_value: Value,
    pub resolved_value: Value,
    pub reason: String,
    pub meta: BTreeMap<String, Value>,
}

/// Builder-style constructor arguments for [`Event`]. Fields not set fall
/// back to the vocabulary defaults.
#[derive(Debug, Clone, Default)]
pub struct EventSpec {
    pub stage: Option<Stage>,
    pub component: Option<Component>,
    pub code: String,
    pub severity: i64,
    pub path: String,
    pub source: Option<Source>,
    pub input_value: Value,
    pub resolved_value: Value,
    pub reason: String,
    pub meta: BTreeMap<String, Value>,
}

impl Event {
    pub fn new(run_id: &str, spec: EventSpec) -> Self {
        Self {
            ts: utc_now_iso(),
            run_id: run_id.to_string(),
            stage: spec.stage.unwrap_or(Stage::Build),
            component: spec.component.unwrap_or(Component::Builder),
            code: spec.code,
            severity: Severity::from_i64(spec.severity),
            path: spec.path,
            source: spec.source.unwrap_or(Source::Computed),
            input_value: spec.input_value,
            resolved_value: spec.resolved_value,
            reason: spec.reason,
            meta: spec.meta,
        }
    }
}

/// UTC timestamp with whole-second precision, `Z` suffix.
pub fn utc_now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// New short hex run id.
pub fn new_run_id() -> String {
    format!("run_{}", uuid::Uuid::new_v4().simple())
}

/// Sink interface for structured diagnostics events.
pub trait DiagnosticsSink {
    fn emit(&self, event: &Event);
}

/// Default sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn emit(&self, _event: &Event) {}
}

/// Appends one JSON record per event to a JSONL file. Fire-and-forget:
/// write failures are swallowed after a trace log.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn try_emit(&self, event: &Event) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl DiagnosticsSink for JsonlSink {
    fn emit(&self, event: &Event) {
        if let Err(err) = self.try_emit(event) {
            tracing::trace!(path = %self.path.display(), %err, "diagnostics sink write failed");
        }
    }
}

/// Per-run context injected into every pipeline stage.
#[derive(Clone)]
pub struct BuildContext {
    pub run_id: String,
    pub debug: bool,
    sink: Arc<dyn DiagnosticsSink>,
}

impl BuildContext {
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            run_id: new_run_id(),
            debug: false,
            sink,
        }
    }

    pub fn noop() -> Self {
        Self::new(Arc::new(NoopSink))
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn emit(&self, spec: EventSpec) -> Event {
        let event = Event::new(&self.run_id, spec);
        self.sink.emit(&event);
        event
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("run_id", &self.run_id)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

/// Sink that retains events in memory. Test helper, also used by the
/// autofix engine to collect per-iteration trails.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: std::sync::Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }

    pub fn snapshot(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => Vec::new(),
        }
    }
}

impl DiagnosticsSink for MemorySink {
    fn emit(&self, event: &Event) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }
}
