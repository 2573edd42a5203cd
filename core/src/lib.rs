//! Deterministic build planning for slatted sofa frames.
//!
//! The pipeline goes raw JSON config -> resolved spec -> layout context ->
//! component builders -> [`plan::BuildPlan`], with structured diagnostics at
//! every deviation, scene metrics and validation over the finished plan, and
//! a bounded autofix loop that patches the config and rebuilds.
//!
//! The only fatal error is a top-level input that is not a JSON object;
//! everything else resolves to defaults with a diagnostic trail.

pub mod autofix;
pub mod components;
pub mod config;
pub mod diagnostics;
pub mod geometry;
pub mod layout;
pub mod metrics;
pub mod plan;
pub mod validate;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    /// The top-level config value was not a JSON object.
    #[error("config root must be a JSON object, got {0}")]
    MalformedInput(String),
}

pub use autofix::{AutofixEngine, AutofixOptions, AutofixReport};
pub use components::{build_default, build_from_raw, BuildOutput};
pub use config::{resolve, PresetCatalog, RawConfig, ResolvedSpec};
pub use diagnostics::{BuildContext, DiagnosticsSink, Event, JsonlSink, MemorySink, NoopSink};
pub use layout::LayoutContext;
pub use metrics::SceneMetrics;
pub use plan::{Anchor, BuildPlan, Primitive, Shape};
pub use validate::{validate, ValidateOptions, Validation};
