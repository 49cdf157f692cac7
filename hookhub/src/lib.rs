//! # hookhub
//!
//! Reformat webhook payloads with a small, loop-aware template language.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on `hookhub`
//! to get everything, or on the individual crates for finer-grained control.

/// Error types, settings, logging, and named-variable tables.
pub use hookhub_core as core;

/// The template language and payload reformatting.
#[cfg(feature = "template")]
pub use hookhub_template as template;

pub use hookhub_core::{HookhubError, HookhubResult, Settings, TemplateError, VariableLookup, VariableRegistry};

#[cfg(feature = "template")]
pub use hookhub_template::{Engine, Value};

/// JSON payloads, for building the values templates render against.
pub use serde_json;

/// Tracing macros and spans, matching the events hookhub emits.
pub use tracing;

/// Subscriber building blocks for callers that install their own.
pub use tracing_subscriber;

/// Renders `source` against a JSON payload with default settings.
///
/// Returns `None` for an empty source or a failed render.
///
/// ```
/// use serde_json::json;
///
/// let out = hookhub::render("Hello, ${data.who}!", json!({"who": "world"}), None);
/// assert_eq!(out.as_deref(), Some("Hello, world!"));
/// ```
#[cfg(feature = "template")]
pub fn render(
    source: &str,
    payload: serde_json::Value,
    variables: Option<&dyn VariableLookup>,
) -> Option<String> {
    Engine::new().render(source, &Value::from(payload), variables)
}

/// Installs the global `tracing` subscriber described by `settings`.
pub fn init_logging(settings: &Settings) {
    hookhub_core::logging::setup_logging(settings);
}
