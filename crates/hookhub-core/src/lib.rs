//! # hookhub-core
//!
//! Core types for hookhub: the error taxonomy, settings and their loader,
//! tracing-based logging, and the named-variable tables that back
//! `config.*` references in templates. This crate has no framework
//! dependencies and provides the foundation for the other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Engine and logging settings
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`variables`] - Named-variable tables with parent inheritance

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod variables;

// Re-export the most commonly used types at the crate root.
pub use error::{HookhubError, HookhubResult, TemplateError};
pub use settings::Settings;
pub use variables::{ScopedVariables, TableId, VariableLookup, VariableRegistry, VariableTable};
