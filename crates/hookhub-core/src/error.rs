//! Core error types for hookhub.
//!
//! Two enums live here. [`TemplateError`] is the taxonomy of failures raised
//! while tokenizing, parsing, and evaluating a template; [`HookhubError`] is
//! the crate-wide error that wraps it together with configuration, variable
//! table, serialization, and I/O failures.
//!
//! Unresolvable data paths, missing named variables, and missing loop keys are
//! *not* errors: they degrade to an empty value at the point of reference.

use thiserror::Error;

/// A fatal failure while processing a template.
///
/// Every variant aborts the whole top-level parse. The driver reports the
/// error on the `tracing` error channel and yields no result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    // ── Tokenizer ────────────────────────────────────────────────────

    /// A character matched none of the patterns of the active lexical mode.
    #[error("Illegal character '{character}' at offset {offset}")]
    LexError {
        /// The offending character.
        character: char,
        /// Byte offset of the character in the template source.
        offset: usize,
    },

    // ── Parser ───────────────────────────────────────────────────────

    /// The token sequence does not match the grammar.
    #[error("Parse error: {0}")]
    ParseError(String),

    // ── Evaluation ───────────────────────────────────────────────────

    /// A hard symbol error: a `config` reference without a variable table,
    /// a `key` reference outside any loop, or an unsupported root.
    #[error("Resolution error: {0}")]
    ResolutionError(String),

    /// Misuse of the loop symbol table (duplicate or unknown index variable,
    /// out-of-range combination index).
    #[error("Loop error: {0}")]
    LoopError(String),

    /// The root items sequence did not collapse to exactly one value.
    #[error("For-loop branching error: top level produced {0} values")]
    ForLoopBranching(usize),

    /// Nested `config` indirection exceeded the configured depth.
    #[error("Config variable recursion exceeded the maximum depth of {0}")]
    RecursionLimit(usize),
}

impl TemplateError {
    /// Returns `true` if this error must escape a nested `config` render
    /// instead of degrading to an empty value.
    pub const fn is_fatal_in_nested(&self) -> bool {
        matches!(self, Self::RecursionLimit(_))
    }
}

/// The primary error type for hookhub.
#[derive(Error, Debug)]
pub enum HookhubError {
    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A named-variable table could not be built or linked.
    #[error("Variable table error: {0}")]
    VariableTableError(String),

    // ── Templates ────────────────────────────────────────────────────

    /// Tokenizing, parsing, or evaluating a template failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A convenience type alias for `Result<T, HookhubError>`.
pub type HookhubResult<T> = Result<T, HookhubError>;
