//! # hookhub-template
//!
//! The hookhub template language: plain text with `${ ... }` injections for
//! variables, conditionals, and `for` loops over sequences and maps, rendered
//! against a structured payload and an optional table of named variables.
//!
//! ```
//! use hookhub_template::{Engine, Value};
//! use serde_json::json;
//!
//! let payload = Value::from(json!({"a": {"b": "Foo"}}));
//! let engine = Engine::new();
//! assert_eq!(engine.render("$data.a.b!", &payload, None).as_deref(), Some("Foo!"));
//! ```
//!
//! ## Modules
//!
//! - [`value`] - The payload value model
//! - [`lexer`] - Mode-stacked tokenizer
//! - [`parser`] - Recursive-descent parser producing an item tree
//! - [`loops`] - Loop symbol table and combination enumeration
//! - [`resolver`] - `data` / `config` / `key` symbol resolution
//! - [`engine`] - Vectorised evaluation and the rendering entry points
//! - [`reformat`] - Expression maps, template files, and JSON reformatting

pub mod engine;
pub mod lexer;
pub mod loops;
pub mod parser;
pub mod reformat;
pub mod resolver;
pub mod value;

pub use engine::Engine;
pub use reformat::{
    evaluate_expression, evaluate_expressions, evaluate_template_file, reformat_payload,
    reformat_payload_file, ReformatError,
};
pub use value::Value;
