//! Payload reformatting.
//!
//! Helpers that sit on top of [`Engine`]: evaluate one expression, a map of
//! expressions, or a template file, and turn an incoming payload into a new
//! JSON document by rendering a template against it.

use std::borrow::Cow;
use std::fmt::Write as _;
use std::hash::Hash;
use std::path::Path;

use hookhub_core::error::HookhubResult;
use hookhub_core::variables::VariableLookup;
use indexmap::IndexMap;
use thiserror::Error;

use crate::engine::Engine;
use crate::value::Value;

/// Failure to turn a payload into a reformatted JSON document.
#[derive(Error, Debug)]
pub enum ReformatError {
    /// The template was empty or failed to render.
    #[error("template produced no output")]
    NoOutput,

    /// The rendered text is not valid JSON.
    #[error("unable to deserialize evaluated template: {source}")]
    Deserialize {
        /// The rendered text.
        data: String,
        /// The JSON parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The template file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReformatError {
    /// The rendered text that failed to deserialize, if rendering got that far.
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Deserialize { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Evaluates one expression. Empty expressions and failed renders give `None`.
pub fn evaluate_expression(
    engine: &Engine,
    expression: &str,
    payload: &Value,
    variables: Option<&dyn VariableLookup>,
) -> Option<String> {
    engine.render(expression, payload, variables)
}

/// Evaluates every expression of a map, keeping keys and their order.
///
/// # Examples
///
/// ```
/// use hookhub_template::engine::Engine;
/// use hookhub_template::reformat::evaluate_expressions;
/// use hookhub_template::value::Value;
/// use serde_json::json;
///
/// let payload = Value::from(json!({"a": {"b": "world", "c": "person"}}));
/// let out = evaluate_expressions(
///     &Engine::new(),
///     [("foo", "Hello, ${data.a.b}!"), ("bar", "I am a ${data.a.c}")],
///     &payload,
///     None,
/// );
/// assert_eq!(out["foo"].as_deref(), Some("Hello, world!"));
/// assert_eq!(out["bar"].as_deref(), Some("I am a person"));
/// ```
pub fn evaluate_expressions<K, E, I>(
    engine: &Engine,
    expressions: I,
    payload: &Value,
    variables: Option<&dyn VariableLookup>,
) -> IndexMap<K, Option<String>>
where
    K: Hash + Eq,
    E: AsRef<str>,
    I: IntoIterator<Item = (K, E)>,
{
    expressions
        .into_iter()
        .map(|(key, expression)| {
            let rendered = engine.render(expression.as_ref(), payload, variables);
            (key, rendered)
        })
        .collect()
}

/// Reads a template file and evaluates it against `payload`.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read. Render failures are not
/// errors here; they yield `Ok(None)` like [`evaluate_expression`].
pub fn evaluate_template_file(
    engine: &Engine,
    path: impl AsRef<Path>,
    payload: &Value,
    variables: Option<&dyn VariableLookup>,
) -> HookhubResult<Option<String>> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), "evaluating template file");
    Ok(engine.render(&source, payload, variables))
}

/// Renders `template` against `payload` and parses the result as JSON.
///
/// # Errors
///
/// [`ReformatError::NoOutput`] if nothing was rendered,
/// [`ReformatError::Deserialize`] if the output is not JSON.
pub fn reformat_payload(
    engine: &Engine,
    template: &str,
    payload: &Value,
    variables: Option<&dyn VariableLookup>,
) -> Result<serde_json::Value, ReformatError> {
    let data = engine
        .render(template, payload, variables)
        .ok_or(ReformatError::NoOutput)?;
    let parsed = serde_json::from_str(&escape_string_controls(&data));
    parsed.map_err(|source| ReformatError::Deserialize { data, source })
}

/// Like [`reformat_payload`], reading the template from a file.
///
/// # Errors
///
/// As [`reformat_payload`], plus [`ReformatError::Io`] if the file cannot
/// be read.
pub fn reformat_payload_file(
    engine: &Engine,
    path: impl AsRef<Path>,
    payload: &Value,
    variables: Option<&dyn VariableLookup>,
) -> Result<serde_json::Value, ReformatError> {
    let template = std::fs::read_to_string(path)?;
    reformat_payload(engine, &template, payload, variables)
}

/// Escapes raw control characters (U+0000 to U+001F) found inside JSON
/// string literals, so rendered payload text such as multi-line messages
/// still parses. Text outside string literals is left alone.
fn escape_string_controls(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut in_string = false;
    let mut escaped = false;
    for c in text.chars() {
        if in_string && !escaped && c < '\u{20}' {
            match c {
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                '\u{8}' => out.push_str("\\b"),
                '\u{c}' => out.push_str("\\f"),
                other => {
                    let _ = write!(out, "\\u{:04x}", u32::from(other));
                }
            }
            continue;
        }
        out.push(c);
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        }
    }
    Cow::Owned(out)
}
