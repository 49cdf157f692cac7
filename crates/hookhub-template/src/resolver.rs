//! Symbol resolution.
//!
//! A symbol is a dotted path whose first segment selects a value source:
//!
//! - `data.…` walks the structured payload,
//! - `config.…` names a variable whose value is itself a template,
//! - `key.…` names an active loop index.
//!
//! Unresolvable `data` paths, unknown config variables, and unbound loop keys
//! are soft misses that resolve to an empty value. Hard failures are a
//! `config` reference without a variable table, a `key` reference outside any
//! loop, and unsupported roots such as `env`.

use hookhub_core::error::TemplateError;
use hookhub_core::variables::VariableLookup;

use crate::loops::{Bindings, LoopKey};
use crate::value::Value;

/// Renders a `config` variable's template source as a fresh document.
///
/// Implemented by the engine; kept as a trait so the resolver does not depend
/// on the engine's concrete type.
pub trait SourceRenderer {
    /// Renders `source` within `scope`, returning `None` when it produces no
    /// result. Only errors that must abort the outer render are returned.
    fn render_source(&self, source: &str, scope: &Scope<'_>) -> Result<Option<String>, TemplateError>;
}

/// The read-only inputs of one render.
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    /// The structured payload `data.…` paths walk.
    pub payload: &'a Value,
    /// The named-variable table for `config.…`, if any.
    pub variables: Option<&'a dyn VariableLookup>,
    /// Nesting depth of `config` indirection (0 at top level).
    pub depth: usize,
}

impl<'a> Scope<'a> {
    /// A top-level scope.
    pub const fn new(payload: &'a Value, variables: Option<&'a dyn VariableLookup>) -> Self {
        Self {
            payload,
            variables,
            depth: 0,
        }
    }

    /// The scope of a `config` variable rendered from this one.
    #[must_use]
    pub const fn nested(&self) -> Self {
        Self {
            payload: self.payload,
            variables: self.variables,
            depth: self.depth + 1,
        }
    }
}

/// Resolves dotted paths against a [`Scope`].
pub struct Resolver<'a> {
    scope: Scope<'a>,
    renderer: &'a dyn SourceRenderer,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver that renders `config` variables with `renderer`.
    pub const fn new(scope: Scope<'a>, renderer: &'a dyn SourceRenderer) -> Self {
        Self { scope, renderer }
    }

    /// The scope this resolver reads from.
    pub const fn scope(&self) -> &Scope<'a> {
        &self.scope
    }

    /// Resolves `path` under the given loop bindings.
    ///
    /// With `stringify` set the result is always a `Value::String` holding
    /// the output text; otherwise the raw value is returned for conditions
    /// and loop sources.
    pub fn resolve(
        &self,
        path: &str,
        bindings: &Bindings,
        stringify: bool,
    ) -> Result<Value, TemplateError> {
        let root = path.split('.').next().unwrap_or_default();

        let value = match root {
            "data" => self.resolve_data(path, bindings),
            "config" => self.resolve_config(path)?,
            "key" => resolve_key(path, bindings)?,
            _ => {
                return Err(TemplateError::ResolutionError(format!(
                    "symbol \"{path}\" is neither a data, config, nor key reference"
                )));
            }
        };

        if stringify {
            Ok(Value::String(value.to_text()))
        } else {
            Ok(value)
        }
    }

    /// Walks the payload one segment at a time. Never fails: any step that
    /// cannot be taken yields the empty string.
    fn resolve_data(&self, path: &str, bindings: &Bindings) -> Value {
        let miss = || {
            tracing::debug!(path, "unresolvable data path");
            Value::String(String::new())
        };

        let mut current = self.scope.payload;
        let mut segments = path.split('.').skip(1).peekable();

        while let Some(segment) = segments.next() {
            match current {
                Value::Map(map) => {
                    let next = map.get(segment).or_else(|| match bindings.get(segment) {
                        Some(LoopKey::Key(key)) => map.get(key),
                        _ => None,
                    });
                    match next {
                        Some(value) => current = value,
                        None => return miss(),
                    }
                }
                Value::Sequence(items) => {
                    if segment == "length" {
                        return if segments.peek().is_none() {
                            Value::from(items.len())
                        } else {
                            miss()
                        };
                    }
                    let index = match bindings.get(segment) {
                        Some(LoopKey::Index(i)) => Some(*i),
                        Some(LoopKey::Key(_)) => None,
                        None => parse_index(segment, items.len()),
                    };
                    match index.and_then(|i| items.get(i)) {
                        Some(value) => current = value,
                        None => return miss(),
                    }
                }
                _ => return miss(),
            }
        }

        current.clone()
    }

    fn resolve_config(&self, path: &str) -> Result<Value, TemplateError> {
        let variables = self.scope.variables.ok_or_else(|| {
            TemplateError::ResolutionError(
                "this parsing context has no event configuration".to_string(),
            )
        })?;

        let name = path.strip_prefix("config.").unwrap_or(path);
        let Some(source) = variables.lookup(name) else {
            tracing::debug!(name, "config variable not found");
            return Ok(Value::Null);
        };

        let rendered = self.renderer.render_source(&source, &self.scope.nested())?;
        Ok(rendered.map_or(Value::Null, Value::String))
    }
}

fn resolve_key(path: &str, bindings: &Bindings) -> Result<Value, TemplateError> {
    if bindings.is_empty() {
        return Err(TemplateError::ResolutionError(
            "cannot reference a for-loop key in this context".to_string(),
        ));
    }
    let name = path.strip_prefix("key.").unwrap_or(path);
    Ok(bindings.get(name).map_or(Value::Null, LoopKey::to_value))
}

/// Parses a sequence index; negative indices count back from the end.
fn parse_index(segment: &str, len: usize) -> Option<usize> {
    let index: i64 = segment.parse().ok()?;
    if index >= 0 {
        usize::try_from(index).ok()
    } else {
        len.checked_sub(usize::try_from(index.unsigned_abs()).ok()?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use serde_json::json;

    /// Renders every config source as itself, uppercased, to observe nesting.
    struct EchoRenderer;

    impl SourceRenderer for EchoRenderer {
        fn render_source(
            &self,
            source: &str,
            scope: &Scope<'_>,
        ) -> Result<Option<String>, TemplateError> {
            if source == "too-deep" {
                return Err(TemplateError::RecursionLimit(scope.depth));
            }
            Ok(Some(format!("{}@{}", source.to_uppercase(), scope.depth)))
        }
    }

    fn payload() -> Value {
        Value::from(json!({
            "a": {"b": "Foo", "n": 0, "flag": true},
            "list": ["x", "y", "z"],
            "people": [{"name": "ann"}, {"name": "bob"}],
            "m": {"k1": "v1", "k2": "v2"},
            "nothing": null
        }))
    }

    fn bindings(pairs: &[(&str, LoopKey)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn text(resolver: &Resolver<'_>, path: &str, b: &Bindings) -> String {
        resolver.resolve(path, b, true).unwrap().to_text()
    }

    #[test]
    fn test_data_paths() {
        let payload = payload();
        let resolver = Resolver::new(Scope::new(&payload, None), &EchoRenderer);
        let none = Bindings::new();

        assert_eq!(text(&resolver, "data.a.b", &none), "Foo");
        assert_eq!(text(&resolver, "data.a.n", &none), "0");
        assert_eq!(text(&resolver, "data.a.flag", &none), "true");
        assert_eq!(text(&resolver, "data.list.1", &none), "y");
        assert_eq!(text(&resolver, "data.list.-1", &none), "z");
        assert_eq!(text(&resolver, "data.list.length", &none), "3");
        assert_eq!(text(&resolver, "data.people.0.name", &none), "ann");
        assert_eq!(text(&resolver, "data.nothing", &none), "");
        assert_eq!(text(&resolver, "data.list", &none), r#"["x", "y", "z"]"#);
    }

    #[test]
    fn test_data_misses_are_empty() {
        let payload = payload();
        let resolver = Resolver::new(Scope::new(&payload, None), &EchoRenderer);
        let none = Bindings::new();

        for path in [
            "data.x.y",
            "data.a.b.c",
            "data.list.9",
            "data.list.-4",
            "data.list.word",
            "data.list.length.x",
            "data.nothing.deeper",
        ] {
            assert_eq!(
                resolver.resolve(path, &none, false).unwrap(),
                Value::from(""),
                "{path}"
            );
        }
    }

    #[test]
    fn test_data_with_loop_bindings() {
        let payload = payload();
        let resolver = Resolver::new(Scope::new(&payload, None), &EchoRenderer);

        let b = bindings(&[("i", LoopKey::Index(1)), ("k", LoopKey::Key("k2".into()))]);
        assert_eq!(text(&resolver, "data.people.i.name", &b), "bob");
        assert_eq!(text(&resolver, "data.m.k", &b), "v2");
        // An index binding cannot select a map entry, nor a key binding a list item.
        assert_eq!(text(&resolver, "data.m.i", &b), "");
        assert_eq!(text(&resolver, "data.list.k", &b), "");
    }

    #[test]
    fn test_real_map_key_beats_loop_binding() {
        let payload = Value::from(json!({"m": {"i": "literal", "a": "bound"}}));
        let resolver = Resolver::new(Scope::new(&payload, None), &EchoRenderer);
        let b = bindings(&[("i", LoopKey::Key("a".into()))]);
        assert_eq!(text(&resolver, "data.m.i", &b), "literal");
    }

    #[test]
    fn test_length_beats_loop_binding_on_sequences() {
        let payload = Value::from(json!({"l": [1, 2]}));
        let resolver = Resolver::new(Scope::new(&payload, None), &EchoRenderer);
        let b = bindings(&[("length", LoopKey::Index(0))]);
        assert_eq!(text(&resolver, "data.l.length", &b), "2");
    }

    #[test]
    fn test_raw_values_are_not_stringified() {
        let payload = payload();
        let resolver = Resolver::new(Scope::new(&payload, None), &EchoRenderer);
        let value = resolver.resolve("data.list", &Bindings::new(), false).unwrap();
        assert!(matches!(value, Value::Sequence(ref items) if items.len() == 3));
        assert_eq!(
            resolver.resolve("data.nothing", &Bindings::new(), false).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_config_without_table_is_hard_error() {
        let payload = payload();
        let resolver = Resolver::new(Scope::new(&payload, None), &EchoRenderer);
        let err = resolver.resolve("config.x", &Bindings::new(), true).unwrap_err();
        assert!(matches!(err, TemplateError::ResolutionError(_)));
    }

    #[test]
    fn test_config_renders_nested_source() {
        let payload = payload();
        let mut table = HashMap::new();
        table.insert("greeting".to_string(), "hello".to_string());
        let resolver = Resolver::new(Scope::new(&payload, Some(&table)), &EchoRenderer);
        let none = Bindings::new();

        assert_eq!(text(&resolver, "config.greeting", &none), "HELLO@1");
        assert_eq!(text(&resolver, "config.missing", &none), "");
        assert_eq!(resolver.resolve("config.missing", &none, false).unwrap(), Value::Null);
    }

    #[test]
    fn test_config_fatal_error_propagates() {
        let payload = payload();
        let mut table = HashMap::new();
        table.insert("loop".to_string(), "too-deep".to_string());
        let resolver = Resolver::new(Scope::new(&payload, Some(&table)), &EchoRenderer);
        let err = resolver.resolve("config.loop", &Bindings::new(), true).unwrap_err();
        assert!(matches!(err, TemplateError::RecursionLimit(1)));
    }

    #[test]
    fn test_key_references() {
        let payload = payload();
        let resolver = Resolver::new(Scope::new(&payload, None), &EchoRenderer);

        let err = resolver.resolve("key.i", &Bindings::new(), true).unwrap_err();
        assert!(matches!(err, TemplateError::ResolutionError(_)));

        let b = bindings(&[("i", LoopKey::Index(0)), ("k", LoopKey::Key("k1".into()))]);
        assert_eq!(resolver.resolve("key.i", &b, false).unwrap(), Value::from(0_usize));
        assert_eq!(text(&resolver, "key.k", &b), "k1");
        assert_eq!(resolver.resolve("key.z", &b, false).unwrap(), Value::Null);
        assert_eq!(text(&resolver, "key.z", &b), "");
    }

    #[test]
    fn test_env_root_is_unsupported() {
        let payload = payload();
        let resolver = Resolver::new(Scope::new(&payload, None), &EchoRenderer);
        assert!(resolver.resolve("env.HOME", &Bindings::new(), true).is_err());
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("0", 3), Some(0));
        assert_eq!(parse_index("5", 3), Some(5));
        assert_eq!(parse_index("-1", 3), Some(2));
        assert_eq!(parse_index("-3", 3), Some(0));
        assert_eq!(parse_index("-4", 3), None);
        assert_eq!(parse_index("x", 3), None);
    }
}
