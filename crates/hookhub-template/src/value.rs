//! The structured payload value model.
//!
//! [`Value`] is the tagged variant every payload is converted into before a
//! template is evaluated, and the type the symbol resolver walks one path
//! segment at a time. Maps keep their insertion order, which is also the
//! iteration order of `for` loops over them.

use std::fmt;
use std::io;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::ser::Formatter;

/// A read-only payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer or floating point number.
    Number(serde_json::Number),
    /// A string.
    String(String),
    /// An index-ordered sequence.
    Sequence(Vec<Value>),
    /// A string-keyed map in insertion order.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// Returns `true` if this value counts as true in a conditional.
    ///
    /// - `Null` is false
    /// - `Bool` is its own value
    /// - numbers are false only when zero
    /// - strings, sequences, and maps are false only when empty
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Self::String(s) => !s.is_empty(),
            Self::Sequence(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
        }
    }

    /// Converts this value to its output text.
    ///
    /// `Null` becomes the empty string and strings are emitted as-is. Every
    /// other value is serialized as JSON with `", "` and `": "` separators and
    /// non-ASCII characters escaped as `\uXXXX`.
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::String(s) => s.clone(),
            other => {
                let mut out = Vec::new();
                let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedAsciiFormatter);
                if other.serialize(&mut ser).is_err() {
                    return String::new();
                }
                String::from_utf8(out).unwrap_or_default()
            }
        }
    }

    /// A short name for the variant, used in diagnostics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Map(_) => "map",
        }
    }

    /// Returns the string contents if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// JSON output with spaced separators and ASCII-only strings.
struct SpacedAsciiFormatter;

impl Formatter for SpacedAsciiFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0_u16; 2];
        let mut bytes = [0_u8; 4];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(c.encode_utf8(&mut bytes).as_bytes())?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}

// -- From implementations --

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Number(i.into())
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Self::Number((i as u64).into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(arr) => {
                Self::Sequence(arr.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness_table() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(false).is_truthy());
        assert!(Value::from(true).is_truthy());
        assert!(!Value::from(0_i64).is_truthy());
        assert!(!Value::from(json!(0.0)).is_truthy());
        assert!(Value::from(json!(-1)).is_truthy());
        assert!(Value::from(json!(0.5)).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("0").is_truthy());
        assert!(!Value::from(json!([])).is_truthy());
        assert!(Value::from(json!([0])).is_truthy());
        assert!(!Value::from(json!({})).is_truthy());
        assert!(Value::from(json!({"a": null})).is_truthy());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Null.to_text(), "");
        assert_eq!(Value::from("plain").to_text(), "plain");
        assert_eq!(Value::from(true).to_text(), "true");
        assert_eq!(Value::from(42_i64).to_text(), "42");
        assert_eq!(Value::from(json!(1.5)).to_text(), "1.5");
        assert_eq!(Value::from(json!([1, "a", null])).to_text(), r#"[1, "a", null]"#);
        assert_eq!(
            Value::from(json!({"k": [1, true], "e": {}})).to_text(),
            r#"{"k": [1, true], "e": {}}"#
        );
    }

    #[test]
    fn test_to_text_escapes_non_ascii() {
        assert_eq!(Value::from(json!(["é"])).to_text(), r#"["\u00e9"]"#);
        assert_eq!(Value::from(json!({"✓": "😀"})).to_text(), r#"{"\u2713": "\ud83d\ude00"}"#);
        assert_eq!(Value::from(json!(["a\nb\"c"])).to_text(), r#"["a\nb\"c"]"#);
        // Bare strings are emitted untouched.
        assert_eq!(Value::from("é").to_text(), "é");
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let value = Value::from(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let Value::Map(map) = &value else {
            panic!("expected a map");
        };
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(value.to_text(), r#"{"zeta": 1, "alpha": 2, "mid": 3}"#);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::from(json!({})).kind(), "map");
        assert_eq!(Value::from(json!([])).kind(), "sequence");
    }
}
