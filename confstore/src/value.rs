//! Dynamic value model shared by decoders and storages.
//!
//! Decoders produce [`Value`] trees (re-exported from `serde_json`), and every
//! storage wraps either one such tree or a flat set of scalar entries.

use std::fmt;

pub use serde_json::{Map, Number, Value};

/// Shape of a dynamic value, used when reporting conversion failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ValueKind {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool,
    /// A number without a fractional part.
    Integer,
    /// A number with a fractional part or exponent.
    Float,
    /// A string.
    String,
    /// An ordered list.
    List,
    /// A string-keyed mapping.
    Map,
}

impl ValueKind {
    /// Classify `value`.
    ///
    /// # Examples
    ///
    /// ```
    /// use confstore::ValueKind;
    /// use serde_json::json;
    /// assert_eq!(ValueKind::of(&json!(1)), ValueKind::Integer);
    /// assert_eq!(ValueKind::of(&json!(1.5)), ValueKind::Float);
    /// assert_eq!(ValueKind::of(&json!({"a": 1})), ValueKind::Map);
    /// ```
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) => {
                if n.is_f64() {
                    Self::Float
                } else {
                    Self::Integer
                }
            }
            Value::String(_) => Self::String,
            Value::Array(_) => Self::List,
            Value::Object(_) => Self::Map,
        }
    }

    /// Lower-case name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::List => "list",
            Self::Map => "map",
        }
    }

    /// Whether the kind is a scalar (neither list nor map).
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        !matches!(self, Self::List | Self::Map)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse `text` as a JSON container when it looks like one.
///
/// Strings starting with `{` or `[` (after trimming) are treated as embedded
/// structured data, mirroring how CSV-aware environment providers leave JSON
/// untouched. Returns `None` for any other text or when parsing fails.
pub(crate) fn parse_embedded(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if !matches!(trimmed.chars().next(), Some('[' | '{')) {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::trace!(error = %err, "string resembles JSON but did not parse");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(null), ValueKind::Null)]
    #[case(json!(true), ValueKind::Bool)]
    #[case(json!(-3), ValueKind::Integer)]
    #[case(json!(0.25), ValueKind::Float)]
    #[case(json!("x"), ValueKind::String)]
    #[case(json!([1]), ValueKind::List)]
    #[case(json!({}), ValueKind::Map)]
    fn classifies_values(#[case] value: Value, #[case] expected: ValueKind) {
        assert_eq!(ValueKind::of(&value), expected);
    }

    #[rstest]
    #[case(" {\"a\": 1}", Some(json!({"a": 1})))]
    #[case("[1, 2]", Some(json!([1, 2])))]
    #[case("[broken", None)]
    #[case("plain", None)]
    fn parses_embedded_json(#[case] text: &str, #[case] expected: Option<Value>) {
        assert_eq!(parse_embedded(text), expected);
    }
}
