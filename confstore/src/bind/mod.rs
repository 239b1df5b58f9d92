//! Structural coercion of dynamic values into typed destinations.
//!
//! Every destination shape implements [`Bind`]: scalars, `Option<T>`,
//! `Vec<T>`, maps, the temporal types, and records through
//! `#[derive(Bind)]`. Binding *overlays* a value onto an existing
//! destination, so replaying several sources against one destination yields
//! field-level override semantics.
//!
//! # Example
//!
//! ```rust
//! use confstore::{Bind, BindContext};
//! use serde_json::json;
//!
//! #[derive(Debug, Default, Bind)]
//! struct Database {
//!     host: String,
//!     #[config(default = 5432)]
//!     port: u16,
//! }
//!
//! let mut db = Database::default();
//! let ctx = BindContext::new(true);
//! db.apply_defaults(&ctx).expect("defaults parse");
//! db.bind(&json!({"host": "db1"}), &ctx).expect("value binds");
//! assert_eq!(db.host, "db1");
//! assert_eq!(db.port, 5432);
//! ```

use std::borrow::Cow;
use std::fmt;

use uncased::UncasedStr;

use crate::error::ConversionError;
use crate::value::{Map, Value, ValueKind, parse_embedded};

mod collections;
mod scalar;
mod temporal;

pub use scalar::merge_value;
pub use temporal::parse_duration;

/// Destination shape, used for introspection and error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Shape {
    /// A scalar such as `u16` or `String`.
    Scalar(&'static str),
    /// An untyped [`Value`].
    Dynamic,
    /// `Option<T>`.
    Optional,
    /// `Vec<T>`.
    List,
    /// A string-keyed map.
    Map,
    /// A record with named fields.
    Record(&'static str),
    /// `std::time::Duration`.
    Duration,
    /// An absolute point in time.
    Time,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(name) => f.write_str(name),
            Self::Dynamic => f.write_str("dynamic value"),
            Self::Optional => f.write_str("optional value"),
            Self::List => f.write_str("list"),
            Self::Map => f.write_str("map"),
            Self::Record(name) => write!(f, "record `{name}`"),
            Self::Duration => f.write_str("duration"),
            Self::Time => f.write_str("timestamp"),
        }
    }
}

/// A destination that dynamic configuration values can be bound into.
///
/// Implementations overlay `value` onto `self`: data absent from `value`
/// leaves the destination untouched. `null` is treated as "no data" by every
/// implementation except `Option<T>`, where a present key always materialises
/// the inner value.
pub trait Bind {
    /// Overlay `value` onto `self`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when `value` cannot be coerced into this
    /// destination's shape. The destination may be partially written.
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError>;

    /// Apply declared default values.
    ///
    /// Records reset annotated fields to their parsed default literal and
    /// recurse into the rest. Every other shape is left untouched, except
    /// `Option<T>` which allocates a `None` whose `T` carries defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] when a default literal does not parse
    /// into its field.
    fn apply_defaults(&mut self, _ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        Ok(())
    }

    /// Whether this type, or anything it contains by value, declares
    /// defaults.
    #[must_use]
    fn has_defaults() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// The destination shape.
    #[must_use]
    fn shape() -> Shape
    where
        Self: Sized;

    /// Check declared constraints after a successful bind.
    ///
    /// # Errors
    ///
    /// Returns every violated constraint as one aggregate.
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
enum Step<'a> {
    Member(&'a str),
    Index(usize),
}

/// State threaded through a bind: the defaults policy, the key separator of
/// flat sources, and the field path used in error messages.
#[derive(Clone, Copy, Debug)]
pub struct BindContext<'a> {
    defaults: bool,
    compound_separator: Option<&'a str>,
    parent: Option<&'a BindContext<'a>>,
    step: Option<Step<'a>>,
}

impl<'a> BindContext<'a> {
    /// Root context with the given defaults policy.
    #[must_use]
    pub const fn new(defaults: bool) -> Self {
        Self {
            defaults,
            compound_separator: None,
            parent: None,
            step: None,
        }
    }

    /// Enable compound key lookup: a field named `max_conns` also matches
    /// nested keys `MAX` → `CONNS` when `separator` is `_`.
    #[must_use]
    pub const fn with_compound_separator(mut self, separator: &'a str) -> Self {
        self.compound_separator = Some(separator);
        self
    }

    /// Whether default annotations apply to freshly allocated values.
    #[must_use]
    pub const fn defaults_enabled(&self) -> bool {
        self.defaults
    }

    /// Context for the record field or map entry `name`.
    #[must_use]
    pub fn member<'b>(&'b self, name: &'b str) -> BindContext<'b> {
        BindContext {
            defaults: self.defaults,
            compound_separator: self.compound_separator,
            parent: Some(self),
            step: Some(Step::Member(name)),
        }
    }

    /// Context for list element `index`.
    #[must_use]
    pub fn index(&self, index: usize) -> BindContext<'_> {
        BindContext {
            defaults: self.defaults,
            compound_separator: self.compound_separator,
            parent: Some(self),
            step: Some(Step::Index(index)),
        }
    }

    /// Dotted path from the bind root to this context.
    #[must_use]
    pub fn path(&self) -> String {
        let mut steps = Vec::new();
        let mut cursor = Some(self);
        while let Some(ctx) = cursor {
            if let Some(step) = ctx.step {
                steps.push(step);
            }
            cursor = ctx.parent;
        }
        let mut out = String::new();
        for step in steps.iter().rev() {
            match step {
                Step::Member(name) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(name);
                }
                Step::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }

    /// Conversion error for `value` failing to become `target` here.
    #[must_use]
    pub fn mismatch(&self, value: &Value, target: Shape) -> ConversionError {
        ConversionError::new(ValueKind::of(value), target.to_string(), self.path())
    }

    /// Find the source value for record key `key` in `fields`.
    ///
    /// Tries an exact match, then an ASCII case-insensitive match, then (for
    /// flat sources) a compound lookup that splits `key` on the source
    /// separator and walks nested maps.
    #[must_use]
    pub fn lookup<'v>(&self, fields: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
        find_key(fields, key).or_else(|| {
            let separator = self.compound_separator?;
            if !key.contains(separator) {
                return None;
            }
            let mut parts = key.split(separator).peekable();
            let mut current = fields;
            while let Some(part) = parts.next() {
                let found = find_key(current, part)?;
                if parts.peek().is_none() {
                    return Some(found);
                }
                current = found.as_object()?;
            }
            None
        })
    }
}

pub(crate) fn find_key<'v>(fields: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    fields.get(key).or_else(|| {
        let wanted = UncasedStr::new(key);
        fields
            .iter()
            .find(|(candidate, _)| UncasedStr::new(candidate) == wanted)
            .map(|(_, value)| value)
    })
}

/// Interpret `value` as the field map of a record or map destination.
///
/// `null` yields `Ok(None)` (nothing to bind). A string holding a JSON object
/// is parsed first.
///
/// # Errors
///
/// Returns a [`ConversionError`] for any other non-map value.
pub fn record_fields<'v>(
    value: &'v Value,
    ctx: &BindContext<'_>,
    shape: Shape,
) -> Result<Option<Cow<'v, Map<String, Value>>>, ConversionError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(fields) => Ok(Some(Cow::Borrowed(fields))),
        Value::String(text) => match parse_embedded(text) {
            Some(Value::Object(fields)) => Ok(Some(Cow::Owned(fields))),
            _ => Err(ctx.mismatch(value, shape)),
        },
        _ => Err(ctx.mismatch(value, shape)),
    }
}

/// Reset `field` to the default `literal`, parsed with the ordinary coercion
/// rules.
///
/// # Errors
///
/// Returns a [`ConversionError`] when the literal does not fit the field.
pub fn inject_default<T: Bind + Default>(
    field: &mut T,
    literal: &Value,
    ctx: &BindContext<'_>,
) -> Result<(), ConversionError> {
    let mut fresh = T::default();
    fresh.apply_defaults(ctx)?;
    fresh.bind(literal, ctx)?;
    *field = fresh;
    Ok(())
}

/// A newly allocated destination slot, with defaults applied when enabled.
pub(crate) fn fresh<T: Bind + Default>(ctx: &BindContext<'_>) -> Result<T, ConversionError> {
    let mut slot = T::default();
    if ctx.defaults_enabled() {
        slot.apply_defaults(ctx)?;
    }
    Ok(slot)
}
