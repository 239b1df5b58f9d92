//! Scalar destinations: booleans, numbers, strings, paths, and raw values.

use std::path::PathBuf;
use std::str::FromStr;

use super::{Bind, BindContext, Shape};
use crate::error::ConversionError;
use crate::value::{Number, Value};

/// Text of `number` when it denotes an integer; integral floats such as
/// `5432.0` qualify.
fn integer_text(number: &Number) -> Option<String> {
    match number.as_f64().filter(|_| number.is_f64()) {
        Some(float) => (float.fract().abs() < f64::EPSILON).then(|| format!("{float}")),
        None => Some(number.to_string()),
    }
}

fn parse_scalar<T>(text: &str, value: &Value, ctx: &BindContext<'_>, shape: Shape) -> Result<T, ConversionError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text.trim()
        .parse::<T>()
        .map_err(|err| ctx.mismatch(value, shape).with_detail(err.to_string()))
}

macro_rules! bind_integer {
    ($($ty:ty),* $(,)?) => {$(
        impl Bind for $ty {
            fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
                let shape = Self::shape();
                *self = match value {
                    Value::Null => return Ok(()),
                    Value::Number(number) => {
                        let text = integer_text(number).ok_or_else(|| {
                            ctx.mismatch(value, shape).with_detail("value has a fractional part")
                        })?;
                        parse_scalar(&text, value, ctx, shape)?
                    }
                    Value::String(text) => parse_scalar(text, value, ctx, shape)?,
                    _ => return Err(ctx.mismatch(value, shape)),
                };
                Ok(())
            }

            fn shape() -> Shape {
                Shape::Scalar(stringify!($ty))
            }
        }
    )*};
}

bind_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! bind_float {
    ($($ty:ty),* $(,)?) => {$(
        impl Bind for $ty {
            fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
                let shape = Self::shape();
                *self = match value {
                    Value::Null => return Ok(()),
                    Value::Number(number) => parse_scalar(&number.to_string(), value, ctx, shape)?,
                    Value::String(text) => parse_scalar(text, value, ctx, shape)?,
                    _ => return Err(ctx.mismatch(value, shape)),
                };
                Ok(())
            }

            fn shape() -> Shape {
                Shape::Scalar(stringify!($ty))
            }
        }
    )*};
}

bind_float!(f32, f64);

impl Bind for bool {
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        *self = match value {
            Value::Null => return Ok(()),
            Value::Bool(flag) => *flag,
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => {
                    return Err(ctx
                        .mismatch(value, Self::shape())
                        .with_detail(format!("`{text}` is not a boolean")));
                }
            },
            _ => return Err(ctx.mismatch(value, Self::shape())),
        };
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Scalar("bool")
    }
}

impl Bind for String {
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        *self = match value {
            Value::Null => return Ok(()),
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Array(_) | Value::Object(_) => return Err(ctx.mismatch(value, Self::shape())),
        };
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Scalar("String")
    }
}

impl Bind for PathBuf {
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        match value {
            Value::Null => {}
            Value::String(text) => *self = Self::from(text),
            _ => return Err(ctx.mismatch(value, Self::shape())),
        }
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Scalar("PathBuf")
    }
}

/// Untyped destinations accept anything; maps merge recursively and every
/// other shape replaces the current value.
impl Bind for Value {
    fn bind(&mut self, value: &Value, _ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        if !value.is_null() {
            merge_value(self, value.clone());
        }
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Dynamic
    }
}

/// Overlay `layer` onto `target`: objects merge key by key, anything else
/// replaces `target` wholesale.
///
/// # Examples
///
/// ```rust
/// use confstore::bind::merge_value;
/// use serde_json::json;
///
/// let mut acc = json!({"a": 1, "b": {"x": 1}});
/// merge_value(&mut acc, json!({"b": {"y": 2}, "c": 3}));
/// assert_eq!(acc, json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3}));
/// ```
pub fn merge_value(target: &mut Value, layer: Value) {
    match layer {
        Value::Object(map) => {
            if !target.is_object() {
                *target = Value::Object(crate::value::Map::new());
            }
            let Some(target_map) = target.as_object_mut() else {
                return;
            };
            for (key, value) in map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        _ => *target = layer,
    }
}
