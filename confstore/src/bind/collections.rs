//! Container destinations: `Option<T>`, `Vec<T>`, and string-keyed maps.

use std::borrow::Cow;
use std::collections::btree_map::{self, BTreeMap};
use std::collections::hash_map::{self, HashMap};
use std::fmt::Display;
use std::hash::{BuildHasher, Hash};
use std::str::FromStr;

use super::{Bind, BindContext, Shape, fresh, record_fields};
use crate::error::ConversionError;
use crate::value::{Map, Value, ValueKind, parse_embedded};

/// A present key always materialises a fresh value, even when it is `null`
/// or an empty map, replacing whatever the slot held; an absent key never
/// reaches this impl.
impl<T: Bind + Default> Bind for Option<T> {
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        let mut slot: T = fresh(ctx)?;
        slot.bind(value, ctx)?;
        *self = Some(slot);
        Ok(())
    }

    fn apply_defaults(&mut self, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        if self.is_none() && T::has_defaults() {
            let mut slot = T::default();
            slot.apply_defaults(ctx)?;
            *self = Some(slot);
        }
        Ok(())
    }

    fn has_defaults() -> bool {
        T::has_defaults()
    }

    fn shape() -> Shape {
        Shape::Optional
    }

    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        self.as_ref().map_or(Ok(()), Bind::validate)
    }
}

/// Elements of a map whose keys are all decimal indices, ordered by index.
/// Gaps become `null`.
fn indexed_entries(fields: &Map<String, Value>) -> Option<Vec<Value>> {
    let mut indexed = fields
        .iter()
        .map(|(key, value)| key.parse::<usize>().ok().map(|index| (index, value)))
        .collect::<Option<Vec<_>>>()?;
    indexed.sort_by_key(|(index, _)| *index);
    let len = indexed.last().map_or(0, |(index, _)| index.saturating_add(1));
    let mut items = vec![Value::Null; len];
    for (index, value) in indexed {
        if let Some(slot) = items.get_mut(index) {
            *slot = value.clone();
        }
    }
    Some(items)
}

/// Elements of a list written as text: embedded JSON arrays are parsed,
/// anything else is split on commas.
fn split_list(text: &str) -> Vec<Value> {
    if let Some(Value::Array(items)) = parse_embedded(text) {
        return items;
    }
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(',')
        .map(|item| Value::String(item.trim().to_owned()))
        .collect()
}

/// Lists are replaced wholesale by a list of matching length.
impl<T: Bind + Default> Bind for Vec<T> {
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        let items: Cow<'_, [Value]> = match value {
            Value::Null => return Ok(()),
            Value::Array(items) => Cow::Borrowed(items.as_slice()),
            Value::Object(fields) => Cow::Owned(
                indexed_entries(fields).ok_or_else(|| ctx.mismatch(value, Self::shape()))?,
            ),
            Value::String(text) => Cow::Owned(split_list(text)),
            scalar => Cow::Owned(vec![scalar.clone()]),
        };
        let mut bound = Self::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let child = ctx.index(index);
            let mut element: T = fresh(&child)?;
            element.bind(item, &child)?;
            bound.push(element);
        }
        *self = bound;
        Ok(())
    }

    fn shape() -> Shape {
        Shape::List
    }
}

fn parse_key<K>(key: &str, ctx: &BindContext<'_>) -> Result<K, ConversionError>
where
    K: FromStr,
    K::Err: Display,
{
    key.parse::<K>().map_err(|err| {
        ConversionError::new(ValueKind::String, "map key", ctx.path()).with_detail(err.to_string())
    })
}

fn bound_entry<V: Bind + Default>(item: &Value, ctx: &BindContext<'_>) -> Result<V, ConversionError> {
    let mut entry: V = fresh(ctx)?;
    entry.bind(item, ctx)?;
    Ok(entry)
}

/// Maps merge incrementally: new keys are added, existing entries are
/// overlaid, and keys missing from the source survive.
impl<K, V, S> Bind for HashMap<K, V, S>
where
    K: FromStr + Eq + Hash,
    K::Err: Display,
    V: Bind + Default,
    S: BuildHasher,
{
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        let Some(fields) = record_fields(value, ctx, Self::shape())? else {
            return Ok(());
        };
        for (name, item) in fields.iter() {
            let child = ctx.member(name);
            match self.entry(parse_key(name, &child)?) {
                hash_map::Entry::Occupied(mut slot) => slot.get_mut().bind(item, &child)?,
                hash_map::Entry::Vacant(slot) => {
                    slot.insert(bound_entry(item, &child)?);
                }
            }
        }
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Map
    }
}

impl<K, V> Bind for BTreeMap<K, V>
where
    K: FromStr + Ord,
    K::Err: Display,
    V: Bind + Default,
{
    fn bind(&mut self, value: &Value, ctx: &BindContext<'_>) -> Result<(), ConversionError> {
        let Some(fields) = record_fields(value, ctx, Self::shape())? else {
            return Ok(());
        };
        for (name, item) in fields.iter() {
            let child = ctx.member(name);
            match self.entry(parse_key(name, &child)?) {
                btree_map::Entry::Occupied(mut slot) => slot.get_mut().bind(item, &child)?,
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(bound_entry(item, &child)?);
                }
            }
        }
        Ok(())
    }

    fn shape() -> Shape {
        Shape::Map
    }
}
