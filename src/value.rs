//! Uniform access to field and dependency values.
//!
//! Validators receive values in whatever shape the caller had at hand: a
//! bare scalar, a flat key-value map from a submitted form, a JSON tree, or a
//! record loaded from the entity store. `FieldValue` wraps all of them behind
//! one case-insensitive `get`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::store::EntityRecord;

/// A field or dependency value in one of several representations.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A single value with no members (string, number, bool or null).
    Scalar(Value),
    /// A flat key-value map.
    Map(BTreeMap<String, Value>),
    /// A generic JSON tree.
    Tree(Value),
    /// A record loaded from the entity store.
    Record(EntityRecord),
}

impl FieldValue {
    /// Wrap a JSON value, choosing `Tree` for objects and arrays.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(_) | Value::Array(_) => FieldValue::Tree(value),
            other => FieldValue::Scalar(other),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Scalar(Value::String(value.into()))
    }

    /// Member lookup by key, ignoring ASCII case.
    ///
    /// Scalars have no members. Arrays in a tree accept numeric keys.
    pub fn get(&self, key: &str) -> Option<FieldValue> {
        match self {
            FieldValue::Scalar(_) => None,
            FieldValue::Map(map) => {
                lookup(|| map.iter(), key).map(|v| FieldValue::from_json(v.clone()))
            }
            FieldValue::Tree(value) => {
                tree_get(value, key).map(|v| FieldValue::from_json(v.clone()))
            }
            FieldValue::Record(record) => record_get(record, key),
        }
    }

    /// Walk a dot-separated property path with [`get`](Self::get).
    ///
    /// An empty path returns the value itself.
    pub fn get_path(&self, path: &str) -> Option<FieldValue> {
        let path = path.trim();
        if path.is_empty() {
            return Some(self.clone());
        }

        let mut current = self.clone();
        for segment in path.split('.') {
            current = current.get(segment.trim())?;
        }
        Some(current)
    }

    /// Is this JSON null (or a record field holding null)?
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Scalar(Value::Null) | FieldValue::Tree(Value::Null))
    }

    /// Emptiness as used by required-field checks.
    ///
    /// Null, blank strings, and empty maps/arrays are empty. Numeric zero is
    /// empty only when `zero_is_empty` is set.
    pub fn is_empty(&self, zero_is_empty: bool) -> bool {
        match self {
            FieldValue::Scalar(value) | FieldValue::Tree(value) => json_is_empty(value, zero_is_empty),
            FieldValue::Map(map) => map.is_empty(),
            FieldValue::Record(_) => false,
        }
    }

    /// Text form of a scalar value. Records render as their identifier.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Scalar(value) | FieldValue::Tree(value) => render_scalar(value),
            FieldValue::Map(_) => None,
            FieldValue::Record(record) => Some(record.id.to_string()),
        }
    }

    /// Numeric form; numeric strings are coerced.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Scalar(value) | FieldValue::Tree(value) => json_as_f64(value),
            _ => None,
        }
    }

    /// Interpret the value as an `(x, z)` coordinate pair.
    ///
    /// Accepts an object with `x`/`z` members, an array `[x, z]` or
    /// `[x, y, z]`, or a string `"x, z"` / `"x, y, z"`.
    pub fn as_coordinates(&self) -> Option<(f64, f64)> {
        match self {
            FieldValue::Scalar(Value::String(s)) => parse_coordinate_text(s),
            FieldValue::Tree(Value::Array(items)) => {
                let numbers: Option<Vec<f64>> = items.iter().map(json_as_f64).collect();
                coordinate_pair(&numbers?)
            }
            FieldValue::Map(_) | FieldValue::Tree(Value::Object(_)) | FieldValue::Record(_) => {
                let x = self.get("x")?.as_f64()?;
                let z = self.get("z")?.as_f64()?;
                Some((x, z))
            }
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        FieldValue::from_json(value)
    }
}

impl From<EntityRecord> for FieldValue {
    fn from(record: EntityRecord) -> Self {
        FieldValue::Record(record)
    }
}

impl From<BTreeMap<String, Value>> for FieldValue {
    fn from(map: BTreeMap<String, Value>) -> Self {
        FieldValue::Map(map)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::text(value)
    }
}

/// Render a JSON value as display text.
///
/// Strings render unquoted, numbers and booleans in their usual form, null as
/// `None`, and composite values as compact JSON.
pub fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Integral values render without a fractional part.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

pub(crate) fn json_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn json_is_empty(value: &Value, zero_is_empty: bool) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => zero_is_empty && n.as_f64() == Some(0.0),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) => false,
    }
}

fn lookup<'a, I, F>(entries: F, key: &str) -> Option<&'a Value>
where
    F: Fn() -> I,
    I: Iterator<Item = (&'a String, &'a Value)>,
{
    entries()
        .find(|(k, _)| k.as_str() == key)
        .or_else(|| entries().find(|(k, _)| k.eq_ignore_ascii_case(key)))
        .map(|(_, v)| v)
}

fn tree_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => object_get(map, key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn object_get<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    lookup(|| map.iter(), key)
}

fn record_get(record: &EntityRecord, key: &str) -> Option<FieldValue> {
    if key.eq_ignore_ascii_case("id") && record.field(key).is_none() {
        return Some(FieldValue::text(record.id.as_str()));
    }
    if let Some(value) = record.field(key) {
        return Some(FieldValue::from_json(value.clone()));
    }
    if let Some(related) = record.reference(key) {
        return Some(match related {
            Some(entity) => FieldValue::Record(entity.clone()),
            None => FieldValue::Scalar(Value::Null),
        });
    }
    record
        .collection(key)
        .map(|items| FieldValue::Tree(Value::Array(items.iter().map(record_to_json).collect())))
}

/// Flatten a record into the object shape a JSON tree would have: fields,
/// `Id` unless a field already carries it, then loaded navigations.
fn record_to_json(record: &EntityRecord) -> Value {
    let mut object: Map<String, Value> = record
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if record.field("id").is_none() {
        object.insert("Id".to_string(), Value::String(record.id.to_string()));
    }
    for (name, related) in &record.references {
        let value = related.as_deref().map_or(Value::Null, record_to_json);
        object.entry(name.clone()).or_insert(value);
    }
    for (name, items) in &record.collections {
        let value = Value::Array(items.iter().map(record_to_json).collect());
        object.entry(name.clone()).or_insert(value);
    }

    Value::Object(object)
}

fn parse_coordinate_text(text: &str) -> Option<(f64, f64)> {
    let numbers: Option<Vec<f64>> = text
        .split([',', ' ', ';'])
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f64>().ok())
        .collect();
    coordinate_pair(&numbers?)
}

fn coordinate_pair(numbers: &[f64]) -> Option<(f64, f64)> {
    match numbers {
        [x, z] => Some((*x, *z)),
        [x, _, z] => Some((*x, *z)),
        _ => None,
    }
}
