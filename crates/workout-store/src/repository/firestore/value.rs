//! Firestore value codec
//!
//! Converts between plain JSON and Firestore's typed REST representation
//! (`{"stringValue": "..."}`, `{"integerValue": "42"}`, ...).
//!
//! Types with no plain JSON form (timestamps, references, bytes, geo points,
//! non-finite doubles) decode to their single-key wrapper, e.g.
//! `{"timestampValue": "2024-10-01T12:00:00Z"}`, and encode back unchanged.

use serde_json::{json, Map, Number, Value};

use crate::domain::{DomainError, DomainResult};

/// Value kinds kept in their typed wrapper after decoding
const KEPT_TYPED: [&str; 4] = ["timestampValue", "referenceValue", "bytesValue", "geoPointValue"];

pub fn encode(value: &Value) -> Value {
    if let Some(typed) = kept_typed(value) {
        return typed.clone();
    }
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            // Integers above i64::MAX do not fit Firestore's int64 either
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) if items.is_empty() => json!({ "arrayValue": {} }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode(value)))
        .collect()
}

pub fn decode(value: &Value) -> DomainResult<Value> {
    let (kind, inner) = value
        .as_object()
        .and_then(|obj| obj.iter().next())
        .ok_or_else(|| DomainError::Decode(format!("not a Firestore value: {}", value)))?;

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| bad_value(kind, inner)),
        "integerValue" => {
            // int64 travels as a JSON string
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                other => other.as_i64(),
            };
            parsed.map(Value::from).ok_or_else(|| bad_value(kind, inner))
        }
        "doubleValue" => match inner {
            Value::Number(n) => Ok(Value::Number(n.clone())),
            // "NaN" / "Infinity" have no JSON number form
            Value::String(_) => Ok(wrap(kind, inner)),
            other => other
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| bad_value(kind, inner)),
        },
        "stringValue" => inner
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| bad_value(kind, inner)),
        "timestampValue" | "referenceValue" | "bytesValue" if inner.is_string() => Ok(wrap(kind, inner)),
        "geoPointValue" if inner.is_object() => Ok(wrap(kind, inner)),
        "timestampValue" | "referenceValue" | "bytesValue" | "geoPointValue" => Err(bad_value(kind, inner)),
        "arrayValue" => {
            let items = match inner.get("values") {
                Some(Value::Array(values)) => values.iter().map(decode).collect::<DomainResult<Vec<_>>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(items))
        }
        "mapValue" => {
            let fields = match inner.get("fields") {
                Some(Value::Object(fields)) => decode_fields(fields)?,
                _ => Map::new(),
            };
            Ok(Value::Object(fields))
        }
        other => Err(DomainError::Decode(format!("unsupported Firestore value type `{}`", other))),
    }
}

pub fn decode_fields(fields: &Map<String, Value>) -> DomainResult<Map<String, Value>> {
    fields
        .iter()
        .map(|(name, value)| Ok((name.clone(), decode(value)?)))
        .collect()
}

fn wrap(kind: &str, inner: &Value) -> Value {
    let mut typed = Map::new();
    typed.insert(kind.to_string(), inner.clone());
    Value::Object(typed)
}

/// A decoded wrapper that must go back to Firestore as-is
fn kept_typed(value: &Value) -> Option<&Value> {
    let map = value.as_object().filter(|map| map.len() == 1)?;
    let (kind, inner) = map.iter().next()?;
    let kept = match kind.as_str() {
        "doubleValue" => inner.is_string(),
        other => KEPT_TYPED.contains(&other),
    };
    kept.then_some(value)
}

fn bad_value(kind: &str, inner: &Value) -> DomainError {
    DomainError::Decode(format!("malformed {}: {}", kind, inner))
}
