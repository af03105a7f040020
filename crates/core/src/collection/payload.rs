//! Decoding of untyped request bodies into entities.
//!
//! Unknown keys are dropped by deserialization; reserved envelope keys are
//! stripped first so clients may send back what they received.

use serde_json::{Map, Value};

use super::entity::Entity;
use crate::document::validate::slugify;
use crate::document::{DocumentId, ValidationError};

const RESERVED_KEYS: [&str; 4] = ["_id", "createdAt", "updatedAt", "__v"];

pub type Payload = Map<String, Value>;

fn strip_reserved(payload: &mut Payload) {
    for key in RESERVED_KEYS {
        payload.remove(key);
    }
}

/// Decode and validate a complete entity.
pub fn decode<T: Entity>(mut payload: Payload) -> Result<T, ValidationError> {
    strip_reserved(&mut payload);
    let body: T = serde_json::from_value(Value::Object(payload))?;
    body.validate()?;
    Ok(body)
}

/// Apply a partial payload over an existing entity, then decode and
/// validate the result.
pub fn merge<T: Entity>(current: &T, mut patch: Payload) -> Result<T, ValidationError> {
    let mut base = match serde_json::to_value(current)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    strip_reserved(&mut patch);
    base.extend(patch);
    decode(base)
}

/// Read an identifier field. `null` counts as absent.
pub fn id_field(payload: &Payload, key: &'static str) -> Result<Option<DocumentId>, ValidationError> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => DocumentId::parse(raw)
            .map(Some)
            .ok_or(ValidationError::Required(vec![key])),
        Some(_) => Err(ValidationError::invalid(key, "must be a string identifier")),
    }
}

/// Read an explicit `order`. `null` counts as absent.
pub fn explicit_order(payload: &Payload) -> Result<Option<i64>, ValidationError> {
    match payload.get("order") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| ValidationError::invalid("order", "must be an integer")),
    }
}

/// Remove a nested array of objects, such as a form's `fields`.
pub fn take_objects(
    payload: &mut Payload,
    key: &'static str,
) -> Result<Option<Vec<Payload>>, ValidationError> {
    match payload.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(ValidationError::invalid(key, "must be an array of objects")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ValidationError::invalid(key, "must be an array of objects")),
    }
}

/// Normalise `slug` before decoding. An explicit slug is slugified and a
/// blank one is derived from the `source` field. A missing slug is derived
/// on create (`current` is `None`) and left as stored on update, where
/// `current` is the stored value of `source`.
pub fn normalise_slug(payload: &mut Payload, source: &str, current: Option<&str>) {
    let derived = |payload: &Payload| {
        let text = payload
            .get(source)
            .and_then(Value::as_str)
            .or(current)
            .unwrap_or_default();
        slugify(text)
    };
    let slug = match payload.get("slug") {
        Some(Value::String(raw)) if !raw.trim().is_empty() => slugify(raw),
        Some(Value::String(_) | Value::Null) => derived(payload),
        None if current.is_none() => derived(payload),
        _ => return,
    };
    payload.insert("slug".to_string(), Value::String(slug));
}
