//! # Payload Validation
//!
//! Each operation declares an ordered schema of top-level fields. Required
//! fields with the wrong JSON type are collected into one
//! [`AppError::Validation`]; optional ones are silently replaced by their
//! default so the typed request always deserialises.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, Result};

/// The JSON type a field is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Number => value.is_number(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }

    /// The value used when an optional field is missing or mistyped.
    fn default_value(self) -> Value {
        match self {
            FieldKind::String => Value::String(String::new()),
            FieldKind::Number => Value::from(0),
            FieldKind::Boolean => Value::Bool(false),
            FieldKind::Array => Value::Array(Vec::new()),
            FieldKind::Object => Value::Object(Default::default()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false }
    }
}

pub type FieldSchema = [FieldSpec];

/// Type-checks `payload` against `schema`, filling optional defaults in place.
///
/// A payload that is not a JSON object is treated as `{}`.
pub fn validate_fields(payload: &mut Value, schema: &FieldSchema) -> Result<()> {
    if !payload.is_object() {
        *payload = Value::Object(Default::default());
    }
    let Some(fields) = payload.as_object_mut() else {
        return Err(AppError::store("payload is not an object"));
    };

    let mut missing = Vec::new();
    for spec in schema {
        let ok = fields.get(spec.name).is_some_and(|v| spec.kind.matches(v));
        if ok {
            continue;
        }
        if spec.required {
            missing.push(spec.name.to_string());
        } else {
            fields.insert(spec.name.to_string(), spec.kind.default_value());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(missing))
    }
}

/// Validates and then deserialises into the operation's request type.
pub fn parse_request<T: DeserializeOwned>(mut payload: Value, schema: &FieldSchema) -> Result<T> {
    validate_fields(&mut payload, schema)?;
    Ok(serde_json::from_value(payload)?)
}
