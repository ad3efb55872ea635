//! Collection schemas and schema-directed typing.
//!
//! JSON has no date or coordinate type, so a document arriving as JSON
//! carries those fields as strings and `{lat, lon}` objects. Applying the
//! collection schema turns them into [`Value::DateTime`] and
//! [`Value::GeoPoint`], validating them and normalizing datetimes to UTC.
//! Typed values fingerprint like their JSON rendering, so typing never
//! changes the fingerprint of an already-normalized document.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Document, GeoPoint, Value};

/// Declared type of a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Full-text field.
    Text,
    /// Numeric field.
    Number,
    /// Boolean field.
    Boolean,
    /// RFC 3339 timestamp.
    Datetime,
    /// Latitude/longitude pair.
    Geopoint,
}

/// Mapping entry for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the node stores this field encrypted.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub encrypted: bool,
}

impl FieldMapping {
    /// Plain (unencrypted) mapping of the given type.
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            encrypted: false,
        }
    }

    /// Mark the field as stored encrypted.
    pub fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }
}

/// Collection name plus its field mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    /// Collection name.
    pub collection: String,
    /// Field name to mapping.
    pub fields: BTreeMap<String, FieldMapping>,
}

/// Errors raised while applying a schema.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A declared field holds a value that cannot be read as its type.
    #[error("field '{field}' is not a valid {expected:?}")]
    TypeMismatch {
        /// Field name.
        field: String,
        /// Declared type.
        expected: FieldType,
    },
    /// A datetime field holds text that is not RFC 3339.
    #[error("field '{field}' has invalid datetime '{value}'")]
    InvalidDateTime {
        /// Field name.
        field: String,
        /// Offending text.
        value: String,
    },
}

impl CollectionSchema {
    /// Create an empty schema for a collection.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field declaration.
    pub fn field(mut self, name: impl Into<String>, mapping: FieldMapping) -> Self {
        self.fields.insert(name.into(), mapping);
        self
    }

    /// Coerce declared top-level fields of `document` to their types.
    ///
    /// A declared type applies to a scalar value or to every element of a
    /// list value. Undeclared fields pass through unchanged.
    pub fn apply(&self, document: &Document) -> Result<Document, SchemaError> {
        document
            .iter()
            .map(|(name, value)| {
                let typed = match self.fields.get(name) {
                    Some(mapping) => coerce_field(name, value, mapping.field_type)?,
                    None => value.clone(),
                };
                Ok((name.clone(), typed))
            })
            .collect()
    }
}

fn coerce_field(field: &str, value: &Value, expected: FieldType) -> Result<Value, SchemaError> {
    match value {
        // A geopoint is itself a map, so only lists fan out.
        Value::List(items) => items
            .iter()
            .map(|item| coerce_scalar(field, item, expected))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        _ => coerce_scalar(field, value, expected),
    }
}

fn coerce_scalar(field: &str, value: &Value, expected: FieldType) -> Result<Value, SchemaError> {
    let mismatch = || SchemaError::TypeMismatch {
        field: field.to_string(),
        expected,
    };

    match (expected, value) {
        (FieldType::Text, Value::Text(_))
        | (FieldType::Number, Value::Number(_))
        | (FieldType::Boolean, Value::Boolean(_))
        | (FieldType::Datetime, Value::DateTime(_))
        | (FieldType::Geopoint, Value::GeoPoint(_)) => Ok(value.clone()),
        (FieldType::Datetime, Value::Text(text)) => DateTime::parse_from_rfc3339(text)
            .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| SchemaError::InvalidDateTime {
                field: field.to_string(),
                value: text.clone(),
            }),
        (FieldType::Geopoint, Value::Nested(doc)) => geopoint_from(doc).ok_or_else(mismatch),
        _ => Err(mismatch()),
    }
}

fn geopoint_from(doc: &Document) -> Option<Value> {
    if doc.len() != 2 {
        return None;
    }
    match (doc.get("lat"), doc.get("lon")) {
        (Some(Value::Number(lat)), Some(Value::Number(lon))) => {
            Some(Value::GeoPoint(GeoPoint { lat: *lat, lon: *lon }))
        }
        _ => None,
    }
}
