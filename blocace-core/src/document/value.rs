//! Typed document values.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::DocumentError;

/// Largest integer magnitude an f64 represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

/// A single field value.
///
/// The variant set is closed so canonical encoding is total over it.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 text.
    Text(String),
    /// IEEE-754 double.
    Number(f64),
    /// Boolean flag.
    Boolean(bool),
    /// UTC instant.
    DateTime(DateTime<Utc>),
    /// Latitude/longitude pair.
    GeoPoint(GeoPoint),
    /// Ordered list of values.
    List(Vec<Value>),
    /// Nested field map.
    Nested(Document),
}

/// An ordered mapping of field name to value.
///
/// Fields are kept sorted by key, so two documents holding the same
/// key/value set compare equal whatever order they were built in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the previous value if the key existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Iterate fields in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a document from a JSON object.
    ///
    /// Strings stay text; use a collection schema to type dates and
    /// coordinates. `null` is rejected anywhere in the tree.
    pub fn from_json(value: serde_json::Value) -> Result<Self, DocumentError> {
        match value {
            serde_json::Value::Object(map) => object_to_document(map, ""),
            _ => Err(DocumentError::NotAnObject),
        }
    }

    /// Render the document as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, DocumentError> {
        serde_json::to_value(self).map_err(|e| DocumentError::Render(e.to_string()))
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            fields: iter.into_iter().collect(),
        }
    }
}

fn object_to_document(
    map: serde_json::Map<String, serde_json::Value>,
    path: &str,
) -> Result<Document, DocumentError> {
    map.into_iter()
        .map(|(key, value)| {
            let child = join_path(path, &key);
            json_to_value(value, &child).map(|v| (key, v))
        })
        .collect()
}

fn json_to_value(value: serde_json::Value, path: &str) -> Result<Value, DocumentError> {
    Ok(match value {
        serde_json::Value::Null => return Err(DocumentError::Null { path: path.to_string() }),
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().ok_or_else(|| {
            DocumentError::NumberOutOfRange { path: path.to_string() }
        })?),
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Array(items) => Value::List(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| json_to_value(item, &format!("{path}[{i}]")))
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(map) => Value::Nested(object_to_document(map, path)?),
    })
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Document::from_json(json).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Number(n) => serialize_number(*n, serializer),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::DateTime(dt) => serializer.serialize_str(&render_datetime(dt)),
            Value::GeoPoint(point) => {
                if !point.lat.is_finite() || !point.lon.is_finite() {
                    return Err(S::Error::custom("non-finite coordinate"));
                }
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("lat", &point.lat)?;
                map.serialize_entry("lon", &point.lon)?;
                map.end()
            }
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Nested(doc) => doc.serialize(serializer),
        }
    }
}

/// RFC 3339 rendering of an instant, in UTC with a `Z` suffix.
pub(super) fn render_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn serialize_number<S: Serializer>(n: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !n.is_finite() {
        return Err(S::Error::custom("non-finite number"));
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<GeoPoint> for Value {
    fn from(point: GeoPoint) -> Self {
        Value::GeoPoint(point)
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        Value::Nested(doc)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_from_json_types() {
        let doc = Document::from_json(json!({
            "name": "Carly Compton",
            "age": 28,
            "isActive": false,
            "tags": ["incididunt", "dolore"],
            "location": {"lon": 46.564666, "lat": 53.15213}
        }))
        .unwrap();

        assert_eq!(doc.get("name"), Some(&Value::Text("Carly Compton".into())));
        assert_eq!(doc.get("age"), Some(&Value::Number(28.0)));
        assert_eq!(doc.get("isActive"), Some(&Value::Boolean(false)));
        assert!(matches!(doc.get("tags"), Some(Value::List(items)) if items.len() == 2));
        assert!(matches!(doc.get("location"), Some(Value::Nested(_))));
    }

    #[test]
    fn test_from_json_rejects_null_with_path() {
        let err = Document::from_json(json!({"friends": [{"id": 0, "name": null}]})).unwrap_err();
        assert_eq!(err, DocumentError::Null { path: "friends[0].name".into() });
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert_eq!(Document::from_json(json!([1, 2])).unwrap_err(), DocumentError::NotAnObject);
    }

    #[test]
    fn test_to_json_renders_typed_values() {
        let registered = Utc.with_ymd_and_hms(2015, 9, 18, 12, 59, 51).unwrap();
        let doc = Document::new()
            .with("age", 28)
            .with("ratio", 0.5)
            .with("registered", registered)
            .with("location", GeoPoint { lat: 53.15213, lon: 46.564666 });

        assert_eq!(
            doc.to_json().unwrap(),
            json!({
                "age": 28,
                "ratio": 0.5,
                "registered": "2015-09-18T12:59:51Z",
                "location": {"lat": 53.15213, "lon": 46.564666}
            })
        );
    }

    #[test]
    fn test_to_json_rejects_nan() {
        let doc = Document::new().with("bad", f64::NAN);
        assert!(matches!(doc.to_json(), Err(DocumentError::Render(_))));
    }

    #[test]
    fn test_deserialize_through_serde() {
        let doc: Document = serde_json::from_str(r#"{"b": 1, "a": "x"}"#).unwrap();
        let keys: Vec<_> = doc.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
