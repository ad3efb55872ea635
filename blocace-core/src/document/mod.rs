//! Document model, canonical encoding and collection schemas.

mod canonical;
mod schema;
mod value;

pub use canonical::{canonicalize, fingerprint, Fingerprint, DOMAIN_TAG};
pub(crate) use canonical::parse_hash;
pub use schema::{CollectionSchema, FieldMapping, FieldType, SchemaError};
pub use value::{Document, GeoPoint, Value};

use thiserror::Error;

/// Errors raised while building or rendering documents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Top-level JSON value is not an object.
    #[error("document must be a JSON object")]
    NotAnObject,
    /// A `null` appeared in the tree.
    #[error("null value at '{path}'")]
    Null {
        /// Dotted path to the null.
        path: String,
    },
    /// A JSON number has no f64 representation.
    #[error("number out of range at '{path}'")]
    NumberOutOfRange {
        /// Dotted path to the number.
        path: String,
    },
    /// The document cannot be rendered as JSON.
    #[error("cannot render document: {0}")]
    Render(String),
    /// Text is not a 32-byte hex digest.
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
}
