//! Canonical byte encoding and fingerprints.
//!
//! # Encoding
//!
//! All integers are big-endian. A document is the domain tag followed by
//! its field map.
//!
//! | Item     | Encoding                                               |
//! |----------|--------------------------------------------------------|
//! | Map      | `u64` count, then `u64 len ‖ key ‖ value` by key order |
//! | Text     | `0x01 ‖ u64 len ‖ utf8`                                |
//! | Number   | `0x02 ‖ f64 bits`                                      |
//! | Boolean  | `0x03 ‖ 0x00/0x01`                                     |
//! | List     | `0x06 ‖ u64 count ‖ values`                            |
//! | Nested   | `0x07 ‖ map`                                           |
//!
//! Typed values are encoded exactly as their JSON rendering reads back:
//! a DateTime is the Text of its RFC 3339 UTC form, and a GeoPoint is the
//! Nested map `{lat, lon}`. A document and `Document::from_json` of its
//! rendering therefore share one fingerprint, with or without a schema.
//!
//! Floats are normalized first: `-0.0` encodes as `+0.0` and every NaN as
//! the canonical quiet NaN.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::value::render_datetime;
use super::{Document, DocumentError, Value};
use crate::crypto::sha256;

/// Domain tag prefixed to every canonical document encoding.
pub const DOMAIN_TAG: &[u8] = b"blocace/document/v1";

const TAG_TEXT: u8 = 0x01;
const TAG_NUMBER: u8 = 0x02;
const TAG_BOOLEAN: u8 = 0x03;
// 0x04 and 0x05 are unused: typed values encode as their JSON form.
const TAG_LIST: u8 = 0x06;
const TAG_NESTED: u8 = 0x07;

const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// SHA-256 digest of a document's canonical encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Raw digest bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

impl FromStr for Fingerprint {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hash(s)
            .map(Fingerprint)
            .ok_or_else(|| DocumentError::InvalidDigest(s.to_string()))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hash(&s)
            .map(Fingerprint)
            .ok_or_else(|| serde::de::Error::custom("expected 32-byte hex digest"))
    }
}

/// Parse a 32-byte hex digest, with or without a `0x` prefix.
pub(crate) fn parse_hash(s: &str) -> Option<[u8; 32]> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).ok()?;
    bytes.try_into().ok()
}

/// Encode a document into its canonical byte form.
pub fn canonicalize(document: &Document) -> Vec<u8> {
    let mut out = Vec::with_capacity(DOMAIN_TAG.len() + 64 * document.len());
    out.extend_from_slice(DOMAIN_TAG);
    encode_map(&mut out, document);
    out
}

/// Compute the fingerprint of a document.
pub fn fingerprint(document: &Document) -> Fingerprint {
    Fingerprint(sha256(&canonicalize(document)))
}

fn encode_map(out: &mut Vec<u8>, document: &Document) {
    write_len(out, document.len());
    // Document iterates in ascending byte-wise key order.
    for (key, value) in document.iter() {
        write_len_prefixed(out, key.as_bytes());
        encode_value(out, value);
    }
}

fn encode_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Text(s) => write_text(out, s),
        Value::Number(n) => {
            out.push(TAG_NUMBER);
            write_f64(out, *n);
        }
        Value::Boolean(b) => {
            out.push(TAG_BOOLEAN);
            out.push(u8::from(*b));
        }
        Value::DateTime(dt) => write_text(out, &render_datetime(dt)),
        Value::GeoPoint(point) => {
            // Same bytes as Nested {"lat": Number, "lon": Number}.
            out.push(TAG_NESTED);
            write_len(out, 2);
            for (key, n) in [("lat", point.lat), ("lon", point.lon)] {
                write_len_prefixed(out, key.as_bytes());
                out.push(TAG_NUMBER);
                write_f64(out, n);
            }
        }
        Value::List(items) => {
            out.push(TAG_LIST);
            write_len(out, items.len());
            for item in items {
                encode_value(out, item);
            }
        }
        Value::Nested(doc) => {
            out.push(TAG_NESTED);
            encode_map(out, doc);
        }
    }
}

fn write_text(out: &mut Vec<u8>, s: &str) {
    out.push(TAG_TEXT);
    write_len_prefixed(out, s.as_bytes());
}

fn write_f64(out: &mut Vec<u8>, n: f64) {
    let bits = if n.is_nan() {
        CANONICAL_NAN
    } else if n == 0.0 {
        0
    } else {
        n.to_bits()
    };
    out.extend_from_slice(&bits.to_be_bytes());
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    // usize is at most 64 bits on supported targets.
    out.extend_from_slice(&(len as u64).to_be_bytes());
}

fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    write_len(out, bytes.len());
    out.extend_from_slice(bytes);
}
