//! Signed document envelopes and detached-signature verification.
//!
//! Signing covers the document fingerprint, so the signature is bound to
//! the canonical encoding rather than to any particular JSON rendering.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::{
    derive_address, sign_digest, verify_digest, Address, KeyPair, PublicKey, Signature,
};
use crate::document::{fingerprint, Document, Fingerprint};
use crate::error::CryptoError;

/// A document together with its fingerprint, signature and signer address.
///
/// Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    #[serde(rename = "rawDocument")]
    document: Document,
    fingerprint: Fingerprint,
    signature: Signature,
    address: Address,
}

impl SignedEnvelope {
    /// Fingerprint `document` and sign it with `key_pair`.
    pub fn sign(document: Document, key_pair: &KeyPair) -> Result<Self, CryptoError> {
        let fingerprint = fingerprint(&document);
        let signature = sign_digest(key_pair, fingerprint.as_bytes())?;
        let address = derive_address(&key_pair.public_key());
        Ok(Self {
            document,
            fingerprint,
            signature,
            address,
        })
    }

    /// The signed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Fingerprint computed at signing time.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Detached signature over the fingerprint.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Address of the signer.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Take the document back out.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Check the envelope against the signer's public key.
    ///
    /// The carried fingerprint must match the document, the carried address
    /// must derive from `public_key`, and the signature must verify.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        if fingerprint(&self.document) != self.fingerprint {
            debug!("envelope fingerprint does not match its document");
            return false;
        }
        if derive_address(public_key) != self.address {
            debug!(address = %self.address, "envelope address does not match public key");
            return false;
        }
        verify_digest(public_key, self.fingerprint.as_bytes(), &self.signature).is_ok()
    }
}

/// Check a detached signature over `document`.
pub fn verify_signature(document: &Document, signature: &Signature, public_key: &PublicKey) -> bool {
    verify_digest(public_key, fingerprint(document).as_bytes(), signature).is_ok()
}

/// Check a hex-encoded detached signature against a hex-encoded public key.
///
/// Malformed hex, wrong lengths and off-curve keys all yield `false`.
pub fn verify_document(document: &Document, signature_hex: &str, public_key_hex: &str) -> bool {
    let Ok(signature) = Signature::from_hex(signature_hex) else {
        return false;
    };
    let Ok(public_key) = PublicKey::from_hex(public_key_hex) else {
        return false;
    };
    verify_signature(document, &signature, &public_key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::GeoPoint;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample() -> Document {
        Document::from_json(json!({
            "id": "5bf1d3fdf6fd4a5c4638f64e",
            "name": "Carly Compton",
            "age": 28,
            "tags": ["incididunt", "dolore"]
        }))
        .unwrap()
    }

    #[test]
    fn test_sign_then_verify() {
        let kp = KeyPair::generate();
        let envelope = SignedEnvelope::sign(sample(), &kp).unwrap();

        assert!(envelope.verify(&kp.public_key()));
        assert_eq!(envelope.address(), &derive_address(&kp.public_key()));
        assert_eq!(envelope.fingerprint(), &fingerprint(&sample()));
    }

    #[test]
    fn test_other_key_rejected() {
        let envelope = SignedEnvelope::sign(sample(), &KeyPair::generate()).unwrap();
        assert!(!envelope.verify(&KeyPair::generate().public_key()));
    }

    #[test]
    fn test_tampered_document_rejected() {
        let kp = KeyPair::generate();
        let mut envelope = SignedEnvelope::sign(sample(), &kp).unwrap();
        envelope.document.insert("age", 29);
        assert!(!envelope.verify(&kp.public_key()));
    }

    #[test]
    fn test_tampered_fingerprint_rejected() {
        let kp = KeyPair::generate();
        let mut envelope = SignedEnvelope::sign(sample(), &kp).unwrap();
        envelope.fingerprint.0[0] ^= 1;
        assert!(!envelope.verify(&kp.public_key()));
    }

    #[test]
    fn test_hex_verification_never_panics() {
        let kp = KeyPair::generate();
        let doc = sample();
        let envelope = SignedEnvelope::sign(doc.clone(), &kp).unwrap();
        let sig_hex = envelope.signature().to_hex();
        let pk_hex = kp.public_key().to_hex();

        assert!(verify_document(&doc, &sig_hex, &pk_hex));
        assert!(!verify_document(&doc, "zz", &pk_hex));
        assert!(!verify_document(&doc, &sig_hex, ""));
        assert!(!verify_document(&doc, &sig_hex[..126], &pk_hex));
        assert!(!verify_document(&doc, &sig_hex, &"00".repeat(64)));
        assert!(!verify_document(&doc, &"00".repeat(64), &pk_hex));
    }

    #[test]
    fn test_envelope_json_shape() {
        let kp = KeyPair::generate();
        let envelope = SignedEnvelope::sign(sample(), &kp).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["rawDocument"]["name"], "Carly Compton");
        assert_eq!(json["signature"].as_str().unwrap().len(), 128);
        assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
        assert!(json["address"].as_str().unwrap().starts_with("0x"));

        let back: SignedEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back, envelope);
        assert!(back.verify(&kp.public_key()));
    }

    #[test]
    fn test_typed_envelope_survives_json_text() {
        let kp = KeyPair::generate();
        let doc = sample()
            .with("registered", Utc.with_ymd_and_hms(2015, 9, 18, 12, 59, 51).unwrap())
            .with("location", GeoPoint { lat: 53.15213, lon: 46.564666 });
        let envelope = SignedEnvelope::sign(doc, &kp).unwrap();

        let text = serde_json::to_string(&envelope).unwrap();
        let back: SignedEnvelope = serde_json::from_str(&text).unwrap();

        assert_eq!(fingerprint(back.document()), *envelope.fingerprint());
        assert_eq!(back.fingerprint(), envelope.fingerprint());
        assert!(back.verify(&kp.public_key()));
    }
}
