//! ECDSA/secp256k1 signature creation and verification.
//!
//! Documents are signed over their 32-byte fingerprint, which is fed to
//! ECDSA as the message prehash. Nonces follow RFC 6979 and signatures are
//! normalized to low-S.

use std::fmt;

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::keys::{strip_hex_prefix, KeyPair, PublicKey};
use crate::error::CryptoError;

/// Signature size in bytes (`r ‖ s`).
pub const SIGNATURE_SIZE: usize = 64;

/// ECDSA signature wrapper with hex serialization.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(k256::ecdsa::Signature);

impl Signature {
    /// Create a Signature from the 64-byte `r ‖ s` form.
    ///
    /// Rejects zero or out-of-range scalars.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != SIGNATURE_SIZE {
            return Err(CryptoError::InvalidSignature);
        }
        k256::ecdsa::Signature::from_slice(bytes)
            .map(Signature)
            .map_err(|_| CryptoError::InvalidSignature)
    }

    /// Parse a hex-encoded signature, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(strip_hex_prefix(s)).map_err(|_| CryptoError::InvalidSignature)?;
        Self::from_slice(&bytes)
    }

    /// Get the raw bytes of the signature.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE] {
        let mut out = [0u8; SIGNATURE_SIZE];
        out.copy_from_slice(&self.0.to_bytes());
        out
    }

    /// Lowercase hex of the 64-byte encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Signature::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Sign a 32-byte digest with a key pair.
pub fn sign_digest(key_pair: &KeyPair, digest: &[u8; 32]) -> Result<Signature, CryptoError> {
    let signature: k256::ecdsa::Signature = key_pair
        .signing_key()
        .sign_prehash(digest)
        .map_err(|_| CryptoError::SigningFailed)?;
    // Low-S only.
    Ok(Signature(signature.normalize_s().unwrap_or(signature)))
}

/// Verify a signature against a 32-byte digest and public key.
///
/// High-S signatures are rejected.
pub fn verify_digest(
    public_key: &PublicKey,
    digest: &[u8; 32],
    signature: &Signature,
) -> Result<(), CryptoError> {
    if signature.0.normalize_s().is_some() {
        return Err(CryptoError::SignatureVerificationFailed);
    }
    public_key
        .inner()
        .verify_prehash(digest, &signature.0)
        .map_err(|_| CryptoError::SignatureVerificationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let digest = sha256(b"test message");

        let signature = sign_digest(&kp, &digest).unwrap();
        assert!(verify_digest(&kp.public_key(), &digest, &signature).is_ok());
    }

    #[test]
    fn test_verify_wrong_digest_fails() {
        let kp = KeyPair::generate();
        let signature = sign_digest(&kp, &sha256(b"test message")).unwrap();
        let result = verify_digest(&kp.public_key(), &sha256(b"wrong message"), &signature);
        assert_eq!(result, Err(CryptoError::SignatureVerificationFailed));
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let digest = sha256(b"test message");

        let signature = sign_digest(&kp1, &digest).unwrap();
        assert!(verify_digest(&kp2.public_key(), &digest, &signature).is_err());
    }

    #[test]
    fn test_signature_determinism() {
        let kp = KeyPair::generate();
        let digest = sha256(b"test message");

        // RFC 6979 nonces make signatures deterministic
        let sig1 = sign_digest(&kp, &digest).unwrap();
        let sig2 = sign_digest(&kp, &digest).unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_high_s_rejected() {
        let kp = KeyPair::generate();
        let digest = sha256(b"malleable");
        let signature = sign_digest(&kp, &digest).unwrap();

        // (r, n - s) is the mirrored high-S signature for the same message.
        use k256::elliptic_curve::PrimeField;
        let bytes = signature.to_bytes();
        let s = k256::Scalar::from_repr(*k256::FieldBytes::from_slice(&bytes[32..])).unwrap();
        let mut mirrored = bytes;
        mirrored[32..].copy_from_slice(&(-s).to_bytes());

        let high = Signature::from_slice(&mirrored).unwrap();
        assert!(verify_digest(&kp.public_key(), &digest, &high).is_err());
    }

    #[test]
    fn test_signature_hex_roundtrip() {
        let kp = KeyPair::generate();
        let signature = sign_digest(&kp, &sha256(b"test message")).unwrap();

        let recovered = Signature::from_hex(&signature.to_hex()).unwrap();
        assert_eq!(signature, recovered);

        let json = serde_json::to_string(&signature).unwrap();
        let from_json: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(signature, from_json);
    }

    #[test]
    fn test_malformed_signature_rejected() {
        assert!(Signature::from_slice(&[0u8; 64]).is_err());
        assert!(Signature::from_slice(&[1u8; 63]).is_err());
        assert!(Signature::from_hex("zz").is_err());
    }
}
