//! secp256k1 key pair generation and management.

use std::fmt;

use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Private key size in bytes.
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Serialized public key size in bytes (uncompressed point without the SEC1 tag).
pub const PUBLIC_KEY_SIZE: usize = 64;

/// secp256k1 public key.
///
/// Serialized as 64 raw bytes (`x ‖ y`) or 128 lowercase hex characters,
/// which is the form the Blocace node stores for an account.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Create a PublicKey from the 64-byte `x ‖ y` form.
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_SIZE]) -> Result<Self, CryptoError> {
        let mut sec1 = [0u8; PUBLIC_KEY_SIZE + 1];
        sec1[0] = 0x04;
        sec1[1..].copy_from_slice(bytes);
        Self::from_sec1(&sec1)
    }

    /// Create a PublicKey from any accepted encoding: 64-byte raw,
    /// 65-byte uncompressed SEC1 or 33-byte compressed SEC1.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        match bytes.len() {
            PUBLIC_KEY_SIZE => {
                let mut raw = [0u8; PUBLIC_KEY_SIZE];
                raw.copy_from_slice(bytes);
                Self::from_bytes(&raw)
            }
            33 | 65 => Self::from_sec1(bytes),
            _ => Err(CryptoError::InvalidPublicKey),
        }
    }

    /// Parse a hex-encoded public key, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(strip_hex_prefix(s)).map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_slice(&bytes)
    }

    fn from_sec1(bytes: &[u8]) -> Result<Self, CryptoError> {
        VerifyingKey::from_sec1_bytes(bytes)
            .map(PublicKey)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Get the 64-byte `x ‖ y` encoding.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let point = self.0.to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        // Skip the 0x04 uncompressed tag.
        out.copy_from_slice(&point.as_bytes()[1..]);
        out
    }

    /// Lowercase hex of the 64-byte encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Get the inner VerifyingKey.
    #[inline]
    pub fn inner(&self) -> &VerifyingKey {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        PublicKey(key)
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// secp256k1 key pair bound to one account.
///
/// The secret scalar is wiped from memory when the pair is dropped.
/// `Debug` output never includes it.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using the OS random number generator.
    pub fn generate() -> Self {
        KeyPair {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Create a key pair from a raw private key.
    ///
    /// The input must be exactly 32 bytes encoding a scalar in `1..n`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(CryptoError::InvalidPrivateKey("expected 32 bytes"));
        }
        if bytes.iter().all(|b| *b == 0) {
            return Err(CryptoError::InvalidPrivateKey("zero scalar"));
        }
        let signing_key = SigningKey::from_slice(bytes)
            .map_err(|_| CryptoError::InvalidPrivateKey("scalar not below curve order"))?;
        Ok(KeyPair { signing_key })
    }

    /// Create a key pair from a hex-encoded private key.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            hex::decode(strip_hex_prefix(s))
                .map_err(|_| CryptoError::InvalidPrivateKey("not valid hex"))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key().clone())
    }

    /// Get the signing (secret) key.
    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Copy out the raw secret scalar.
    ///
    /// The copy is wiped when the returned buffer is dropped.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// secp256k1 group order.
    const CURVE_ORDER: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

    #[test]
    fn test_key_generation_uniqueness() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        assert_ne!(kp1.public_key(), kp2.public_key());
        assert_ne!(*kp1.secret_bytes(), *kp2.secret_bytes());
    }

    #[test]
    fn test_keypair_from_bytes() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::from_bytes(&kp1.secret_bytes()[..]).unwrap();
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_known_generator_point() {
        let mut scalar = [0u8; 32];
        scalar[31] = 1;
        let kp = KeyPair::from_bytes(&scalar).unwrap();
        assert_eq!(
            kp.public_key().to_hex(),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798\
             483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(matches!(
            KeyPair::from_bytes(&[1u8; 31]),
            Err(CryptoError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            KeyPair::from_bytes(&[1u8; 33]),
            Err(CryptoError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_rejects_zero_scalar() {
        assert_eq!(
            KeyPair::from_bytes(&[0u8; 32]).unwrap_err(),
            CryptoError::InvalidPrivateKey("zero scalar")
        );
    }

    #[test]
    fn test_rejects_curve_order_and_above() {
        assert!(KeyPair::from_hex(CURVE_ORDER).is_err());
        assert!(KeyPair::from_bytes(&[0xff; 32]).is_err());
    }

    #[test]
    fn test_from_hex_with_prefix() {
        let kp = KeyPair::generate();
        let hex = format!("0x{}", hex::encode(*kp.secret_bytes()));
        assert_eq!(KeyPair::from_hex(&hex).unwrap().public_key(), kp.public_key());
    }

    #[test]
    fn test_public_key_encodings() {
        let kp = KeyPair::generate();
        let pk = kp.public_key();

        let raw = pk.to_bytes();
        assert_eq!(PublicKey::from_bytes(&raw).unwrap(), pk);

        let compressed = pk.inner().to_encoded_point(true);
        assert_eq!(PublicKey::from_slice(compressed.as_bytes()).unwrap(), pk);

        assert_eq!(PublicKey::from_hex(&pk.to_hex()).unwrap(), pk);
        assert!(PublicKey::from_slice(&raw[..40]).is_err());
    }

    #[test]
    fn test_public_key_json() {
        let pk = KeyPair::generate().public_key();
        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", pk.to_hex()));
        let recovered: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, recovered);
    }

    #[test]
    fn test_debug_hides_secret() {
        let kp = KeyPair::generate();
        let debug = format!("{:?}", kp);
        assert!(!debug.contains(&hex::encode(*kp.secret_bytes())));
        assert!(debug.contains(&kp.public_key().to_hex()));
    }
}
