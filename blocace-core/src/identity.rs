//! Account identity: a key pair bound to its derived address.

use zeroize::Zeroizing;

use crate::crypto::{
    decrypt_key, derive_address, encrypt_key, sha256, sign_digest, Address, KeyPair, PublicKey,
    Signature, PRIVATE_KEY_SIZE,
};
use crate::document::Document;
use crate::envelope::SignedEnvelope;
use crate::error::{CoreError, CryptoError};

/// A signing identity on the Blocace network.
///
/// Holds the key pair and the address derived from it. The raw key only
/// leaves through [`Identity::to_vault`] or [`Identity::secret_bytes`].
#[derive(Debug, Clone)]
pub struct Identity {
    key_pair: KeyPair,
    address: Address,
}

impl Identity {
    /// Wrap an existing key pair.
    pub fn new(key_pair: KeyPair) -> Self {
        let address = derive_address(&key_pair.public_key());
        Self { key_pair, address }
    }

    /// Identity from a fresh random key.
    pub fn generate() -> Self {
        Self::new(KeyPair::generate())
    }

    /// Identity from a raw 32-byte private key.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, CryptoError> {
        KeyPair::from_bytes(bytes).map(Self::new)
    }

    /// Identity from a hex private key, with or without `0x`.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        KeyPair::from_hex(s).map(Self::new)
    }

    /// Open a vault blob with `password`.
    pub fn from_vault(blob: &[u8], password: &str) -> Result<Self, CoreError> {
        let secret = decrypt_key(blob, password)?;
        Ok(Self::from_private_key(&secret[..])?)
    }

    /// Seal the private key into a vault blob under `password`.
    pub fn to_vault(&self, password: &str) -> Result<Vec<u8>, CoreError> {
        Ok(encrypt_key(&self.key_pair.secret_bytes(), password)?)
    }

    /// Account address.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Public key.
    pub fn public_key(&self) -> PublicKey {
        self.key_pair.public_key()
    }

    /// Public key as 128 hex chars.
    pub fn public_key_hex(&self) -> String {
        self.public_key().to_hex()
    }

    /// Underlying key pair.
    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }

    /// Raw private key bytes.
    pub fn secret_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        self.key_pair.secret_bytes()
    }

    /// Sign a document for submission.
    pub fn sign(&self, document: Document) -> Result<SignedEnvelope, CryptoError> {
        SignedEnvelope::sign(document, &self.key_pair)
    }

    /// Sign SHA-256 of arbitrary bytes, e.g. a login challenge.
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature, CryptoError> {
        sign_digest(&self.key_pair, &sha256(message))
    }
}

impl From<KeyPair> for Identity {
    fn from(key_pair: KeyPair) -> Self {
        Self::new(key_pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{verify_digest, VaultError};

    const ADMIN_KEY: &str = "879aac33205b270c4a96109d41049a1fd37e595550f8a29271656c886a065c4f";

    #[test]
    fn test_from_hex_is_stable() {
        let a = Identity::from_hex(ADMIN_KEY).unwrap();
        let b = Identity::from_hex(&format!("0x{ADMIN_KEY}")).unwrap();
        assert_eq!(a.address(), b.address());
        assert_eq!(a.public_key_hex(), b.public_key_hex());
        assert_eq!(a.public_key_hex().len(), 128);
        assert_eq!(a.address(), &derive_address(&a.public_key()));
    }

    #[test]
    fn test_vault_roundtrip() {
        let identity = Identity::from_hex(ADMIN_KEY).unwrap();
        let blob = identity.to_vault("123456").unwrap();

        let reopened = Identity::from_vault(&blob, "123456").unwrap();
        assert_eq!(*reopened.secret_bytes(), *identity.secret_bytes());

        let err = Identity::from_vault(&blob, "654321").unwrap_err();
        assert_eq!(err, CoreError::Vault(VaultError::AuthenticationFailed));
    }

    #[test]
    fn test_sign_message() {
        let identity = Identity::generate();
        let signature = identity.sign_message(b"challenge-42").unwrap();
        assert!(verify_digest(&identity.public_key(), &sha256(b"challenge-42"), &signature).is_ok());
        assert!(verify_digest(&identity.public_key(), &sha256(b"challenge-43"), &signature).is_err());
    }

    #[test]
    fn test_sign_binds_address() {
        let identity = Identity::generate();
        let envelope = identity.sign(Document::new().with("k", "v")).unwrap();
        assert_eq!(envelope.address(), identity.address());
        assert!(envelope.verify(&identity.public_key()));
    }

    #[test]
    fn test_debug_hides_secret() {
        let identity = Identity::from_hex(ADMIN_KEY).unwrap();
        let debug = format!("{:?}", identity);
        assert!(!debug.contains(ADMIN_KEY));
    }

    #[test]
    fn test_invalid_keys_rejected() {
        assert!(Identity::from_private_key(&[0u8; 32]).is_err());
        assert!(Identity::from_private_key(&[1u8; 31]).is_err());
        assert!(Identity::from_hex("not hex").is_err());
    }
}
