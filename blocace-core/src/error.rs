//! Error types for the Blocace core crate.

use thiserror::Error;

use crate::crypto::VaultError;
use crate::document::{DocumentError, SchemaError};
use crate::proof::SourceError;

/// Top-level error type for blocace-core operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Key, signature or address material was rejected.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    /// The password vault could not produce a key.
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),
    /// A document could not be built from the supplied value.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
    /// A document does not fit its collection schema.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    /// The chain source could not supply proof material.
    #[error("chain source error: {0}")]
    Source(#[from] SourceError),
}

/// Errors related to key, signature and address material.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The private key is not a 32-byte scalar in `1..n`.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(&'static str),
    /// The public key is not a point on secp256k1.
    #[error("invalid public key format")]
    InvalidPublicKey,
    /// The signature bytes are malformed.
    #[error("invalid signature format")]
    InvalidSignature,
    /// The address string is malformed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// The signing backend refused to produce a signature.
    #[error("signing failed")]
    SigningFailed,
    /// Signature verification failed (signature doesn't match message/key).
    #[error("signature verification failed")]
    SignatureVerificationFailed,
}
