//! # Blocace Core
//!
//! Client-side identity and verification for the Blocace document chain.
//!
//! This crate provides the trust layer every other Blocace crate builds on:
//! - Cryptographic primitives (secp256k1 ECDSA, SHA-256, Keccak-256 addresses)
//! - Password vaults for private keys (Argon2id + AES-256-GCM)
//! - Typed documents, collection schemas and canonical fingerprints
//! - Signed envelopes and detached-signature verification
//! - Merkle inclusion proofs checked against published block roots
//!
//! Everything here is synchronous and performs no I/O.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crypto;
pub mod document;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod proof;

// Re-export commonly used types at crate root
pub use crypto::{decrypt_key, encrypt_key, Address, KeyPair, PublicKey, Signature, VaultError};
pub use document::{
    canonicalize, fingerprint, CollectionSchema, Document, DocumentError, FieldMapping, FieldType,
    Fingerprint, GeoPoint, SchemaError, Value,
};
pub use envelope::{verify_document, verify_signature, SignedEnvelope};
pub use error::{CoreError, CryptoError};
pub use identity::Identity;
pub use proof::{
    verify_inclusion, verify_inclusion_with_count, ChainSource, InclusionOutcome, InclusionProof,
    InclusionVerifier, MemoryChain, MerkleTree, ProofError, SourceError,
};
