//! Cryptographic primitives for Blocace clients.
//!
//! This module provides:
//! - secp256k1 key pair generation and validation
//! - SHA-256 and Keccak-256 hashing, binary Merkle roots
//! - Account address derivation (last 20 bytes of Keccak-256 of the public key)
//! - ECDSA signatures over 32-byte digests
//! - Password vault blobs (Argon2id + AES-256-GCM)

mod address;
mod hashing;
mod keys;
mod signing;
pub mod vault;

pub use address::{derive_address, Address, ADDRESS_SIZE};
pub use hashing::{keccak256, merkle_parent, merkle_root, sha256, sha256_concat};
pub(crate) use hashing::next_level;
pub use keys::{KeyPair, PublicKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use signing::{sign_digest, verify_digest, Signature, SIGNATURE_SIZE};
pub use vault::{decrypt_key, encrypt_key, KdfParams, VaultError, KDF_PARAMS};
