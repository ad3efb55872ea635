//! Password vault for raw private keys.
//!
//! Produces a self-contained blob that only the password can open, so a
//! key can be written to local storage without exposing the scalar.
//!
//! # Blob Format
//!
//! | Field      | Size (bytes) | Description                        |
//! |------------|--------------|-------------------------------------|
//! | Magic      | 4            | "BLCV" (0x424c4356)                |
//! | Version    | 1            | Format version (currently 1)       |
//! | Salt       | 32           | Random salt for Argon2id           |
//! | Nonce      | 12           | Random nonce for AES-256-GCM       |
//! | Ciphertext | 48           | Encrypted key (32) + GCM tag (16)  |
//!
//! Total: 97 bytes
//!
//! The KDF cost parameters are fixed constants of format version 1, so a
//! blob written by one process opens in any other.

use aes_gcm::{aead::Aead, Aes256Gcm, KeyInit, Nonce};
use argon2::{Argon2, Params, Version};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

use super::keys::PRIVATE_KEY_SIZE;

/// Magic bytes identifying a Blocace vault blob.
pub const VAULT_MAGIC: &[u8; 4] = b"BLCV";

/// Current vault format version.
pub const VAULT_VERSION: u8 = 1;

/// Salt size in bytes (for Argon2id).
pub const SALT_SIZE: usize = 32;

/// Nonce size in bytes (for AES-GCM).
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size in bytes.
pub const TAG_SIZE: usize = 16;

/// Total vault blob size in bytes.
pub const VAULT_SIZE: usize = 4 + 1 + SALT_SIZE + NONCE_SIZE + PRIVATE_KEY_SIZE + TAG_SIZE;

/// Argon2id cost parameters shared by every encrypt/decrypt call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    /// Iteration count.
    pub t_cost: u32,
    /// Lanes.
    pub p_cost: u32,
}

/// Parameters of vault format version 1 (OWASP Argon2id baseline).
pub const KDF_PARAMS: KdfParams = KdfParams {
    m_cost: 19 * 1024, // 19 MiB memory
    t_cost: 2,
    p_cost: 1,
};

/// Errors that can occur during vault operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// Blob has the wrong length.
    #[error("vault blob has wrong size: expected {expected} bytes, got {actual}")]
    WrongSize {
        /// Expected blob size in bytes.
        expected: usize,
        /// Actual blob size in bytes.
        actual: usize,
    },
    /// Magic bytes don't match.
    #[error("not a Blocace vault blob")]
    InvalidMagic,
    /// Unsupported blob format version.
    #[error("unsupported vault version: {version}")]
    UnsupportedVersion {
        /// The version number found in the blob.
        version: u8,
    },
    /// An empty password was supplied for encryption.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password-based key derivation failed.
    #[error("key derivation failed")]
    KeyDerivationFailed,
    /// Encryption failed.
    #[error("encryption failed")]
    EncryptionFailed,
    /// Authentication tag mismatch (wrong password or corrupted blob).
    #[error("authentication failed (wrong password or corrupted vault)")]
    AuthenticationFailed,
}

/// Encrypt a raw private key with a password.
///
/// Returns the vault blob (97 bytes total). A fresh salt and nonce are drawn
/// for every call.
///
/// # Example
///
/// ```
/// use blocace_core::crypto::vault::{encrypt_key, VAULT_SIZE};
/// use blocace_core::KeyPair;
///
/// let kp = KeyPair::generate();
/// let blob = encrypt_key(&kp.secret_bytes(), "my_password").unwrap();
/// assert_eq!(blob.len(), VAULT_SIZE);
/// ```
pub fn encrypt_key(
    secret_bytes: &[u8; PRIVATE_KEY_SIZE],
    password: &str,
) -> Result<Vec<u8>, VaultError> {
    if password.is_empty() {
        return Err(VaultError::EmptyPassword);
    }

    let mut salt = [0u8; SALT_SIZE];
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let derived_key = derive_key(password.as_bytes(), &salt)?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|_| VaultError::EncryptionFailed)?;
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, &secret_bytes[..])
        .map_err(|_| VaultError::EncryptionFailed)?;

    let mut result = Vec::with_capacity(VAULT_SIZE);
    result.extend_from_slice(VAULT_MAGIC);
    result.push(VAULT_VERSION);
    result.extend_from_slice(&salt);
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    debug_assert_eq!(result.len(), VAULT_SIZE);
    Ok(result)
}

/// Decrypt a raw private key from a vault blob.
///
/// A wrong password and a tampered ciphertext both surface as
/// [`VaultError::AuthenticationFailed`]; no partially decrypted bytes are
/// ever returned.
///
/// # Example
///
/// ```
/// use blocace_core::crypto::vault::{encrypt_key, decrypt_key};
/// use blocace_core::KeyPair;
///
/// let kp = KeyPair::generate();
/// let blob = encrypt_key(&kp.secret_bytes(), "my_password").unwrap();
/// let decrypted = decrypt_key(&blob, "my_password").unwrap();
/// assert_eq!(*kp.secret_bytes(), *decrypted);
/// ```
pub fn decrypt_key(
    blob: &[u8],
    password: &str,
) -> Result<Zeroizing<[u8; PRIVATE_KEY_SIZE]>, VaultError> {
    if blob.len() != VAULT_SIZE {
        return Err(VaultError::WrongSize {
            expected: VAULT_SIZE,
            actual: blob.len(),
        });
    }

    if &blob[0..4] != VAULT_MAGIC {
        return Err(VaultError::InvalidMagic);
    }

    let version = blob[4];
    if version != VAULT_VERSION {
        return Err(VaultError::UnsupportedVersion { version });
    }

    let salt = &blob[5..5 + SALT_SIZE];
    let nonce_bytes = &blob[5 + SALT_SIZE..5 + SALT_SIZE + NONCE_SIZE];
    let ciphertext = &blob[5 + SALT_SIZE + NONCE_SIZE..];

    let derived_key = derive_key(password.as_bytes(), salt)?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key[..])
        .map_err(|_| VaultError::AuthenticationFailed)?;
    let nonce = Nonce::from_slice(nonce_bytes);
    let plaintext = Zeroizing::new(
        cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| VaultError::AuthenticationFailed)?,
    );

    if plaintext.len() != PRIVATE_KEY_SIZE {
        return Err(VaultError::AuthenticationFailed);
    }
    let mut result = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
    result.copy_from_slice(&plaintext);

    Ok(result)
}

/// Derive a 256-bit encryption key from password and salt using Argon2id.
fn derive_key(password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, VaultError> {
    let params = Params::new(KDF_PARAMS.m_cost, KDF_PARAMS.t_cost, KDF_PARAMS.p_cost, Some(32))
        .map_err(|_| VaultError::KeyDerivationFailed)?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(password, salt, &mut key[..])
        .map_err(|_| VaultError::KeyDerivationFailed)?;

    Ok(key)
}
