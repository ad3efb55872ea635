//! Account address derivation.
//!
//! An account address is the last 20 bytes of the Keccak-256 hash of the
//! 64-byte public key, which is the Ethereum convention the Blocace node
//! uses for its account handles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::hashing::keccak256;
use super::keys::{strip_hex_prefix, PublicKey};
use crate::error::CryptoError;

/// Address size in bytes.
pub const ADDRESS_SIZE: usize = 20;

/// 20-byte account handle derived from a public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; ADDRESS_SIZE]);

impl Address {
    /// Raw address bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

/// Derive an account address from a public key.
pub fn derive_address(public_key: &PublicKey) -> Address {
    let hash = keccak256(&public_key.to_bytes());
    let mut address = [0u8; ADDRESS_SIZE];
    address.copy_from_slice(&hash[32 - ADDRESS_SIZE..]);
    Address(address)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s))
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        if bytes.len() != ADDRESS_SIZE {
            return Err(CryptoError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_SIZE,
                bytes.len()
            )));
        }
        let mut address = [0u8; ADDRESS_SIZE];
        address.copy_from_slice(&bytes);
        Ok(Address(address))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
