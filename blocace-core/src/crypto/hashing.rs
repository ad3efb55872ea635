//! SHA-256 and Keccak-256 hashing utilities.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

/// Compute SHA-256 hash of the input data.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 hash of concatenated data slices.
///
/// More efficient than allocating a buffer for concatenation.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute the Keccak-256 hash (pre-standard SHA-3 padding) of the input.
#[inline]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Hash two child nodes into their parent.
#[inline]
pub fn merkle_parent(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    sha256_concat(&[left, right])
}

/// Compute Merkle root of a list of 32-byte hashes.
///
/// Uses a simple binary Merkle tree construction:
/// - Empty list returns 32 zero bytes
/// - Single hash returns that hash
/// - Otherwise, pair hashes and hash pairs recursively
/// - Odd leaves are duplicated
pub fn merkle_root(hashes: &[[u8; 32]]) -> [u8; 32] {
    if hashes.is_empty() {
        return [0u8; 32];
    }

    let mut level: Vec<[u8; 32]> = hashes.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Reduce one tree level to its parent level.
pub(crate) fn next_level(level: &[[u8; 32]]) -> Vec<[u8; 32]> {
    level
        .chunks(2)
        .map(|chunk| {
            // Odd leaf: duplicate it
            let right = chunk.get(1).unwrap_or(&chunk[0]);
            merkle_parent(&chunk[0], right)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_value() {
        let hash = sha256(b"abc");
        assert_eq!(
            hex::encode(hash),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_keccak256_known_value() {
        // Keccak-256 of the empty string, as used by Ethereum.
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_sha256_concat_equals_manual() {
        let concat_hash = sha256_concat(&[b"hello", b" world"]);
        assert_eq!(concat_hash, sha256(b"hello world"));
    }

    #[test]
    fn test_merkle_root_empty() {
        assert_eq!(merkle_root(&[]), [0u8; 32]);
    }

    #[test]
    fn test_merkle_root_single() {
        let hash = sha256(b"test");
        assert_eq!(merkle_root(&[hash]), hash);
    }

    #[test]
    fn test_merkle_root_three() {
        let h1 = sha256(b"one");
        let h2 = sha256(b"two");
        let h3 = sha256(b"three");

        let root = merkle_root(&[h1, h2, h3]);

        // Expected: hash(hash(h1, h2), hash(h3, h3))
        let left = merkle_parent(&h1, &h2);
        let right = merkle_parent(&h3, &h3);
        assert_eq!(root, merkle_parent(&left, &right));
    }

    #[test]
    fn test_merkle_root_four() {
        let h: Vec<[u8; 32]> = [b"one".as_ref(), b"two", b"three", b"four"]
            .iter()
            .map(|d| sha256(d))
            .collect();

        let left = merkle_parent(&h[0], &h[1]);
        let right = merkle_parent(&h[2], &h[3]);
        assert_eq!(merkle_root(&h), merkle_parent(&left, &right));
    }
}
