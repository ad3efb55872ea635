//! Block inclusion proofs.
//!
//! A block commits to its documents through a binary Merkle tree whose
//! leaves are document fingerprints in block order. An [`InclusionProof`]
//! carries the sibling hashes from one leaf up to the root; walking it with
//! a locally recomputed fingerprint must land exactly on the block's
//! published root.

mod merkle;
mod source;

pub use merkle::MerkleTree;
pub use source::{ChainSource, InclusionVerifier, MemoryChain, SourceError};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::crypto::merkle_parent;
use crate::document::{fingerprint, Document};

/// Membership proof for one document in one block.
///
/// Odd levels duplicate their last node, so a proof for the last leaf of
/// an `n`-leaf block also folds to the same root when it claims one more
/// leaf at the next position. The root alone therefore binds the document
/// but not its position; check the claimed count against the block's
/// published document count with [`verify_inclusion_with_count`] when the
/// position matters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionProof {
    /// Block the proof is for.
    pub block_id: String,
    /// Document the proof is for.
    pub document_id: String,
    /// Position of the document's leaf in the block.
    pub leaf_index: u64,
    /// Number of leaves in the block.
    pub leaf_count: u64,
    /// Sibling hashes from the leaf level upward.
    #[serde(with = "hex_hashes")]
    pub siblings: Vec<[u8; 32]>,
}

impl InclusionProof {
    /// Tree depth implied by the leaf count.
    pub fn expected_depth(&self) -> usize {
        tree_depth(self.leaf_count)
    }

    /// Reject a proof whose leaf count differs from the block's published
    /// document count.
    pub fn check_leaf_count(&self, published: u64) -> Result<(), ProofError> {
        if self.leaf_count != published {
            return Err(ProofError::LeafCountMismatch {
                claimed: self.leaf_count,
                published,
            });
        }
        Ok(())
    }

    fn check_shape(&self, block_id: &str, document_id: &str) -> Result<(), ProofError> {
        if self.block_id != block_id || self.document_id != document_id {
            return Err(ProofError::SubjectMismatch {
                block_id: self.block_id.clone(),
                document_id: self.document_id.clone(),
            });
        }
        if self.leaf_count == 0 {
            return Err(ProofError::EmptyBlock);
        }
        if self.leaf_index >= self.leaf_count {
            return Err(ProofError::LeafOutOfRange {
                index: self.leaf_index,
                count: self.leaf_count,
            });
        }
        let expected = self.expected_depth();
        if self.siblings.len() != expected {
            return Err(ProofError::DepthMismatch {
                expected,
                actual: self.siblings.len(),
            });
        }
        Ok(())
    }

    /// Fold `leaf` up through the siblings to a candidate root.
    ///
    /// Bit `i` of the leaf index says whether the running hash is a right
    /// child at level `i`.
    pub fn compute_root(&self, leaf: &[u8; 32]) -> [u8; 32] {
        let mut index = self.leaf_index;
        let mut node = *leaf;
        for sibling in &self.siblings {
            node = if index & 1 == 0 {
                merkle_parent(&node, sibling)
            } else {
                merkle_parent(sibling, &node)
            };
            index >>= 1;
        }
        node
    }
}

/// ceil(log2(leaf_count)); zero for a single leaf.
pub(crate) fn tree_depth(leaf_count: u64) -> usize {
    if leaf_count <= 1 {
        0
    } else {
        (u64::BITS - (leaf_count - 1).leading_zeros()) as usize
    }
}

/// Structural problems that make a proof unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// The proof claims a block with no leaves.
    #[error("proof describes an empty block")]
    EmptyBlock,
    /// The leaf position lies outside the block.
    #[error("leaf index {index} out of range for {count} leaves")]
    LeafOutOfRange {
        /// Claimed leaf position.
        index: u64,
        /// Claimed leaf count.
        count: u64,
    },
    /// Sibling count disagrees with the tree depth.
    #[error("expected {expected} sibling hashes, got {actual}")]
    DepthMismatch {
        /// Depth implied by the leaf count.
        expected: usize,
        /// Siblings actually supplied.
        actual: usize,
    },
    /// The proof is for a different block or document.
    #[error("proof is for document '{document_id}' in block '{block_id}'")]
    SubjectMismatch {
        /// Block named by the proof.
        block_id: String,
        /// Document named by the proof.
        document_id: String,
    },
    /// The proof's leaf count disagrees with the block's document count.
    #[error("proof claims {claimed} leaves, block publishes {published}")]
    LeafCountMismatch {
        /// Leaf count carried by the proof.
        claimed: u64,
        /// Document count published for the block.
        published: u64,
    },
}

/// Result of checking a document against a block commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InclusionOutcome {
    /// The document is committed under the published root.
    Verified,
    /// The proof is well formed but leads to a different root.
    MismatchedRoot {
        /// Root published for the block.
        expected: [u8; 32],
        /// Root rebuilt from the document and proof.
        computed: [u8; 32],
    },
    /// The proof is structurally unusable; nothing was verified.
    MalformedProof(ProofError),
}

impl InclusionOutcome {
    /// Whether inclusion was proven.
    pub fn is_verified(&self) -> bool {
        matches!(self, InclusionOutcome::Verified)
    }
}

impl fmt::Display for InclusionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InclusionOutcome::Verified => f.write_str("verified"),
            InclusionOutcome::MismatchedRoot { expected, computed } => write!(
                f,
                "root mismatch: block publishes {}, proof yields {}",
                hex::encode(expected),
                hex::encode(computed)
            ),
            InclusionOutcome::MalformedProof(e) => write!(f, "malformed proof: {}", e),
        }
    }
}

/// Check that `document` is committed under `root` using already-fetched
/// proof data.
///
/// The leaf is always the locally computed fingerprint of `document`.
pub fn verify_inclusion(
    proof: &InclusionProof,
    root: &[u8; 32],
    block_id: &str,
    document_id: &str,
    document: &Document,
) -> InclusionOutcome {
    if let Err(e) = proof.check_shape(block_id, document_id) {
        debug!(block_id, document_id, error = %e, "malformed inclusion proof");
        return InclusionOutcome::MalformedProof(e);
    }

    let leaf = fingerprint(document);
    let computed = proof.compute_root(leaf.as_bytes());
    if computed == *root {
        debug!(block_id, document_id, "inclusion verified");
        InclusionOutcome::Verified
    } else {
        warn!(
            block_id,
            document_id,
            expected = %hex::encode(root),
            computed = %hex::encode(computed),
            "inclusion proof does not match block root"
        );
        InclusionOutcome::MismatchedRoot {
            expected: *root,
            computed,
        }
    }
}

/// [`verify_inclusion`], first checking the proof's leaf count against the
/// block's published document count when one is known.
pub fn verify_inclusion_with_count(
    proof: &InclusionProof,
    root: &[u8; 32],
    published_leaf_count: Option<u64>,
    block_id: &str,
    document_id: &str,
    document: &Document,
) -> InclusionOutcome {
    if let Some(published) = published_leaf_count {
        if let Err(e) = proof.check_leaf_count(published) {
            debug!(block_id, document_id, error = %e, "malformed inclusion proof");
            return InclusionOutcome::MalformedProof(e);
        }
    }
    verify_inclusion(proof, root, block_id, document_id, document)
}

/// Hex (de)serialization for a single 32-byte hash.
pub mod hex_hash {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::document::parse_hash;

    /// Serialize as lowercase hex.
    pub fn serialize<S: Serializer>(hash: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    /// Deserialize from hex, with or without `0x`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hash(&s).ok_or_else(|| serde::de::Error::custom("expected 32-byte hex hash"))
    }
}

mod hex_hashes {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::document::parse_hash;

    pub fn serialize<S: Serializer>(hashes: &[[u8; 32]], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(hashes.len()))?;
        for hash in hashes {
            seq.serialize_element(&hex::encode(hash))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<[u8; 32]>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| {
                parse_hash(s).ok_or_else(|| serde::de::Error::custom("expected 32-byte hex hash"))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::merkle_root;

    fn docs(n: usize) -> Vec<Document> {
        (0..n).map(|i| Document::new().with("seq", i as u32)).collect()
    }

    fn leaves(documents: &[Document]) -> Vec<[u8; 32]> {
        documents.iter().map(|d| fingerprint(d).0).collect()
    }

    #[test]
    fn test_tree_depth() {
        assert_eq!(tree_depth(0), 0);
        assert_eq!(tree_depth(1), 0);
        assert_eq!(tree_depth(2), 1);
        assert_eq!(tree_depth(3), 2);
        assert_eq!(tree_depth(4), 2);
        assert_eq!(tree_depth(5), 3);
        assert_eq!(tree_depth(1024), 10);
        assert_eq!(tree_depth(1025), 11);
    }

    #[test]
    fn test_every_leaf_verifies_for_odd_sizes() {
        for n in [1usize, 2, 3, 5, 6, 7, 9] {
            let documents = docs(n);
            let tree = MerkleTree::from_leaves(leaves(&documents));
            let root = merkle_root(&leaves(&documents));
            assert_eq!(tree.root(), root);

            for (i, doc) in documents.iter().enumerate() {
                let proof = tree.proof(i, "blk", "doc").unwrap();
                let outcome = verify_inclusion(&proof, &root, "blk", "doc", doc);
                assert_eq!(outcome, InclusionOutcome::Verified, "n={n} i={i}");
            }
        }
    }

    #[test]
    fn test_wrong_document_mismatches() {
        let documents = docs(4);
        let tree = MerkleTree::from_leaves(leaves(&documents));
        let proof = tree.proof(1, "blk", "doc").unwrap();

        let outcome = verify_inclusion(&proof, &tree.root(), "blk", "doc", &documents[2]);
        assert!(matches!(outcome, InclusionOutcome::MismatchedRoot { .. }));
    }

    #[test]
    fn test_wrong_position_mismatches() {
        let documents = docs(4);
        let tree = MerkleTree::from_leaves(leaves(&documents));
        let mut proof = tree.proof(1, "blk", "doc").unwrap();
        proof.leaf_index = 0;

        let outcome = verify_inclusion(&proof, &tree.root(), "blk", "doc", &documents[1]);
        assert!(matches!(outcome, InclusionOutcome::MismatchedRoot { .. }));
    }

    #[test]
    fn test_structural_errors() {
        let documents = docs(4);
        let tree = MerkleTree::from_leaves(leaves(&documents));
        let root = tree.root();
        let good = tree.proof(1, "blk", "doc").unwrap();

        let mut p = good.clone();
        p.leaf_count = 0;
        p.leaf_index = 0;
        assert_eq!(
            verify_inclusion(&p, &root, "blk", "doc", &documents[1]),
            InclusionOutcome::MalformedProof(ProofError::EmptyBlock)
        );

        let mut p = good.clone();
        p.leaf_index = 4;
        assert_eq!(
            verify_inclusion(&p, &root, "blk", "doc", &documents[1]),
            InclusionOutcome::MalformedProof(ProofError::LeafOutOfRange { index: 4, count: 4 })
        );

        let mut p = good.clone();
        p.siblings.push([0u8; 32]);
        assert_eq!(
            verify_inclusion(&p, &root, "blk", "doc", &documents[1]),
            InclusionOutcome::MalformedProof(ProofError::DepthMismatch { expected: 2, actual: 3 })
        );

        assert!(matches!(
            verify_inclusion(&good, &root, "other", "doc", &documents[1]),
            InclusionOutcome::MalformedProof(ProofError::SubjectMismatch { .. })
        ));
    }

    #[test]
    fn test_overstated_leaf_count_needs_published_count() {
        let documents = docs(3);
        let tree = MerkleTree::from_leaves(leaves(&documents));
        let root = tree.root();

        let mut stretched = tree.proof(2, "blk", "doc").unwrap();
        stretched.leaf_count = 4;
        stretched.leaf_index = 3;

        // The duplicated odd node makes the stretched path fold to the root.
        assert_eq!(
            verify_inclusion(&stretched, &root, "blk", "doc", &documents[2]),
            InclusionOutcome::Verified
        );
        assert_eq!(
            verify_inclusion_with_count(&stretched, &root, Some(3), "blk", "doc", &documents[2]),
            InclusionOutcome::MalformedProof(ProofError::LeafCountMismatch {
                claimed: 4,
                published: 3
            })
        );

        let honest = tree.proof(2, "blk", "doc").unwrap();
        assert_eq!(
            verify_inclusion_with_count(&honest, &root, Some(3), "blk", "doc", &documents[2]),
            InclusionOutcome::Verified
        );
        assert_eq!(
            verify_inclusion_with_count(&stretched, &root, None, "blk", "doc", &documents[2]),
            InclusionOutcome::Verified
        );
    }

    #[test]
    fn test_proof_json_shape() {
        let proof = InclusionProof {
            block_id: "b1".into(),
            document_id: "d1".into(),
            leaf_index: 1,
            leaf_count: 2,
            siblings: vec![[0xab; 32]],
        };
        let json = serde_json::to_value(&proof).unwrap();
        assert_eq!(json["blockId"], "b1");
        assert_eq!(json["leafCount"], 2);
        assert_eq!(json["siblings"][0], hex::encode([0xab; 32]));

        let back: InclusionProof = serde_json::from_value(json).unwrap();
        assert_eq!(back, proof);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(InclusionOutcome::Verified.to_string(), "verified");
        let malformed = InclusionOutcome::MalformedProof(ProofError::EmptyBlock);
        assert!(malformed.to_string().contains("empty block"));
        assert!(!malformed.is_verified());
    }
}
