//! Merkle tree with proof extraction.

use crate::crypto::next_level;
use crate::document::Fingerprint;

use super::InclusionProof;

/// Fully materialized Merkle tree over document fingerprints.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    // levels[0] is the leaves, the last level is the root.
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree from leaf hashes in block order.
    pub fn from_leaves(leaves: Vec<[u8; 32]>) -> Self {
        let mut levels = vec![leaves];
        while let Some(top) = levels.last() {
            if top.len() <= 1 {
                break;
            }
            let parent = next_level(top);
            levels.push(parent);
        }
        Self { levels }
    }

    /// Build a tree from document fingerprints in block order.
    pub fn from_fingerprints<'a>(fingerprints: impl IntoIterator<Item = &'a Fingerprint>) -> Self {
        Self::from_leaves(fingerprints.into_iter().map(|fp| fp.0).collect())
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Root commitment; 32 zero bytes for an empty tree.
    pub fn root(&self) -> [u8; 32] {
        self.levels
            .last()
            .and_then(|top| top.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    /// Proof for the leaf at `index`, or `None` if out of range.
    pub fn proof(&self, index: usize, block_id: &str, document_id: &str) -> Option<InclusionProof> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut siblings = Vec::with_capacity(self.levels.len().saturating_sub(1));
        let mut position = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = position ^ 1;
            // Odd node at the end of a level pairs with itself.
            siblings.push(*level.get(sibling).unwrap_or(&level[position]));
            position /= 2;
        }

        Some(InclusionProof {
            block_id: block_id.to_string(),
            document_id: document_id.to_string(),
            leaf_index: index as u64,
            leaf_count: self.leaf_count() as u64,
            siblings,
        })
    }
}
