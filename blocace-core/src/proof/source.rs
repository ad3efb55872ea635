//! Chain data sources and the source-backed verifier.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::crypto::{derive_address, Address, PublicKey};
use crate::document::{fingerprint, Document};

use super::{verify_inclusion_with_count, InclusionOutcome, InclusionProof, MerkleTree};

/// Errors raised by a [`ChainSource`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The requested block, document or account is unknown.
    #[error("not found: {0}")]
    NotFound(String),
    /// The source could not be reached or returned garbage.
    #[error("chain source unavailable: {0}")]
    Unavailable(String),
}

/// Read access to published chain data.
pub trait ChainSource {
    /// Inclusion proof for a document within a block.
    fn inclusion_proof(&self, block_id: &str, document_id: &str)
        -> Result<InclusionProof, SourceError>;

    /// Published root commitment of a block.
    fn block_root(&self, block_id: &str) -> Result<[u8; 32], SourceError>;

    /// Published document count of a block, if the source knows it.
    fn block_leaf_count(&self, _block_id: &str) -> Result<Option<u64>, SourceError> {
        Ok(None)
    }

    /// Registered public key of an account.
    fn account_public_key(&self, address: &Address) -> Result<PublicKey, SourceError>;
}

impl<S: ChainSource + ?Sized> ChainSource for &S {
    fn inclusion_proof(
        &self,
        block_id: &str,
        document_id: &str,
    ) -> Result<InclusionProof, SourceError> {
        (**self).inclusion_proof(block_id, document_id)
    }

    fn block_root(&self, block_id: &str) -> Result<[u8; 32], SourceError> {
        (**self).block_root(block_id)
    }

    fn block_leaf_count(&self, block_id: &str) -> Result<Option<u64>, SourceError> {
        (**self).block_leaf_count(block_id)
    }

    fn account_public_key(&self, address: &Address) -> Result<PublicKey, SourceError> {
        (**self).account_public_key(address)
    }
}

#[derive(Debug, Clone)]
struct StoredBlock {
    tree: MerkleTree,
    // document id -> leaf position
    positions: HashMap<String, usize>,
}

/// In-memory chain of sealed blocks and registered accounts.
#[derive(Debug, Clone, Default)]
pub struct MemoryChain {
    blocks: HashMap<String, StoredBlock>,
    accounts: HashMap<Address, PublicKey>,
}

impl MemoryChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal a block from `(document_id, document)` pairs in block order.
    ///
    /// Returns the block's root commitment. Sealing an existing id
    /// replaces the block.
    pub fn seal_block<'a, I>(&mut self, block_id: impl Into<String>, documents: I) -> [u8; 32]
    where
        I: IntoIterator<Item = (&'a str, &'a Document)>,
    {
        let mut positions = HashMap::new();
        let mut leaves = Vec::new();
        for (index, (document_id, document)) in documents.into_iter().enumerate() {
            positions.insert(document_id.to_string(), index);
            leaves.push(fingerprint(document).0);
        }

        let tree = MerkleTree::from_leaves(leaves);
        let root = tree.root();
        self.blocks.insert(block_id.into(), StoredBlock { tree, positions });
        root
    }

    /// Register an account key under its derived address.
    pub fn register_account(&mut self, public_key: PublicKey) -> Address {
        let address = derive_address(&public_key);
        self.accounts.insert(address, public_key);
        address
    }

    fn block(&self, block_id: &str) -> Result<&StoredBlock, SourceError> {
        self.blocks
            .get(block_id)
            .ok_or_else(|| SourceError::NotFound(format!("block {block_id}")))
    }
}

impl ChainSource for MemoryChain {
    fn inclusion_proof(
        &self,
        block_id: &str,
        document_id: &str,
    ) -> Result<InclusionProof, SourceError> {
        let block = self.block(block_id)?;
        block
            .positions
            .get(document_id)
            .and_then(|&index| block.tree.proof(index, block_id, document_id))
            .ok_or_else(|| SourceError::NotFound(format!("document {document_id} in {block_id}")))
    }

    fn block_root(&self, block_id: &str) -> Result<[u8; 32], SourceError> {
        self.block(block_id).map(|block| block.tree.root())
    }

    fn block_leaf_count(&self, block_id: &str) -> Result<Option<u64>, SourceError> {
        self.block(block_id).map(|block| Some(block.tree.leaf_count() as u64))
    }

    fn account_public_key(&self, address: &Address) -> Result<PublicKey, SourceError> {
        self.accounts
            .get(address)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("account {address}")))
    }
}

/// Verifies document inclusion against a [`ChainSource`].
#[derive(Debug, Clone)]
pub struct InclusionVerifier<S> {
    source: S,
}

impl<S: ChainSource> InclusionVerifier<S> {
    /// Wrap a chain source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch proof, root and document count for `(block_id, document_id)`
    /// and check that `document` is committed there.
    ///
    /// Only source failures are errors; every verification verdict is an
    /// [`InclusionOutcome`].
    pub fn verify(
        &self,
        block_id: &str,
        document_id: &str,
        document: &Document,
    ) -> Result<InclusionOutcome, SourceError> {
        let proof = self.source.inclusion_proof(block_id, document_id)?;
        let root = self.source.block_root(block_id)?;
        let published = self.source.block_leaf_count(block_id)?;
        debug!(block_id, document_id, siblings = proof.siblings.len(), "fetched inclusion proof");
        Ok(verify_inclusion_with_count(&proof, &root, published, block_id, document_id, document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proof::ProofError;
    use crate::KeyPair;

    fn sample_chain() -> (MemoryChain, Vec<Document>) {
        let documents: Vec<Document> = ["a", "b", "c"]
            .iter()
            .map(|name| Document::new().with("name", *name))
            .collect();
        let mut chain = MemoryChain::new();
        chain.seal_block(
            "block-1",
            vec![("d0", &documents[0]), ("d1", &documents[1]), ("d2", &documents[2])],
        );
        (chain, documents)
    }

    #[test]
    fn test_verifier_accepts_committed_documents() {
        let (chain, documents) = sample_chain();
        let verifier = InclusionVerifier::new(&chain);

        for (i, doc) in documents.iter().enumerate() {
            let outcome = verifier.verify("block-1", &format!("d{i}"), doc).unwrap();
            assert!(outcome.is_verified());
        }
    }

    #[test]
    fn test_verifier_flags_altered_document() {
        let (chain, _) = sample_chain();
        let verifier = InclusionVerifier::new(chain);
        let forged = Document::new().with("name", "B");

        let outcome = verifier.verify("block-1", "d1", &forged).unwrap();
        assert!(matches!(outcome, InclusionOutcome::MismatchedRoot { .. }));
    }

    #[test]
    fn test_unknown_subjects_are_not_found() {
        let (chain, documents) = sample_chain();
        let verifier = InclusionVerifier::new(&chain);

        assert!(matches!(
            verifier.verify("block-9", "d0", &documents[0]),
            Err(SourceError::NotFound(_))
        ));
        assert!(matches!(
            verifier.verify("block-1", "d9", &documents[0]),
            Err(SourceError::NotFound(_))
        ));
    }

    struct StretchedProofs(MemoryChain);

    impl ChainSource for StretchedProofs {
        fn inclusion_proof(
            &self,
            block_id: &str,
            document_id: &str,
        ) -> Result<InclusionProof, SourceError> {
            let mut proof = self.0.inclusion_proof(block_id, document_id)?;
            proof.leaf_count += 1;
            proof.leaf_index += 1;
            Ok(proof)
        }

        fn block_root(&self, block_id: &str) -> Result<[u8; 32], SourceError> {
            self.0.block_root(block_id)
        }

        fn block_leaf_count(&self, block_id: &str) -> Result<Option<u64>, SourceError> {
            self.0.block_leaf_count(block_id)
        }

        fn account_public_key(&self, address: &Address) -> Result<PublicKey, SourceError> {
            self.0.account_public_key(address)
        }
    }

    #[test]
    fn test_verifier_rejects_stretched_leaf_count() {
        let (chain, documents) = sample_chain();
        assert_eq!(chain.block_leaf_count("block-1").unwrap(), Some(3));

        let verifier = InclusionVerifier::new(StretchedProofs(chain));
        let outcome = verifier.verify("block-1", "d2", &documents[2]).unwrap();
        assert!(matches!(
            outcome,
            InclusionOutcome::MalformedProof(ProofError::LeafCountMismatch {
                claimed: 4,
                published: 3
            })
        ));
    }

    #[test]
    fn test_account_lookup() {
        let mut chain = MemoryChain::new();
        let kp = KeyPair::generate();
        let address = chain.register_account(kp.public_key());

        assert_eq!(chain.account_public_key(&address).unwrap(), kp.public_key());
        let other = derive_address(&KeyPair::generate().public_key());
        assert!(chain.account_public_key(&other).is_err());
    }

    #[test]
    fn test_empty_block_root_is_zero() {
        let mut chain = MemoryChain::new();
        let root = chain.seal_block("empty", Vec::<(&str, &Document)>::new());
        assert_eq!(root, [0u8; 32]);
        assert_eq!(chain.block_root("empty").unwrap(), [0u8; 32]);
    }
}
