//! Request and response bodies of the node REST API.

use blocace_core::proof::hex_hash;
use blocace_core::{Address, Document, Fingerprint, InclusionOutcome};
use serde::{Deserialize, Serialize};

/// Account registration and update payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    /// Date of birth, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date_of_birth: String,
    /// Given name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    /// Family name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    /// Organization.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub company: String,
    /// Contact email.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    /// Contact phone.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub phone: String,
    /// Postal address.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub address: String,
    /// Account public key, 128 hex chars.
    pub public_key: String,
}

/// Per-collection access rights of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// Collections the account may write.
    #[serde(default)]
    pub collections_write: Vec<String>,
    /// Collections the account may read in full, bypassing encryption.
    #[serde(default)]
    pub collections_read_override: Vec<String>,
}

/// Account as stored by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Profile and key.
    #[serde(flatten)]
    pub profile: AccountPayload,
    /// Account role, e.g. `admin` or `user`.
    #[serde(default)]
    pub role: Option<String>,
    /// Granted access rights.
    #[serde(flatten)]
    pub permission: Permission,
}

/// `{address}` reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressResponse {
    /// Address of the affected account.
    pub address: Address,
}

/// `{message}` reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    /// Human-readable status.
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChallengeResponse {
    pub challenge: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct JwtRequest<'a> {
    pub address: String,
    pub signature: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JwtResponse {
    pub jwt: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionsResponse {
    pub collections: Vec<String>,
}

/// Node acknowledgement of a submitted document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentReceipt {
    /// Fingerprint the node computed.
    #[serde(default)]
    pub fingerprint: Option<Fingerprint>,
    /// Status text.
    #[serde(default)]
    pub status: Option<String>,
}

/// Full-text search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
    /// Page size.
    pub size: u32,
    /// Offset of the first hit.
    pub from: u32,
    /// Query expression in the node's query language.
    pub query: serde_json::Value,
}

impl QueryPayload {
    /// Match `text` in `field`, first page of ten.
    pub fn matching(text: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            size: 10,
            from: 0,
            query: serde_json::json!({
                "match": text.into(),
                "field": field.into(),
            }),
        }
    }

    /// Set the page.
    pub fn page(mut self, from: u32, size: u32) -> Self {
        self.from = from;
        self.size = size;
        self
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Block holding the document.
    #[serde(rename = "_blockId")]
    pub block_id: String,
    /// The document as submitted.
    #[serde(rename = "_source")]
    pub source: Document,
    /// Author's signature, hex.
    #[serde(rename = "_signature")]
    pub signature: String,
    /// Author's address.
    #[serde(rename = "_address", default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// Search reply.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResponse {
    /// Total matches, when reported.
    #[serde(default)]
    pub total: Option<u64>,
    /// Hits of the requested page.
    pub hits: Vec<QueryHit>,
}

/// Block header summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    /// Block id.
    pub block_id: String,
    /// Root commitment over the block's document fingerprints.
    #[serde(with = "hex_hash")]
    pub merkle_root: [u8; 32],
    /// Height in the chain.
    #[serde(default)]
    pub height: Option<u64>,
    /// Parent block id.
    #[serde(default)]
    pub last_block_id: Option<String>,
    /// Number of documents in the block.
    #[serde(default)]
    pub total_transactions: Option<u64>,
    /// Creation time, RFC 3339.
    #[serde(default)]
    pub date_time: Option<String>,
}

/// Chain summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainInfo {
    /// Tip block id.
    pub newest_block_id: String,
    /// Tip height.
    #[serde(default)]
    pub last_height: Option<u64>,
    /// Documents across all blocks.
    #[serde(default)]
    pub total_transactions: Option<u64>,
}

/// Result of auditing one search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitAudit {
    /// Whether the hit's signature verifies against its author's key.
    pub signature_valid: bool,
    /// Whether the hit is committed in its block.
    pub inclusion: InclusionOutcome,
}

impl HitAudit {
    /// Authored by the claimed account and committed on chain.
    pub fn is_trusted(&self) -> bool {
        self.signature_valid && self.inclusion.is_verified()
    }
}
