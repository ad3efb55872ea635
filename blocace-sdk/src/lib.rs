//! Blocace SDK - Node client with client-side signing and auditing.
//!
//! This crate wraps the REST API of a Blocace node. Documents are signed
//! locally before submission, and anything the node returns can be checked
//! locally: signatures against the author's registered key, and block
//! membership against the block's published Merkle root.
//!
//! # Usage
//!
//! ```rust,no_run
//! use blocace_core::{Document, Identity};
//! use blocace_sdk::{BlocaceClient, ClientConfig, QueryPayload};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let identity = Identity::from_hex(
//!     "277d271593d205c6078964c31fb393303efd76d5297906f60d2a7a7d7d12c99a",
//! )?;
//! let client = BlocaceClient::new(ClientConfig::new("http://localhost:6899"), identity)?;
//!
//! client.sign_and_put_document(&Document::new().with("name", "Carly Compton"), "new1").await?;
//!
//! let hits = client.query(&QueryPayload::matching("Compton", "name"), "new1").await?.hits;
//! for hit in &hits {
//!     let audit = client.audit_hit(hit).await?;
//!     println!("{}: {}", hit.id, audit.inclusion);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Nothing is retried; transport policy belongs to the caller.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod types;

pub use client::BlocaceClient;
pub use config::{ClientConfig, DEFAULT_NODE_URL, DEFAULT_TIMEOUT};
pub use error::{ClientError, Result};
pub use types::{
    Account, AccountPayload, AddressResponse, BlockInfo, BlockchainInfo, DocumentReceipt,
    HitAudit, MessageResponse, Permission, QueryHit, QueryPayload, QueryResponse,
};
