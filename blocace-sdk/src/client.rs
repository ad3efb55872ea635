//! HTTP client for a Blocace node.

use blocace_core::{
    verify_document, verify_inclusion_with_count, Address, CollectionSchema, Document, Identity,
    InclusionOutcome, InclusionProof, PublicKey,
};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::types::*;

/// Authenticated client bound to one signing identity.
///
/// # Example
///
/// ```rust,no_run
/// use blocace_core::{Document, Identity};
/// use blocace_sdk::{BlocaceClient, ClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let identity = Identity::generate();
/// let client = BlocaceClient::new(ClientConfig::default(), identity)?;
///
/// let doc = Document::new().with("name", "Carly Compton");
/// client.sign_and_put_document(&doc, "new1").await?;
/// # Ok(())
/// # }
/// ```
pub struct BlocaceClient {
    base_url: Url,
    http: Client,
    identity: Identity,
    jwt: Mutex<Option<String>>,
}

impl BlocaceClient {
    /// Build a client for the node in `config`, signing as `identity`.
    pub fn new(config: ClientConfig, identity: Identity) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(Self {
            base_url,
            http,
            identity,
            jwt: Mutex::new(None),
        })
    }

    /// Identity requests are signed with.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    // ==================== Authentication ====================

    /// Obtain a JWT by signing the node's login challenge.
    ///
    /// The token is cached and reused by later calls.
    pub async fn get_jwt(&self) -> Result<String> {
        let mut cached = self.jwt.lock().await;
        if let Some(jwt) = cached.as_ref() {
            return Ok(jwt.clone());
        }

        let address = self.identity.address().to_string();
        let url = self.endpoint(&["jwt", "challenge", &address])?;
        let challenge: ChallengeResponse = self.send(self.http.get(url)).await?;

        let signature = self.identity.sign_message(challenge.challenge.as_bytes())?;
        let signature = signature.to_hex();
        let url = self.endpoint(&["jwt"])?;
        let body = JwtRequest {
            address,
            signature: &signature,
        };
        let reply: JwtResponse = self.send(self.http.post(url).json(&body)).await?;

        debug!(address = %self.identity.address(), "obtained JWT");
        *cached = Some(reply.jwt.clone());
        Ok(reply.jwt)
    }

    // ==================== Accounts ====================

    /// Register an account.
    pub async fn create_account(&self, payload: &AccountPayload) -> Result<AddressResponse> {
        self.authorized_json(Method::POST, &["account"], payload).await
    }

    /// Fetch an account.
    pub async fn get_account(&self, address: &Address) -> Result<Account> {
        let address = address.to_string();
        self.authorized(Method::GET, &["account", &address]).await
    }

    /// Replace an account's profile.
    pub async fn update_account(
        &self,
        payload: &AccountPayload,
        address: &Address,
    ) -> Result<MessageResponse> {
        let address = address.to_string();
        self.authorized_json(Method::POST, &["account", &address], payload)
            .await
    }

    /// Grant collection read/write rights.
    pub async fn set_account_permission(
        &self,
        permission: &Permission,
        address: &Address,
    ) -> Result<MessageResponse> {
        let address = address.to_string();
        self.authorized_json(Method::POST, &["account", &address, "permission"], permission)
            .await
    }

    // ==================== Collections ====================

    /// Create a collection with its field mapping.
    pub async fn create_collection(&self, schema: &CollectionSchema) -> Result<MessageResponse> {
        self.authorized_json(Method::POST, &["collection"], schema).await
    }

    /// List collection names.
    pub async fn get_collections(&self) -> Result<Vec<String>> {
        let reply: CollectionsResponse = self.authorized(Method::GET, &["collections"]).await?;
        Ok(reply.collections)
    }

    /// Fetch a collection's field mapping.
    pub async fn get_collection(&self, name: &str) -> Result<CollectionSchema> {
        self.authorized(Method::GET, &["collection", name]).await
    }

    // ==================== Documents ====================

    /// Sign `document` and submit it to `collection`.
    pub async fn sign_and_put_document(
        &self,
        document: &Document,
        collection: &str,
    ) -> Result<DocumentReceipt> {
        let envelope = self.identity.sign(document.clone())?;
        debug!(collection, fingerprint = %envelope.fingerprint(), "submitting document");
        self.authorized_json(Method::PUT, &["document", collection], &envelope)
            .await
    }

    /// Search `collection`.
    pub async fn query(&self, payload: &QueryPayload, collection: &str) -> Result<QueryResponse> {
        self.authorized_json(Method::POST, &["search", collection], payload)
            .await
    }

    // ==================== Chain ====================

    /// Fetch a block summary.
    pub async fn get_block_info(&self, block_id: &str) -> Result<BlockInfo> {
        self.authorized(Method::GET, &["block", block_id]).await
    }

    /// Fetch the chain summary.
    pub async fn get_blockchain_info(&self) -> Result<BlockchainInfo> {
        self.authorized(Method::GET, &["info"]).await
    }

    /// Fetch the inclusion proof of a document.
    pub async fn fetch_inclusion_proof(
        &self,
        block_id: &str,
        document_id: &str,
    ) -> Result<InclusionProof> {
        self.authorized(Method::GET, &["verification", block_id, document_id])
            .await
    }

    /// Fetch a block's published root commitment.
    pub async fn fetch_block_root(&self, block_id: &str) -> Result<[u8; 32]> {
        Ok(self.get_block_info(block_id).await?.merkle_root)
    }

    /// Fetch the registered public key of an account.
    pub async fn fetch_account_public_key(&self, address: &Address) -> Result<PublicKey> {
        let account = self.get_account(address).await?;
        PublicKey::from_hex(&account.profile.public_key).map_err(|e| {
            ClientError::InvalidResponse(format!("account {address} public key: {e}"))
        })
    }

    // ==================== Verification ====================

    /// Check that `document` is committed in `block_id` as `document_id`.
    ///
    /// The fingerprint is always recomputed locally; only the proof and the
    /// block summary come from the node. The proof's leaf count must match
    /// the block's published document count when the node reports one.
    pub async fn verify_transaction(
        &self,
        block_id: &str,
        document_id: &str,
        document: &Document,
    ) -> Result<InclusionOutcome> {
        let proof = self.fetch_inclusion_proof(block_id, document_id).await?;
        let block = self.get_block_info(block_id).await?;
        Ok(verify_inclusion_with_count(
            &proof,
            &block.merkle_root,
            block.total_transactions,
            block_id,
            document_id,
            document,
        ))
    }

    /// Check a search hit's signature and block inclusion.
    pub async fn audit_hit(&self, hit: &QueryHit) -> Result<HitAudit> {
        let address = hit.address.ok_or_else(|| {
            ClientError::InvalidResponse(format!("hit {} carries no author address", hit.id))
        })?;
        let public_key = self.fetch_account_public_key(&address).await?;
        let signature_valid = verify_document(&hit.source, &hit.signature, &public_key.to_hex());
        let inclusion = self
            .verify_transaction(&hit.block_id, &hit.id, &hit.source)
            .await?;

        Ok(HitAudit {
            signature_valid,
            inclusion,
        })
    }

    // ==================== Plumbing ====================

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn authorized<T: DeserializeOwned>(&self, method: Method, segments: &[&str]) -> Result<T> {
        let request = self.authorized_request(method, segments).await?;
        self.send(request).await
    }

    async fn authorized_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T> {
        let request = self.authorized_request(method, segments).await?.json(body);
        self.send(request).await
    }

    async fn authorized_request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let jwt = self.get_jwt().await?;
        let url = self.endpoint(segments)?;
        Ok(self.http.request(method, url).bearer_auth(jwt))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "node response");

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(response.url().path().to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}
