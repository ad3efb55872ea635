//! Subcommand implementations.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use blocace_core::{verify_document, Identity, InclusionOutcome};
use blocace_sdk::{BlocaceClient, QueryPayload};
use tracing::info;

use crate::config::WalletConfig;
use crate::keystore::{load_identity, read_document, read_key_file, save_identity};

fn prompt_password(prompt: &str) -> Result<String> {
    rpassword::prompt_password(prompt).context("failed to read password")
}

fn prompt_password_confirm() -> Result<String> {
    let pass1 = prompt_password("Enter password: ")?;
    let pass2 = prompt_password("Confirm password: ")?;
    if pass1 != pass2 {
        bail!("passwords do not match");
    }
    Ok(pass1)
}

fn unlock(config: &WalletConfig, name: Option<&str>) -> Result<Identity> {
    let path = config.key_path(name);
    let password = prompt_password("Enter password: ")?;
    load_identity(&path, &password)
}

fn connect(config: &WalletConfig, name: Option<&str>) -> Result<BlocaceClient> {
    let identity = unlock(config, name)?;
    Ok(BlocaceClient::new(config.client_config(), identity)?)
}

fn print_identity(heading: &str, identity: &Identity, path: Option<&Path>) {
    println!("{heading}");
    println!("  Address:    {}", identity.address());
    println!("  Public Key: {}", identity.public_key_hex());
    if let Some(path) = path {
        println!("  Saved to:   {}", path.display());
    }
}

// ============================================================================
// Offline Commands
// ============================================================================

pub fn generate(config: &WalletConfig, name: Option<&str>) -> Result<()> {
    let path = config.key_path(name);
    if path.exists() {
        bail!("key already exists: {}", path.display());
    }

    let identity = Identity::generate();
    let password = prompt_password_confirm()?;
    save_identity(&path, &identity, &password)?;

    info!(address = %identity.address(), "generated key");
    print_identity("Generated new identity:", &identity, Some(&path));
    Ok(())
}

pub fn import(config: &WalletConfig, backup: Option<&Path>, name: Option<&str>) -> Result<()> {
    let path = config.key_path(name);
    if path.exists() {
        bail!("key already exists: {}", path.display());
    }

    let identity = match backup {
        Some(file) => {
            let blob = read_key_file(file)?;
            let password = prompt_password("Enter backup password: ")?;
            Identity::from_vault(&blob, &password).context("failed to decrypt backup")?
        }
        None => {
            let key_hex = prompt_password("Enter private key (hex): ")?;
            Identity::from_hex(key_hex.trim()).context("invalid private key")?
        }
    };

    println!("Set password for the keystore:");
    let password = prompt_password_confirm()?;
    save_identity(&path, &identity, &password)?;

    print_identity("Imported identity:", &identity, Some(&path));
    Ok(())
}

pub fn export(config: &WalletConfig, file: &Path, name: Option<&str>) -> Result<()> {
    if file.exists() {
        bail!("file already exists: {}", file.display());
    }
    let identity = unlock(config, name)?;

    println!("Set password for the backup file:");
    let password = prompt_password_confirm()?;
    let blob = identity.to_vault(&password)?;
    fs::write(file, blob).with_context(|| format!("failed to write {}", file.display()))?;

    println!("Exported backup to {}", file.display());
    Ok(())
}

pub fn show(config: &WalletConfig, name: Option<&str>) -> Result<()> {
    let identity = unlock(config, name)?;
    print_identity("Identity:", &identity, None);
    Ok(())
}

pub fn sign(
    config: &WalletConfig,
    document: &Path,
    schema: Option<&Path>,
    name: Option<&str>,
) -> Result<()> {
    let document = read_document(document, schema)?;
    let identity = unlock(config, name)?;
    let envelope = identity.sign(document)?;

    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &envelope)?;
    writeln!(out)?;
    Ok(())
}

pub fn verify(
    document: &Path,
    signature: &str,
    public_key: &str,
    schema: Option<&Path>,
) -> Result<()> {
    let document = read_document(document, schema)?;
    if verify_document(&document, signature, public_key) {
        println!("Signature valid");
        Ok(())
    } else {
        bail!("signature does not match document and public key")
    }
}

// ============================================================================
// Online Commands
// ============================================================================

pub async fn submit(
    config: &WalletConfig,
    document: &Path,
    collection: &str,
    schema: Option<&Path>,
    name: Option<&str>,
) -> Result<()> {
    let document = read_document(document, schema)?;
    let client = connect(config, name)?;

    let receipt = client.sign_and_put_document(&document, collection).await?;
    println!("Document submitted to '{collection}'");
    if let Some(fingerprint) = receipt.fingerprint {
        println!("  Fingerprint: {fingerprint}");
    }
    if let Some(status) = receipt.status {
        println!("  Status:      {status}");
    }
    Ok(())
}

pub async fn verify_inclusion(
    config: &WalletConfig,
    document: &Path,
    block: &str,
    id: &str,
    schema: Option<&Path>,
    name: Option<&str>,
) -> Result<()> {
    let document = read_document(document, schema)?;
    let client = connect(config, name)?;

    let outcome = client.verify_transaction(block, id, &document).await?;
    println!("{outcome}");
    match outcome {
        InclusionOutcome::Verified => Ok(()),
        InclusionOutcome::MismatchedRoot { .. } => {
            bail!("document {id} is NOT committed in block {block}")
        }
        InclusionOutcome::MalformedProof(e) => bail!("cannot verify: {e}"),
    }
}

pub async fn audit(
    config: &WalletConfig,
    collection: &str,
    text: &str,
    field: &str,
    size: u32,
    name: Option<&str>,
) -> Result<()> {
    let client = connect(config, name)?;
    let query = QueryPayload::matching(text, field).page(0, size);
    let reply = client.query(&query, collection).await?;

    let mut untrusted = 0usize;
    for hit in &reply.hits {
        let audit = client.audit_hit(hit).await?;
        let verdict = if audit.is_trusted() { "ok" } else { "FAILED" };
        println!(
            "{verdict:6} {} block={} signature={} inclusion={}",
            hit.id,
            hit.block_id,
            if audit.signature_valid { "valid" } else { "invalid" },
            audit.inclusion
        );
        if !audit.is_trusted() {
            untrusted += 1;
        }
    }

    if untrusted > 0 {
        bail!("{untrusted} of {} hits failed audit", reply.hits.len());
    }
    println!("{} hits audited", reply.hits.len());
    Ok(())
}
