//! Blocace Wallet - Command-line keystore, signer and auditor.
//!
//! # Usage
//!
//! ## Offline Commands (no node needed)
//!
//! ```bash
//! # Generate a new identity
//! blocace-wallet generate
//!
//! # Import a raw private key (prompted) or an encrypted backup
//! blocace-wallet import
//! blocace-wallet import --backup backup.key
//!
//! # Sign a document and print the envelope
//! blocace-wallet sign doc.json --schema mapping.json
//!
//! # Check a detached signature
//! blocace-wallet verify doc.json --signature <hex> --public-key <hex>
//! ```
//!
//! ## Online Commands (uses --node, default http://localhost:6899)
//!
//! ```bash
//! # Submit a signed document
//! blocace-wallet submit doc.json --collection new1
//!
//! # Check block inclusion of a document
//! blocace-wallet verify-inclusion doc.json --block <block_id> --id <doc_id>
//!
//! # Search and audit every hit
//! blocace-wallet audit --collection new1 --text Compton --field name
//! ```

mod cli;
mod commands;
mod config;
mod keystore;

use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::config::WalletConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = WalletConfig::from_cli(&cli);
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        keystore = %config.keystore_dir.display(),
        node = %config.node_url,
        log_level = %config.log_level,
        "wallet starting"
    );

    match cli.command {
        Commands::Generate { name } => commands::generate(&config, name.as_deref()),
        Commands::Import { backup, name } => {
            commands::import(&config, backup.as_deref(), name.as_deref())
        }
        Commands::Export { file, name } => commands::export(&config, &file, name.as_deref()),
        Commands::Show { name } => commands::show(&config, name.as_deref()),
        Commands::Sign {
            document,
            schema,
            name,
        } => commands::sign(&config, &document, schema.as_deref(), name.as_deref()),
        Commands::Verify {
            document,
            signature,
            public_key,
            schema,
        } => commands::verify(&document, &signature, &public_key, schema.as_deref()),

        Commands::Submit {
            document,
            collection,
            schema,
            name,
        } => {
            commands::submit(&config, &document, &collection, schema.as_deref(), name.as_deref())
                .await
        }
        Commands::VerifyInclusion {
            document,
            block,
            id,
            schema,
            name,
        } => {
            commands::verify_inclusion(
                &config,
                &document,
                &block,
                &id,
                schema.as_deref(),
                name.as_deref(),
            )
            .await
        }
        Commands::Audit {
            collection,
            text,
            field,
            size,
            name,
        } => commands::audit(&config, &collection, &text, &field, size, name.as_deref()).await,
    }
}
