//! Command-line argument parsing.

use std::path::PathBuf;

use blocace_sdk::DEFAULT_NODE_URL;
use clap::{Parser, Subcommand};

/// Blocace wallet.
#[derive(Parser, Debug, Clone)]
#[command(name = "blocace-wallet")]
#[command(about = "Command-line keystore, signer and auditor for Blocace")]
#[command(version)]
pub struct Cli {
    /// Keystore directory.
    #[arg(long, global = true, env = "BLOCACE_KEYSTORE", default_value = "~/.blocace/keystore")]
    pub keystore: PathBuf,

    /// Node REST URL.
    #[arg(long, global = true, env = "BLOCACE_NODE", default_value = DEFAULT_NODE_URL)]
    pub node: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    // === Offline Commands ===
    /// Generate a new key and store it encrypted.
    Generate {
        /// Key file name (default: default.key).
        #[arg(long)]
        name: Option<String>,
    },

    /// Import a raw hex private key, or an encrypted backup with --backup.
    Import {
        /// Encrypted backup file to import instead of a raw key.
        #[arg(long)]
        backup: Option<PathBuf>,

        /// Key file name (default: default.key).
        #[arg(long)]
        name: Option<String>,
    },

    /// Write the key as an encrypted backup file.
    Export {
        /// Path for the backup file.
        file: PathBuf,

        /// Key file name (default: default.key).
        #[arg(long)]
        name: Option<String>,
    },

    /// Display the address and public key.
    Show {
        /// Key file name (default: default.key).
        #[arg(long)]
        name: Option<String>,
    },

    /// Sign a JSON document and print the envelope.
    Sign {
        /// JSON document file.
        document: PathBuf,

        /// Collection mapping used to type datetime and geopoint fields.
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Key file name (default: default.key).
        #[arg(long)]
        name: Option<String>,
    },

    /// Check a detached signature over a JSON document.
    Verify {
        /// JSON document file.
        document: PathBuf,

        /// Signature, 128 hex chars.
        #[arg(long)]
        signature: String,

        /// Signer public key, 128 hex chars.
        #[arg(long)]
        public_key: String,

        /// Collection mapping used to type datetime and geopoint fields.
        #[arg(long)]
        schema: Option<PathBuf>,
    },

    // === Online Commands ===
    /// Sign a JSON document and submit it to a collection.
    Submit {
        /// JSON document file.
        document: PathBuf,

        /// Target collection.
        #[arg(long)]
        collection: String,

        /// Collection mapping used to type datetime and geopoint fields.
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Key file name (default: default.key).
        #[arg(long)]
        name: Option<String>,
    },

    /// Check that a document is committed in a block.
    VerifyInclusion {
        /// JSON document file.
        document: PathBuf,

        /// Block id.
        #[arg(long)]
        block: String,

        /// Document id within the block.
        #[arg(long)]
        id: String,

        /// Collection mapping used to type datetime and geopoint fields.
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Key file name used to authenticate (default: default.key).
        #[arg(long)]
        name: Option<String>,
    },

    /// Search a collection and audit every hit.
    Audit {
        /// Collection to search.
        #[arg(long)]
        collection: String,

        /// Text to match.
        #[arg(long)]
        text: String,

        /// Field to match in.
        #[arg(long)]
        field: String,

        /// Maximum hits.
        #[arg(long, default_value = "10")]
        size: u32,

        /// Key file name used to authenticate (default: default.key).
        #[arg(long)]
        name: Option<String>,
    },
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Expand the keystore path (handle ~ for home).
    pub fn expanded_keystore(&self) -> PathBuf {
        let path_str = self.keystore.to_string_lossy();
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
        self.keystore.clone()
    }
}
