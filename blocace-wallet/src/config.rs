//! Wallet configuration.

use std::path::PathBuf;

use blocace_sdk::ClientConfig;

use crate::cli::Cli;

/// Default key file name inside the keystore.
pub const DEFAULT_KEY_NAME: &str = "default.key";

/// Complete wallet configuration.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Directory holding encrypted key files.
    pub keystore_dir: PathBuf,
    /// Node REST URL.
    pub node_url: String,
    /// Log level.
    pub log_level: String,
}

impl WalletConfig {
    /// Create a wallet configuration from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            keystore_dir: cli.expanded_keystore(),
            node_url: cli.node.clone(),
            log_level: cli.log_level.clone(),
        }
    }

    /// Path of a named key file.
    pub fn key_path(&self, name: Option<&str>) -> PathBuf {
        self.keystore_dir.join(name.unwrap_or(DEFAULT_KEY_NAME))
    }

    /// Client settings for the configured node.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.node_url.clone())
    }
}
