use std::{fs, path::Path};

use anyhow::{anyhow, Result};
use enhancer_sdk::{ConnectionState, HttpLedger, Network};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancerConfig {
    #[serde(default)]
    pub network: Network,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer_url: Option<String>,
    /// Last connected wallet session.
    #[serde(default)]
    pub wallet: ConnectionState,
}

impl EnhancerConfig {
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)?;
        serde_json::from_str(&config_str).map_err(|e| anyhow!("Failed to parse config: {}", e))
    }

    pub fn save(&self, config_dir: &Path) -> Result<()> {
        fs::create_dir_all(config_dir)?;
        let config_str = serde_json::to_string_pretty(self)?;
        fs::write(config_dir.join(CONFIG_FILE), config_str)?;
        Ok(())
    }

    /// Applies command line overrides. Switching network drops endpoint
    /// overrides that belonged to the previous one.
    pub fn update_from_cli_args(
        &mut self,
        network: Option<Network>,
        node_url: Option<String>,
        indexer_url: Option<String>,
    ) {
        if let Some(network) = network {
            if network != self.network {
                self.node_url = None;
                self.indexer_url = None;
                self.wallet = ConnectionState::default();
            }
            self.network = network;
        }
        if let Some(node_url) = node_url {
            self.node_url = Some(node_url);
        }
        if let Some(indexer_url) = indexer_url {
            self.indexer_url = Some(indexer_url);
        }
    }

    pub fn node_url(&self) -> &str {
        self.node_url
            .as_deref()
            .unwrap_or_else(|| self.network.node_url())
    }

    pub fn indexer_url(&self) -> &str {
        self.indexer_url
            .as_deref()
            .unwrap_or_else(|| self.network.indexer_url())
    }

    pub fn ledger(&self) -> HttpLedger {
        HttpLedger::with_urls(self.node_url(), self.indexer_url())
    }
}
