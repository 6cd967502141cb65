//! CLI configuration.
//!
//! Persistent settings for the command-line client: endpoint, network, the
//! preferred signing account, and optional protocol-address overrides for
//! deployments the client does not know built in.

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::chain::RpcConfig;
use crate::core::{parse_address, ProtocolConfig};
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// CLI CONFIGURATION
// ═══════════════════════════════════════════════════════════════════════════════

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// JSON-RPC endpoint URL, wallet-backed
    pub rpc_url: String,
    /// Network the endpoint is expected to serve
    pub network: Network,
    /// Preferred signing account; first wallet account when unset
    pub account: Option<Address>,
    /// Protocol addresses, overriding the network's built-in deployment
    pub protocol: Option<ProtocolConfig>,
    /// Per-request transport timeout in seconds
    pub timeout_secs: u64,
    /// Delay between receipt polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            network: Network::Sepolia,
            account: None,
            protocol: None,
            timeout_secs: 120,
            poll_interval_ms: 1_000,
        }
    }
}

impl CliConfig {
    /// Load from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Load from file when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| Error::Io(e.to_string()))
    }

    /// Overlay settings from `USDD_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("USDD_RPC_URL") {
            self.rpc_url = url;
        }

        if let Ok(network) = std::env::var("USDD_NETWORK") {
            self.network = network.parse()?;
        }

        if let Ok(account) = std::env::var("USDD_ACCOUNT") {
            self.account = Some(parse_address(&account)?);
        }

        if let Ok(timeout) = std::env::var("USDD_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.timeout_secs = secs;
            }
        }

        Ok(())
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Default config file path
    pub fn default_path() -> PathBuf {
        default_data_dir().join("config.json")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(Error::Config("RPC URL cannot be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout must be greater than 0".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll interval must be greater than 0".into()));
        }
        if let Some(protocol) = &self.protocol {
            protocol.validate()?;
        }
        Ok(())
    }

    /// The protocol deployment to target: the explicit override when set,
    /// otherwise the network's built-in deployment
    pub fn resolve_protocol(&self) -> Result<ProtocolConfig> {
        if let Some(protocol) = &self.protocol {
            return Ok(protocol.clone());
        }
        match self.network {
            Network::Sepolia => Ok(ProtocolConfig::sepolia()),
            Network::Mainnet | Network::Local => Err(Error::Config(format!(
                "no built-in deployment for {}; set protocol addresses in the config file",
                self.network
            ))),
        }
    }

    /// Transport settings for the JSON-RPC provider
    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            url: self.rpc_url.clone(),
            timeout_ms: self.timeout_secs * 1_000,
            poll_interval_ms: self.poll_interval_ms,
            ..RpcConfig::default()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NETWORK
// ═══════════════════════════════════════════════════════════════════════════════

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Ethereum mainnet
    Mainnet,
    /// Sepolia testnet
    Sepolia,
    /// Local development chain
    Local,
}

impl Network {
    /// Get network name
    pub fn name(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Sepolia => "sepolia",
            Network::Local => "local",
        }
    }

    /// Chain ID the endpoint should report, where fixed
    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Network::Mainnet => Some(1),
            Network::Sepolia => Some(11_155_111),
            Network::Local => None,
        }
    }

    /// Check if production network
    pub fn is_production(&self) -> bool {
        matches!(self, Network::Mainnet)
    }
}

impl std::str::FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "sepolia" | "testnet" | "test" => Ok(Network::Sepolia),
            "local" | "dev" => Ok(Network::Local),
            _ => Err(Error::Config(format!("unknown network: {}", s))),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPER FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Get default data directory
fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(".usdd");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join("Library/Application Support/USDD");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("USDD");
        }
    }

    PathBuf::from(".usdd")
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
