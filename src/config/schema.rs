//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so minimal configs stay minimal.

use serde::{Deserialize, Serialize};

/// Root configuration for the wallet connector.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Network to operate on (chain id, RPC endpoints, wallet URL).
    pub network: NetworkConfig,

    /// RPC client behaviour.
    pub rpc: RpcConfig,
}

impl ConnectorConfig {
    /// Preset for NEAR mainnet.
    pub fn mainnet() -> Self {
        Self {
            network: NetworkConfig {
                network_id: "mainnet".to_string(),
                endpoints: vec![
                    "https://rpc.mainnet.near.org".to_string(),
                    "https://rpc.mainnet.fastnear.com".to_string(),
                ],
                wallet_url: "https://app.mynearwallet.com".to_string(),
                app_url: String::new(),
            },
            rpc: RpcConfig::default(),
        }
    }

    /// Preset for NEAR testnet.
    pub fn testnet() -> Self {
        Self {
            network: NetworkConfig {
                network_id: "testnet".to_string(),
                endpoints: vec![
                    "https://rpc.testnet.near.org".to_string(),
                    "https://rpc.testnet.fastnear.com".to_string(),
                ],
                wallet_url: "https://testnet.mynearwallet.com".to_string(),
                app_url: String::new(),
            },
            rpc: RpcConfig::default(),
        }
    }
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chain identifier, also the storage namespace ("mainnet", "testnet").
    pub network_id: String,

    /// Candidate RPC endpoints, tried in order with rotation.
    pub endpoints: Vec<String>,

    /// Base URL of the external wallet's signing pages.
    pub wallet_url: String,

    /// Base URL the wallet redirects back to after signing.
    pub app_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        ConnectorConfig::mainnet().network
    }
}

/// RPC client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Initial per-request timeout in milliseconds; also the adaptive floor.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry budget per endpoint before giving up.
    #[serde(default = "default_tries_per_endpoint")]
    pub tries_per_endpoint: u32,

    /// Whether the timeout grows after timed-out requests.
    #[serde(default = "default_adaptive_timeout")]
    pub adaptive_timeout: bool,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_tries_per_endpoint() -> u32 {
    3
}

fn default_adaptive_timeout() -> bool {
    true
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            tries_per_endpoint: default_tries_per_endpoint(),
            adaptive_timeout: default_adaptive_timeout(),
        }
    }
}
