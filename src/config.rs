// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Node configuration: a thin TOML parse layer over the structs the rest
//! of the crate consumes.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors while loading node configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the config file from disk.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file did not parse as valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Root node configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node settings.
    pub node: NodeSettings,
    /// HTTP introspection endpoint.
    pub http: HttpConfig,
    /// P2P settings.
    pub p2p: P2pConfig,
    /// Consensus / trust settings.
    pub consensus: ConsensusConfig,
    /// Ledger backend selection.
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Node-wide settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Human-readable name, used only in logs.
    pub name: String,
    /// Data directory: identity file, database, peer history.
    pub data_dir: String,
    /// Optional passphrase encrypting the node identity file at rest.
    #[serde(default)]
    pub identity_passphrase: Option<String>,
}

/// HTTP introspection endpoint config.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Listen address, e.g. `0.0.0.0:7076`.
    pub listen_addr: String,
}

/// P2P transport and peer-management settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct P2pConfig {
    /// TCP listen address, e.g. `0.0.0.0:7075`.
    pub listen_addr: String,
    /// Network id byte pair embedded in every wire header.
    pub network_id: [u8; 2],
    /// Protocol version triple (max, using, min).
    pub protocol_version: (u8, u8, u8),
    /// Maximum concurrently tracked live peers.
    #[serde(default = "default_max_live_peers")]
    pub max_live_peers: usize,
    /// Maximum concurrently tracked bootstrap peers.
    #[serde(default = "default_max_bootstrap_peers")]
    pub max_bootstrap_peers: usize,
    /// Peers dialed unconditionally at startup, bypassing the saved peer store.
    #[serde(default)]
    pub static_nodes: Vec<String>,
    /// Trusted bootstrap seeds consulted before falling back to gossiped peers.
    #[serde(default)]
    pub trusted_nodes: Vec<String>,
}

fn default_max_live_peers() -> usize {
    256
}

fn default_max_bootstrap_peers() -> usize {
    32
}

/// Consensus and trust settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Genesis block, hex-encoded per `spec.md` §4.1 block wire format.
    pub genesis_block_hex: String,
    /// Addresses (hex) treated as Trusted Principal Representatives:
    /// their single vote cements a block immediately.
    #[serde(default)]
    pub trusted_prs: HashMap<String, bool>,
}

/// Ledger backend selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseBackend {
    /// Single JSON file, human-inspectable, default for small deployments.
    Json,
    /// `sled` embedded KV store.
    Sled,
}

impl Default for DatabaseBackend {
    fn default() -> Self {
        DatabaseBackend::Json
    }
}

/// Ledger backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Which `LedgerFacade` implementation to construct.
    #[serde(default)]
    pub backend: DatabaseBackend,
}

impl NodeConfig {
    /// Load and parse a TOML config file from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let cfg: NodeConfig = toml::from_str(&raw)?;
        Ok(cfg)
    }
}
