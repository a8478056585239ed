use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::infrastructure::id_codec::DEFAULT_EPOCH_MILLIS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub shard_config_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            shard_config_path: env::var("SHARD_CONFIG")
                .unwrap_or_else(|_| "config/shards.json".to_string())
                .into(),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn load_sharding(&self) -> AppResult<ShardingConfig> {
        ShardingConfig::from_file(&self.shard_config_path)
    }
}

/// Opaque per-database connection settings; only the pool builders read them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSpec {
    pub url: String,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl ConnectionSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: None,
        }
    }
}

/// One shard cluster as written in configuration, before validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardClusterConfig {
    pub databases: Vec<ConnectionSpec>,
    /// Number of physical databases
    pub count: u32,
    pub logical_shards: u32,
    /// Logical shards per physical database
    pub mapping: u32,
}

fn default_epoch() -> i64 {
    DEFAULT_EPOCH_MILLIS
}

/// Top-level sharding configuration: the id epoch plus every named cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardingConfig {
    #[serde(default = "default_epoch")]
    pub epoch_millis: i64,
    pub clusters: BTreeMap<String, ShardClusterConfig>,
}

impl ShardingConfig {
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse shard config: {}", e)))
    }

    pub fn from_file(path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!(
                "Failed to read shard config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }
}
