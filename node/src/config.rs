//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use examcert_ledger::MetadataLinks;
use examcert_types::WalletAddress;

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for an examcert node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for ledger storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Genesis administrator, required only when initialising a fresh data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<WalletAddress>,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `external_url` placed in generated certificate metadata.
    #[serde(default = "default_metadata_base_url")]
    pub metadata_base_url: String,

    /// Prefix joined with the evidence image hash in generated metadata.
    #[serde(default = "default_image_gateway")]
    pub image_gateway: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./examcert_data")
}

fn default_map_size_mb() -> usize {
    64
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metadata_base_url() -> String {
    MetadataLinks::default().external_url
}

fn default_image_gateway() -> String {
    MetadataLinks::default().image_gateway
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    /// Parsed log format, falling back to human output on an unknown value.
    pub fn log_format(&self) -> LogFormat {
        self.log_format.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to human log format");
            LogFormat::Human
        })
    }

    pub fn metadata_links(&self) -> MetadataLinks {
        MetadataLinks {
            image_gateway: self.image_gateway.clone(),
            external_url: self.metadata_base_url.clone(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            admin: None,
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            metadata_base_url: default_metadata_base_url(),
            image_gateway: default_image_gateway(),
        }
    }
}
