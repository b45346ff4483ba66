//! Client configuration.
//!
//! Stored as a camelCase JSON file; every field is optional.

use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Address of the public file service.
pub const DEFAULT_ENDPOINT: &str = "https://stocksharp.com/services/fileservice.svc";

/// Settings of a [`FileClient`](crate::FileClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// Service address, consumed by whoever builds the transport.
    pub endpoint: String,

    /// Negotiate deflate compression for transfers.
    pub use_compression: bool,

    /// Compare each downloaded body with the fingerprint reported by the service.
    pub verify_download_hash: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            use_compression: true,
            verify_download_hash: false,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from `path`.
    ///
    /// A missing file yields defaults. A file that fails to parse is logged
    /// and also yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no client config, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse client config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Writes configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "client config saved");
        Ok(())
    }
}
