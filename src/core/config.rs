//! Configuration structures for plasma-publish
//!
//! Every field is optional so that layers (defaults, files, environment, CLI)
//! can be merged field by field. Accessors fall back to the built-in values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Directory the package step writes archives to
pub const DEFAULT_ARTIFACTS_DIR: &str = ".compose/artifacts";

/// Private-network repository, tried first
pub const DEFAULT_PRIMARY_DOMAIN: &str = "http://repositories.interaction.svc.skilld:8081";

/// Public repository, used when the private one does not answer
pub const DEFAULT_FALLBACK_DOMAIN: &str = "https://repositories.skilld.cloud";

/// Reachability probe timeout in seconds
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

/// Root configuration object
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublishConfig {
    /// Directory holding the packaged archive, relative to the project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<String>,

    /// Endpoint probed first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_domain: Option<String>,

    /// Endpoint used when the probe fails
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_domain: Option<String>,

    /// Probe timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_timeout_secs: Option<u64>,

    /// Encrypted keyring file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyring_path: Option<String>,
}

impl PublishConfig {
    pub fn artifacts_dir(&self) -> &str {
        self.artifacts_dir.as_deref().unwrap_or(DEFAULT_ARTIFACTS_DIR)
    }

    pub fn primary_domain(&self) -> &str {
        self.primary_domain.as_deref().unwrap_or(DEFAULT_PRIMARY_DOMAIN)
    }

    pub fn fallback_domain(&self) -> &str {
        self.fallback_domain
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_DOMAIN)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(
            self.probe_timeout_secs
                .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
        )
    }

    /// Configured keyring file, or the per-user default location
    pub fn keyring_path(&self) -> PathBuf {
        match &self.keyring_path {
            Some(path) => PathBuf::from(path),
            None => dirs::config_dir()
                .map(|dir| dir.join("plasma-publish"))
                .unwrap_or_else(|| PathBuf::from(".plasma-publish"))
                .join("keyring.json.age"),
        }
    }
}
