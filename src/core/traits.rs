//! Core traits and types for artifact publishing
//!
//! This module defines the data passed between the publish stages and the
//! capability interfaces the orchestrator is built from: the credential
//! store, the interactive prompt, the repository HTTP client and the
//! version-control inspection.

use crate::core::error::{KeyringError, TransportError};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Suffix shared by every packaged source archive
pub const ARTIFACT_SUFFIX: &str = "plasma-src.tar.gz";

/// Probe status recorded when the primary endpoint did not answer
pub const NOT_PROBED: u16 = 0;

// ============================================================================
// Artifact
// ============================================================================

/// Name and location of the archive published by one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDescriptor {
    repository_name: String,
    commit_short_hash: String,
    file_name: String,
    local_path: PathBuf,
}

impl ArtifactDescriptor {
    pub fn new<P: AsRef<Path>>(
        repository_name: impl Into<String>,
        commit_short_hash: impl Into<String>,
        artifacts_dir: P,
    ) -> Self {
        let repository_name = repository_name.into();
        let commit_short_hash = commit_short_hash.into();
        let file_name = Self::file_name_for(&repository_name, &commit_short_hash);
        let local_path = artifacts_dir.as_ref().join(&file_name);

        Self {
            repository_name,
            commit_short_hash,
            file_name,
            local_path,
        }
    }

    /// Archive file name for a repository at a given commit
    ///
    /// # Examples
    ///
    /// ```
    /// use plasma_publish::core::ArtifactDescriptor;
    ///
    /// assert_eq!(
    ///     ArtifactDescriptor::file_name_for("demo", "abc1234"),
    ///     "demo-abc1234-plasma-src.tar.gz"
    /// );
    /// ```
    pub fn file_name_for(repository_name: &str, commit_short_hash: &str) -> String {
        format!("{}-{}-{}", repository_name, commit_short_hash, ARTIFACT_SUFFIX)
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }

    pub fn commit_short_hash(&self) -> &str {
        &self.commit_short_hash
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Upload target inside the repository's artifacts area on `domain`
    pub fn archive_url(&self, domain: &str) -> String {
        format!(
            "{}/repository/{}-artifacts/{}",
            domain.trim_end_matches('/'),
            self.repository_name,
            self.file_name
        )
    }
}

/// Output of the version-control inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    pub repository_name: String,
    pub commit_short_hash: String,
}

// ============================================================================
// Endpoint
// ============================================================================

/// Repository endpoint picked for this invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointChoice {
    pub domain: String,
    pub reachable: bool,
    pub probe_status_code: u16,
}

// ============================================================================
// Credentials
// ============================================================================

/// Username/password pair bound to a repository URL
#[derive(Debug, Clone)]
pub struct Credentials {
    pub url: String,
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Credentials for the current request plus whether they must be written back
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub credentials: Credentials,
    pub needs_persist: bool,
}

/// Field requested from the user when no stored credentials exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Username,
    Password,
}

// ============================================================================
// Upload
// ============================================================================

/// Interpreted response of the artifact upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    pub http_status: u16,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

// ============================================================================
// Capabilities
// ============================================================================

/// Persistent credential storage keyed by URL
///
/// `add_item` only changes the in-memory view; nothing reaches durable
/// storage until `save` is called.
pub trait CredentialStore: Send {
    /// Look up credentials for `url`
    ///
    /// Returns `KeyringError::NotFound` when the store holds no entry for it.
    fn get_for_url(&mut self, url: &str) -> Result<Credentials, KeyringError>;

    /// Insert or replace the entry for `item.url`
    fn add_item(&mut self, item: Credentials) -> Result<(), KeyringError>;

    /// Flush the in-memory view to durable storage
    fn save(&mut self) -> Result<(), KeyringError>;
}

/// Source of credentials the user types in
pub trait CredentialPrompt: Send + Sync {
    fn prompt(&self, url: &str, field: CredentialField) -> std::io::Result<String>;
}

/// Working-copy inspection yielding the artifact identity
pub trait RepoInfoResolver: Send + Sync {
    fn resolve(&self) -> anyhow::Result<RepoInfo>;
}

/// HTTP operations used against the artifact repository
///
/// Every method returns the response status as soon as one is received;
/// `Err` means no response arrived at all.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Unauthenticated reachability probe bounded by `timeout`
    async fn probe(&self, url: &str, timeout: Duration) -> Result<StatusCode, TransportError>;

    /// Authenticated HEAD request
    async fn head(&self, url: &str, credentials: &Credentials)
    -> Result<StatusCode, TransportError>;

    /// Authenticated PUT streaming `file` as the request body
    async fn put_file(
        &self,
        url: &str,
        credentials: &Credentials,
        file: tokio::fs::File,
    ) -> Result<StatusCode, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_file_name_format() {
        let pairs = [
            ("demo", "abc1234"),
            ("plasma-core", "0f1e2d3"),
            ("a", "1"),
        ];

        for (name, hash) in pairs {
            let artifact = ArtifactDescriptor::new(name, hash, ".compose/artifacts");
            assert_eq!(
                artifact.file_name(),
                format!("{}-{}-plasma-src.tar.gz", name, hash)
            );
        }
    }

    #[test]
    fn test_local_path_joins_directory() {
        let artifact = ArtifactDescriptor::new("demo", "abc1234", ".compose/artifacts");

        assert_eq!(
            artifact.local_path(),
            Path::new(".compose/artifacts/demo-abc1234-plasma-src.tar.gz")
        );
        assert_eq!(artifact.repository_name(), "demo");
        assert_eq!(artifact.commit_short_hash(), "abc1234");
    }

    #[test]
    fn test_archive_url_shape() {
        let artifact = ArtifactDescriptor::new("demo", "abc1234", ".compose/artifacts");

        assert_eq!(
            artifact.archive_url("https://repositories.example.com"),
            "https://repositories.example.com/repository/demo-artifacts/demo-abc1234-plasma-src.tar.gz"
        );
        assert_eq!(
            artifact.archive_url("http://10.0.0.1:8081/"),
            "http://10.0.0.1:8081/repository/demo-artifacts/demo-abc1234-plasma-src.tar.gz"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("https://repo", "alice", "hunter2-secret");

        let debug = format!("{:?}", credentials);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2-secret"));
        assert_eq!(credentials.password.expose_secret(), "hunter2-secret");
    }

    #[test]
    fn test_upload_outcome_serialization() {
        let outcome = UploadOutcome {
            http_status: 201,
            success: true,
            error_detail: None,
        };

        let json = serde_json::to_string(&outcome).unwrap();
        assert_eq!(json, r#"{"http_status":201,"success":true}"#);
    }
}
