//! Error handling for artifact publishing
//!
//! Low-level failures (HTTP client, filesystem, keyring internals) are logged
//! where they happen and surfaced through these variants with a short message.
//! Only a few conditions carry actionable guidance.

use crate::core::state_machine::PublishState;
use thiserror::Error;

/// Main error type for the publish workflow
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("error getting repository information")]
    RepositoryInfoUnavailable,

    #[error("artifact {file} not found in {dir}. Execute 'plasmactl package' before")]
    ArtifactNotFound { file: String, dir: String },

    #[error("error opening artifact file")]
    ArtifactOpenFailed,

    #[error("the keyring is malformed or wrong passphrase provided")]
    CredentialStoreMalformed,

    #[error("keyring passphrase is empty")]
    KeyringPassphraseMissing,

    #[error("failed to read credentials from terminal: {message}")]
    InteractivePromptFailed { message: String },

    #[error("failed to authenticate against {domain}: {detail}")]
    AuthenticationFailed {
        domain: String,
        status: Option<u16>,
        detail: String,
    },

    #[error("failed to upload artifact: {detail}")]
    UploadFailed { status: Option<u16>, detail: String },

    #[error("error during saving keyring file: {message}")]
    CredentialPersistFailed { message: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("invalid publish state transition {from:?} -> {to:?}")]
    InvalidTransition { from: PublishState, to: PublishState },
}

impl PublishError {
    /// HTTP status observed for network failures, if a response was received
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::AuthenticationFailed { status, .. } | Self::UploadFailed { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the user can fix the condition from the message alone
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            Self::ArtifactNotFound { .. }
                | Self::KeyringPassphraseMissing
                | Self::InteractivePromptFailed { .. }
                | Self::AuthenticationFailed { .. }
        )
    }

    /// Get suggested actions for this error
    pub fn suggested_actions(&self) -> Vec<&'static str> {
        match self {
            Self::RepositoryInfoUnavailable => vec![
                "Run the command from inside a git working copy",
                "Make sure the repository has at least one commit",
            ],
            Self::ArtifactNotFound { .. } => vec!["Execute 'plasmactl package' before publishing"],
            Self::ArtifactOpenFailed => vec!["Check the permissions of the artifacts directory"],
            Self::CredentialStoreMalformed => vec![
                "Check the keyring passphrase",
                "Remove the keyring file to start over",
            ],
            Self::KeyringPassphraseMissing => {
                vec!["Set PLASMA_KEYRING_PASSPHRASE or run the command in a terminal"]
            }
            Self::InteractivePromptFailed { .. } => vec![
                "Pass --username and --password in non-interactive environments",
                "Set PLASMA_KEYRING_PASSPHRASE in non-interactive environments",
            ],
            Self::AuthenticationFailed { .. } => vec![
                "Check the username and password for the artifacts repository",
                "Check the network connection to the repository",
            ],
            Self::UploadFailed { .. } => vec![
                "Check that the artifacts repository exists for this project",
                "Check the repository status",
            ],
            Self::CredentialPersistFailed { .. } => vec!["Check the keyring file permissions"],
            Self::ConfigError(_) => vec!["Check .plasma-publish.yaml"],
            Self::InvalidTransition { .. } => vec![],
        }
    }

    /// Get error code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Self::RepositoryInfoUnavailable => "REPOSITORY_INFO_UNAVAILABLE",
            Self::ArtifactNotFound { .. } => "ARTIFACT_NOT_FOUND",
            Self::ArtifactOpenFailed => "ARTIFACT_OPEN_FAILED",
            Self::CredentialStoreMalformed => "CREDENTIAL_STORE_MALFORMED",
            Self::KeyringPassphraseMissing => "KEYRING_PASSPHRASE_MISSING",
            Self::InteractivePromptFailed { .. } => "INTERACTIVE_PROMPT_FAILED",
            Self::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            Self::UploadFailed { .. } => "UPLOAD_FAILED",
            Self::CredentialPersistFailed { .. } => "CREDENTIAL_PERSIST_FAILED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
        }
    }
}

/// Errors reported by a credential store
#[derive(Error, Debug)]
pub enum KeyringError {
    #[error("item not found")]
    NotFound,

    #[error("passphrase is empty")]
    EmptyPassphrase,

    #[error("failed to read passphrase: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("keyring is malformed: {0}")]
    Malformed(String),

    #[error("keyring I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport-level failure before an HTTP response was received
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_not_found_message() {
        let error = PublishError::ArtifactNotFound {
            file: "demo-abc1234-plasma-src.tar.gz".to_string(),
            dir: ".compose/artifacts".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("demo-abc1234-plasma-src.tar.gz"));
        assert!(message.contains(".compose/artifacts"));
        assert!(message.contains("plasmactl package"));
        assert!(error.is_user_actionable());
        assert_eq!(error.code(), "ARTIFACT_NOT_FOUND");
    }

    #[test]
    fn test_repository_info_is_generic() {
        let error = PublishError::RepositoryInfoUnavailable;

        assert_eq!(error.to_string(), "error getting repository information");
        assert!(!error.is_user_actionable());
        assert!(!error.suggested_actions().is_empty());
    }

    #[test]
    fn test_authentication_failed_carries_status() {
        let error = PublishError::AuthenticationFailed {
            domain: "https://repositories.example.com".to_string(),
            status: Some(401),
            detail: "401 Unauthorized".to_string(),
        };

        assert_eq!(error.http_status(), Some(401));
        assert_eq!(error.code(), "AUTHENTICATION_FAILED");
        assert!(error.to_string().contains("401 Unauthorized"));
    }

    #[test]
    fn test_upload_failed_transport_has_no_status() {
        let error = PublishError::UploadFailed {
            status: None,
            detail: "error uploading artifact".to_string(),
        };

        assert_eq!(error.http_status(), None);
        assert!(!error.is_user_actionable());
        assert_eq!(error.to_string(), "failed to upload artifact: error uploading artifact");
    }

    #[test]
    fn test_store_malformed_message() {
        let error = PublishError::CredentialStoreMalformed;

        assert_eq!(error.code(), "CREDENTIAL_STORE_MALFORMED");
        assert!(error.to_string().contains("wrong passphrase"));
        assert!(error.suggested_actions().iter().any(|a| a.contains("passphrase")));
    }

    #[test]
    fn test_keyring_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: KeyringError = io.into();

        assert!(matches!(error, KeyringError::Io(_)));
        assert!(error.to_string().contains("denied"));
    }

    #[test]
    fn test_transport_error_display() {
        let error = TransportError::new("connection refused");
        assert_eq!(error.to_string(), "connection refused");
    }
}
