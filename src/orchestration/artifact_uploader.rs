//! Authenticated upload of the artifact archive
//!
//! The upload is a HEAD against the repository root to check the credentials,
//! followed by a PUT streaming the archive. The archive is opened read-only
//! before the HEAD and its handle is dropped on every return path.

use crate::core::error::PublishError;
use crate::core::traits::{Credentials, RepositoryClient, UploadOutcome};
use reqwest::StatusCode;
use std::path::Path;
use tokio::fs::File;

impl UploadOutcome {
    /// 200 and 201 are the only successful upload responses
    pub fn from_status(status: StatusCode) -> Self {
        let success = status == StatusCode::OK || status == StatusCode::CREATED;
        Self {
            http_status: status.as_u16(),
            success,
            error_detail: (!success).then(|| status.to_string()),
        }
    }

    /// Turn an unsuccessful outcome into `UploadFailed`
    pub fn ensure_success(self) -> Result<Self, PublishError> {
        if self.success {
            return Ok(self);
        }

        Err(PublishError::UploadFailed {
            status: Some(self.http_status),
            detail: self
                .error_detail
                .unwrap_or_else(|| self.http_status.to_string()),
        })
    }
}

/// Fail with `ArtifactNotFound` unless `path` is an existing file
pub async fn ensure_artifact_exists(path: &Path) -> Result<(), PublishError> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => Ok(()),
        _ => Err(PublishError::ArtifactNotFound {
            file: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            dir: path
                .parent()
                .map(|dir| dir.display().to_string())
                .unwrap_or_default(),
        }),
    }
}

pub struct ArtifactUploader<'a> {
    client: &'a dyn RepositoryClient,
}

impl<'a> ArtifactUploader<'a> {
    pub fn new(client: &'a dyn RepositoryClient) -> Self {
        Self { client }
    }

    /// Check credentials, then upload `local_file_path` to `remote_archive_url`
    ///
    /// A missing archive fails before any request is made.
    pub async fn upload(
        &self,
        domain: &str,
        credentials: &Credentials,
        local_file_path: &Path,
        remote_archive_url: &str,
    ) -> Result<UploadOutcome, PublishError> {
        let file = self.open_artifact(local_file_path).await?;
        self.authenticate(domain, credentials).await?;
        self.send(file, credentials, remote_archive_url)
            .await?
            .ensure_success()
    }

    pub async fn open_artifact(&self, local_file_path: &Path) -> Result<File, PublishError> {
        ensure_artifact_exists(local_file_path).await?;

        File::open(local_file_path).await.map_err(|err| {
            tracing::error!(path = %local_file_path.display(), error = %err, "failed to open artifact");
            PublishError::ArtifactOpenFailed
        })
    }

    /// HEAD `domain` with basic auth; anything but 200 is fatal
    pub async fn authenticate(
        &self,
        domain: &str,
        credentials: &Credentials,
    ) -> Result<(), PublishError> {
        match self.client.head(domain, credentials).await {
            Ok(StatusCode::OK) => {
                tracing::debug!(domain, "credentials accepted");
                Ok(())
            }
            Ok(status) => {
                tracing::warn!(domain, status = status.as_u16(), "authentication rejected");
                Err(PublishError::AuthenticationFailed {
                    domain: domain.to_string(),
                    status: Some(status.as_u16()),
                    detail: status.to_string(),
                })
            }
            Err(err) => {
                tracing::error!(domain, error = %err, "authentication request failed");
                Err(PublishError::AuthenticationFailed {
                    domain: domain.to_string(),
                    status: None,
                    detail: "error sending authentication request".to_string(),
                })
            }
        }
    }

    /// PUT the opened archive; a transport failure is `UploadFailed`
    pub async fn send(
        &self,
        file: File,
        credentials: &Credentials,
        remote_archive_url: &str,
    ) -> Result<UploadOutcome, PublishError> {
        match self.client.put_file(remote_archive_url, credentials, file).await {
            Ok(status) => {
                let outcome = UploadOutcome::from_status(status);
                tracing::info!(
                    url = remote_archive_url,
                    status = outcome.http_status,
                    success = outcome.success,
                    "upload finished"
                );
                Ok(outcome)
            }
            Err(err) => {
                tracing::error!(url = remote_archive_url, error = %err, "upload request failed");
                Err(PublishError::UploadFailed {
                    status: None,
                    detail: "error uploading artifact".to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::testing::FakeRepositoryClient;
    use tempfile::TempDir;

    const DOMAIN: &str = "https://repositories.example.com";
    const URL: &str =
        "https://repositories.example.com/repository/demo-artifacts/demo-abc1234-plasma-src.tar.gz";

    fn artifact(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("demo-abc1234-plasma-src.tar.gz");
        std::fs::write(&path, b"tarball").unwrap();
        path
    }

    fn credentials() -> Credentials {
        Credentials::new(DOMAIN, "alice", "pw")
    }

    #[test]
    fn test_outcome_from_status() {
        assert!(UploadOutcome::from_status(StatusCode::OK).success);
        assert!(UploadOutcome::from_status(StatusCode::CREATED).success);

        let accepted = UploadOutcome::from_status(StatusCode::ACCEPTED);
        assert!(!accepted.success);
        assert_eq!(accepted.error_detail.as_deref(), Some("202 Accepted"));
    }

    #[tokio::test]
    async fn test_successful_upload() {
        let temp_dir = TempDir::new().unwrap();
        let path = artifact(&temp_dir);
        let client = FakeRepositoryClient::new();

        let outcome = ArtifactUploader::new(&client)
            .upload(DOMAIN, &credentials(), &path, URL)
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.http_status, 201);

        let calls = client.calls();
        assert_eq!(client.methods(), vec!["HEAD", "PUT"]);
        assert_eq!(calls[0].url, DOMAIN);
        assert_eq!(calls[1].url, URL);
        assert_eq!(calls[1].username.as_deref(), Some("alice"));
        assert_eq!(calls[1].body.as_deref(), Some(&b"tarball"[..]));
    }

    #[tokio::test]
    async fn test_missing_artifact_makes_no_request() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("demo-abc1234-plasma-src.tar.gz");
        let client = FakeRepositoryClient::new();

        let result = ArtifactUploader::new(&client)
            .upload(DOMAIN, &credentials(), &path, URL)
            .await;

        match result {
            Err(PublishError::ArtifactNotFound { file, dir }) => {
                assert_eq!(file, "demo-abc1234-plasma-src.tar.gz");
                assert_eq!(dir, temp_dir.path().display().to_string());
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_directory_is_not_an_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let client = FakeRepositoryClient::new();

        let result = ArtifactUploader::new(&client)
            .upload(DOMAIN, &credentials(), temp_dir.path(), URL)
            .await;

        assert!(matches!(result, Err(PublishError::ArtifactNotFound { .. })));
    }

    #[tokio::test]
    async fn test_rejected_credentials_abort_before_put() {
        let temp_dir = TempDir::new().unwrap();
        let path = artifact(&temp_dir);
        let client = FakeRepositoryClient::new().head_status(StatusCode::UNAUTHORIZED);

        let result = ArtifactUploader::new(&client)
            .upload(DOMAIN, &credentials(), &path, URL)
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, PublishError::AuthenticationFailed { .. }));
        assert_eq!(err.http_status(), Some(401));
        assert_eq!(client.methods(), vec!["HEAD"]);
    }

    #[tokio::test]
    async fn test_non_ok_head_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = artifact(&temp_dir);
        let client = FakeRepositoryClient::new().head_status(StatusCode::NO_CONTENT);

        let result = ArtifactUploader::new(&client)
            .upload(DOMAIN, &credentials(), &path, URL)
            .await;

        assert!(matches!(result, Err(PublishError::AuthenticationFailed { .. })));
        assert_eq!(client.methods(), vec!["HEAD"]);
    }

    #[tokio::test]
    async fn test_head_transport_error_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let path = artifact(&temp_dir);
        let client = FakeRepositoryClient::new().head_unreachable();

        let err = ArtifactUploader::new(&client)
            .upload(DOMAIN, &credentials(), &path, URL)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::AuthenticationFailed { status: None, .. }));
        assert_eq!(client.methods(), vec!["HEAD"]);
    }

    #[tokio::test]
    async fn test_server_error_on_put() {
        let temp_dir = TempDir::new().unwrap();
        let path = artifact(&temp_dir);
        let client = FakeRepositoryClient::new().put_status(StatusCode::INTERNAL_SERVER_ERROR);

        let err = ArtifactUploader::new(&client)
            .upload(DOMAIN, &credentials(), &path, URL)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::UploadFailed { .. }));
        assert_eq!(err.http_status(), Some(500));
        assert!(err.to_string().contains("500 Internal Server Error"));
    }

    #[tokio::test]
    async fn test_put_transport_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = artifact(&temp_dir);
        let client = FakeRepositoryClient::new().put_unreachable();

        let err = ArtifactUploader::new(&client)
            .upload(DOMAIN, &credentials(), &path, URL)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::UploadFailed { status: None, .. }));
    }
}
