//! Artifact Publisher - Main orchestrator for artifact publishing
//!
//! Drives one publish run through its stages:
//! - Repository name and commit lookup
//! - Endpoint selection (private endpoint first, public fallback)
//! - Artifact validation
//! - Credential resolution
//! - Authentication probe and upload
//! - Keyring persistence of newly entered credentials
//!
//! Every stage is a hard gate. Only the final keyring save may fail without
//! failing the run.

use crate::core::config::PublishConfig;
use crate::core::error::PublishError;
use crate::core::state_machine::{PublishState, PublishStateMachine};
use crate::core::traits::{
    ArtifactDescriptor, CredentialPrompt, CredentialStore, EndpointChoice, RepoInfoResolver,
    RepositoryClient, UploadOutcome,
};
use crate::orchestration::artifact_uploader::{ArtifactUploader, ensure_artifact_exists};
use crate::orchestration::endpoint_selector::EndpointSelector;
use crate::security::credential_resolver::CredentialResolver;
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Values supplied by the caller for this run
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Repository username; empty means "ask if nothing is stored"
    pub username: String,

    /// Repository password; empty means "ask if nothing is stored"
    pub password: SecretString,
}

impl PublishOptions {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Publishing report returned after a successful run
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub artifact: ArtifactDescriptor,
    pub endpoint: EndpointChoice,
    pub archive_url: String,
    pub outcome: UploadOutcome,
    pub credentials_persisted: bool,
    pub final_state: PublishState,
    pub duration_ms: u64,
}

/// Main artifact publisher orchestrator
pub struct ArtifactPublisher {
    project_path: PathBuf,
    config: PublishConfig,
    repo_info: Arc<dyn RepoInfoResolver>,
    client: Arc<dyn RepositoryClient>,
    prompt: Arc<dyn CredentialPrompt>,
    state_machine: PublishStateMachine,
}

impl ArtifactPublisher {
    /// Create a new ArtifactPublisher
    ///
    /// # Arguments
    ///
    /// * `project_path` - Working copy the artifacts directory is relative to
    /// * `config` - Effective configuration
    pub fn new<P: AsRef<Path>>(
        project_path: P,
        config: PublishConfig,
        repo_info: Arc<dyn RepoInfoResolver>,
        client: Arc<dyn RepositoryClient>,
        prompt: Arc<dyn CredentialPrompt>,
    ) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            config,
            repo_info,
            client,
            prompt,
            state_machine: PublishStateMachine::new(),
        }
    }

    /// State reached by the last run
    pub fn state_machine(&self) -> &PublishStateMachine {
        &self.state_machine
    }

    /// Publish the artifact of the current commit
    ///
    /// New credentials are flushed to `store` only after the upload succeeded.
    pub async fn publish(
        &mut self,
        options: &PublishOptions,
        store: &mut dyn CredentialStore,
    ) -> Result<PublishReport, PublishError> {
        let start_time = Instant::now();
        self.state_machine.clear();

        match self.run(options, store, start_time).await {
            Ok(report) => Ok(report),
            Err(err) => {
                self.state_machine.fail();
                tracing::error!(code = err.code(), error = %err, "publish failed");
                Err(err)
            }
        }
    }

    async fn run(
        &mut self,
        options: &PublishOptions,
        store: &mut dyn CredentialStore,
        start_time: Instant,
    ) -> Result<PublishReport, PublishError> {
        // 1. Repository information
        let repo = self.repo_info.resolve().map_err(|err| {
            tracing::error!(error = %format!("{:#}", err), "cannot determine repository information");
            PublishError::RepositoryInfoUnavailable
        })?;
        self.state_machine.transition(PublishState::RepoInfoResolved)?;

        let artifacts_dir = self.project_path.join(self.config.artifacts_dir());
        let artifact = ArtifactDescriptor::new(
            repo.repository_name,
            repo.commit_short_hash,
            &artifacts_dir,
        );

        // 2. Endpoint
        let endpoint = EndpointSelector::new(self.client.as_ref(), self.config.probe_timeout())
            .select_endpoint(self.config.primary_domain(), self.config.fallback_domain())
            .await;
        let archive_url = artifact.archive_url(&endpoint.domain);

        tracing::info!(
            artifact_dir = self.config.artifacts_dir(),
            artifact_file = artifact.file_name(),
            repository_domain = %endpoint.domain,
            archive_url = %archive_url,
            probe_status = endpoint.probe_status_code,
            "artifact info"
        );
        self.state_machine.transition(PublishState::EndpointChosen)?;

        // 3. Artifact
        log_directory_contents(&artifacts_dir);
        ensure_artifact_exists(artifact.local_path()).await?;
        println!(
            "Looking for artifact {} in {}",
            artifact.file_name(),
            self.config.artifacts_dir()
        );

        let uploader = ArtifactUploader::new(self.client.as_ref());
        let file = uploader.open_artifact(artifact.local_path()).await?;
        self.state_machine.transition(PublishState::ArtifactPathValidated)?;

        // 4. Credentials
        println!("Getting credentials");
        let resolved = CredentialResolver::new(self.prompt.as_ref()).resolve(
            &endpoint.domain,
            &options.username,
            &options.password,
            store,
        )?;
        self.state_machine.transition(PublishState::CredentialsResolved)?;

        // 5. Authentication probe
        uploader
            .authenticate(&endpoint.domain, &resolved.credentials)
            .await?;
        self.state_machine.transition(PublishState::AuthProbed)?;

        // 6. Upload
        println!(
            "Publishing artifact {}/{} to {}...",
            self.config.artifacts_dir(),
            artifact.file_name(),
            archive_url
        );
        let outcome = uploader
            .send(file, &resolved.credentials, &archive_url)
            .await?
            .ensure_success()?;
        self.state_machine.transition(PublishState::Uploaded)?;
        println!("Artifact successfully uploaded");

        // 7. Keyring
        let mut credentials_persisted = false;
        if resolved.needs_persist {
            match store.save() {
                Ok(()) => {
                    credentials_persisted = true;
                    self.state_machine
                        .transition(PublishState::CredentialsPersisted)?;
                }
                Err(err) => {
                    let err = PublishError::CredentialPersistFailed {
                        message: err.to_string(),
                    };
                    tracing::error!(code = err.code(), error = %err, "credentials were not saved");
                }
            }
        }
        self.state_machine.transition(PublishState::Done)?;

        Ok(PublishReport {
            artifact,
            endpoint,
            archive_url,
            outcome,
            credentials_persisted,
            final_state: self.state_machine.get_state(),
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

/// Log what the artifacts directory holds, for diagnosing a missing archive
fn log_directory_contents(dir: &Path) {
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        match entry {
            Ok(entry) => tracing::debug!(path = %entry.path().display(), "artifacts directory entry"),
            Err(err) => {
                tracing::debug!(dir = %dir.display(), error = %err, "cannot list artifacts directory");
                break;
            }
        }
    }
}
