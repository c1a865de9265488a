//! Repository name and commit of the local working copy

use crate::core::traits::{RepoInfo, RepoInfoResolver};
use crate::security::command_executor::SafeCommandExecutor;
use anyhow::{Context, bail};
use std::path::Path;

/// Reads the repository identity through the `git` binary
pub struct GitRepoInfoResolver {
    executor: SafeCommandExecutor,
}

impl GitRepoInfoResolver {
    pub fn new<P: AsRef<Path>>(project_path: P) -> anyhow::Result<Self> {
        let executor = SafeCommandExecutor::new(project_path)?;
        Ok(Self { executor })
    }

    fn repository_name(&self) -> anyhow::Result<String> {
        let origin = self
            .executor
            .stdout("git", &["config", "--get", "remote.origin.url"])
            .unwrap_or_default();

        if let Some(name) = repository_name_from_url(&origin) {
            return Ok(name);
        }

        tracing::debug!("no origin remote, using the working copy directory name");
        let toplevel = self
            .executor
            .stdout("git", &["rev-parse", "--show-toplevel"])
            .context("locating the working copy root")?;

        repository_name_from_url(&toplevel)
            .with_context(|| format!("cannot derive a repository name from '{}'", toplevel))
    }
}

impl RepoInfoResolver for GitRepoInfoResolver {
    fn resolve(&self) -> anyhow::Result<RepoInfo> {
        let repository_name = self.repository_name()?;
        let commit_short_hash = self
            .executor
            .stdout("git", &["rev-parse", "--short", "HEAD"])
            .context("reading the last commit")?;

        if commit_short_hash.is_empty() {
            bail!("git returned an empty commit hash");
        }

        Ok(RepoInfo {
            repository_name,
            commit_short_hash,
        })
    }
}

/// Last path segment of a remote URL or path, without a `.git` suffix
///
/// # Examples
///
/// ```
/// use plasma_publish::vcs::repository_name_from_url;
///
/// assert_eq!(
///     repository_name_from_url("git@github.com:skilld-labs/plasma.git"),
///     Some("plasma".to_string())
/// );
/// assert_eq!(repository_name_from_url(""), None);
/// ```
pub fn repository_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':', '\\']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Fixed repository identity, for hosts that already know it
#[derive(Debug, Clone)]
pub struct StaticRepoInfo(pub RepoInfo);

impl StaticRepoInfo {
    pub fn new(repository_name: &str, commit_short_hash: &str) -> Self {
        Self(RepoInfo {
            repository_name: repository_name.to_string(),
            commit_short_hash: commit_short_hash.to_string(),
        })
    }
}

impl RepoInfoResolver for StaticRepoInfo {
    fn resolve(&self) -> anyhow::Result<RepoInfo> {
        Ok(self.0.clone())
    }
}
