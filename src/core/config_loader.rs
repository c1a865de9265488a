//! Configuration file loader for plasma-publish
//!
//! This module provides configuration loading, validation, and merging capabilities.

use super::config::*;
use crate::core::error::PublishError;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
const CONFIG_FILENAME: &str = ".plasma-publish.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Configuration load options
#[derive(Debug, Clone, Default)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// Directory searched for the global config; `None` skips it
    pub home_dir: Option<PathBuf>,

    /// CLI arguments (highest priority)
    pub cli_args: Option<PublishConfig>,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options reading the real home directory and process environment
    pub fn from_process<P: AsRef<Path>>(project_path: P, cli_args: Option<PublishConfig>) -> Self {
        Self {
            project_path: project_path.as_ref().to_path_buf(),
            home_dir: dirs::home_dir(),
            cli_args,
            env: std::env::vars().collect(),
        }
    }
}

/// Configuration validation result
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<ConfigValidationError>,
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    /// Field name (e.g., "primaryDomain")
    pub field: String,
    pub message: String,
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from multiple sources with priority
    ///
    /// Priority (high to low):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. Project config (./.plasma-publish.yaml)
    /// 4. Global config (~/.plasma-publish.yaml)
    /// 5. Default values
    pub async fn load(options: ConfigLoadOptions) -> Result<PublishConfig, PublishError> {
        let mut configs: Vec<PublishConfig> = Vec::new();

        if let Some(home_dir) = &options.home_dir
            && let Some(global_config) = Self::load_config_file(&home_dir.join(CONFIG_FILENAME)).await?
        {
            configs.push(global_config);
        }

        let project_config_path = options.project_path.join(CONFIG_FILENAME);
        if let Some(project_config) = Self::load_config_file(&project_config_path).await? {
            configs.push(project_config);
        }

        if let Some(env_config) = Self::load_env_config(&options.env) {
            configs.push(env_config);
        }

        if let Some(cli_config) = options.cli_args {
            configs.push(cli_config);
        }

        let merged = Self::merge_configs(configs);
        let expanded = Self::expand_env_vars(merged, &options.env);

        let validation = Self::validate(&expanded);
        if !validation.valid {
            let message = validation
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(PublishError::ConfigError(message));
        }

        Ok(expanded)
    }

    /// Load configuration from a YAML file, `None` if it does not exist
    async fn load_config_file(file_path: &Path) -> Result<Option<PublishConfig>, PublishError> {
        if !file_path.exists() {
            return Ok(None);
        }

        tracing::debug!(path = %file_path.display(), "loading config file");

        let content = fs::read_to_string(file_path).await.map_err(|e| {
            PublishError::ConfigError(format!("Failed to read config file: {}", e))
        })?;

        let config: PublishConfig = serde_yaml::from_str(&content).map_err(|e| {
            PublishError::ConfigError(format!("Failed to parse YAML config: {}", e))
        })?;

        Ok(Some(config))
    }

    /// Load configuration from environment variables
    fn load_env_config(env: &HashMap<String, String>) -> Option<PublishConfig> {
        let mut config = PublishConfig::default();
        let mut has_changes = false;

        let mut take = |name: &str| {
            let value = env.get(name).filter(|v| !v.is_empty()).cloned();
            has_changes |= value.is_some();
            value
        };

        config.artifacts_dir = take("PLASMA_PUBLISH_ARTIFACTS_DIR");
        config.primary_domain = take("PLASMA_PUBLISH_PRIMARY_DOMAIN");
        config.fallback_domain = take("PLASMA_PUBLISH_FALLBACK_DOMAIN");
        config.keyring_path = take("PLASMA_PUBLISH_KEYRING");

        let timeout = take("PLASMA_PUBLISH_PROBE_TIMEOUT");
        config.probe_timeout_secs = match timeout {
            Some(raw) => match raw.parse() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring invalid PLASMA_PUBLISH_PROBE_TIMEOUT");
                    None
                }
            },
            None => None,
        };

        if has_changes { Some(config) } else { None }
    }

    /// Merge multiple configurations with priority
    fn merge_configs(configs: Vec<PublishConfig>) -> PublishConfig {
        let mut result = PublishConfig::default();

        for config in configs {
            Self::merge_into(&mut result, config);
        }

        result
    }

    /// Merge source config into target
    fn merge_into(target: &mut PublishConfig, source: PublishConfig) {
        if source.artifacts_dir.is_some() {
            target.artifacts_dir = source.artifacts_dir;
        }
        if source.primary_domain.is_some() {
            target.primary_domain = source.primary_domain;
        }
        if source.fallback_domain.is_some() {
            target.fallback_domain = source.fallback_domain;
        }
        if source.probe_timeout_secs.is_some() {
            target.probe_timeout_secs = source.probe_timeout_secs;
        }
        if source.keyring_path.is_some() {
            target.keyring_path = source.keyring_path;
        }
    }

    /// Expand ${VAR} references in every string field
    fn expand_env_vars(mut config: PublishConfig, env: &HashMap<String, String>) -> PublishConfig {
        for field in [
            &mut config.artifacts_dir,
            &mut config.primary_domain,
            &mut config.fallback_domain,
            &mut config.keyring_path,
        ] {
            if let Some(value) = field.as_mut() {
                *value = Self::expand_string(value, env);
            }
        }

        config
    }

    /// Expand environment variables in a single string
    fn expand_string(input: &str, env: &HashMap<String, String>) -> String {
        let env_var_regex = Regex::new(ENV_VAR_PATTERN).expect("ENV_VAR_PATTERN is a valid regex");

        let mut result = input.to_string();
        for cap in env_var_regex.captures_iter(input) {
            let var_name = &cap[1];

            if let Some(value) = env.get(var_name) {
                result = result.replace(&format!("${{{}}}", var_name), value);
            } else {
                tracing::warn!(variable = var_name, "environment variable not found");
            }
        }

        result
    }

    /// Validate configuration
    pub fn validate(config: &PublishConfig) -> ConfigValidationResult {
        let mut errors = Vec::new();

        for (field, value) in [
            ("primaryDomain", config.primary_domain()),
            ("fallbackDomain", config.fallback_domain()),
        ] {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                errors.push(ConfigValidationError {
                    field: field.to_string(),
                    message: format!("expected an http(s) URL, got '{}'", value),
                });
            }
        }

        if config.probe_timeout_secs == Some(0) {
            errors.push(ConfigValidationError {
                field: "probeTimeoutSecs".to_string(),
                message: "timeout must be greater than zero".to_string(),
            });
        }

        if config.artifacts_dir().trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "artifactsDir".to_string(),
                message: "artifacts directory must not be empty".to_string(),
            });
        }

        ConfigValidationResult {
            valid: errors.is_empty(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn options(project: &Path) -> ConfigLoadOptions {
        ConfigLoadOptions {
            project_path: project.to_path_buf(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_defaults_without_files() {
        let temp_dir = TempDir::new().unwrap();

        let config = ConfigLoader::load(options(temp_dir.path())).await.unwrap();

        assert_eq!(config, PublishConfig::default());
        assert_eq!(config.artifacts_dir(), DEFAULT_ARTIFACTS_DIR);
    }

    #[tokio::test]
    async fn test_priority_order() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::write(
            home.path().join(CONFIG_FILENAME),
            "artifactsDir: from-home\nprobeTimeoutSecs: 9\nkeyringPath: /home/keyring\n",
        )
        .unwrap();
        std::fs::write(
            project.path().join(CONFIG_FILENAME),
            "artifactsDir: from-project\nprobeTimeoutSecs: 7\n",
        )
        .unwrap();

        let mut env = HashMap::new();
        env.insert("PLASMA_PUBLISH_PROBE_TIMEOUT".to_string(), "3".to_string());

        let load_options = ConfigLoadOptions {
            project_path: project.path().to_path_buf(),
            home_dir: Some(home.path().to_path_buf()),
            cli_args: Some(PublishConfig {
                artifacts_dir: Some("from-cli".to_string()),
                ..Default::default()
            }),
            env,
        };

        let config = ConfigLoader::load(load_options).await.unwrap();

        assert_eq!(config.artifacts_dir(), "from-cli");
        assert_eq!(config.probe_timeout(), Duration::from_secs(3));
        assert_eq!(config.keyring_path, Some("/home/keyring".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_config_error() {
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join(CONFIG_FILENAME), "artifactsDir: [unclosed").unwrap();

        let result = ConfigLoader::load(options(project.path())).await;

        assert!(matches!(result, Err(PublishError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_invalid_domain_rejected() {
        let project = TempDir::new().unwrap();
        std::fs::write(
            project.path().join(CONFIG_FILENAME),
            "fallbackDomain: repositories.example.com\n",
        )
        .unwrap();

        let result = ConfigLoader::load(options(project.path())).await;

        match result {
            Err(PublishError::ConfigError(message)) => assert!(message.contains("fallbackDomain")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_load_env_config() {
        let mut env = HashMap::new();
        env.insert(
            "PLASMA_PUBLISH_PRIMARY_DOMAIN".to_string(),
            "http://10.0.0.5:8081".to_string(),
        );
        env.insert("PLASMA_PUBLISH_PROBE_TIMEOUT".to_string(), "soon".to_string());

        let config = ConfigLoader::load_env_config(&env).unwrap();

        assert_eq!(config.primary_domain(), "http://10.0.0.5:8081");
        assert_eq!(config.probe_timeout_secs, None);
    }

    #[test]
    fn test_load_env_config_without_variables() {
        assert!(ConfigLoader::load_env_config(&HashMap::new()).is_none());
    }

    #[test]
    fn test_expand_string() {
        let mut env = HashMap::new();
        env.insert("NEXUS_HOST".to_string(), "nexus.internal".to_string());

        let result = ConfigLoader::expand_string("http://${NEXUS_HOST}:8081", &env);
        assert_eq!(result, "http://nexus.internal:8081");

        let untouched = ConfigLoader::expand_string("http://${MISSING_HOST}", &env);
        assert_eq!(untouched, "http://${MISSING_HOST}");
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = PublishConfig {
            probe_timeout_secs: Some(0),
            ..Default::default()
        };

        let result = ConfigLoader::validate(&config);

        assert!(!result.valid);
        assert_eq!(result.errors[0].field, "probeTimeoutSecs");
    }
}
