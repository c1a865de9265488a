//! Credential resolution for the chosen repository
//!
//! Stored credentials win. Otherwise the supplied values are used, missing
//! fields are requested from the prompt, and the result is staged in the
//! store for the orchestrator to flush after a successful upload.

use crate::core::error::{KeyringError, PublishError};
use crate::core::traits::{
    CredentialField, CredentialPrompt, CredentialStore, Credentials, ResolvedCredentials,
};
use secrecy::{ExposeSecret, SecretString};

pub struct CredentialResolver<'a> {
    prompt: &'a dyn CredentialPrompt,
}

impl<'a> CredentialResolver<'a> {
    pub fn new(prompt: &'a dyn CredentialPrompt) -> Self {
        Self { prompt }
    }

    /// Find or build the credentials for `target_url`
    ///
    /// Never flushes the store; `needs_persist` tells the caller whether a
    /// new entry was staged.
    pub fn resolve(
        &self,
        target_url: &str,
        supplied_username: &str,
        supplied_password: &SecretString,
        store: &mut dyn CredentialStore,
    ) -> Result<ResolvedCredentials, PublishError> {
        match store.get_for_url(target_url) {
            Ok(credentials) => {
                tracing::debug!(url = target_url, "using stored credentials");
                return Ok(ResolvedCredentials {
                    credentials,
                    needs_persist: false,
                });
            }
            Err(KeyringError::NotFound) => {}
            Err(KeyringError::EmptyPassphrase) => {
                return Err(PublishError::KeyringPassphraseMissing);
            }
            Err(KeyringError::Prompt(err)) => {
                return Err(PublishError::InteractivePromptFailed {
                    message: err.to_string(),
                });
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to read keyring");
                return Err(PublishError::CredentialStoreMalformed);
            }
        }

        let mut credentials = Credentials {
            url: target_url.to_string(),
            username: supplied_username.to_string(),
            password: supplied_password.clone(),
        };

        let missing_username = credentials.username.is_empty();
        let missing_password = credentials.password.expose_secret().is_empty();

        if missing_username || missing_password {
            println!("Please add login and password for URL - {}", target_url);

            if missing_username {
                credentials.username = self.ask(target_url, CredentialField::Username)?;
            }
            if missing_password {
                credentials.password =
                    SecretString::from(self.ask(target_url, CredentialField::Password)?);
            }
        }

        store.add_item(credentials.clone()).map_err(|err| {
            tracing::error!(error = %err, "failed to add keyring item");
            PublishError::CredentialStoreMalformed
        })?;

        Ok(ResolvedCredentials {
            credentials,
            needs_persist: true,
        })
    }

    fn ask(&self, url: &str, field: CredentialField) -> Result<String, PublishError> {
        self.prompt
            .prompt(url, field)
            .map_err(|err| PublishError::InteractivePromptFailed {
                message: err.to_string(),
            })
    }
}
