//! Interactive credential input
//!
//! `TerminalPrompt` reads from the attached terminal and fails with
//! `NotConnected` when there is none. `CannedPrompt` answers from fixed values
//! and records what was asked.

use crate::core::traits::{CredentialField, CredentialPrompt};
use dialoguer::{Input, Password};
use secrecy::SecretString;
use std::io;
use std::sync::Mutex;

fn into_io(err: dialoguer::Error) -> io::Error {
    match err {
        dialoguer::Error::IO(e) => e,
    }
}

/// Prompt on the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn prompt(&self, _url: &str, field: CredentialField) -> io::Result<String> {
        match field {
            CredentialField::Username => Input::<String>::new()
                .with_prompt("Username")
                .interact_text()
                .map_err(into_io),
            CredentialField::Password => Password::new()
                .with_prompt("Password")
                .interact()
                .map_err(into_io),
        }
    }
}

/// Ask for the keyring passphrase without echoing it
pub fn read_passphrase() -> io::Result<SecretString> {
    Password::new()
        .with_prompt("Keyring passphrase")
        .allow_empty_password(true)
        .interact()
        .map(SecretString::from)
        .map_err(into_io)
}

/// Prompt answering from preset values
///
/// A field without a preset value fails the way a detached terminal does.
#[derive(Debug, Default)]
pub struct CannedPrompt {
    username: Option<String>,
    password: Option<String>,
    asked: Mutex<Vec<CredentialField>>,
}

impl CannedPrompt {
    pub fn new(username: Option<&str>, password: Option<&str>) -> Self {
        Self {
            username: username.map(str::to_string),
            password: password.map(str::to_string),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Prompt that behaves like a non-interactive environment
    pub fn detached() -> Self {
        Self::default()
    }

    /// Fields requested so far, in order
    pub fn asked(&self) -> Vec<CredentialField> {
        self.asked
            .lock()
            .map(|asked| asked.clone())
            .unwrap_or_default()
    }
}

impl CredentialPrompt for CannedPrompt {
    fn prompt(&self, _url: &str, field: CredentialField) -> io::Result<String> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(field);
        }

        let value = match field {
            CredentialField::Username => &self.username,
            CredentialField::Password => &self.password,
        };

        value
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "not a terminal"))
    }
}
