//! Credential stores keyed by repository URL
//!
//! `FileKeyring` keeps credentials in a JSON document encrypted with an age
//! passphrase. The file is read lazily on first access so that a wrong
//! passphrase surfaces from the lookup, not from construction.
//! `MemoryKeyring` holds everything in memory and records flushes.

use crate::core::error::KeyringError;
use crate::core::traits::{CredentialStore, Credentials};
use crate::security::prompt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// On-disk representation of one credentials entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct StoredItem {
    url: String,
    username: String,
    password: String,
}

impl From<&Credentials> for StoredItem {
    fn from(item: &Credentials) -> Self {
        Self {
            url: item.url.clone(),
            username: item.username.clone(),
            password: item.password.expose_secret().to_string(),
        }
    }
}

impl From<&StoredItem> for Credentials {
    fn from(item: &StoredItem) -> Self {
        Credentials::new(&item.url, &item.username, &item.password)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct KeyringData {
    #[serde(default)]
    credentials: Vec<StoredItem>,
}

/// Where the keyring passphrase comes from
pub enum Passphrase {
    Provided(SecretString),
    /// Ask on the terminal the first time the keyring is opened
    Interactive,
}

impl Passphrase {
    fn obtain(&self) -> Result<SecretString, KeyringError> {
        let passphrase = match self {
            Passphrase::Provided(secret) => secret.clone(),
            Passphrase::Interactive => prompt::read_passphrase().map_err(|e| {
                tracing::error!(error = %e, "failed to read keyring passphrase");
                KeyringError::Prompt(e)
            })?,
        };

        if passphrase.expose_secret().is_empty() {
            return Err(KeyringError::EmptyPassphrase);
        }

        Ok(passphrase)
    }
}

/// age-encrypted keyring file
pub struct FileKeyring {
    path: PathBuf,
    passphrase_source: Passphrase,
    passphrase: Option<SecretString>,
    items: Option<BTreeMap<String, StoredItem>>,
}

impl FileKeyring {
    pub fn new<P: AsRef<Path>>(path: P, passphrase: Passphrase) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            passphrase_source: passphrase,
            passphrase: None,
            items: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn passphrase(&mut self) -> Result<SecretString, KeyringError> {
        if let Some(passphrase) = &self.passphrase {
            return Ok(passphrase.clone());
        }

        let passphrase = self.passphrase_source.obtain()?;
        self.passphrase = Some(passphrase.clone());
        Ok(passphrase)
    }

    /// Decrypt the file on first use; a missing file is an empty keyring
    fn items(&mut self) -> Result<&mut BTreeMap<String, StoredItem>, KeyringError> {
        if self.items.is_none() {
            let passphrase = self.passphrase()?;
            let data = if self.path.exists() {
                let encrypted = std::fs::read(&self.path)?;
                decrypt(&encrypted, passphrase)?
            } else {
                KeyringData::default()
            };

            tracing::debug!(
                path = %self.path.display(),
                entries = data.credentials.len(),
                "keyring loaded"
            );

            self.items = Some(
                data.credentials
                    .into_iter()
                    .map(|item| (item.url.clone(), item))
                    .collect(),
            );
        }

        Ok(self.items.get_or_insert_with(BTreeMap::new))
    }
}

impl CredentialStore for FileKeyring {
    fn get_for_url(&mut self, url: &str) -> Result<Credentials, KeyringError> {
        self.items()?
            .get(url)
            .map(Credentials::from)
            .ok_or(KeyringError::NotFound)
    }

    fn add_item(&mut self, item: Credentials) -> Result<(), KeyringError> {
        let stored = StoredItem::from(&item);
        self.items()?.insert(stored.url.clone(), stored);
        Ok(())
    }

    fn save(&mut self) -> Result<(), KeyringError> {
        let passphrase = self.passphrase()?;
        let data = KeyringData {
            credentials: self.items()?.values().cloned().collect(),
        };
        let encrypted = encrypt(&data, passphrase)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file, then rename
        let temp_file = self.path.with_extension("tmp");
        write_private(&temp_file, &encrypted)?;
        std::fs::rename(&temp_file, &self.path)?;

        tracing::info!(path = %self.path.display(), "keyring saved");
        Ok(())
    }
}

/// Write `contents` readable by the owner only
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // A leftover temp file keeps its old mode
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.sync_all()
}

fn encrypt(data: &KeyringData, passphrase: SecretString) -> Result<Vec<u8>, KeyringError> {
    let plaintext =
        serde_json::to_vec(data).map_err(|e| KeyringError::Malformed(e.to_string()))?;

    let encryptor = age::Encryptor::with_user_passphrase(passphrase);
    let mut encrypted = Vec::new();
    let mut writer = encryptor.wrap_output(&mut encrypted)?;
    writer.write_all(&plaintext)?;
    writer.finish()?;

    Ok(encrypted)
}

fn decrypt(encrypted: &[u8], passphrase: SecretString) -> Result<KeyringData, KeyringError> {
    let decryptor =
        age::Decryptor::new(encrypted).map_err(|e| KeyringError::Malformed(e.to_string()))?;
    let identity = age::scrypt::Identity::new(passphrase);

    let mut reader = decryptor
        .decrypt(std::iter::once(&identity as &dyn age::Identity))
        .map_err(|e| KeyringError::Malformed(e.to_string()))?;

    let mut plaintext = Vec::new();
    reader
        .read_to_end(&mut plaintext)
        .map_err(|e| KeyringError::Malformed(e.to_string()))?;

    serde_json::from_slice(&plaintext).map_err(|e| KeyringError::Malformed(e.to_string()))
}

/// In-memory credential store
///
/// `add_item` stages entries; `save` copies staged entries into the durable
/// view and counts the call. Failures can be injected for lookups, inserts
/// and saves.
#[derive(Default)]
pub struct MemoryKeyring {
    staged: BTreeMap<String, StoredItem>,
    durable: BTreeMap<String, StoredItem>,
    save_calls: usize,
    lookup_fault: Option<LookupFault>,
    fail_add: bool,
    fail_save: bool,
}

#[derive(Debug, Clone, Copy)]
enum LookupFault {
    Malformed,
    EmptyPassphrase,
    PassphrasePrompt,
}

impl LookupFault {
    fn to_error(self) -> KeyringError {
        match self {
            LookupFault::Malformed => KeyringError::Malformed("unreadable keyring".to_string()),
            LookupFault::EmptyPassphrase => KeyringError::EmptyPassphrase,
            LookupFault::PassphrasePrompt => KeyringError::Prompt(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "not a terminal",
            )),
        }
    }
}

impl MemoryKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyring already holding `items` in durable storage
    pub fn with_items(items: impl IntoIterator<Item = Credentials>) -> Self {
        let durable: BTreeMap<_, _> = items
            .into_iter()
            .map(|item| (item.url.clone(), StoredItem::from(&item)))
            .collect();

        Self {
            staged: durable.clone(),
            durable,
            ..Default::default()
        }
    }

    /// Every lookup reports a malformed store
    pub fn malformed() -> Self {
        Self::with_lookup_fault(LookupFault::Malformed)
    }

    /// Every lookup fails as if an empty passphrase was entered
    pub fn empty_passphrase() -> Self {
        Self::with_lookup_fault(LookupFault::EmptyPassphrase)
    }

    /// Every lookup fails as if the passphrase could not be read
    pub fn passphrase_prompt_failure() -> Self {
        Self::with_lookup_fault(LookupFault::PassphrasePrompt)
    }

    fn with_lookup_fault(fault: LookupFault) -> Self {
        Self {
            lookup_fault: Some(fault),
            ..Default::default()
        }
    }

    /// Make `add_item` fail
    pub fn failing_add(mut self) -> Self {
        self.fail_add = true;
        self
    }

    /// Make `save` fail
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls
    }

    /// Entry as last flushed by `save`
    pub fn saved(&self, url: &str) -> Option<Credentials> {
        self.durable.get(url).map(Credentials::from)
    }

    /// Entry in the in-memory view, flushed or not
    pub fn staged(&self, url: &str) -> Option<Credentials> {
        self.staged.get(url).map(Credentials::from)
    }
}

impl CredentialStore for MemoryKeyring {
    fn get_for_url(&mut self, url: &str) -> Result<Credentials, KeyringError> {
        if let Some(fault) = self.lookup_fault {
            return Err(fault.to_error());
        }

        self.staged
            .get(url)
            .map(Credentials::from)
            .ok_or(KeyringError::NotFound)
    }

    fn add_item(&mut self, item: Credentials) -> Result<(), KeyringError> {
        if self.fail_add {
            return Err(KeyringError::Malformed("keyring cannot be updated".to_string()));
        }

        self.staged.insert(item.url.clone(), StoredItem::from(&item));
        Ok(())
    }

    fn save(&mut self) -> Result<(), KeyringError> {
        self.save_calls += 1;
        if self.fail_save {
            return Err(KeyringError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "keyring is read-only",
            )));
        }

        self.durable = self.staged.clone();
        Ok(())
    }
}
