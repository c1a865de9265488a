pub mod command_executor;
pub mod credential_resolver;
pub mod keyring;
pub mod prompt;

pub use command_executor::{CommandError, SafeCommandExecutor};
pub use credential_resolver::CredentialResolver;
pub use keyring::{FileKeyring, MemoryKeyring, Passphrase};
pub use prompt::{CannedPrompt, TerminalPrompt};
