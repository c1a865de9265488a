pub mod core;
pub mod orchestration;
pub mod security;
pub mod transport;
pub mod vcs;

pub use core::*;
pub use orchestration::{ArtifactPublisher, PublishOptions, PublishReport};
pub use security::{
    CannedPrompt, CommandError, CredentialResolver, FileKeyring, MemoryKeyring, Passphrase,
    SafeCommandExecutor, TerminalPrompt,
};
pub use transport::ReqwestRepositoryClient;
pub use vcs::{GitRepoInfoResolver, StaticRepoInfo};
