//! Working-copy inspection

pub mod repo_info;

pub use repo_info::{GitRepoInfoResolver, StaticRepoInfo, repository_name_from_url};
