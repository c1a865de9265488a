//! Orchestration layer for artifact publishing
//!
//! This module wires endpoint selection, credential resolution and the
//! authenticated upload into one publish run.

pub mod artifact_publisher;
pub mod artifact_uploader;
pub mod endpoint_selector;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use artifact_publisher::{ArtifactPublisher, PublishOptions, PublishReport};
pub use artifact_uploader::{ArtifactUploader, ensure_artifact_exists};
pub use endpoint_selector::EndpointSelector;
