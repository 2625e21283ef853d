//! Depot Core - artifact coordinates, repository layouts and metadata
//!
//! This crate holds the pure, I/O-free half of Depot:
//! - `ArtifactCoordinate` and friends: the identity of repository content
//! - `Layout`: bidirectional translation between native paths and coordinates
//! - `RepositoryMetadata`: the `maven-metadata.xml` model and merge rules
//! - `version`: snapshot detection and version ordering

pub mod coordinate;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod version;

pub use coordinate::{
    ArtifactCoordinate, MetadataCoordinate, ProjectCoordinate, RepositoryPath, VersionedCoordinate,
};
pub use error::{CoreError, LayoutError, Result};
pub use layout::{Layout, METADATA_FILE, metadata_path};
pub use metadata::{RepositoryMetadata, SnapshotVersion, Versioning, merge_metadata};
