//! Metadata merging
//!
//! A managed `maven-metadata.xml` is the union of its own content and the
//! copies of every remote that was checked. Each remote has a tracking
//! file `.metadata-<remote id>` next to the document whose modification
//! time is the last successful check of that remote.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use depot_core::{merge_metadata, MetadataCoordinate, RepositoryMetadata};

use crate::checksum::{write_sidecars, Digests};
use crate::config::ResolvedConnector;
use crate::error::Result;
use crate::fs::{modified_time, touch, write_atomic, TempFile};
use crate::policy::{needs_remote_check, UpdatePolicy};
use crate::transfer::{Attempt, ConnectorTransfer};
use crate::transport::TransferOutcome;

/// Prefix of the per-remote tracking files
pub const TRACKING_PREFIX: &str = ".metadata-";

/// Result of a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The local document was rewritten
    Merged(PathBuf),
    /// The local document was left as it was
    Unchanged(PathBuf),
    /// No local document and no remote had one
    NotFound,
}

impl MergeOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            MergeOutcome::Merged(path) | MergeOutcome::Unchanged(path) => Some(path),
            MergeOutcome::NotFound => None,
        }
    }
}

/// Per-connector state of one merge
enum RemoteCheck {
    /// The remote returned a usable document
    Merged(RepositoryMetadata),
    /// The remote was reached but had nothing new
    NoChange,
    Failed,
    NotChecked,
}

/// Tracking file for `remote_id` next to a metadata document
pub fn tracking_file(document: &Path, remote_id: &str) -> PathBuf {
    let name = format!("{}{}", TRACKING_PREFIX, remote_id);
    match document.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

pub(crate) struct MetadataMerger<'a> {
    transfer: ConnectorTransfer<'a>,
}

impl<'a> MetadataMerger<'a> {
    pub(crate) fn new(transfer: ConnectorTransfer<'a>) -> Self {
        Self { transfer }
    }

    /// Merge remote documents into the one at `destination`
    ///
    /// The caller holds the path lock for `destination`.
    pub(crate) async fn merge(
        &self,
        connectors: &[ResolvedConnector<'_>],
        coordinate: &MetadataCoordinate,
        destination: &Path,
    ) -> Result<MergeOutcome> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let local_exists = destination.is_file();
        let now = Utc::now();
        let remote_path = depot_core::metadata_path(coordinate);
        let mut remote_docs = Vec::new();

        for connector in connectors {
            let tracking = tracking_file(destination, &connector.remote.id);
            let check = self
                .check_remote(connector, coordinate, &remote_path, destination, &tracking, local_exists, now)
                .await?;
            match check {
                RemoteCheck::Merged(doc) => {
                    touch(&tracking)?;
                    remote_docs.push(doc);
                }
                RemoteCheck::NoChange => touch(&tracking)?,
                RemoteCheck::Failed | RemoteCheck::NotChecked => {}
            }
        }

        if remote_docs.is_empty() {
            return Ok(if local_exists {
                MergeOutcome::Unchanged(destination.to_path_buf())
            } else {
                MergeOutcome::NotFound
            });
        }

        let seed = if local_exists {
            read_local(destination, coordinate)
        } else {
            None
        };
        let merged = merge_metadata(coordinate, seed.as_ref(), &remote_docs, Utc::now());
        let xml = merged.to_xml()?;
        write_atomic(destination, xml.as_bytes())?;
        write_sidecars(destination, &Digests::of_bytes(xml.as_bytes()))?;

        info!(
            metadata = %coordinate,
            remotes = remote_docs.len(),
            versions = merged.versioning.versions.len(),
            "Merged metadata"
        );
        Ok(MergeOutcome::Merged(destination.to_path_buf()))
    }

    #[allow(clippy::too_many_arguments)]
    async fn check_remote(
        &self,
        connector: &ResolvedConnector<'_>,
        coordinate: &MetadataCoordinate,
        remote_path: &str,
        destination: &Path,
        tracking: &Path,
        local_exists: bool,
        now: DateTime<Utc>,
    ) -> Result<RemoteCheck> {
        // Without a local document the last check is irrelevant
        let last_checked = if local_exists {
            modified_time(tracking)
        } else {
            None
        };
        let policy = connector.policies().update_policy(coordinate.is_snapshot());
        if !needs_remote_check(policy, last_checked, now) {
            debug!(remote = %connector.remote.id, metadata = %coordinate, "Metadata check not due");
            return Ok(RemoteCheck::NotChecked);
        }
        let if_modified_since = match policy {
            UpdatePolicy::Ignore => None,
            _ => last_checked,
        };

        let temp = TempFile::beside(destination);
        match self
            .transfer
            .attempt(connector, remote_path, temp.path(), if_modified_since)
            .await?
        {
            Attempt::Transferred(TransferOutcome::Downloaded { .. }) => {}
            Attempt::Transferred(TransferOutcome::NotModified | TransferOutcome::NotFound) => {
                return Ok(RemoteCheck::NoChange);
            }
            Attempt::Transferred(TransferOutcome::Failed { .. }) | Attempt::Skipped => {
                return Ok(RemoteCheck::Failed);
            }
        }

        let bytes = std::fs::read(temp.path())?;
        let check = match RepositoryMetadata::from_bytes(&bytes) {
            Ok(doc) if doc.describes(coordinate) => RemoteCheck::Merged(doc),
            Ok(doc) => {
                warn!(
                    remote = %connector.remote.id,
                    metadata = %coordinate,
                    "Remote metadata describes {}:{}{} instead",
                    doc.group_id,
                    doc.artifact_id,
                    doc.version.as_deref().map(|v| format!(":{}", v)).unwrap_or_default()
                );
                RemoteCheck::Failed
            }
            Err(e) => {
                warn!(remote = %connector.remote.id, metadata = %coordinate, "Unparseable remote metadata: {}", e);
                RemoteCheck::Failed
            }
        };
        Ok(check)
    }
}

/// Current local document, if it parses
fn read_local(path: &Path, coordinate: &MetadataCoordinate) -> Option<RepositoryMetadata> {
    let bytes = std::fs::read(path).ok()?;
    match RepositoryMetadata::from_bytes(&bytes) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!(metadata = %coordinate, "Discarding unparseable local metadata: {}", e);
            None
        }
    }
}
