//! Fetch orchestration
//!
//! Resolves a request against a managed repository, deciding per connector
//! whether the remote must be consulted, and materializes whatever the
//! first successful connector returns.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use depot_core::{metadata_path, ArtifactCoordinate, MetadataCoordinate, RepositoryPath};

use crate::checksum::{
    check_sidecar, parse_sidecar, write_sidecar, ChecksumAlgorithm, Digests, SidecarState,
};
use crate::config::{ProxyConfig, ResolvedConnector};
use crate::error::{ProxyError, Result};
use crate::failure_cache::FailureCache;
use crate::fs::{modified_time, touch, TempFile};
use crate::merger::{MergeOutcome, MetadataMerger};
use crate::path_lock::PathLocks;
use crate::policy::{
    needs_remote_check, on_checksum_mismatch, ChecksumAction, ChecksumPolicy, UpdatePolicy,
};
use crate::transfer::{Attempt, ConnectorTransfer};
use crate::transport::{TransferOutcome, Transport};

/// Result of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The managed file, fresh or previously cached
    Found(PathBuf),
    NotFound,
}

impl FetchOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            FetchOutcome::Found(path) => Some(path),
            FetchOutcome::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found(_))
    }
}

/// What one connector did for an artifact
enum ConnectorResult {
    /// A new copy is in place
    Materialized,
    /// The remote confirmed the local copy
    Confirmed,
    /// Nothing usable, try the next connector
    Continue,
}

/// Fills managed repositories from their remotes
pub struct FetchOrchestrator {
    config: RwLock<Arc<ProxyConfig>>,
    transport: Arc<dyn Transport>,
    failures: Arc<FailureCache>,
    locks: PathLocks,
}

impl FetchOrchestrator {
    pub fn new(config: ProxyConfig, transport: Arc<dyn Transport>) -> Self {
        let failures = Arc::new(FailureCache::new(config.failure_cache_ttl));
        Self {
            config: RwLock::new(Arc::new(config)),
            transport,
            failures,
            locks: PathLocks::new(),
        }
    }

    /// Share a failure cache with other orchestrators
    pub fn with_failure_cache(mut self, failures: Arc<FailureCache>) -> Self {
        self.failures = failures;
        self
    }

    /// The configuration new fetches start with
    pub fn config(&self) -> Arc<ProxyConfig> {
        Arc::clone(&self.config.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swap in a new configuration; fetches in flight keep the old one
    pub fn update_config(&self, config: ProxyConfig) -> Result<()> {
        config.validate()?;
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);
        Ok(())
    }

    pub fn failure_cache(&self) -> &Arc<FailureCache> {
        &self.failures
    }

    /// Fetch whatever a repository-relative path names
    pub async fn fetch_path(&self, managed_id: &str, path: &str) -> Result<FetchOutcome> {
        let config = self.config();
        let managed = config.require_managed(managed_id)?;
        match managed.layout.to_coordinate(path)? {
            RepositoryPath::Artifact(coordinate) => self.fetch_artifact(managed_id, &coordinate).await,
            RepositoryPath::Metadata(coordinate) => self.fetch_metadata(managed_id, &coordinate).await,
        }
    }

    /// Return a local copy of an artifact, fetching or refreshing it as the
    /// connector policies require
    pub async fn fetch_artifact(
        &self,
        managed_id: &str,
        coordinate: &ArtifactCoordinate,
    ) -> Result<FetchOutcome> {
        let config = self.config();
        let managed = config.require_managed(managed_id)?;
        let destination = managed.resolve(&managed.layout.to_path(coordinate));

        let _guard = self.locks.acquire(&destination).await;

        let last_checked = modified_time(&destination);
        let now = Utc::now();
        let snapshot = coordinate.is_snapshot();
        let connectors = config.connectors_for(managed_id);
        let pending: Vec<_> = connectors
            .iter()
            .filter(|c| needs_remote_check(c.policies().update_policy(snapshot), last_checked, now))
            .collect();

        if pending.is_empty() {
            return Ok(match last_checked {
                Some(_) => {
                    debug!(repo = managed_id, artifact = %coordinate, "Serving cached copy");
                    FetchOutcome::Found(destination)
                }
                None => FetchOutcome::NotFound,
            });
        }

        let transfer = ConnectorTransfer::new(self.transport.as_ref(), &self.failures);
        for connector in pending {
            let remote_path = connector.remote.layout.to_path(coordinate);
            let if_modified_since = match connector.policies().update_policy(snapshot) {
                UpdatePolicy::Ignore => None,
                _ => last_checked,
            };

            let result = self
                .try_connector(&transfer, connector, &remote_path, &destination, if_modified_since)
                .await?;
            match result {
                ConnectorResult::Materialized => {
                    info!(
                        repo = managed_id,
                        remote = %connector.remote.id,
                        artifact = %coordinate,
                        "Fetched artifact"
                    );
                    return Ok(FetchOutcome::Found(destination));
                }
                ConnectorResult::Confirmed => {
                    touch(&destination)?;
                    debug!(remote = %connector.remote.id, artifact = %coordinate, "Local copy is current");
                    return Ok(FetchOutcome::Found(destination));
                }
                ConnectorResult::Continue => {}
            }
        }

        if last_checked.is_some() {
            warn!(repo = managed_id, artifact = %coordinate, "No remote answered, serving cached copy");
            Ok(FetchOutcome::Found(destination))
        } else {
            debug!(repo = managed_id, artifact = %coordinate, "Not found in any remote");
            Ok(FetchOutcome::NotFound)
        }
    }

    /// Return the local metadata document, merging remote copies into it as
    /// the connector policies require
    pub async fn fetch_metadata(
        &self,
        managed_id: &str,
        coordinate: &MetadataCoordinate,
    ) -> Result<FetchOutcome> {
        Ok(match self.merge_metadata(managed_id, coordinate).await? {
            MergeOutcome::Merged(path) | MergeOutcome::Unchanged(path) => FetchOutcome::Found(path),
            MergeOutcome::NotFound => FetchOutcome::NotFound,
        })
    }

    /// Like [`FetchOrchestrator::fetch_metadata`], reporting whether the
    /// local document was rewritten
    pub async fn merge_metadata(
        &self,
        managed_id: &str,
        coordinate: &MetadataCoordinate,
    ) -> Result<MergeOutcome> {
        let config = self.config();
        let managed = config.require_managed(managed_id)?;
        let destination = managed.resolve(&metadata_path(coordinate));

        let _guard = self.locks.acquire(&destination).await;

        let transfer = ConnectorTransfer::new(self.transport.as_ref(), &self.failures);
        MetadataMerger::new(transfer)
            .merge(&config.connectors_for(managed_id), coordinate, &destination)
            .await
    }

    async fn try_connector(
        &self,
        transfer: &ConnectorTransfer<'_>,
        connector: &ResolvedConnector<'_>,
        remote_path: &str,
        destination: &Path,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> Result<ConnectorResult> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = TempFile::beside(destination);
        match transfer
            .attempt(connector, remote_path, temp.path(), if_modified_since)
            .await?
        {
            Attempt::Transferred(TransferOutcome::Downloaded { .. }) => {}
            Attempt::Transferred(TransferOutcome::NotModified) if destination.exists() => {
                return Ok(ConnectorResult::Confirmed);
            }
            Attempt::Transferred(TransferOutcome::NotFound) => {
                debug!(remote = %connector.remote.id, path = remote_path, "Not found");
                return Ok(ConnectorResult::Continue);
            }
            _ => return Ok(ConnectorResult::Continue),
        }

        let digests = Digests::of_file(temp.path())?;
        let mut sidecars = Vec::with_capacity(ChecksumAlgorithm::ALL.len());
        for algorithm in ChecksumAlgorithm::ALL {
            let sidecar = TempFile::beside(&algorithm.sidecar_path(destination));
            let sidecar_path = format!("{}.{}", remote_path, algorithm.extension());
            let state = match transfer.attempt(connector, &sidecar_path, sidecar.path(), None).await? {
                Attempt::Transferred(TransferOutcome::Downloaded { .. }) => {
                    check_sidecar(sidecar.path(), algorithm, &digests)
                }
                _ => SidecarState::Missing,
            };
            sidecars.push((algorithm, sidecar, state));
        }

        let policy = connector.policies().checksum;
        let mut mismatched = sidecars.iter().any(|(_, _, state)| state.is_mismatch());
        for (algorithm, _, state) in &sidecars {
            if let SidecarState::Mismatch { expected } = state {
                let err = ProxyError::ChecksumMismatch {
                    path: remote_path.to_string(),
                    algorithm: algorithm.to_string(),
                    expected: expected.clone(),
                    actual: digests.get(*algorithm).to_string(),
                };
                warn!(remote = %connector.remote.id, "{}", err);
            }
        }
        let all_missing = sidecars.iter().all(|(_, _, s)| *s == SidecarState::Missing);
        if all_missing && policy == ChecksumPolicy::Fail {
            warn!(remote = %connector.remote.id, path = remote_path, "No checksum files to verify against");
            mismatched = true;
        }

        let action = if mismatched {
            on_checksum_mismatch(policy)
        } else {
            ChecksumAction::Accept
        };
        if action == ChecksumAction::RejectArtifact {
            warn!(remote = %connector.remote.id, path = remote_path, "Rejected download");
            return Ok(ConnectorResult::Continue);
        }

        // Sidecars first; the artifact rename is the last step
        for (algorithm, sidecar, state) in sidecars {
            match state {
                // Kept as the remote stated it; only reachable under `ignore`
                SidecarState::Mismatch { expected } if action == ChecksumAction::Accept => {
                    match parse_sidecar(&expected, algorithm) {
                        Some(digest) => write_sidecar(destination, algorithm, &digest)?,
                        None => sidecar.persist(&algorithm.sidecar_path(destination))?,
                    }
                }
                _ => write_sidecar(destination, algorithm, digests.get(algorithm))?,
            }
        }
        temp.persist(destination)?;
        if action == ChecksumAction::RepairChecksumFile {
            info!(path = %destination.display(), "Rewrote checksum files from downloaded content");
        }

        Ok(ConnectorResult::Materialized)
    }
}
