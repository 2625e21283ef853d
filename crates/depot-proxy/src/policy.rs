//! Connector policies
//!
//! Every decision here is a pure function of the policy value and the
//! state of the local copy. The orchestrator does the I/O.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How to react when a downloaded file disagrees with its checksums
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Keep the file and whatever checksums came with it
    Ignore,
    /// Discard the file and try the next connector
    Fail,
    /// Keep the file and rewrite its checksums from the downloaded bytes
    #[default]
    Fix,
}

/// When a cached release or snapshot must be checked against a remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Always consult the remote; a fresh copy always overwrites
    Ignore,
    /// Only fetch when there is no local copy
    Once,
    /// Fetch when the last check was on another UTC day
    Daily,
    /// Always consult the remote
    Always,
}

/// Whether transfer failures are remembered between requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheFailuresPolicy {
    /// Never consult or populate the failure cache
    #[default]
    Ignore,
    /// Skip remotes that failed recently
    Cache,
}

impl CacheFailuresPolicy {
    pub fn uses_cache(&self) -> bool {
        matches!(self, CacheFailuresPolicy::Cache)
    }
}

/// The policy set of one proxy connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Policies {
    #[serde(default)]
    pub checksum: ChecksumPolicy,
    #[serde(default = "default_releases")]
    pub releases: UpdatePolicy,
    #[serde(default = "default_snapshots")]
    pub snapshots: UpdatePolicy,
    #[serde(default)]
    pub cache_failures: CacheFailuresPolicy,
}

fn default_releases() -> UpdatePolicy {
    UpdatePolicy::Once
}

fn default_snapshots() -> UpdatePolicy {
    UpdatePolicy::Daily
}

impl Default for Policies {
    fn default() -> Self {
        Self {
            checksum: ChecksumPolicy::default(),
            releases: default_releases(),
            snapshots: default_snapshots(),
            cache_failures: CacheFailuresPolicy::default(),
        }
    }
}

impl Policies {
    /// Snapshots policy for snapshot content, releases policy otherwise
    pub fn update_policy(&self, snapshot: bool) -> UpdatePolicy {
        if snapshot {
            self.snapshots
        } else {
            self.releases
        }
    }
}

/// Outcome of a checksum mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumAction {
    RejectArtifact,
    RepairChecksumFile,
    Accept,
}

/// Outcome of a failed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFailureAction {
    /// Note the failure and move on to the next connector
    RecordAndContinue,
}

/// Must the remote be consulted for an item last checked at `last_checked`?
///
/// `last_checked` is `None` when there is no local copy.
pub fn needs_remote_check(
    policy: UpdatePolicy,
    last_checked: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match policy {
        UpdatePolicy::Always | UpdatePolicy::Ignore => true,
        UpdatePolicy::Once => last_checked.is_none(),
        UpdatePolicy::Daily => match last_checked {
            None => true,
            Some(checked) => checked.date_naive() != now.date_naive(),
        },
    }
}

pub fn on_checksum_mismatch(policy: ChecksumPolicy) -> ChecksumAction {
    match policy {
        ChecksumPolicy::Fail => ChecksumAction::RejectArtifact,
        ChecksumPolicy::Fix => ChecksumAction::RepairChecksumFile,
        ChecksumPolicy::Ignore => ChecksumAction::Accept,
    }
}

/// A single connector's failure never aborts a fetch
pub fn on_transfer_failure(_policy: CacheFailuresPolicy) -> TransferFailureAction {
    TransferFailureAction::RecordAndContinue
}
