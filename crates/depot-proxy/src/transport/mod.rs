//! Remote transports
//!
//! A transport moves one remote file to a local temp path. Anything that
//! goes wrong on the remote side is folded into [`TransferOutcome`] so the
//! orchestrator can record it and move on to the next connector. Only a
//! failure to write the local destination is returned as an error.

mod file;
mod http;
mod memory;

pub use file::FileTransport;
pub use http::HttpTransport;
pub use memory::{MemoryTransport, TransferCall};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::Path;

use crate::config::RemoteRepository;
use crate::error::Result;

/// Result of a single transfer attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The file was written to the destination
    Downloaded {
        last_modified: Option<DateTime<Utc>>,
    },
    /// The remote copy is not newer than `if_modified_since`
    NotModified,
    NotFound,
    Failed { reason: String },
}

impl TransferOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        TransferOutcome::Failed {
            reason: reason.into(),
        }
    }
}

/// Fetches files from remote repositories
#[async_trait]
pub trait Transport: Send + Sync {
    /// Copy `relative_path` of `remote` to `destination`
    ///
    /// `destination` is a temp path owned by the caller. Its contents are
    /// only meaningful on [`TransferOutcome::Downloaded`]; anything left
    /// there after another outcome is discarded.
    ///
    /// `Err` means `destination` could not be written (disk full,
    /// permissions). It is local, so no other remote would do better.
    async fn fetch(
        &self,
        remote: &RemoteRepository,
        relative_path: &str,
        destination: &Path,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> io::Result<TransferOutcome>;
}

/// Dispatches on the scheme of the remote URL
pub struct RemoteTransport {
    http: HttpTransport,
    file: FileTransport,
}

impl RemoteTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            http: HttpTransport::new()?,
            file: FileTransport,
        })
    }
}

#[async_trait]
impl Transport for RemoteTransport {
    async fn fetch(
        &self,
        remote: &RemoteRepository,
        relative_path: &str,
        destination: &Path,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> io::Result<TransferOutcome> {
        if remote.url.starts_with("file:") {
            self.file
                .fetch(remote, relative_path, destination, if_modified_since)
                .await
        } else {
            self.http
                .fetch(remote, relative_path, destination, if_modified_since)
                .await
        }
    }
}
