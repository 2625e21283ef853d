//! `file://` remotes, for mirrors on local or network filesystems

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{TransferOutcome, Transport};
use crate::config::RemoteRepository;
use crate::fs::modified_time;

/// Copies files out of a directory tree
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTransport;

impl FileTransport {
    fn source_path(remote: &RemoteRepository, relative_path: &str) -> Option<PathBuf> {
        let root = url::Url::parse(&remote.url).ok()?.to_file_path().ok()?;
        Some(root.join(relative_path.trim_start_matches('/')))
    }
}

#[async_trait]
impl Transport for FileTransport {
    async fn fetch(
        &self,
        remote: &RemoteRepository,
        relative_path: &str,
        destination: &Path,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> io::Result<TransferOutcome> {
        let Some(source) = Self::source_path(remote, relative_path) else {
            return Ok(TransferOutcome::failed(format!("not a file URL: {}", remote.url)));
        };
        if !source.is_file() {
            return Ok(TransferOutcome::NotFound);
        }

        let last_modified = modified_time(&source);
        if let (Some(since), Some(modified)) = (if_modified_since, last_modified) {
            if modified <= since {
                return Ok(TransferOutcome::NotModified);
            }
        }

        // Opening the source is the remote side; the copy itself can only
        // fail on reading it or on writing the destination
        let mut reader = match tokio::fs::File::open(&source).await {
            Ok(file) => file,
            Err(e) => {
                return Ok(TransferOutcome::failed(format!(
                    "cannot open {}: {}",
                    source.display(),
                    e
                )));
            }
        };
        let mut writer = tokio::fs::File::create(destination).await?;
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let read = match reader.read(&mut buffer).await {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) => {
                    return Ok(TransferOutcome::failed(format!(
                        "read of {} failed: {}",
                        source.display(),
                        e
                    )));
                }
            };
            writer.write_all(&buffer[..read]).await?;
        }
        writer.flush().await?;

        Ok(TransferOutcome::Downloaded { last_modified })
    }
}
