//! In-memory transport for testing
//!
//! Serves files registered per remote id, records every call and can be
//! told to fail or stall a remote, or to fail writing the local copy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::{TransferOutcome, Transport};
use crate::config::RemoteRepository;

/// A file served by [`MemoryTransport`]
#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCall {
    pub remote_id: String,
    pub path: String,
    pub if_modified_since: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    /// remote id -> relative path -> file
    files: HashMap<String, HashMap<String, MemoryFile>>,
    failing: HashSet<String>,
    /// Remotes whose downloads fail locally, as on a full disk
    unwritable: HashSet<String>,
    delays: HashMap<String, Duration>,
    calls: Vec<TransferCall>,
}

/// Transport backed by a map of remote files
#[derive(Clone, Default)]
pub struct MemoryTransport {
    state: Arc<RwLock<State>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` at `path` of `remote_id`, modified now
    pub fn add(&self, remote_id: &str, path: &str, content: impl Into<Vec<u8>>) {
        self.add_modified(remote_id, path, content, Utc::now());
    }

    pub fn add_modified(
        &self,
        remote_id: &str,
        path: &str,
        content: impl Into<Vec<u8>>,
        last_modified: DateTime<Utc>,
    ) {
        let mut state = self.state.write().unwrap();
        state.files.entry(remote_id.to_string()).or_default().insert(
            path.trim_start_matches('/').to_string(),
            MemoryFile {
                content: content.into(),
                last_modified,
            },
        );
    }

    pub fn remove(&self, remote_id: &str, path: &str) {
        let mut state = self.state.write().unwrap();
        if let Some(files) = state.files.get_mut(remote_id) {
            files.remove(path.trim_start_matches('/'));
        }
    }

    /// Make every transfer from `remote_id` fail
    pub fn fail_remote(&self, remote_id: &str) {
        self.state.write().unwrap().failing.insert(remote_id.to_string());
    }

    pub fn heal_remote(&self, remote_id: &str) {
        self.state.write().unwrap().failing.remove(remote_id);
    }

    /// Make every download from `remote_id` fail to write its destination
    pub fn fail_writes(&self, remote_id: &str) {
        self.state
            .write()
            .unwrap()
            .unwritable
            .insert(remote_id.to_string());
    }

    /// Stall every transfer from `remote_id` before answering
    pub fn delay_remote(&self, remote_id: &str, delay: Duration) {
        self.state
            .write()
            .unwrap()
            .delays
            .insert(remote_id.to_string(), delay);
    }

    /// All calls so far, in order
    pub fn calls(&self) -> Vec<TransferCall> {
        self.state.read().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.read().unwrap().calls.len()
    }

    /// Calls made against one remote
    pub fn calls_to(&self, remote_id: &str) -> usize {
        self.state
            .read()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.remote_id == remote_id)
            .count()
    }

    pub fn reset_calls(&self) {
        self.state.write().unwrap().calls.clear();
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch(
        &self,
        remote: &RemoteRepository,
        relative_path: &str,
        destination: &Path,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> io::Result<TransferOutcome> {
        let path = relative_path.trim_start_matches('/');
        let delay = {
            let mut state = self.state.write().unwrap();
            state.calls.push(TransferCall {
                remote_id: remote.id.clone(),
                path: path.to_string(),
                if_modified_since,
            });
            state.delays.get(&remote.id).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let (file, unwritable) = {
            let state = self.state.read().unwrap();
            if state.failing.contains(&remote.id) {
                return Ok(TransferOutcome::failed(format!("{} is unreachable", remote.id)));
            }
            let file = state
                .files
                .get(&remote.id)
                .and_then(|files| files.get(path))
                .cloned();
            (file, state.unwritable.contains(&remote.id))
        };

        let Some(file) = file else {
            return Ok(TransferOutcome::NotFound);
        };
        if if_modified_since.is_some_and(|since| file.last_modified <= since) {
            return Ok(TransferOutcome::NotModified);
        }
        if unwritable {
            return Err(io::Error::other("No space left on device"));
        }

        tokio::fs::write(destination, &file.content).await?;
        Ok(TransferOutcome::Downloaded {
            last_modified: Some(file.last_modified),
        })
    }
}
