//! One transfer through one connector
//!
//! Applies the connector's failure-cache policy and timeout around a
//! transport call. Shared by artifact fetches and metadata merges. A local
//! write error is passed through untouched and never blamed on the remote.

use chrono::{DateTime, Utc};
use std::io;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::ResolvedConnector;
use crate::error::ProxyError;
use crate::failure_cache::FailureCache;
use crate::policy::{on_transfer_failure, TransferFailureAction};
use crate::transport::{TransferOutcome, Transport};

/// What happened when a connector was tried
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Attempt {
    /// The URL failed recently and was not tried
    Skipped,
    Transferred(TransferOutcome),
}

#[derive(Clone, Copy)]
pub(crate) struct ConnectorTransfer<'a> {
    transport: &'a dyn Transport,
    failures: &'a FailureCache,
}

impl<'a> ConnectorTransfer<'a> {
    pub(crate) fn new(transport: &'a dyn Transport, failures: &'a FailureCache) -> Self {
        Self { transport, failures }
    }

    pub(crate) async fn attempt(
        &self,
        connector: &ResolvedConnector<'_>,
        remote_path: &str,
        destination: &Path,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> io::Result<Attempt> {
        let url = connector.remote.url_for(remote_path);
        let cache_policy = connector.policies().cache_failures;

        if cache_policy.uses_cache() && self.failures.has_failed(&url) {
            debug!(remote = %connector.remote.id, url = %url, "Skipping recently failed URL");
            return Ok(Attempt::Skipped);
        }

        let timeout = connector.timeout();
        let transfer = self
            .transport
            .fetch(connector.remote, remote_path, destination, if_modified_since);
        let outcome = match tokio::time::timeout(timeout, transfer).await {
            Ok(outcome) => outcome?,
            Err(_) => TransferOutcome::failed(
                ProxyError::Timeout {
                    url: url.clone(),
                    seconds: timeout.as_secs(),
                }
                .to_string(),
            ),
        };

        if let TransferOutcome::Failed { reason } = &outcome {
            match on_transfer_failure(cache_policy) {
                TransferFailureAction::RecordAndContinue => {
                    warn!(remote = %connector.remote.id, url = %url, "Transfer failed: {}", reason);
                    if cache_policy.uses_cache() {
                        self.failures.record_failure(&url);
                    }
                }
            }
        }

        Ok(Attempt::Transferred(outcome))
    }
}
