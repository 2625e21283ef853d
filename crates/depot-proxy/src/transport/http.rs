//! HTTP(S) remotes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::header::{IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::StatusCode;
use std::io;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use super::{TransferOutcome, Transport};
use crate::config::RemoteRepository;
use crate::error::{ProxyError, Result};

/// Format of the HTTP `Date`-style headers
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Streams remote files over HTTP
///
/// Timeouts are applied by the caller per connector, not by the client.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("depot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

/// Reason for a request that never produced a response
fn request_failure(e: reqwest::Error) -> TransferOutcome {
    match ProxyError::from(e) {
        ProxyError::TransferFailed { reason, .. } => TransferOutcome::Failed { reason },
        other => TransferOutcome::failed(other.to_string()),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(
        &self,
        remote: &RemoteRepository,
        relative_path: &str,
        destination: &Path,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> io::Result<TransferOutcome> {
        let url = remote.url_for(relative_path);
        let mut request = self.client.get(&url);
        if let Some(since) = if_modified_since {
            request = request.header(IF_MODIFIED_SINCE, since.format(HTTP_DATE).to_string());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return Ok(request_failure(e)),
        };
        match response.status() {
            StatusCode::NOT_MODIFIED => return Ok(TransferOutcome::NotModified),
            StatusCode::NOT_FOUND | StatusCode::GONE => return Ok(TransferOutcome::NotFound),
            s if !s.is_success() => return Ok(TransferOutcome::failed(format!("HTTP {}", s))),
            _ => {}
        }

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|d| d.with_timezone(&Utc));

        // Errors on `file` are local and propagate; errors on the stream
        // are the remote's
        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => file.write_all(&chunk).await?,
                Err(e) => return Ok(request_failure(e)),
            }
        }
        file.flush().await?;

        Ok(TransferOutcome::Downloaded { last_modified })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use depot_core::Layout;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JAR: &str = "/org/example/app/1.0/app-1.0.jar";

    async fn remote(server: &MockServer) -> RemoteRepository {
        RemoteRepository::new("central", server.uri(), Layout::Default)
    }

    #[tokio::test]
    async fn test_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JAR))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"jar-bytes".to_vec())
                    .insert_header("Last-Modified", "Sat, 15 Jun 2024 12:00:00 GMT"),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("download.tmp");
        let transport = HttpTransport::new().unwrap();
        let outcome = transport
            .fetch(&remote(&server).await, JAR, &dest, None)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            TransferOutcome::Downloaded {
                last_modified: Some(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
            }
        );
        assert_eq!(std::fs::read(&dest).unwrap(), b"jar-bytes");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(path("/missing.jar"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/gone.jar"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;
        Mock::given(path("/broken.jar"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let transport = HttpTransport::new().unwrap();
        let remote = remote(&server).await;

        for (name, expected_not_found) in [("missing.jar", true), ("gone.jar", true)] {
            let dest = dir.path().join(name);
            let outcome = transport.fetch(&remote, name, &dest, None).await.unwrap();
            assert_eq!(outcome == TransferOutcome::NotFound, expected_not_found);
            assert!(!dest.exists());
        }

        let dest = dir.path().join("broken.jar");
        let outcome = transport.fetch(&remote, "broken.jar", &dest, None).await.unwrap();
        assert!(matches!(outcome, TransferOutcome::Failed { reason } if reason.contains("503")));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_if_modified_since() {
        let server = MockServer::start().await;
        Mock::given(path(JAR))
            .and(header("If-Modified-Since", "Sat, 15 Jun 2024 12:00:00 GMT"))
            .respond_with(ResponseTemplate::new(304))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("download.tmp");
        let since = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let outcome = HttpTransport::new()
            .unwrap()
            .fetch(&remote(&server).await, JAR, &dest, Some(since))
            .await
            .unwrap();

        assert_eq!(outcome, TransferOutcome::NotModified);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_connection_refused_is_failure() {
        let remote = RemoteRepository::new("dead", "http://127.0.0.1:1", Layout::Default);
        let dir = tempfile::tempdir().unwrap();
        let outcome = HttpTransport::new()
            .unwrap()
            .fetch(&remote, JAR, &dir.path().join("x.tmp"), None)
            .await
            .unwrap();
        assert!(matches!(outcome, TransferOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_unwritable_destination_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(path(JAR))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jar-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join("download.tmp");
        let result = HttpTransport::new()
            .unwrap()
            .fetch(&remote(&server).await, JAR, &dest, None)
            .await;

        assert_eq!(result.unwrap_err().kind(), std::io::ErrorKind::NotFound);
    }
}
