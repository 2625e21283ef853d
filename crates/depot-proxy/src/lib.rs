//! Depot Proxy - filling managed repositories from remote ones
//!
//! This crate provides the I/O half of Depot:
//!
//! - **Proxy connectors**: ordered links from a managed repository to remotes
//! - **Policies**: when to re-check a cached copy, what to do on a bad checksum
//! - **Failure cache**: skip remotes that failed recently
//! - **Metadata merging**: one `maven-metadata.xml` built from every remote
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use depot_core::ArtifactCoordinate;
//! use depot_proxy::{FetchOrchestrator, ProxyConfig, RemoteTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProxyConfig::load_from("depot.yaml".as_ref())?;
//! let orchestrator = FetchOrchestrator::new(config, Arc::new(RemoteTransport::new()?));
//!
//! let jar = ArtifactCoordinate::new("org.example", "app", "1.0", "jar");
//! if let Some(path) = orchestrator.fetch_artifact("internal", &jar).await?.path() {
//!     println!("{}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod failure_cache;
pub mod fetch;
pub mod fs;
pub mod merger;
pub mod path_lock;
pub mod policy;
mod transfer;
pub mod transport;

// Re-exports for convenience
pub use checksum::{ChecksumAlgorithm, Digests};
pub use config::{ManagedRepository, ProxyConfig, ProxyConnector, RemoteRepository};
pub use error::{ProxyError, Result};
pub use failure_cache::FailureCache;
pub use fetch::{FetchOrchestrator, FetchOutcome};
pub use merger::MergeOutcome;
pub use policy::{CacheFailuresPolicy, ChecksumPolicy, Policies, UpdatePolicy};
pub use transport::{
    FileTransport, HttpTransport, MemoryTransport, RemoteTransport, TransferOutcome, Transport,
};
