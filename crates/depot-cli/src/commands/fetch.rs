//! Fetch and merge commands

use console::style;
use std::path::Path;
use std::sync::Arc;

use depot_core::RepositoryPath;
use depot_proxy::{FetchOrchestrator, FetchOutcome, MergeOutcome, RemoteTransport};

use super::load_config;
use crate::error::{CliError, Result};

fn orchestrator(config_path: &Path) -> Result<FetchOrchestrator> {
    let config = load_config(config_path)?;
    let transport = RemoteTransport::new()?;
    Ok(FetchOrchestrator::new(config, Arc::new(transport)))
}

/// Fetch an artifact or metadata path and print where it landed
pub async fn run(config_path: &Path, repo: &str, path: &str) -> Result<()> {
    let orchestrator = orchestrator(config_path)?;
    match orchestrator.fetch_path(repo, path).await? {
        FetchOutcome::Found(local) => {
            println!("{}", local.display());
            Ok(())
        }
        FetchOutcome::NotFound => Err(CliError::not_found(format!("{} in {}", path, repo))),
    }
}

/// Merge remote metadata for a `maven-metadata.xml` path
pub async fn merge(config_path: &Path, repo: &str, path: &str) -> Result<()> {
    let orchestrator = orchestrator(config_path)?;
    let managed = orchestrator.config().require_managed(repo)?.clone();
    let coordinate = match managed.layout.to_coordinate(path)? {
        RepositoryPath::Metadata(coordinate) => coordinate,
        RepositoryPath::Artifact(_) => {
            return Err(CliError::usage(format!("{} is not a metadata path", path)));
        }
    };

    match orchestrator.merge_metadata(repo, &coordinate).await? {
        MergeOutcome::Merged(local) => {
            println!("{} {}", style("merged").green().bold(), local.display());
            Ok(())
        }
        MergeOutcome::Unchanged(local) => {
            println!("{} {}", style("unchanged").dim(), local.display());
            Ok(())
        }
        MergeOutcome::NotFound => Err(CliError::not_found(format!("{} in {}", path, repo))),
    }
}
