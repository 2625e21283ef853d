//! Proxy configuration
//!
//! Loaded from YAML once, validated, then handed to the orchestrator as an
//! immutable snapshot. A new snapshot replaces the old one between
//! fetches; a fetch in flight keeps the snapshot it started with.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use depot_core::Layout;

use crate::error::{ProxyError, Result};
use crate::failure_cache::DEFAULT_FAILURE_TTL;
use crate::policy::Policies;

/// Transfer timeout used when neither the connector nor the remote sets one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Proxy configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfig {
    /// How long a failed remote URL is skipped under `cache-failures: cache`
    #[serde(default = "default_failure_ttl", with = "humantime_serde")]
    pub failure_cache_ttl: Duration,

    #[serde(default)]
    pub managed_repositories: Vec<ManagedRepository>,

    #[serde(default)]
    pub remote_repositories: Vec<RemoteRepository>,

    /// Declaration order breaks ties between equal `order` values
    #[serde(default)]
    pub proxy_connectors: Vec<ProxyConnector>,
}

fn default_failure_ttl() -> Duration {
    DEFAULT_FAILURE_TTL
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            failure_cache_ttl: default_failure_ttl(),
            managed_repositories: Vec::new(),
            remote_repositories: Vec::new(),
            proxy_connectors: Vec::new(),
        }
    }
}

/// The authoritative local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedRepository {
    pub id: String,
    pub location: PathBuf,
    #[serde(default)]
    pub layout: Layout,
}

impl ManagedRepository {
    pub fn new(id: impl Into<String>, location: impl Into<PathBuf>, layout: Layout) -> Self {
        Self {
            id: id.into(),
            location: location.into(),
            layout,
        }
    }

    /// Absolute path of a repository-relative native path
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.location.join(relative)
    }
}

/// A read-only upstream repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRepository {
    pub id: String,
    /// `http://`, `https://` or `file://`
    pub url: String,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl RemoteRepository {
    pub fn new(id: impl Into<String>, url: impl Into<String>, layout: Layout) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            layout,
            timeout: None,
        }
    }

    /// Full URL of a repository-relative path
    pub fn url_for(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }
}

/// Permission for a managed repository to be filled from a remote one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConnector {
    pub source_repo_id: String,
    pub target_repo_id: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub policies: Policies,
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl ProxyConnector {
    pub fn new(source: impl Into<String>, target: impl Into<String>, order: u32) -> Self {
        Self {
            source_repo_id: source.into(),
            target_repo_id: target.into(),
            order,
            policies: Policies::default(),
            timeout: None,
        }
    }

    pub fn with_policies(mut self, policies: Policies) -> Self {
        self.policies = policies;
        self
    }
}

/// A connector joined with the remote it points at
#[derive(Debug, Clone)]
pub struct ResolvedConnector<'a> {
    pub connector: &'a ProxyConnector,
    pub remote: &'a RemoteRepository,
}

impl ResolvedConnector<'_> {
    pub fn policies(&self) -> &Policies {
        &self.connector.policies
    }

    /// Connector timeout, then remote timeout, then the default
    pub fn timeout(&self) -> Duration {
        self.connector
            .timeout
            .or(self.remote.timeout)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

impl ProxyConfig {
    /// Load and validate a configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check references and repository locations
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        let all_ids = self
            .managed_repositories
            .iter()
            .map(|r| &r.id)
            .chain(self.remote_repositories.iter().map(|r| &r.id));
        for id in all_ids {
            if id.is_empty() {
                return Err(invalid("repository id must not be empty"));
            }
            if !ids.insert(id.as_str()) {
                return Err(invalid(format!("duplicate repository id '{}'", id)));
            }
        }

        for repo in &self.managed_repositories {
            if !repo.location.is_dir() {
                return Err(invalid(format!(
                    "location of managed repository '{}' is not a directory: {}",
                    repo.id,
                    repo.location.display()
                )));
            }
        }

        for repo in &self.remote_repositories {
            let url = url::Url::parse(&repo.url).map_err(|e| ProxyError::InvalidRepositoryUrl {
                url: repo.url.clone(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https" | "file") {
                return Err(ProxyError::InvalidRepositoryUrl {
                    url: repo.url.clone(),
                    reason: "URL must start with http://, https:// or file://".to_string(),
                });
            }
        }

        let mut pairs = HashSet::new();
        for connector in &self.proxy_connectors {
            if self.managed(&connector.source_repo_id).is_none() {
                return Err(invalid(format!(
                    "connector source '{}' is not a managed repository",
                    connector.source_repo_id
                )));
            }
            if self.remote(&connector.target_repo_id).is_none() {
                return Err(invalid(format!(
                    "connector target '{}' is not a remote repository",
                    connector.target_repo_id
                )));
            }
            if !pairs.insert((&connector.source_repo_id, &connector.target_repo_id)) {
                return Err(invalid(format!(
                    "duplicate connector '{}' -> '{}'",
                    connector.source_repo_id, connector.target_repo_id
                )));
            }
        }

        Ok(())
    }

    pub fn managed(&self, id: &str) -> Option<&ManagedRepository> {
        self.managed_repositories.iter().find(|r| r.id == id)
    }

    pub fn remote(&self, id: &str) -> Option<&RemoteRepository> {
        self.remote_repositories.iter().find(|r| r.id == id)
    }

    /// Managed repository by id, as an error if unknown
    pub fn require_managed(&self, id: &str) -> Result<&ManagedRepository> {
        self.managed(id).ok_or_else(|| ProxyError::RepositoryNotFound { id: id.to_string() })
    }

    /// Connectors of a managed repository in fallback order
    pub fn connectors_for(&self, managed_id: &str) -> Vec<ResolvedConnector<'_>> {
        let mut connectors: Vec<_> = self
            .proxy_connectors
            .iter()
            .filter(|c| c.source_repo_id == managed_id)
            .filter_map(|connector| {
                self.remote(&connector.target_repo_id)
                    .map(|remote| ResolvedConnector { connector, remote })
            })
            .collect();
        // Stable sort keeps declaration order for equal `order`
        connectors.sort_by_key(|c| c.connector.order);
        connectors
    }
}

fn invalid(message: impl Into<String>) -> ProxyError {
    ProxyError::InvalidConfig {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CacheFailuresPolicy, ChecksumPolicy, UpdatePolicy};

    fn yaml_for(location: &Path) -> String {
        format!(
            r#"
failureCacheTtl: 2m
managedRepositories:
  - id: internal
    location: {}
remoteRepositories:
  - id: central
    url: https://repo.maven.apache.org/maven2
    timeout: 10s
  - id: legacy-mirror
    url: http://mirror.example.com/maven
    layout: legacy
proxyConnectors:
  - sourceRepoId: internal
    targetRepoId: legacy-mirror
    order: 2
  - sourceRepoId: internal
    targetRepoId: central
    order: 1
    timeout: 5s
    policies:
      checksum: fail
      releases: daily
      snapshots: always
      cache-failures: cache
"#,
            location.display()
        )
    }

    #[test]
    fn test_parse_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProxyConfig::from_yaml(&yaml_for(dir.path())).unwrap();

        assert_eq!(config.failure_cache_ttl, Duration::from_secs(120));
        assert_eq!(config.managed("internal").unwrap().layout, Layout::Default);
        assert_eq!(config.remote("legacy-mirror").unwrap().layout, Layout::Legacy);

        let connectors = config.connectors_for("internal");
        assert_eq!(connectors.len(), 2);
        assert_eq!(connectors[0].remote.id, "central");
        assert_eq!(connectors[0].timeout(), Duration::from_secs(5));
        assert_eq!(connectors[1].remote.id, "legacy-mirror");
        assert_eq!(connectors[1].timeout(), DEFAULT_TIMEOUT);

        let policies = connectors[0].policies();
        assert_eq!(policies.checksum, ChecksumPolicy::Fail);
        assert_eq!(policies.releases, UpdatePolicy::Daily);
        assert_eq!(policies.snapshots, UpdatePolicy::Always);
        assert_eq!(policies.cache_failures, CacheFailuresPolicy::Cache);

        assert_eq!(connectors[1].policies(), &Policies::default());
    }

    #[test]
    fn test_unknown_layout_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = yaml_for(dir.path()).replace("layout: legacy", "layout: maven1");
        assert!(matches!(
            ProxyConfig::from_yaml(&yaml),
            Err(ProxyError::Serialization(_))
        ));
    }

    #[test]
    fn test_dangling_connector_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = yaml_for(dir.path()).replace("targetRepoId: central", "targetRepoId: nowhere");
        let err = ProxyConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("nowhere"));
    }

    #[test]
    fn test_missing_location_rejected() {
        let yaml = yaml_for(Path::new("/definitely/not/here"));
        assert!(matches!(
            ProxyConfig::from_yaml(&yaml),
            Err(ProxyError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_bad_remote_url_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = yaml_for(dir.path()).replace("http://mirror", "ftp://mirror");
        assert!(matches!(
            ProxyConfig::from_yaml(&yaml),
            Err(ProxyError::InvalidRepositoryUrl { .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ProxyConfig::from_yaml(&yaml_for(dir.path())).unwrap();
        config
            .remote_repositories
            .push(RemoteRepository::new("internal", "https://x.example.com", Layout::Default));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProxyConfig::from_yaml(&yaml_for(dir.path())).unwrap();
        let path = dir.path().join("conf").join("depot.yaml");
        config.save_to(&path).unwrap();

        let reloaded = ProxyConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.proxy_connectors, config.proxy_connectors);
        assert_eq!(reloaded.failure_cache_ttl, config.failure_cache_ttl);
    }

    #[test]
    fn test_url_for() {
        let remote = RemoteRepository::new("central", "https://repo.example.com/maven2/", Layout::Default);
        assert_eq!(
            remote.url_for("/org/example/app/1.0/app-1.0.jar"),
            "https://repo.example.com/maven2/org/example/app/1.0/app-1.0.jar"
        );
    }
}
