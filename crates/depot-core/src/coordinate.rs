//! Artifact and metadata coordinates
//!
//! Coordinates are the layout-independent identity of something stored in
//! a repository. Paths are derived from them, never copied between layouts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::version;

/// One physical artifact file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    /// Artifact version; for snapshots this may be the timestamped form
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(rename = "type")]
    pub r#type: String,
}

impl ArtifactCoordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        r#type: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: None,
            r#type: r#type.into(),
        }
    }

    /// Builder-style classifier
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Declared version (`1.0-SNAPSHOT` for a timestamped snapshot build)
    pub fn base_version(&self) -> String {
        version::base_version(&self.version)
    }

    pub fn is_snapshot(&self) -> bool {
        version::is_snapshot(&self.version)
    }

    /// The project this artifact belongs to
    pub fn project(&self) -> ProjectCoordinate {
        ProjectCoordinate::new(&self.group_id, &self.artifact_id)
    }

    /// The version-level coordinate, keyed by the declared version
    pub fn versioned(&self) -> VersionedCoordinate {
        VersionedCoordinate::new(&self.group_id, &self.artifact_id, self.base_version())
    }
}

impl fmt::Display for ArtifactCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        write!(f, ":{}", self.r#type)
    }
}

/// Project-level metadata identity (all versions)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCoordinate {
    pub group_id: String,
    pub artifact_id: String,
}

impl ProjectCoordinate {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for ProjectCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

/// Version-level metadata identity (snapshot build tracking)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionedCoordinate {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl VersionedCoordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    pub fn is_snapshot(&self) -> bool {
        version::is_snapshot(&self.version)
    }
}

impl fmt::Display for VersionedCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Either kind of metadata document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum MetadataCoordinate {
    Project(ProjectCoordinate),
    Versioned(VersionedCoordinate),
}

impl MetadataCoordinate {
    pub fn group_id(&self) -> &str {
        match self {
            MetadataCoordinate::Project(p) => &p.group_id,
            MetadataCoordinate::Versioned(v) => &v.group_id,
        }
    }

    pub fn artifact_id(&self) -> &str {
        match self {
            MetadataCoordinate::Project(p) => &p.artifact_id,
            MetadataCoordinate::Versioned(v) => &v.artifact_id,
        }
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            MetadataCoordinate::Project(_) => None,
            MetadataCoordinate::Versioned(v) => Some(&v.version),
        }
    }

    /// Only version-level documents of snapshot versions track snapshot builds
    pub fn is_snapshot(&self) -> bool {
        match self {
            MetadataCoordinate::Project(_) => false,
            MetadataCoordinate::Versioned(v) => v.is_snapshot(),
        }
    }
}

impl From<ProjectCoordinate> for MetadataCoordinate {
    fn from(p: ProjectCoordinate) -> Self {
        MetadataCoordinate::Project(p)
    }
}

impl From<VersionedCoordinate> for MetadataCoordinate {
    fn from(v: VersionedCoordinate) -> Self {
        MetadataCoordinate::Versioned(v)
    }
}

impl fmt::Display for MetadataCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataCoordinate::Project(p) => p.fmt(f),
            MetadataCoordinate::Versioned(v) => v.fmt(f),
        }
    }
}

/// Anything a repository path can decode to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RepositoryPath {
    Artifact(ArtifactCoordinate),
    Metadata(MetadataCoordinate),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_display() {
        let c = ArtifactCoordinate::new("org.apache", "commons", "1.0", "jar");
        assert_eq!(c.to_string(), "org.apache:commons:1.0:jar");

        let c = c.with_classifier("sources");
        assert_eq!(c.to_string(), "org.apache:commons:1.0:sources:jar");
    }

    #[test]
    fn test_snapshot_coordinates() {
        let c = ArtifactCoordinate::new("org.example", "app", "2.0-20070821.185701-3", "jar");
        assert!(c.is_snapshot());
        assert_eq!(c.base_version(), "2.0-SNAPSHOT");
        assert_eq!(
            c.versioned(),
            VersionedCoordinate::new("org.example", "app", "2.0-SNAPSHOT")
        );
        assert!(MetadataCoordinate::from(c.versioned()).is_snapshot());
        assert!(!MetadataCoordinate::from(c.project()).is_snapshot());
    }

    #[test]
    fn test_structural_equality() {
        let a = ArtifactCoordinate::new("g", "a", "1.0", "jar").with_classifier("tests");
        let b = ArtifactCoordinate::new("g", "a", "1.0", "jar").with_classifier("tests");
        assert_eq!(a, b);
        assert_ne!(a, ArtifactCoordinate::new("g", "a", "1.0", "jar"));
    }

    #[test]
    fn test_repository_path_json() {
        let path = RepositoryPath::Artifact(ArtifactCoordinate::new("g", "a", "1.0", "pom"));
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json["kind"], "artifact");
        assert_eq!(json["type"], "pom");
        assert!(json.get("classifier").is_none());
    }
}
