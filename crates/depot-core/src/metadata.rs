//! Repository metadata documents (`maven-metadata.xml`)
//!
//! A metadata document is never edited in place: every merge builds a new
//! [`RepositoryMetadata`] from a seed and the remote documents, which the
//! caller then writes out whole.
//!
//! ```xml
//! <metadata>
//!   <groupId>org.example</groupId>
//!   <artifactId>app</artifactId>
//!   <versioning>
//!     <latest>2.0</latest>
//!     <release>2.0</release>
//!     <versions>
//!       <version>1.0</version>
//!       <version>2.0</version>
//!     </versions>
//!     <lastUpdated>20070821185701</lastUpdated>
//!   </versioning>
//! </metadata>
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::coordinate::MetadataCoordinate;
use crate::error::{CoreError, Result};
use crate::version;

/// `lastUpdated` wire format (UTC)
pub const LAST_UPDATED_FORMAT: &str = "%Y%m%d%H%M%S";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// A project- or version-level metadata document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename = "metadata", rename_all = "camelCase")]
pub struct RepositoryMetadata {
    pub group_id: String,
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub versioning: Versioning,
}

/// The `<versioning>` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versioning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// Available versions, oldest first
    #[serde(default, with = "versions_list", skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotVersion>,
    #[serde(default, with = "last_updated", skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// The build a declared snapshot currently resolves to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotVersion {
    /// `yyyyMMdd.HHmmss`
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub build_number: u32,
}

impl SnapshotVersion {
    pub fn new(timestamp: impl Into<String>, build_number: u32) -> Self {
        Self {
            timestamp: timestamp.into(),
            build_number,
        }
    }
}

impl PartialOrd for SnapshotVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SnapshotVersion {
    /// Chronological: timestamps are fixed width, so string order is time order
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.build_number.cmp(&other.build_number))
    }
}

impl RepositoryMetadata {
    /// Empty document for a coordinate
    pub fn new(coordinate: &MetadataCoordinate) -> Self {
        Self {
            group_id: coordinate.group_id().to_string(),
            artifact_id: coordinate.artifact_id().to_string(),
            version: coordinate.version().map(str::to_string),
            versioning: Versioning::default(),
        }
    }

    /// Parse a document from XML text
    pub fn from_xml(xml: &str) -> Result<Self> {
        let metadata: Self = quick_xml::de::from_str(xml)?;
        Ok(metadata)
    }

    /// Parse a document from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes).map_err(|e| CoreError::MetadataParse {
            message: format!("Invalid UTF-8: {}", e),
        })?;
        Self::from_xml(xml)
    }

    /// Serialize with an XML declaration and two-space indentation
    pub fn to_xml(&self) -> Result<String> {
        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 2);
        self.serialize(serializer)?;
        Ok(format!("{}\n{}\n", XML_DECLARATION, body))
    }

    /// Does this document describe the given coordinate?
    ///
    /// A version-level document must name the same version; one that
    /// omits `version` is taken at its path.
    pub fn describes(&self, coordinate: &MetadataCoordinate) -> bool {
        let same_version = match (coordinate.version(), self.version.as_deref()) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => true,
        };
        self.group_id == coordinate.group_id()
            && self.artifact_id == coordinate.artifact_id()
            && same_version
    }
}

/// Merge a seed document and any number of remote documents
///
/// - `versions` is the de-duplicated union, invalid tokens dropped, sorted
///   oldest first
/// - `latest` and `release` are recomputed from that union
/// - `snapshot` is the chronologically latest build across all inputs
/// - `last_updated` is `now`, never copied from an input
pub fn merge_metadata<'a>(
    coordinate: &MetadataCoordinate,
    seed: Option<&'a RepositoryMetadata>,
    remotes: impl IntoIterator<Item = &'a RepositoryMetadata>,
    now: DateTime<Utc>,
) -> RepositoryMetadata {
    let mut merged = RepositoryMetadata::new(coordinate);
    let mut versions = Vec::new();
    let mut snapshot: Option<SnapshotVersion> = None;

    for doc in seed.into_iter().chain(remotes) {
        versions.extend(
            doc.versioning
                .versions
                .iter()
                .filter(|v| version::is_valid_version(v))
                .cloned(),
        );

        if let Some(candidate) = &doc.versioning.snapshot {
            if snapshot.as_ref().is_none_or(|current| candidate > current) {
                snapshot = Some(candidate.clone());
            }
        }
    }

    version::sort_versions(&mut versions);

    merged.versioning.latest = versions.last().cloned();
    merged.versioning.release = versions
        .iter()
        .rev()
        .find(|v| !version::is_snapshot(v))
        .cloned();
    merged.versioning.versions = versions;
    merged.versioning.snapshot = snapshot;
    merged.versioning.last_updated = Some(now);
    merged
}

mod versions_list {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize)]
    struct VersionsRef<'a> {
        version: &'a [String],
    }

    #[derive(Deserialize)]
    struct Versions {
        #[serde(default)]
        version: Vec<String>,
    }

    pub fn serialize<S: Serializer>(versions: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        VersionsRef { version: versions }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(Versions::deserialize(deserializer)?.version)
    }
}

mod last_updated {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::LAST_UPDATED_FORMAT;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.serialize_str(&dt.format(LAST_UPDATED_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDateTime::parse_from_str(s, LAST_UPDATED_FORMAT)
                .map(|dt| Some(dt.and_utc()))
                .map_err(|e| de::Error::custom(format!("invalid lastUpdated '{}': {}", s, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{ProjectCoordinate, VersionedCoordinate};
    use chrono::TimeZone;

    const RELEASE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata modelVersion="1.1.0">
  <groupId>org.example</groupId>
  <artifactId>app</artifactId>
  <versioning>
    <latest>3.0</latest>
    <release>3.0</release>
    <versions>
      <version>1.0</version>
      <version>3.0</version>
    </versions>
    <lastUpdated>20070821185701</lastUpdated>
  </versioning>
</metadata>
"#;

    const SNAPSHOT_XML: &str = r#"<metadata>
  <groupId>org.example</groupId>
  <artifactId>app</artifactId>
  <version>1.0-SNAPSHOT</version>
  <versioning>
    <snapshot>
      <timestamp>20070821.185701</timestamp>
      <buildNumber>2</buildNumber>
    </snapshot>
    <lastUpdated>20070821185701</lastUpdated>
  </versioning>
</metadata>"#;

    fn project() -> MetadataCoordinate {
        ProjectCoordinate::new("org.example", "app").into()
    }

    fn doc_with_versions(versions: &[&str]) -> RepositoryMetadata {
        let mut doc = RepositoryMetadata::new(&project());
        doc.versioning.versions = versions.iter().map(|v| v.to_string()).collect();
        doc
    }

    #[test]
    fn test_parse_release_metadata() {
        let doc = RepositoryMetadata::from_xml(RELEASE_XML).unwrap();
        assert_eq!(doc.group_id, "org.example");
        assert_eq!(doc.artifact_id, "app");
        assert_eq!(doc.version, None);
        assert_eq!(doc.versioning.versions, vec!["1.0", "3.0"]);
        assert_eq!(doc.versioning.release.as_deref(), Some("3.0"));
        assert_eq!(
            doc.versioning.last_updated,
            Some(Utc.with_ymd_and_hms(2007, 8, 21, 18, 57, 1).unwrap())
        );
        assert!(doc.describes(&project()));
    }

    #[test]
    fn test_parse_snapshot_metadata() {
        let doc = RepositoryMetadata::from_xml(SNAPSHOT_XML).unwrap();
        assert_eq!(doc.version.as_deref(), Some("1.0-SNAPSHOT"));
        let snapshot = doc.versioning.snapshot.unwrap();
        assert_eq!(snapshot, SnapshotVersion::new("20070821.185701", 2));
        assert!(doc.versioning.versions.is_empty());
    }

    #[test]
    fn test_describes_checks_version() {
        let doc = RepositoryMetadata::from_xml(SNAPSHOT_XML).unwrap();
        let same: MetadataCoordinate =
            VersionedCoordinate::new("org.example", "app", "1.0-SNAPSHOT").into();
        let other: MetadataCoordinate =
            VersionedCoordinate::new("org.example", "app", "2.0-SNAPSHOT").into();
        assert!(doc.describes(&same));
        assert!(!doc.describes(&other));
        let lib: MetadataCoordinate = ProjectCoordinate::new("org.example", "lib").into();
        assert!(!doc.describes(&lib));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(RepositoryMetadata::from_xml("not xml at all").is_err());
        assert!(RepositoryMetadata::from_bytes(&[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn test_xml_round_trip() {
        let coordinate: MetadataCoordinate =
            VersionedCoordinate::new("org.example", "app", "1.0-SNAPSHOT").into();
        let mut doc = RepositoryMetadata::new(&coordinate);
        doc.versioning.snapshot = Some(SnapshotVersion::new("20070821.185701", 4));
        doc.versioning.last_updated = Some(Utc.with_ymd_and_hms(2007, 8, 21, 18, 57, 1).unwrap());

        let xml = doc.to_xml().unwrap();
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains("<lastUpdated>20070821185701</lastUpdated>"));
        assert!(xml.contains("<buildNumber>4</buildNumber>"));
        assert!(!xml.contains("<versions"));

        assert_eq!(RepositoryMetadata::from_xml(&xml).unwrap(), doc);
    }

    #[test]
    fn test_merge_release_union() {
        let seed = doc_with_versions(&["1.0", "2.0"]);
        let remote = doc_with_versions(&["1.0", "3.0"]);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let merged = merge_metadata(&project(), Some(&seed), [&remote], now);
        assert_eq!(merged.versioning.versions, vec!["1.0", "2.0", "3.0"]);
        assert_eq!(merged.versioning.latest.as_deref(), Some("3.0"));
        assert_eq!(merged.versioning.release.as_deref(), Some("3.0"));
        assert_eq!(merged.versioning.last_updated, Some(now));
    }

    #[test]
    fn test_merge_sorts_by_version_not_arrival() {
        let a = doc_with_versions(&["1.0", "5.0", "2.0"]);
        let b = doc_with_versions(&["0.9", "4.0", "3.0", "10.0"]);

        let merged = merge_metadata(&project(), None, [&a, &b], Utc::now());
        assert_eq!(
            merged.versioning.versions,
            vec!["0.9", "1.0", "2.0", "3.0", "4.0", "5.0", "10.0"]
        );
    }

    #[test]
    fn test_merge_drops_invalid_versions() {
        let remote = doc_with_versions(&["1.0", "bad version", "", "1.1-SNAPSHOT"]);
        let merged = merge_metadata(&project(), None, [&remote], Utc::now());
        assert_eq!(merged.versioning.versions, vec!["1.0", "1.1-SNAPSHOT"]);
        assert_eq!(merged.versioning.latest.as_deref(), Some("1.1-SNAPSHOT"));
        assert_eq!(merged.versioning.release.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_merge_latest_snapshot_wins() {
        let coordinate: MetadataCoordinate =
            VersionedCoordinate::new("org.example", "app", "1.0-SNAPSHOT").into();

        let mut older = RepositoryMetadata::new(&coordinate);
        older.versioning.snapshot = Some(SnapshotVersion::new("20070821.185701", 2));
        let mut newer = RepositoryMetadata::new(&coordinate);
        newer.versioning.snapshot = Some(SnapshotVersion::new("20070822.101010", 4));

        let merged = merge_metadata(&coordinate, None, [&newer, &older], Utc::now());
        assert_eq!(
            merged.versioning.snapshot,
            Some(SnapshotVersion::new("20070822.101010", 4))
        );
        assert_eq!(merged.version.as_deref(), Some("1.0-SNAPSHOT"));
    }

    #[test]
    fn test_snapshot_ordering_uses_build_number_on_tie() {
        let a = SnapshotVersion::new("20070821.185701", 2);
        let b = SnapshotVersion::new("20070821.185701", 10);
        assert!(b > a);
    }
}
