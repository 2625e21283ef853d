//! Repository layouts
//!
//! Two layouts are understood:
//!
//! - **default** (Maven 2): `org/apache/commons/commons-io/1.0/commons-io-1.0[-sources].jar`
//! - **legacy** (Maven 1): `org.apache.commons/jars/commons-io-1.0[-sources].jar`
//!
//! Both translate to and from [`ArtifactCoordinate`]. Moving a file between
//! repositories of different layouts always decodes with one layout and
//! encodes with the other; raw path strings are never reused.
//!
//! Metadata documents live at the Maven 2 placement regardless of layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::coordinate::{
    ArtifactCoordinate, MetadataCoordinate, ProjectCoordinate, RepositoryPath, VersionedCoordinate,
};
use crate::error::{CoreError, LayoutError};
use crate::version;

/// File name of repository metadata documents
pub const METADATA_FILE: &str = "maven-metadata.xml";

/// Qualifiers that may follow the first version segment in a legacy file name
const LEGACY_QUALIFIERS: &[&str] = &[
    "alpha",
    "beta",
    "rc",
    "cr",
    "m",
    "milestone",
    "ga",
    "final",
    "sp",
    version::SNAPSHOT,
];

/// Repository layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Maven 2 layout
    #[default]
    Default,
    /// Maven 1 layout
    Legacy,
}

impl Layout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Default => "default",
            Layout::Legacy => "legacy",
        }
    }

    /// Native path of an artifact, relative to the repository root
    pub fn to_path(&self, coordinate: &ArtifactCoordinate) -> String {
        match self {
            Layout::Default => default_path(coordinate),
            Layout::Legacy => legacy_path(coordinate),
        }
    }

    /// Decode a native path into an artifact or metadata coordinate
    pub fn to_coordinate(&self, path: &str) -> Result<RepositoryPath, LayoutError> {
        let segments = split_segments(path)?;

        if segments.last() == Some(&METADATA_FILE) {
            return decode_metadata(path, &segments).map(RepositoryPath::Metadata);
        }

        let coordinate = match self {
            Layout::Default => decode_default(path, &segments)?,
            Layout::Legacy => decode_legacy(path, &segments)?,
        };
        Ok(RepositoryPath::Artifact(coordinate))
    }

    /// Decode a path that must name an artifact
    pub fn artifact_coordinate(&self, path: &str) -> Result<ArtifactCoordinate, LayoutError> {
        match self.to_coordinate(path)? {
            RepositoryPath::Artifact(c) => Ok(c),
            RepositoryPath::Metadata(_) => Err(LayoutError::new(
                path,
                "path names a metadata document, not an artifact",
            )),
        }
    }

    /// Re-encode a path of this layout in another layout
    pub fn translate(&self, path: &str, target: Layout) -> Result<String, LayoutError> {
        match self.to_coordinate(path)? {
            RepositoryPath::Artifact(c) => Ok(target.to_path(&c)),
            RepositoryPath::Metadata(m) => Ok(metadata_path(&m)),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Layout::Default),
            "legacy" => Ok(Layout::Legacy),
            other => Err(CoreError::UnknownLayout {
                name: other.to_string(),
            }),
        }
    }
}

/// Native path of a metadata document (same for every layout)
pub fn metadata_path(coordinate: &MetadataCoordinate) -> String {
    let group = coordinate.group_id().replace('.', "/");
    match coordinate {
        MetadataCoordinate::Project(p) => {
            format!("{}/{}/{}", group, p.artifact_id, METADATA_FILE)
        }
        MetadataCoordinate::Versioned(v) => {
            format!("{}/{}/{}/{}", group, v.artifact_id, v.version, METADATA_FILE)
        }
    }
}

/// `artifactId-version[-classifier].type`
fn file_name(c: &ArtifactCoordinate) -> String {
    match &c.classifier {
        Some(classifier) => format!(
            "{}-{}-{}.{}",
            c.artifact_id, c.version, classifier, c.r#type
        ),
        None => format!("{}-{}.{}", c.artifact_id, c.version, c.r#type),
    }
}

fn default_path(c: &ArtifactCoordinate) -> String {
    format!(
        "{}/{}/{}/{}",
        c.group_id.replace('.', "/"),
        c.artifact_id,
        c.base_version(),
        file_name(c)
    )
}

fn legacy_path(c: &ArtifactCoordinate) -> String {
    format!("{}/{}s/{}", c.group_id, c.r#type, file_name(c))
}

/// Normalize separators and split into non-empty segments
fn split_segments(path: &str) -> Result<Vec<&str>, LayoutError> {
    let trimmed = path.trim_start_matches(['/', '\\']);
    if trimmed.is_empty() {
        return Err(LayoutError::new(path, "path is empty"));
    }

    let segments: Vec<&str> = trimmed.split(['/', '\\']).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(LayoutError::new(path, "path contains an empty segment"));
    }
    if segments.iter().any(|s| *s == "." || *s == "..") {
        return Err(LayoutError::new(path, "path contains a relative segment"));
    }
    Ok(segments)
}

/// A directory name that reads as a version rather than an artifactId
fn looks_like_version(segment: &str) -> bool {
    segment.starts_with(|c: char| c.is_ascii_digit()) || segment.ends_with(version::SNAPSHOT_SUFFIX)
}

fn decode_metadata(path: &str, segments: &[&str]) -> Result<MetadataCoordinate, LayoutError> {
    let n = segments.len();
    if n < 3 {
        return Err(LayoutError::new(
            path,
            "metadata path needs at least groupId/artifactId/maven-metadata.xml",
        ));
    }

    let parent = segments[n - 2];
    if n >= 4 && looks_like_version(parent) {
        if !version::is_valid_version(parent) {
            return Err(LayoutError::new(path, format!("invalid version '{}'", parent)));
        }
        return Ok(MetadataCoordinate::Versioned(VersionedCoordinate::new(
            segments[..n - 3].join("."),
            segments[n - 3],
            parent,
        )));
    }

    Ok(MetadataCoordinate::Project(ProjectCoordinate::new(
        segments[..n - 2].join("."),
        parent,
    )))
}

/// Split `[-classifier].type` following the version in a file name
fn split_classifier_and_type(
    path: &str,
    remainder: &str,
) -> Result<(Option<String>, String), LayoutError> {
    if let Some(ext) = remainder.strip_prefix('.') {
        if ext.is_empty() {
            return Err(LayoutError::new(path, "missing type extension"));
        }
        // app-1.0.1.jar under 1.0/ is a misfiled 1.0.1, not type "1.jar"
        let first = ext.split('.').next().unwrap_or(ext);
        if first.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LayoutError::new(
                path,
                "file name version continues past the version directory",
            ));
        }
        return Ok((None, ext.to_string()));
    }

    let Some(rest) = remainder.strip_prefix('-') else {
        return Err(LayoutError::new(
            path,
            "expected '.' or '-' after the version in the file name",
        ));
    };

    match rest.split_once('.') {
        Some((classifier, ext)) if !classifier.is_empty() && !ext.is_empty() => {
            Ok((Some(classifier.to_string()), ext.to_string()))
        }
        Some(_) => Err(LayoutError::new(path, "empty classifier or type")),
        None => Err(LayoutError::new(path, "missing type extension")),
    }
}

/// Find the artifact version at the start of `rest`, anchored on the
/// version declared by the directory
fn match_default_version<'a>(rest: &'a str, dir_version: &str) -> Option<(&'a str, &'a str)> {
    let at_boundary = |s: &str| s.starts_with('.') || s.starts_with('-');

    if let Some(remainder) = rest.strip_prefix(dir_version) {
        if at_boundary(remainder) {
            return Some((&rest[..dir_version.len()], remainder));
        }
    }

    // A declared snapshot directory may hold timestamped builds:
    // 1.0-SNAPSHOT/artifact-1.0-20050611.112233-1.jar
    let prefix = dir_version.strip_suffix(version::SNAPSHOT)?;
    let after_prefix = rest.strip_prefix(prefix)?;
    let stamp_len = timestamp_build_len(after_prefix)?;
    let end = prefix.len() + stamp_len;
    let remainder = &rest[end..];
    if at_boundary(remainder) {
        Some((&rest[..end], remainder))
    } else {
        None
    }
}

/// Length of a leading `yyyyMMdd.HHmmss-N` token, if present
fn timestamp_build_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.len() < 17 {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);
    if !digits(0..8) || bytes[8] != b'.' || !digits(9..15) || bytes[15] != b'-' {
        return None;
    }
    let build_digits = bytes[16..].iter().take_while(|b| b.is_ascii_digit()).count();
    if build_digits == 0 {
        None
    } else {
        Some(16 + build_digits)
    }
}

fn decode_default(path: &str, segments: &[&str]) -> Result<ArtifactCoordinate, LayoutError> {
    let n = segments.len();
    if n < 4 {
        return Err(LayoutError::new(
            path,
            "default layout needs groupId/artifactId/version/filename",
        ));
    }

    let filename = segments[n - 1];
    let dir_version = segments[n - 2];
    let artifact_id = segments[n - 3];
    let group_id = segments[..n - 3].join(".");

    if !version::is_valid_version(dir_version) {
        return Err(LayoutError::new(
            path,
            format!("invalid version directory '{}'", dir_version),
        ));
    }

    let rest = filename
        .strip_prefix(artifact_id)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(|| {
            LayoutError::new(
                path,
                format!("file name does not start with '{}-'", artifact_id),
            )
        })?;

    let (artifact_version, remainder) =
        match_default_version(rest, dir_version).ok_or_else(|| {
            LayoutError::new(
                path,
                format!(
                    "cannot separate artifactId from version: file name does not carry version '{}'",
                    dir_version
                ),
            )
        })?;

    let (classifier, r#type) = split_classifier_and_type(path, remainder)?;

    Ok(ArtifactCoordinate {
        group_id,
        artifact_id: artifact_id.to_string(),
        version: artifact_version.to_string(),
        classifier,
        r#type,
    })
}

fn is_legacy_version_part(part: &str) -> bool {
    part.starts_with(|c: char| c.is_ascii_digit())
        || LEGACY_QUALIFIERS
            .iter()
            .any(|q| q.eq_ignore_ascii_case(part))
}

fn decode_legacy(path: &str, segments: &[&str]) -> Result<ArtifactCoordinate, LayoutError> {
    let [group_id, type_dir, filename] = segments else {
        return Err(LayoutError::new(
            path,
            "legacy layout needs exactly groupId/types/filename",
        ));
    };

    let r#type = type_dir
        .strip_suffix('s')
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            LayoutError::new(path, format!("type directory '{}' must end in 's'", type_dir))
        })?;

    let stem = filename
        .strip_suffix(r#type)
        .and_then(|s| s.strip_suffix('.'))
        .ok_or_else(|| {
            LayoutError::new(
                path,
                format!("file name does not end in '.{}' for directory '{}'", r#type, type_dir),
            )
        })?;

    // artifactId ends at the first '-' followed by a digit
    let split = stem
        .char_indices()
        .zip(stem.chars().skip(1))
        .find(|((_, c), next)| *c == '-' && next.is_ascii_digit())
        .map(|((i, _), _)| i)
        .ok_or_else(|| {
            LayoutError::new(path, "cannot separate artifactId from version")
        })?;

    let artifact_id = &stem[..split];
    if artifact_id.is_empty() {
        return Err(LayoutError::new(path, "empty artifactId"));
    }

    let mut parts = stem[split + 1..].split('-').peekable();
    let mut version_parts = Vec::new();
    if let Some(first) = parts.next() {
        version_parts.push(first);
    }
    while let Some(part) = parts.peek() {
        if !is_legacy_version_part(part) {
            break;
        }
        version_parts.push(*part);
        parts.next();
    }

    let version = version_parts.join("-");
    if !version::is_valid_version(&version) {
        return Err(LayoutError::new(path, format!("invalid version '{}'", version)));
    }

    let classifier: Vec<&str> = parts.collect();
    let classifier = if classifier.is_empty() {
        None
    } else if classifier.iter().any(|p| p.is_empty()) {
        return Err(LayoutError::new(path, "empty classifier"));
    } else {
        Some(classifier.join("-"))
    };

    Ok(ArtifactCoordinate {
        group_id: group_id.to_string(),
        artifact_id: artifact_id.to_string(),
        version,
        classifier,
        r#type: r#type.to_string(),
    })
}
