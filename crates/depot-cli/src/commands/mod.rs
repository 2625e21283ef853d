//! CLI commands

pub mod check;
pub mod fetch;
pub mod path;
pub mod resolve;
pub mod verify;

use std::path::{Path, PathBuf};

use depot_core::ArtifactCoordinate;
use depot_proxy::ProxyConfig;

use crate::error::{CliError, Result};

/// Explicit `--config`, else `<config dir>/depot/depot.yaml`
pub fn config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    dirs::config_dir()
        .map(|dir| dir.join("depot").join("depot.yaml"))
        .ok_or_else(|| {
            CliError::config_with_help(
                "no configuration directory on this platform",
                "Pass --config or set DEPOT_CONFIG",
            )
        })
}

pub fn load_config(path: &Path) -> Result<ProxyConfig> {
    if !path.exists() {
        return Err(CliError::config_with_help(
            format!("{} does not exist", path.display()),
            "Pass --config or set DEPOT_CONFIG",
        ));
    }
    Ok(ProxyConfig::load_from(path)?)
}

/// Parse `groupId:artifactId:version[:type[:classifier]]`
pub fn parse_coordinate(input: &str) -> Result<ArtifactCoordinate> {
    let parts: Vec<&str> = input.split(':').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(CliError::usage(format!("empty field in coordinate '{}'", input)));
    }
    let coordinate = match parts.as_slice() {
        [group, artifact, version] => ArtifactCoordinate::new(*group, *artifact, *version, "jar"),
        [group, artifact, version, kind] => ArtifactCoordinate::new(*group, *artifact, *version, *kind),
        [group, artifact, version, kind, classifier] => {
            ArtifactCoordinate::new(*group, *artifact, *version, *kind).with_classifier(*classifier)
        }
        _ => {
            return Err(CliError::usage(format!(
                "expected groupId:artifactId:version[:type[:classifier]], got '{}'",
                input
            )));
        }
    };
    Ok(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        let c = parse_coordinate("org.example:app:1.0").unwrap();
        assert_eq!(c.r#type, "jar");
        assert_eq!(c.classifier, None);

        let c = parse_coordinate("org.example:app:1.0:war").unwrap();
        assert_eq!(c.r#type, "war");

        let c = parse_coordinate("org.example:app:1.0:jar:sources").unwrap();
        assert_eq!(c.classifier.as_deref(), Some("sources"));

        assert!(parse_coordinate("org.example:app").is_err());
        assert!(parse_coordinate("org.example::1.0").is_err());
        assert!(parse_coordinate("a:b:c:d:e:f").is_err());
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let path = config_path(Some(PathBuf::from("/etc/depot.yaml"))).unwrap();
        assert_eq!(path, PathBuf::from("/etc/depot.yaml"));
    }
}
