//! Resolve command - coordinate to repository path

use console::style;
use serde::Serialize;

use depot_core::{metadata_path, Layout, MetadataCoordinate};

use super::parse_coordinate;
use crate::error::Result;

#[derive(Serialize)]
struct Resolved {
    coordinate: String,
    layout: Layout,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_metadata: Option<String>,
}

pub fn run(input: &str, layout: Layout, metadata: bool, json: bool) -> Result<()> {
    let coordinate = parse_coordinate(input)?;

    let (project_metadata, version_metadata) = if metadata {
        (
            Some(metadata_path(&MetadataCoordinate::from(coordinate.project()))),
            Some(metadata_path(&MetadataCoordinate::from(coordinate.versioned()))),
        )
    } else {
        (None, None)
    };
    let resolved = Resolved {
        coordinate: coordinate.to_string(),
        layout,
        path: layout.to_path(&coordinate),
        project_metadata,
        version_metadata,
    };

    if json {
        let output = serde_json::to_string_pretty(&resolved)
            .map_err(|e| crate::error::CliError::internal(e.to_string()))?;
        println!("{}", output);
        return Ok(());
    }

    println!("{}", resolved.path);
    if let (Some(project), Some(version)) = (&resolved.project_metadata, &resolved.version_metadata) {
        println!("{} {}", style("project metadata:").dim(), project);
        println!("{} {}", style("version metadata:").dim(), version);
    }
    Ok(())
}
