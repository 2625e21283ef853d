//! Path command - decode a repository path

use console::style;
use serde::Serialize;

use depot_core::{Layout, RepositoryPath};

use crate::error::{CliError, Result};

#[derive(Serialize)]
struct Decoded<'a> {
    path: &'a str,
    layout: Layout,
    decoded: &'a RepositoryPath,
    #[serde(skip_serializing_if = "Option::is_none")]
    translated: Option<String>,
}

pub fn run(path: &str, layout: Layout, to: Option<Layout>, json: bool) -> Result<()> {
    let decoded = layout.to_coordinate(path)?;
    let translated = to.map(|target| layout.translate(path, target)).transpose()?;

    if json {
        let output = serde_json::to_string_pretty(&Decoded {
            path,
            layout,
            decoded: &decoded,
            translated,
        })
        .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", output);
        return Ok(());
    }

    match &decoded {
        RepositoryPath::Artifact(c) => {
            println!("{} {}", style("artifact").green().bold(), c);
            println!("  {:<11} {}", "groupId", c.group_id);
            println!("  {:<11} {}", "artifactId", c.artifact_id);
            println!("  {:<11} {}", "version", c.version);
            if let Some(classifier) = &c.classifier {
                println!("  {:<11} {}", "classifier", classifier);
            }
            println!("  {:<11} {}", "type", c.r#type);
            if c.is_snapshot() {
                println!("  {:<11} {}", "snapshot", c.base_version());
            }
        }
        RepositoryPath::Metadata(m) => {
            println!("{} {}", style("metadata").cyan().bold(), m);
        }
    }
    if let (Some(target), Some(translated)) = (to, translated) {
        println!("{} {}", style(format!("{}:", target)).dim(), translated);
    }
    Ok(())
}
