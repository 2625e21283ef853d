//! Verify command - check a file against its sidecars

use console::style;
use std::path::Path;

use depot_proxy::checksum::{parse_sidecar, verify};
use depot_proxy::ChecksumAlgorithm;

use crate::error::{CliError, Result};

pub fn run(file: &Path) -> Result<()> {
    if !file.is_file() {
        return Err(CliError::Io {
            message: format!("{} is not a file", file.display()),
        });
    }

    let mut checked = 0;
    for algorithm in ChecksumAlgorithm::ALL {
        let sidecar = algorithm.sidecar_path(file);
        if !sidecar.exists() {
            continue;
        }
        let contents = std::fs::read_to_string(&sidecar)?;
        let expected = parse_sidecar(&contents, algorithm).ok_or_else(|| CliError::Checksum {
            message: format!("{} does not contain a {} digest", sidecar.display(), algorithm),
        })?;
        verify(file, algorithm, &expected)?;
        println!("{} {} {}", style("✓").green().bold(), algorithm, expected);
        checked += 1;
    }

    if checked == 0 {
        return Err(CliError::Checksum {
            message: format!("no .sha1 or .md5 file next to {}", file.display()),
        });
    }
    Ok(())
}
