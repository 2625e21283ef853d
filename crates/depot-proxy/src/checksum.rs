//! Checksum sidecar files
//!
//! Every artifact in a managed repository is accompanied by `.sha1` and
//! `.md5` files holding the lowercase hex digest of its bytes.

use md5::Md5;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::error::{ProxyError, Result};
use crate::fs::write_atomic;

/// Supported sidecar algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    Sha1,
    Md5,
}

impl ChecksumAlgorithm {
    pub const ALL: [ChecksumAlgorithm; 2] = [ChecksumAlgorithm::Sha1, ChecksumAlgorithm::Md5];

    /// Sidecar file extension, also the display name
    pub fn extension(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha1 => "sha1",
            ChecksumAlgorithm::Md5 => "md5",
        }
    }

    /// Number of hex characters in a digest
    fn hex_len(&self) -> usize {
        match self {
            ChecksumAlgorithm::Sha1 => 40,
            ChecksumAlgorithm::Md5 => 32,
        }
    }

    /// Path of the sidecar for `artifact`
    pub fn sidecar_path(&self, artifact: &Path) -> PathBuf {
        let mut name = artifact.as_os_str().to_owned();
        name.push(".");
        name.push(self.extension());
        PathBuf::from(name)
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Digests of one file for every supported algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digests {
    pub sha1: String,
    pub md5: String,
}

impl Digests {
    pub fn of_bytes(data: &[u8]) -> Self {
        Self {
            sha1: hex::encode(Sha1::digest(data)),
            md5: hex::encode(Md5::digest(data)),
        }
    }

    /// Hash a file in a single pass
    pub fn of_file(path: &Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut sha1 = Sha1::new();
        let mut md5 = Md5::new();
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let read = file.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            sha1.update(&buffer[..read]);
            md5.update(&buffer[..read]);
        }
        Ok(Self {
            sha1: hex::encode(sha1.finalize()),
            md5: hex::encode(md5.finalize()),
        })
    }

    pub fn get(&self, algorithm: ChecksumAlgorithm) -> &str {
        match algorithm {
            ChecksumAlgorithm::Sha1 => &self.sha1,
            ChecksumAlgorithm::Md5 => &self.md5,
        }
    }
}

/// Extract the digest from sidecar contents
///
/// Accepts a bare digest, `digest  filename` as written by `sha1sum`, and
/// the BSD `SHA1 (file) = digest` form. Returns `None` if nothing that
/// looks like a digest of the right length is found.
pub fn parse_sidecar(contents: &str, algorithm: ChecksumAlgorithm) -> Option<String> {
    let contents = contents.trim();
    let candidate = match contents.rsplit_once(" = ") {
        Some((_, digest)) => digest.trim(),
        None => contents.split_whitespace().next()?,
    };
    let digest = candidate.to_ascii_lowercase();
    let valid = digest.len() == algorithm.hex_len() && digest.chars().all(|c| c.is_ascii_hexdigit());
    valid.then_some(digest)
}

/// State of a sidecar fetched from a remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidecarState {
    /// The remote had no sidecar for this algorithm
    Missing,
    Valid,
    /// Present but unusable or disagreeing with the downloaded bytes
    Mismatch { expected: String },
}

impl SidecarState {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, SidecarState::Mismatch { .. })
    }
}

/// Compare a downloaded sidecar against the actual digest
pub fn check_sidecar(sidecar: &Path, algorithm: ChecksumAlgorithm, digests: &Digests) -> SidecarState {
    let contents = match std::fs::read(sidecar) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => return SidecarState::Missing,
    };
    match parse_sidecar(&contents, algorithm) {
        Some(expected) if expected == digests.get(algorithm) => SidecarState::Valid,
        Some(expected) => SidecarState::Mismatch { expected },
        None => SidecarState::Mismatch {
            expected: contents.trim().chars().take(64).collect(),
        },
    }
}

/// Verify `artifact` against an expected digest
pub fn verify(artifact: &Path, algorithm: ChecksumAlgorithm, expected: &str) -> Result<()> {
    let digests = Digests::of_file(artifact)?;
    let actual = digests.get(algorithm);
    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ProxyError::ChecksumMismatch {
            path: artifact.display().to_string(),
            algorithm: algorithm.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

/// Write a single sidecar next to `artifact`
pub fn write_sidecar(artifact: &Path, algorithm: ChecksumAlgorithm, digest: &str) -> io::Result<()> {
    let line = format!("{}\n", digest.to_ascii_lowercase());
    write_atomic(&algorithm.sidecar_path(artifact), line.as_bytes())
}

/// Write every sidecar of `artifact` from its digests
pub fn write_sidecars(artifact: &Path, digests: &Digests) -> io::Result<()> {
    for algorithm in ChecksumAlgorithm::ALL {
        write_sidecar(artifact, algorithm, digests.get(algorithm))?;
    }
    Ok(())
}
