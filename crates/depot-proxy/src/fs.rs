//! Filesystem helpers for the managed repository
//!
//! Everything written into a managed repository goes through a
//! [`TempFile`] in the destination directory and is renamed into place, so
//! readers never observe a partially written file.

use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extension of in-progress downloads
pub const TEMP_EXTENSION: &str = "tmp";

/// A uniquely named temporary file next to its final destination
///
/// The file is removed on drop unless it was persisted, which covers
/// early returns, rejected downloads and panics alike.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    persisted: bool,
}

impl TempFile {
    /// Reserve a temp path in the same directory as `destination`
    ///
    /// The file itself is created by whoever writes to [`TempFile::path`].
    pub fn beside(destination: &Path) -> Self {
        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let unique = format!("{}.{:016x}.{}", name, rand::random::<u64>(), TEMP_EXTENSION);
        let path = match destination.parent() {
            Some(parent) => parent.join(unique),
            None => PathBuf::from(unique),
        };
        Self {
            path,
            persisted: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically move the temp file onto `destination`, replacing it
    pub fn persist(mut self, destination: &Path) -> io::Result<()> {
        std::fs::rename(&self.path, destination)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Could not remove temp file {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Write `data` to `destination` through a temp file and rename
pub fn write_atomic(destination: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let temp = TempFile::beside(destination);
    let mut file = File::create(temp.path())?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);
    temp.persist(destination)
}

/// Modification time, or `None` if the file does not exist
pub fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

/// Set a file's modification time to now, creating it if missing
pub fn touch(path: &Path) -> io::Result<()> {
    let file = File::options()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.set_modified(SystemTime::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == TEMP_EXTENSION))
            .collect()
    }

    #[test]
    fn test_temp_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("app-1.0.jar");
        {
            let temp = TempFile::beside(&dest);
            assert_eq!(temp.path().parent(), Some(dir.path()));
            std::fs::write(temp.path(), b"partial").unwrap();
            assert_eq!(temp_files(dir.path()).len(), 1);
        }
        assert!(temp_files(dir.path()).is_empty());
        assert!(!dest.exists());
    }

    #[test]
    fn test_persist_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("app-1.0.jar");
        std::fs::write(&dest, b"stale").unwrap();

        let temp = TempFile::beside(&dest);
        std::fs::write(temp.path(), b"fresh").unwrap();
        temp.persist(&dest).unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"fresh");
        assert!(temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_unique_names() {
        let dest = Path::new("/repo/app-1.0.jar");
        assert_ne!(TempFile::beside(dest).path(), TempFile::beside(dest).path());
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a/b/maven-metadata.xml");
        write_atomic(&dest, b"<metadata/>").unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"<metadata/>");
        assert!(temp_files(dest.parent().unwrap()).is_empty());
    }

    #[test]
    fn test_touch_and_modified_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".metadata-central");
        assert!(modified_time(&path).is_none());

        touch(&path).unwrap();
        let first = modified_time(&path).unwrap();
        assert!((Utc::now() - first).num_seconds() < 5);

        let old = SystemTime::now() - Duration::from_secs(86_400 * 3);
        File::options().write(true).open(&path).unwrap().set_modified(old).unwrap();
        assert!(modified_time(&path).unwrap() < first);

        touch(&path).unwrap();
        assert!(modified_time(&path).unwrap() >= first);
    }
}
