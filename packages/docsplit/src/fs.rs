//! Filesystem access used by the splitter and the assembler.
//!
//! Both pipelines talk to the disk only through [`FileSystem`], so a run can
//! be observed (see [`Recorder`]) or redirected without touching the core.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{DocsplitError, Result};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Filename, including extension.
    pub name: String,
    /// Full path of the entry.
    pub path: PathBuf,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Synchronous filesystem capability.
pub trait FileSystem {
    /// List a directory, sorted by name.
    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>>;

    /// Read a whole UTF-8 file.
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Create or replace a file. The parent directory must exist.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Delete a file.
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Create a directory and any missing parents.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Delete an empty directory.
    fn remove_dir(&self, path: &Path) -> Result<()>;

    /// Whether `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether `path` exists at all.
    fn exists(&self, path: &Path) -> bool;

    /// Whether a directory has no entries. A missing directory counts as empty.
    fn is_dir_empty(&self, dir: &Path) -> Result<bool> {
        if !self.is_dir(dir) {
            return Ok(true);
        }
        Ok(self.read_dir(dir)?.is_empty())
    }
}

/// The local disk.
///
/// Writes go to a temp file that is synced and renamed over the target, so a
/// crash never leaves a half-written document behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| DocsplitError::io(dir, e))? {
            let entry = entry.map_err(|e| DocsplitError::io(dir, e))?;
            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                tracing::warn!(path = %path.display(), "Skipping entry with non UTF-8 name");
                continue;
            };
            let is_dir = entry
                .file_type()
                .map_err(|e| DocsplitError::io(&path, e))?
                .is_dir();
            entries.push(DirEntry { name, path, is_dir });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| DocsplitError::io(path, e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let temp_file = path.with_file_name(format!(".{file_name}.tmp"));

        // Write to temp file first, then sync and rename for atomicity
        {
            let mut file = File::create(&temp_file).map_err(|e| DocsplitError::io(&temp_file, e))?;
            file.write_all(contents.as_bytes())
                .map_err(|e| DocsplitError::io(&temp_file, e))?;
            file.sync_all().map_err(|e| DocsplitError::io(&temp_file, e))?;
        }

        // On Windows, rename fails if the destination already exists
        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(path).map_err(|e| DocsplitError::io(path, e))?;
        }

        fs::rename(&temp_file, path).map_err(|e| DocsplitError::io(path, e))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| DocsplitError::io(path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| DocsplitError::io(path, e))
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        fs::remove_dir(path).map_err(|e| DocsplitError::io(path, e))
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Counts of mutating filesystem calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub files_written: usize,
    pub files_removed: usize,
    pub dirs_created: usize,
    pub dirs_removed: usize,
}

impl MutationStats {
    /// Total number of mutations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.files_written + self.files_removed + self.dirs_created + self.dirs_removed
    }
}

/// Wraps a [`FileSystem`] and counts every mutation passing through it.
#[derive(Debug, Default)]
pub struct Recorder<F> {
    inner: F,
    files_written: AtomicUsize,
    files_removed: AtomicUsize,
    dirs_created: AtomicUsize,
    dirs_removed: AtomicUsize,
}

impl<F: FileSystem> Recorder<F> {
    /// Start recording on top of `inner`.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            files_written: AtomicUsize::new(0),
            files_removed: AtomicUsize::new(0),
            dirs_created: AtomicUsize::new(0),
            dirs_removed: AtomicUsize::new(0),
        }
    }

    /// Mutations recorded so far.
    pub fn stats(&self) -> MutationStats {
        MutationStats {
            files_written: self.files_written.load(Ordering::Relaxed),
            files_removed: self.files_removed.load(Ordering::Relaxed),
            dirs_created: self.dirs_created.load(Ordering::Relaxed),
            dirs_removed: self.dirs_removed.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        for counter in [
            &self.files_written,
            &self.files_removed,
            &self.dirs_created,
            &self.dirs_removed,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl<F: FileSystem> FileSystem for Recorder<F> {
    fn read_dir(&self, dir: &Path) -> Result<Vec<DirEntry>> {
        self.inner.read_dir(dir)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.inner.write(path, contents)?;
        self.files_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.inner.remove_file(path)?;
        self.files_removed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.inner.create_dir_all(path)?;
        self.dirs_created.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        self.inner.remove_dir(path)?;
        self.dirs_removed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_local_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("info.yaml");
        LocalFs.write(&path, "title: API\n").unwrap();

        assert_eq!(LocalFs.read_to_string(&path).unwrap(), "title: API\n");
        // Temp file is renamed away
        let names: Vec<String> = LocalFs
            .read_dir(dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["info.yaml"]);
    }

    #[test]
    fn test_read_dir_sorted_with_kinds() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a.yaml"), "").unwrap();

        let entries = LocalFs.read_dir(dir.path()).unwrap();
        assert_eq!(entries[0].name, "a.yaml");
        assert!(!entries[0].is_dir);
        assert_eq!(entries[1].name, "b");
        assert!(entries[1].is_dir);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = LocalFs
            .read_to_string(&dir.path().join("missing.yaml"))
            .unwrap_err();
        assert!(matches!(err, DocsplitError::Io { .. }));
    }

    #[test]
    fn test_is_dir_empty() {
        let dir = tempdir().unwrap();
        assert!(LocalFs.is_dir_empty(dir.path()).unwrap());
        assert!(LocalFs.is_dir_empty(&dir.path().join("missing")).unwrap());
        fs::write(dir.path().join("x"), "").unwrap();
        assert!(!LocalFs.is_dir_empty(dir.path()).unwrap());
    }

    #[test]
    fn test_recorder_counts_mutations() {
        let dir = tempdir().unwrap();
        let fs = Recorder::new(LocalFs);
        let sub = dir.path().join("sub");

        fs.create_dir_all(&sub).unwrap();
        fs.write(&sub.join("a.yaml"), "a: 1\n").unwrap();
        fs.read_to_string(&sub.join("a.yaml")).unwrap();
        fs.remove_file(&sub.join("a.yaml")).unwrap();
        fs.remove_dir(&sub).unwrap();

        assert_eq!(
            fs.stats(),
            MutationStats {
                files_written: 1,
                files_removed: 1,
                dirs_created: 1,
                dirs_removed: 1,
            }
        );
        assert_eq!(fs.stats().total(), 4);

        fs.reset();
        assert_eq!(fs.stats().total(), 0);
    }
}
