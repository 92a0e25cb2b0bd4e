//! On-disk naming contract shared by both pipelines.
//!
//! Within one directory level:
//! - `_.yaml` (or `_.yml`, `_.json`) is the self file holding the keys that
//!   were not decomposed;
//! - `<key>.yaml`, `<key>.yml`, `<key>.json` are document files;
//! - `<key>.md`, `<key>.txt` are text files holding one multi-line string;
//! - `<key>/` is a subdirectory holding a decomposed mapping or sequence;
//! - names starting with `.` are ignored (temp files, VCS metadata).
//!
//! `<key>` is always the [`KeyCodec`](crate::codec::KeyCodec) encoding of the
//! document key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::codec::KeyCodec;
use crate::config::{DOCUMENT_EXTENSIONS, SELF_FILE_STEM, TEXT_EXTENSIONS};
use crate::error::Result;
use crate::fs::{DirEntry, FileSystem};

/// How a key is materialized on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A document file holding the whole value.
    Document,
    /// A text file holding a multi-line string.
    Text,
    /// A subdirectory holding a decomposed composite.
    Directory,
}

/// What a directory entry stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// The directory's own self file.
    SelfFile,
    /// An entry bound to the key encoded as `stem`.
    Keyed { stem: String, kind: EntryKind },
}

/// Classify a directory entry. Returns `None` for entries outside the tree.
pub fn classify(entry: &DirEntry) -> Option<Slot> {
    if entry.name.starts_with('.') {
        return None;
    }
    if entry.is_dir {
        return Some(Slot::Keyed {
            stem: entry.name.clone(),
            kind: EntryKind::Directory,
        });
    }

    let (stem, extension) = entry.name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    if DOCUMENT_EXTENSIONS.contains(&extension) {
        if stem == SELF_FILE_STEM {
            return Some(Slot::SelfFile);
        }
        return Some(Slot::Keyed {
            stem: stem.to_string(),
            kind: EntryKind::Document,
        });
    }
    if TEXT_EXTENSIONS.contains(&extension) {
        return Some(Slot::Keyed {
            stem: stem.to_string(),
            kind: EntryKind::Text,
        });
    }
    None
}

/// Filename stem for `key`, or `None` when the key cannot have an entry of
/// its own.
///
/// The stem must be a single path segment that is neither hidden nor the
/// self-file stem, and it must decode back to exactly `key`. Under the
/// separator codec a key holding the sentinel (`me@host`) fails the last
/// check, as does one of two keys sharing an encoding (`a/b` and `a@b`).
/// Keys without a stem always stay inline in their parent's self file.
pub fn file_stem(codec: KeyCodec, key: &str) -> Option<String> {
    let stem = codec.encode(key);
    let usable = !stem.is_empty()
        && stem != SELF_FILE_STEM
        && !stem.starts_with('.')
        && !stem.contains(['/', '\\', '\0']);
    if usable && codec.decode(&stem).ok().as_deref() == Some(key) {
        Some(stem)
    } else {
        None
    }
}

#[derive(Debug)]
struct Known {
    path: PathBuf,
    kind: EntryKind,
}

/// Entries present in a directory before the splitter touches it, indexed by
/// decoded key.
///
/// The splitter claims the entries it reuses; whatever is left unclaimed at
/// the end of a directory pass is stale.
#[derive(Debug, Default)]
pub struct KnownEntries {
    by_key: BTreeMap<String, Vec<Known>>,
    self_files: Vec<PathBuf>,
}

impl KnownEntries {
    /// Scan `dir`. A missing directory has no known entries.
    pub fn scan(fs: &impl FileSystem, dir: &Path, codec: KeyCodec) -> Result<Self> {
        let mut known = Self::default();
        if !fs.is_dir(dir) {
            return Ok(known);
        }

        for entry in fs.read_dir(dir)? {
            match classify(&entry) {
                Some(Slot::SelfFile) => known.self_files.push(entry.path),
                Some(Slot::Keyed { stem, kind }) => {
                    let key = codec.decode(&stem)?;
                    known.by_key.entry(key).or_default().push(Known {
                        path: entry.path,
                        kind,
                    });
                }
                None => {}
            }
        }
        Ok(known)
    }

    /// Take the existing entry of `kind` for `key`, if there is one.
    pub fn claim(&mut self, key: &str, kind: EntryKind) -> Option<PathBuf> {
        let entries = self.by_key.get_mut(key)?;
        let position = entries.iter().position(|k| k.kind == kind)?;
        let claimed = entries.remove(position);
        if entries.is_empty() {
            self.by_key.remove(key);
        }
        Some(claimed.path)
    }

    /// Take the existing self file, if there is one.
    pub fn claim_self_file(&mut self) -> Option<PathBuf> {
        if self.self_files.is_empty() {
            None
        } else {
            Some(self.self_files.remove(0))
        }
    }

    /// Everything left unclaimed.
    pub fn into_stale(self) -> Vec<(PathBuf, EntryKind)> {
        self.self_files
            .into_iter()
            .map(|path| (path, EntryKind::Document))
            .chain(
                self.by_key
                    .into_values()
                    .flatten()
                    .map(|known| (known.path, known.kind)),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFs;
    use std::fs;
    use tempfile::tempdir;

    fn file(name: &str) -> DirEntry {
        DirEntry {
            name: name.to_string(),
            path: PathBuf::from(name),
            is_dir: false,
        }
    }

    #[test]
    fn test_classify_files() {
        assert_eq!(classify(&file("_.yaml")), Some(Slot::SelfFile));
        assert_eq!(classify(&file("_.json")), Some(Slot::SelfFile));
        assert_eq!(
            classify(&file("@users.yaml")),
            Some(Slot::Keyed {
                stem: "@users".to_string(),
                kind: EntryKind::Document
            })
        );
        assert_eq!(
            classify(&file("description.md")),
            Some(Slot::Keyed {
                stem: "description".to_string(),
                kind: EntryKind::Text
            })
        );
        assert_eq!(
            classify(&file("v1.2.yml")),
            Some(Slot::Keyed {
                stem: "v1.2".to_string(),
                kind: EntryKind::Document
            })
        );
    }

    #[test]
    fn test_classify_ignores_foreign_entries() {
        assert_eq!(classify(&file(".info.yaml.tmp")), None);
        assert_eq!(classify(&file("README")), None);
        assert_eq!(classify(&file("logo.png")), None);
        assert_eq!(classify(&file(".yaml")), None);
    }

    #[test]
    fn test_classify_directory() {
        let entry = DirEntry {
            name: "paths".to_string(),
            path: PathBuf::from("paths"),
            is_dir: true,
        };
        assert_eq!(
            classify(&entry),
            Some(Slot::Keyed {
                stem: "paths".to_string(),
                kind: EntryKind::Directory
            })
        );
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(KeyCodec::Separator, "info"), Some("info".to_string()));
        assert_eq!(file_stem(KeyCodec::Separator, "/users"), Some("@users".to_string()));
        assert_eq!(file_stem(KeyCodec::Separator, ""), None);
        assert_eq!(file_stem(KeyCodec::Separator, "_"), None);
        assert_eq!(file_stem(KeyCodec::Separator, "."), None);
        assert_eq!(file_stem(KeyCodec::Separator, ".."), None);
        assert_eq!(file_stem(KeyCodec::Separator, ".hidden"), None);
        assert_eq!(file_stem(KeyCodec::Separator, "a\\b"), None);
    }

    #[test]
    fn test_file_stem_requires_exact_decode() {
        assert_eq!(file_stem(KeyCodec::Separator, "me@host"), None);
        assert_eq!(file_stem(KeyCodec::Separator, "a/b"), Some("a@b".to_string()));
        assert_eq!(file_stem(KeyCodec::Separator, "a@b"), None);
        assert_eq!(file_stem(KeyCodec::Pointer, "me@host"), Some("me@0host".to_string()));
    }

    #[test]
    fn test_scan_and_claim() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("_.yaml"), "a: 1\n").unwrap();
        fs::write(dir.path().join("info.yml"), "title: x\n").unwrap();
        fs::write(dir.path().join("@users.yaml"), "get: {}\n").unwrap();
        fs::create_dir(dir.path().join("tags")).unwrap();

        let mut known = KnownEntries::scan(&LocalFs, dir.path(), KeyCodec::Separator).unwrap();
        assert_eq!(
            known.claim("info", EntryKind::Document),
            Some(dir.path().join("info.yml"))
        );
        assert_eq!(known.claim("info", EntryKind::Document), None);
        assert_eq!(known.claim("tags", EntryKind::Document), None);
        assert_eq!(
            known.claim("/users", EntryKind::Document),
            Some(dir.path().join("@users.yaml"))
        );
        assert_eq!(known.claim_self_file(), Some(dir.path().join("_.yaml")));

        let stale = known.into_stale();
        assert_eq!(stale, vec![(dir.path().join("tags"), EntryKind::Directory)]);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let known = KnownEntries::scan(&LocalFs, &dir.path().join("nope"), KeyCodec::Separator)
            .unwrap();
        assert!(known.into_stale().is_empty());
    }
}
