//! Splitter: write a document into a synchronized directory tree.
//!
//! Each directory level is reconciled against what is already on disk:
//! entries for current keys are reused (and only rewritten when their
//! content changed), entries for keys that disappeared are deleted, and
//! directories left empty are pruned at the end. Re-running with an
//! unchanged document touches nothing.

use std::path::Path;

use crate::codec::KeyCodec;
use crate::config::{SELF_FILE_STEM, TEXT_EXTENSION};
use crate::error::{DocsplitError, Result};
use crate::format::{self, DocumentFormat};
use crate::fs::FileSystem;
use crate::layout::{file_stem, EntryKind, KnownEntries};
use crate::policy::{Candidate, DecompositionPolicy};
use crate::value::{Mapping, Value};

/// Outcome of one `unbundle` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitReport {
    /// Files created or rewritten.
    pub written: usize,
    /// Files whose content was already up to date.
    pub unchanged: usize,
    /// Stale files and directories deleted.
    pub removed: usize,
    /// Empty directories pruned after the split.
    pub pruned: usize,
}

/// Where a key ended up after a directory pass.
enum Placement {
    /// The key stays in the parent's self file.
    Inline,
    /// The key is represented by its own file or directory.
    Persisted,
}

/// Splits documents into directory trees.
pub struct Splitter<'a, F: FileSystem> {
    fs: &'a F,
    policy: &'a DecompositionPolicy,
    codec: KeyCodec,
    format: DocumentFormat,
}

impl<'a, F: FileSystem> Splitter<'a, F> {
    /// Create a splitter with the separator codec and YAML output.
    #[must_use]
    pub fn new(fs: &'a F, policy: &'a DecompositionPolicy) -> Self {
        Self {
            fs,
            policy,
            codec: KeyCodec::default(),
            format: DocumentFormat::default(),
        }
    }

    /// Set the key codec.
    #[must_use]
    pub fn with_codec(mut self, codec: KeyCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the format of newly created document files.
    #[must_use]
    pub fn with_format(mut self, format: DocumentFormat) -> Self {
        self.format = format;
        self
    }

    /// Split `document` into `target`, converging whatever is already there.
    ///
    /// The root must be a mapping; its residual keys go to `target/_.yaml`.
    pub fn unbundle(&self, document: &Value, target: &Path) -> Result<SplitReport> {
        let Value::Mapping(root) = document else {
            return Err(DocsplitError::NotAMapping {
                found: document.kind(),
            });
        };

        tracing::info!(target = %target.display(), keys = root.len(), "Unbundling document");

        if !self.fs.is_dir(target) {
            self.fs.create_dir_all(target)?;
        }

        let mut report = SplitReport::default();
        let entries = root.iter().map(|(k, v)| (k.clone(), v)).collect();
        self.split_dir(target, entries, 1, true, &mut report)?;
        report.pruned = prune_empty_dirs(self.fs, target)?;

        tracing::info!(
            written = report.written,
            unchanged = report.unchanged,
            removed = report.removed,
            pruned = report.pruned,
            "Unbundle complete"
        );
        Ok(report)
    }

    /// Reconcile one directory with `entries`.
    ///
    /// Returns whether the directory now holds content for this mapping. When
    /// it does not, the caller keeps the whole value inline.
    fn split_dir(
        &self,
        dir: &Path,
        entries: Vec<(String, &Value)>,
        depth: usize,
        is_root: bool,
        report: &mut SplitReport,
    ) -> Result<bool> {
        let mut known = KnownEntries::scan(self.fs, dir, self.codec)?;
        let mut residual = Mapping::new();
        let mut persisted_any = false;

        for (key, value) in entries {
            match self.place(dir, &key, value, depth, &mut known, report)? {
                Placement::Persisted => persisted_any = true,
                Placement::Inline => {
                    residual.insert(key, value.clone());
                }
            }
        }

        let self_file = known.claim_self_file();
        for (path, kind) in known.into_stale() {
            self.remove_stale(&path, kind, report)?;
        }

        // The root always keeps its residual: there is no parent to hold it.
        let keep_self = !residual.is_empty() && (persisted_any || is_root);
        if keep_self {
            let path = self_file.unwrap_or_else(|| {
                dir.join(format!("{SELF_FILE_STEM}.{}", self.format.extension()))
            });
            self.write_document(&path, &Value::Mapping(residual), report)?;
        } else if let Some(path) = self_file {
            self.remove_stale(&path, EntryKind::Document, report)?;
        }

        Ok(persisted_any || keep_self)
    }

    /// Decide where one key goes and write it there.
    fn place(
        &self,
        dir: &Path,
        key: &str,
        value: &Value,
        depth: usize,
        known: &mut KnownEntries,
        report: &mut SplitReport,
    ) -> Result<Placement> {
        let Some(stem) = file_stem(self.codec, key) else {
            tracing::debug!(key, dir = %dir.display(), "Key cannot name a file, keeping inline");
            return Ok(Placement::Inline);
        };

        let candidate = Candidate {
            key,
            value,
            dir,
            depth,
        };
        if !self.policy.should_decompose(&candidate) {
            return Ok(Placement::Inline);
        }
        let avoid_subdirectory = self.policy.avoid_subdirectory(&candidate);

        match value {
            Value::String(text)
                if value.is_multiline() && self.policy.multiline_as_text() && !avoid_subdirectory =>
            {
                let path = known
                    .claim(key, EntryKind::Text)
                    .unwrap_or_else(|| dir.join(format!("{stem}.{TEXT_EXTENSION}")));
                self.write_text(&path, text, report)?;
                Ok(Placement::Persisted)
            }
            Value::Mapping(_) | Value::Sequence(_) if !avoid_subdirectory => {
                let subdir = known
                    .claim(key, EntryKind::Directory)
                    .unwrap_or_else(|| dir.join(&stem));
                let children = value.keyed_entries().unwrap_or_default();
                if self.split_dir(&subdir, children, depth + 1, false, report)? {
                    Ok(Placement::Persisted)
                } else {
                    Ok(Placement::Inline)
                }
            }
            _ => {
                let path = known.claim(key, EntryKind::Document).unwrap_or_else(|| {
                    dir.join(format!("{stem}.{}", self.format.extension()))
                });
                self.write_document(&path, value, report)?;
                Ok(Placement::Persisted)
            }
        }
    }

    /// Write a document file unless it already parses to `value`.
    ///
    /// An existing file keeps the format of its own extension.
    fn write_document(&self, path: &Path, value: &Value, report: &mut SplitReport) -> Result<()> {
        if self.fs.exists(path) {
            let current = self
                .fs
                .read_to_string(path)
                .ok()
                .and_then(|text| format::parse(&text).ok());
            if current.is_some_and(|current| current.identical(value)) {
                tracing::debug!(path = %path.display(), "Document unchanged");
                report.unchanged += 1;
                return Ok(());
            }
        }

        let format = DocumentFormat::from_path(path).unwrap_or(self.format);
        let text = format
            .stringify(value)
            .map_err(|message| DocsplitError::Serialize { message })?;
        self.write_file(path, &text, report)
    }

    /// Write a text file unless it already holds `text`.
    fn write_text(&self, path: &Path, text: &str, report: &mut SplitReport) -> Result<()> {
        if self.fs.exists(path) && self.fs.read_to_string(path).ok().as_deref() == Some(text) {
            tracing::debug!(path = %path.display(), "Text unchanged");
            report.unchanged += 1;
            return Ok(());
        }
        self.write_file(path, text, report)
    }

    fn write_file(&self, path: &Path, contents: &str, report: &mut SplitReport) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !self.fs.is_dir(parent) {
                self.fs.create_dir_all(parent)?;
            }
        }
        self.fs.write(path, contents)?;
        tracing::debug!(path = %path.display(), "Wrote file");
        report.written += 1;
        Ok(())
    }

    fn remove_stale(&self, path: &Path, kind: EntryKind, report: &mut SplitReport) -> Result<()> {
        tracing::debug!(path = %path.display(), ?kind, "Removing stale entry");
        match kind {
            EntryKind::Directory => report.removed += remove_tree(self.fs, path)?,
            EntryKind::Document | EntryKind::Text => {
                self.fs.remove_file(path)?;
                report.removed += 1;
            }
        }
        Ok(())
    }
}

/// Delete a directory and everything below it. Returns the entries removed.
fn remove_tree(fs: &impl FileSystem, dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs.read_dir(dir)? {
        if entry.is_dir {
            removed += remove_tree(fs, &entry.path)?;
        } else {
            fs.remove_file(&entry.path)?;
            removed += 1;
        }
    }
    fs.remove_dir(dir)?;
    Ok(removed + 1)
}

/// Remove every directory below `root` that has no entries left, deepest
/// first. Hidden directories are left alone. Returns the number removed.
pub fn prune_empty_dirs(fs: &impl FileSystem, root: &Path) -> Result<usize> {
    let mut pruned = 0;
    for entry in fs.read_dir(root)? {
        if !entry.is_dir || entry.name.starts_with('.') {
            continue;
        }
        pruned += prune_empty_dirs(fs, &entry.path)?;
        if fs.is_dir_empty(&entry.path)? {
            fs.remove_dir(&entry.path)?;
            tracing::debug!(path = %entry.path.display(), "Pruned empty directory");
            pruned += 1;
        }
    }
    Ok(pruned)
}
