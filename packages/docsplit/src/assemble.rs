//! Assembler: read a directory tree back into one document.

use std::path::Path;

use crate::codec::KeyCodec;
use crate::config::SELF_FILE_STEM;
use crate::error::{DocsplitError, Result};
use crate::format;
use crate::fs::FileSystem;
use crate::layout::{classify, EntryKind, Slot};
use crate::value::{Mapping, Value};

/// An assembled document together with the problems skipped along the way.
///
/// `warnings` is only ever filled in lenient mode; strict assembly fails on
/// the first problem instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub document: Value,
    pub warnings: Vec<String>,
}

/// Reassembles directory trees written by the splitter (or by hand).
pub struct Assembler<'a, F: FileSystem> {
    fs: &'a F,
    codec: KeyCodec,
    strict: bool,
}

impl<'a, F: FileSystem> Assembler<'a, F> {
    /// Create a strict assembler using the separator codec.
    #[must_use]
    pub fn new(fs: &'a F) -> Self {
        Self {
            fs,
            codec: KeyCodec::default(),
            strict: true,
        }
    }

    /// Set the key codec.
    #[must_use]
    pub fn with_codec(mut self, codec: KeyCodec) -> Self {
        self.codec = codec;
        self
    }

    /// In non-strict mode unreadable files are skipped and reported as warnings.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Assemble `dir` and return the document only.
    pub fn bundle(&self, dir: &Path) -> Result<Value> {
        Ok(self.assemble(dir)?.document)
    }

    /// Assemble `dir`. The root is always a mapping.
    pub fn assemble(&self, dir: &Path) -> Result<Bundle> {
        if !self.fs.is_dir(dir) {
            return Err(DocsplitError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        tracing::info!(dir = %dir.display(), strict = self.strict, "Bundling directory");

        let mut warnings = Vec::new();
        let root = self.assemble_dir(dir, &mut warnings)?;

        if !warnings.is_empty() {
            tracing::warn!(count = warnings.len(), "Bundled with skipped entries");
        }
        Ok(Bundle {
            document: Value::Mapping(root),
            warnings,
        })
    }

    fn assemble_dir(&self, dir: &Path, warnings: &mut Vec<String>) -> Result<Mapping> {
        let mut own: Option<Mapping> = None;
        let mut bound = Mapping::new();

        for entry in self.fs.read_dir(dir)? {
            let Some(slot) = classify(&entry) else {
                tracing::trace!(path = %entry.path.display(), "Ignoring entry");
                continue;
            };

            match slot {
                Slot::SelfFile => {
                    if own.is_some() {
                        return Err(DocsplitError::DuplicateKey {
                            key: SELF_FILE_STEM.to_string(),
                            dir: dir.to_path_buf(),
                        });
                    }
                    let Some(value) = self.skippable(self.read_self_file(&entry.path), warnings)?
                    else {
                        continue;
                    };
                    own = Some(value);
                }
                Slot::Keyed { stem, kind } => {
                    let Some(key) = self.skippable(self.codec.decode(&stem), warnings)? else {
                        continue;
                    };
                    if bound.contains_key(&key) {
                        return Err(DocsplitError::DuplicateKey {
                            key,
                            dir: dir.to_path_buf(),
                        });
                    }
                    let value = match kind {
                        EntryKind::Directory => {
                            Value::from_keyed(self.assemble_dir(&entry.path, warnings)?)
                        }
                        EntryKind::Document => {
                            match self.skippable(self.read_document(&entry.path), warnings)? {
                                Some(value) => value,
                                None => continue,
                            }
                        }
                        EntryKind::Text => {
                            match self.skippable(self.read_text(&entry.path), warnings)? {
                                Some(text) => Value::String(text),
                                None => continue,
                            }
                        }
                    };
                    bound.insert(key, value);
                }
            }
        }

        let mut mapping = own.unwrap_or_default();
        for (key, value) in bound {
            if mapping.contains_key(&key) {
                tracing::debug!(key = %key, dir = %dir.display(), "Entry overrides self file key");
            }
            mapping.insert(key, value);
        }
        Ok(mapping)
    }

    /// Read a file as UTF-8. Content that is not valid UTF-8 is a parse error.
    fn read_text(&self, path: &Path) -> Result<String> {
        match self.fs.read_to_string(path) {
            Err(DocsplitError::Io { path, source })
                if source.kind() == std::io::ErrorKind::InvalidData =>
            {
                Err(DocsplitError::parse(path, format!("not valid UTF-8: {source}")))
            }
            other => other,
        }
    }

    fn read_document(&self, path: &Path) -> Result<Value> {
        let text = self.read_text(path)?;
        format::parse(&text).map_err(|message| DocsplitError::parse(path, message))
    }

    /// A self file holds a mapping; an empty one counts as an empty mapping.
    fn read_self_file(&self, path: &Path) -> Result<Mapping> {
        match self.read_document(path)? {
            Value::Mapping(mapping) => Ok(mapping),
            Value::Null => Ok(Mapping::new()),
            other => Err(DocsplitError::parse(
                path,
                format!("self file must hold a mapping, found {}", other.kind()),
            )),
        }
    }

    /// In lenient mode, turn a parse or naming failure into a warning.
    fn skippable<T>(&self, result: Result<T>, warnings: &mut Vec<String>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e @ (DocsplitError::Parse { .. } | DocsplitError::InvalidName { .. }))
                if !self.strict =>
            {
                tracing::warn!(error = %e, "Skipping entry");
                warnings.push(e.to_string());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
