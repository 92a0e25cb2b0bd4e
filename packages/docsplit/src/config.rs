//! On-disk layout constants and declarative policy configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::KeyCodec;
use crate::error::{DocsplitError, Result};
use crate::format::DocumentFormat;
use crate::policy::DecompositionPolicy;

/// Filename stem of a directory's self file (`_.yaml`).
///
/// Holds the keys of the directory's mapping that were not decomposed.
/// The key `_` itself therefore never becomes a file of its own.
pub const SELF_FILE_STEM: &str = "_";

/// Extensions recognized as document files. New files use the first one
/// matching the configured [`DocumentFormat`].
pub const DOCUMENT_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Extension of text files written for multi-line strings.
pub const TEXT_EXTENSION: &str = "md";

/// Extensions recognized as text files when reading a tree.
pub const TEXT_EXTENSIONS: &[&str] = &["md", "txt"];

/// Declarative policy, loadable from a YAML file.
///
/// ```yaml
/// max_depth: 2
/// flat_under: [paths]
/// multiline_as_text: true
/// codec: separator
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Values nested deeper than this are written whole into one file.
    pub max_depth: Option<usize>,

    /// Children of directories with these names never become directories.
    pub flat_under: Vec<String>,

    /// When non-empty, only these keys and the children of directories
    /// named after them are decomposed.
    pub decompose_keys: Vec<String>,

    /// Extract multi-line strings into text files.
    pub multiline_as_text: bool,

    /// Key-to-filename codec.
    pub codec: KeyCodec,

    /// Format of newly created document files.
    pub format: DocumentFormat,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            flat_under: Vec::new(),
            decompose_keys: Vec::new(),
            multiline_as_text: true,
            codec: KeyCodec::default(),
            format: DocumentFormat::default(),
        }
    }
}

impl PolicyConfig {
    /// Load and validate a policy file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| DocsplitError::io(path, e))?;
        let config: Self = serde_yaml_ng::from_str(&text).map_err(|e| {
            DocsplitError::Config(format!("invalid policy file {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot describe a usable tree.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == Some(0) {
            return Err(DocsplitError::Config(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self
            .flat_under
            .iter()
            .chain(&self.decompose_keys)
            .any(|name| name.is_empty())
        {
            return Err(DocsplitError::Config(
                "key names in flat_under and decompose_keys must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the predicates this configuration describes.
    #[must_use]
    pub fn to_policy(&self) -> DecompositionPolicy {
        let mut policy =
            DecompositionPolicy::new().with_multiline_as_text(self.multiline_as_text);

        if !self.decompose_keys.is_empty() {
            let keys = self.decompose_keys.clone();
            let multiline_as_text = self.multiline_as_text;
            policy = policy.with_should_decompose(move |c| {
                let selected = keys.iter().any(|k| k == c.key)
                    || c.dir_name().is_some_and(|d| keys.iter().any(|k| k == d));
                selected
                    && (c.value.is_composite() || (multiline_as_text && c.value.is_multiline()))
            });
        }

        if self.max_depth.is_some() || !self.flat_under.is_empty() {
            let max_depth = self.max_depth;
            let flat_under = self.flat_under.clone();
            policy = policy.with_avoid_subdirectory(move |c| {
                max_depth.is_some_and(|max| c.depth > max)
                    || c
                        .dir_name()
                        .is_some_and(|d| flat_under.iter().any(|k| k == d))
            });
        }

        policy
    }
}
