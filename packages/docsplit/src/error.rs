//! Error types for docsplit.
//!
//! Every failure carries the path or key it concerns so the caller can
//! report it without further context.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for the docsplit library.
#[derive(Debug, Error)]
pub enum DocsplitError {
    /// Reading, writing, listing or deleting a path failed.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A document or text file could not be parsed.
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// A value could not be turned into document text.
    #[error("Serialization failed: {message}")]
    Serialize { message: String },

    /// Two filesystem entries decode to the same document key.
    #[error("Key '{key}' is defined more than once in {}", .dir.display())]
    DuplicateKey { key: String, dir: PathBuf },

    /// The document handed to `unbundle` is not a mapping.
    #[error("Document root must be a mapping, found {found}")]
    NotAMapping { found: &'static str },

    /// A filename holds a malformed escape sequence.
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Invalid policy configuration or command-line option.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DocsplitError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Build a parse error for a file.
    pub fn parse(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

/// Result type alias for docsplit operations.
pub type Result<T> = std::result::Result<T, DocsplitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_display() {
        let err = DocsplitError::DuplicateKey {
            key: "/users".to_string(),
            dir: PathBuf::from("out/paths"),
        };
        assert_eq!(
            err.to_string(),
            "Key '/users' is defined more than once in out/paths"
        );
    }

    #[test]
    fn test_io_display_includes_path() {
        let err = DocsplitError::io(
            "out/info.yaml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("out/info.yaml"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_not_a_mapping_display() {
        let err = DocsplitError::NotAMapping { found: "sequence" };
        assert_eq!(
            err.to_string(),
            "Document root must be a mapping, found sequence"
        );
    }
}
