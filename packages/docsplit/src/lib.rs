//! docsplit - Split YAML/JSON documents into directory trees and back.
//!
//! A large document (an OpenAPI description, a configuration bundle) is
//! easier to review and merge when every significant part lives in its own
//! file. `unbundle` writes a document into a directory tree, `bundle` reads
//! the tree back, and the two are inverse for any decomposition policy.
//!
//! # Example
//!
//! ```
//! use docsplit::codec::KeyCodec;
//!
//! // Keys containing '/' map to a single filename
//! assert_eq!(KeyCodec::Separator.encode("/users/{id}"), "@users@{id}");
//! assert_eq!(KeyCodec::Separator.decode("@users@{id}").unwrap(), "/users/{id}");
//! ```
//!
//! # Architecture
//!
//! - [`value`]: In-memory document model
//! - [`codec`]: Key to filename mapping
//! - [`policy`]: Which values get their own file or directory
//! - [`layout`]: On-disk naming contract and directory scanning
//! - [`format`]: YAML/JSON parsing and serialization
//! - [`fs`]: Filesystem access and mutation counting
//! - [`split`]: Document to directory tree (`unbundle`)
//! - [`assemble`]: Directory tree to document (`bundle`)
//! - [`config`]: Layout constants and policy files
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod assemble;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod format;
pub mod fs;
pub mod layout;
pub mod policy;
pub mod split;
pub mod value;

use std::path::Path;

pub use assemble::{Assembler, Bundle};
pub use codec::KeyCodec;
pub use config::PolicyConfig;
pub use error::{DocsplitError, Result};
pub use format::DocumentFormat;
pub use fs::{FileSystem, LocalFs, MutationStats, Recorder};
pub use policy::{Candidate, DecompositionPolicy};
pub use split::{SplitReport, Splitter};
pub use value::{Mapping, Value};

/// Split `document` into `target` on the local disk with default settings.
pub fn unbundle(
    document: &Value,
    target: &Path,
    policy: &DecompositionPolicy,
) -> Result<SplitReport> {
    Splitter::new(&LocalFs, policy).unbundle(document, target)
}

/// Read the tree under `dir` on the local disk back into one document.
pub fn bundle(dir: &Path) -> Result<Value> {
    Assembler::new(&LocalFs).bundle(dir)
}
