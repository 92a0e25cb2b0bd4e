//! Reversible mapping between document keys and filesystem names.
//!
//! A document key always maps to exactly one path segment: path separators
//! inside a key are substituted by [`SENTINEL`] so `/users` is stored as
//! `@users` rather than as a nested `users` directory.

use serde::{Deserialize, Serialize};

use crate::error::{DocsplitError, Result};

/// Character standing in for `/` in filenames.
pub const SENTINEL: char = '@';

/// Key-to-filename codec.
///
/// The same codec must be used for an unbundle and the bundle that reads its
/// output back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KeyCodec {
    /// `/` becomes `@`, and `@` decodes back to `/`.
    ///
    /// Keys that already contain `@` do not survive a round trip.
    #[default]
    Separator,

    /// JSON-Pointer style: `@` becomes `@0` and `/` becomes `@1`.
    ///
    /// Every key round-trips; decoding rejects any other `@` sequence.
    Pointer,
}

impl KeyCodec {
    /// Encode a document key as a filename stem. Never fails.
    #[must_use]
    pub fn encode(self, key: &str) -> String {
        match self {
            Self::Separator => key.replace('/', "@"),
            Self::Pointer => {
                let mut out = String::with_capacity(key.len());
                for c in key.chars() {
                    match c {
                        SENTINEL => out.push_str("@0"),
                        '/' => out.push_str("@1"),
                        other => out.push(other),
                    }
                }
                out
            }
        }
    }

    /// Decode a filename stem back into a document key.
    pub fn decode(self, name: &str) -> Result<String> {
        match self {
            Self::Separator => Ok(name.replace(SENTINEL, "/")),
            Self::Pointer => {
                let mut out = String::with_capacity(name.len());
                let mut chars = name.chars();
                while let Some(c) = chars.next() {
                    if c != SENTINEL {
                        out.push(c);
                        continue;
                    }
                    match chars.next() {
                        Some('0') => out.push(SENTINEL),
                        Some('1') => out.push('/'),
                        Some(other) => {
                            return Err(DocsplitError::InvalidName {
                                name: name.to_string(),
                                reason: format!("unknown escape '{SENTINEL}{other}'"),
                            })
                        }
                        None => {
                            return Err(DocsplitError::InvalidName {
                                name: name.to_string(),
                                reason: format!("dangling '{SENTINEL}' at end of name"),
                            })
                        }
                    }
                }
                Ok(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_escapes_slash() {
        let codec = KeyCodec::Separator;
        assert_eq!(codec.encode("/users/{id}"), "@users@{id}");
        assert_eq!(codec.decode("@users@{id}").unwrap(), "/users/{id}");
        assert!(!codec.encode("/a/b").contains('/'));
    }

    #[test]
    fn test_separator_cannot_hold_sentinel() {
        let codec = KeyCodec::Separator;
        assert_eq!(codec.decode(&codec.encode("me@host")).unwrap(), "me/host");
    }

    #[test]
    fn test_pointer_round_trips_sentinel() {
        let codec = KeyCodec::Pointer;
        for key in ["/users", "me@host", "@1", "plain", "a/@/b", ""] {
            let encoded = codec.encode(key);
            assert!(!encoded.contains('/'), "{encoded}");
            assert_eq!(codec.decode(&encoded).unwrap(), key);
        }
        assert_eq!(codec.encode("/users"), "@1users");
        assert_eq!(codec.encode("a@b"), "a@0b");
    }

    #[test]
    fn test_pointer_rejects_malformed_escape() {
        let codec = KeyCodec::Pointer;
        assert!(matches!(
            codec.decode("@users"),
            Err(DocsplitError::InvalidName { .. })
        ));
        assert!(matches!(
            codec.decode("trailing@"),
            Err(DocsplitError::InvalidName { .. })
        ));
    }
}
