//! Decomposition policy: which values get their own file or directory.

use std::fmt;
use std::path::Path;

use crate::value::Value;

/// A key/value pair under consideration by the splitter.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Document key of the value.
    pub key: &'a str,
    /// The value itself.
    pub value: &'a Value,
    /// Directory the value would be written into.
    pub dir: &'a Path,
    /// Nesting depth: 1 for direct children of the document root.
    pub depth: usize,
}

impl Candidate<'_> {
    /// Name of the directory the candidate lives in (its parent key on disk).
    #[must_use]
    pub fn dir_name(&self) -> Option<&str> {
        self.dir.file_name().and_then(|n| n.to_str())
    }
}

/// Caller-supplied predicate over a candidate.
pub type Predicate = Box<dyn Fn(&Candidate<'_>) -> bool + Send + Sync>;

/// Decides, per key, whether a value stays inline in its parent's file or
/// is materialized on its own.
///
/// All three parts are optional:
/// - `should_decompose` defaults to "mapping, sequence, or multi-line text
///   while text extraction is enabled";
/// - `avoid_subdirectory` defaults to never: decomposed composites become
///   subdirectories;
/// - `multiline_as_text` defaults to `true`.
pub struct DecompositionPolicy {
    should_decompose: Option<Predicate>,
    avoid_subdirectory: Option<Predicate>,
    multiline_as_text: bool,
}

impl DecompositionPolicy {
    /// Create a policy with every default in place.
    #[must_use]
    pub fn new() -> Self {
        Self {
            should_decompose: None,
            avoid_subdirectory: None,
            multiline_as_text: true,
        }
    }

    /// Replace the default decomposition predicate.
    #[must_use]
    pub fn with_should_decompose(
        mut self,
        predicate: impl Fn(&Candidate<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_decompose = Some(Box::new(predicate));
        self
    }

    /// Set the predicate that keeps a decomposed value in one sibling file.
    #[must_use]
    pub fn with_avoid_subdirectory(
        mut self,
        predicate: impl Fn(&Candidate<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.avoid_subdirectory = Some(Box::new(predicate));
        self
    }

    /// Enable or disable extraction of multi-line strings to text files.
    #[must_use]
    pub fn with_multiline_as_text(mut self, enabled: bool) -> Self {
        self.multiline_as_text = enabled;
        self
    }

    /// Whether the candidate leaves its parent's file.
    pub fn should_decompose(&self, candidate: &Candidate<'_>) -> bool {
        match &self.should_decompose {
            Some(predicate) => predicate(candidate),
            None => {
                candidate.value.is_composite()
                    || (self.multiline_as_text && candidate.value.is_multiline())
            }
        }
    }

    /// Whether a decomposed candidate is written whole into one file.
    pub fn avoid_subdirectory(&self, candidate: &Candidate<'_>) -> bool {
        self.avoid_subdirectory
            .as_ref()
            .is_some_and(|predicate| predicate(candidate))
    }

    /// Whether multi-line strings may become text files at all.
    #[must_use]
    pub fn multiline_as_text(&self) -> bool {
        self.multiline_as_text
    }
}

impl Default for DecompositionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DecompositionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecompositionPolicy")
            .field("should_decompose", &self.should_decompose.is_some())
            .field("avoid_subdirectory", &self.avoid_subdirectory.is_some())
            .field("multiline_as_text", &self.multiline_as_text)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Mapping;

    fn candidate<'a>(key: &'a str, value: &'a Value, dir: &'a Path) -> Candidate<'a> {
        Candidate {
            key,
            value,
            dir,
            depth: 1,
        }
    }

    #[test]
    fn test_default_decomposes_composites_and_text() {
        let policy = DecompositionPolicy::new();
        let dir = Path::new("out");
        let object = Value::Mapping(Mapping::new());
        let text = Value::from("a\nb");
        let scalar = Value::from("a");

        assert!(policy.should_decompose(&candidate("info", &object, dir)));
        assert!(policy.should_decompose(&candidate("description", &text, dir)));
        assert!(!policy.should_decompose(&candidate("title", &scalar, dir)));
        assert!(!policy.avoid_subdirectory(&candidate("info", &object, dir)));
    }

    #[test]
    fn test_text_extraction_switch() {
        let policy = DecompositionPolicy::new().with_multiline_as_text(false);
        let text = Value::from("a\nb");
        assert!(!policy.should_decompose(&candidate("description", &text, Path::new("out"))));
    }

    #[test]
    fn test_custom_predicates() {
        let policy = DecompositionPolicy::new()
            .with_should_decompose(|c| c.key == "paths")
            .with_avoid_subdirectory(|c| c.depth > 1 || c.dir_name() == Some("paths"));
        let value = Value::Mapping(Mapping::new());

        assert!(policy.should_decompose(&candidate("paths", &value, Path::new("out"))));
        assert!(!policy.should_decompose(&candidate("info", &value, Path::new("out"))));
        assert!(policy.avoid_subdirectory(&candidate("/users", &value, Path::new("out/paths"))));
    }
}
