//! In-memory value model shared by the splitter and the assembler.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Decimal sequence index without leading zeros.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INDEX_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|[1-9][0-9]*)$").expect("valid regex"));

/// Mapping of document keys to values.
///
/// Key order carries no meaning; a sorted map keeps write order deterministic.
pub type Mapping = BTreeMap<String, Value>;

/// A document value.
///
/// Multi-line text is not a separate variant: it is a `String` for which
/// [`Value::is_multiline`] holds, so a string read back from a text file
/// compares equal to the one parsed from the original document.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Ordered list of values
    Sequence(Vec<Value>),
    /// Keyed values
    Mapping(Mapping),
}

impl Value {
    /// Try to get value as mapping reference
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Structural equality that compares floats by their bits.
    ///
    /// Unlike `==`, a NaN matches itself, so a file holding `.nan` reads as
    /// unchanged. `0.0` and `-0.0` differ, matching their serialized form.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Sequence(a), Value::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
            }
            (Value::Mapping(a), Value::Mapping(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.identical(vb))
            }
            _ => self == other,
        }
    }

    /// Whether the value is a mapping or a sequence.
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Mapping(_) | Value::Sequence(_))
    }

    /// Whether the value is a string holding at least one line break.
    pub fn is_multiline(&self) -> bool {
        matches!(self, Value::String(s) if s.contains('\n'))
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// View a composite value as `(key, value)` entries.
    ///
    /// Sequence elements are keyed by their decimal index. Returns `None`
    /// for scalars. This is the inverse of [`Value::from_keyed`].
    pub fn keyed_entries(&self) -> Option<Vec<(String, &Value)>> {
        match self {
            Value::Mapping(m) => Some(m.iter().map(|(k, v)| (k.clone(), v)).collect()),
            Value::Sequence(items) => Some(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (index_key(i), v))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Build a value from keyed entries, applying the array-detection rule.
    ///
    /// A non-empty mapping whose keys are exactly `"0"..="n-1"` becomes a
    /// sequence in index order. Any gap or non-index key keeps the mapping.
    pub fn from_keyed(mapping: Mapping) -> Value {
        let len = mapping.len();
        // Keys are unique, so n distinct indices below n cover 0..n exactly.
        let all_indexed = mapping
            .keys()
            .all(|k| parse_index_key(k).is_some_and(|i| i < len));
        if len == 0 || !all_indexed {
            return Value::Mapping(mapping);
        }

        let mut items: Vec<(usize, Value)> = mapping
            .into_iter()
            .filter_map(|(k, v)| parse_index_key(&k).map(|i| (i, v)))
            .collect();
        items.sort_unstable_by_key(|(i, _)| *i);
        Value::Sequence(items.into_iter().map(|(_, v)| v).collect())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

/// Key under which sequence element `index` is stored.
pub fn index_key(index: usize) -> String {
    index.to_string()
}

/// Parse a key produced by [`index_key`].
pub fn parse_index_key(key: &str) -> Option<usize> {
    if INDEX_KEY_PATTERN.is_match(key) {
        key.parse().ok()
    } else {
        None
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<Mapping> for Value {
    fn from(m: Mapping) -> Self {
        Value::Mapping(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(pairs: &[(&str, Value)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_is_multiline() {
        assert!(Value::from("line1\nline2").is_multiline());
        assert!(!Value::from("single line").is_multiline());
        assert!(!Value::Int(3).is_multiline());
    }

    #[test]
    fn test_keyed_entries_of_sequence() {
        let value = Value::from(vec!["a", "b"]);
        let entries = value.keyed_entries().unwrap();
        assert_eq!(entries[0], ("0".to_string(), &Value::from("a")));
        assert_eq!(entries[1], ("1".to_string(), &Value::from("b")));
        assert!(Value::Null.keyed_entries().is_none());
    }

    #[test]
    fn test_from_keyed_detects_sequence() {
        let m = mapping(&[
            ("2", Value::from("c")),
            ("0", Value::from("a")),
            ("1", Value::from("b")),
        ]);
        assert_eq!(Value::from_keyed(m), Value::from(vec!["a", "b", "c"]));
    }

    #[test]
    fn test_from_keyed_keeps_mapping_on_gap() {
        let m = mapping(&[("0", Value::from("a")), ("2", Value::from("c"))]);
        assert!(matches!(Value::from_keyed(m), Value::Mapping(_)));
    }

    #[test]
    fn test_from_keyed_keeps_mapping_on_mixed_keys() {
        let m = mapping(&[
            ("0", Value::from("a")),
            ("1", Value::from("b")),
            ("name", Value::from("c")),
        ]);
        assert!(matches!(Value::from_keyed(m), Value::Mapping(_)));
    }

    #[test]
    fn test_from_keyed_rejects_leading_zero() {
        let m = mapping(&[("00", Value::from("a"))]);
        assert!(matches!(Value::from_keyed(m), Value::Mapping(_)));
    }

    #[test]
    fn test_from_keyed_empty_stays_mapping() {
        assert_eq!(Value::from_keyed(Mapping::new()), Value::Mapping(Mapping::new()));
    }

    #[test]
    fn test_identical_matches_nan() {
        let nan = Value::Sequence(vec![Value::Float(f64::NAN), Value::Int(1)]);
        assert_ne!(nan, nan.clone());
        assert!(nan.identical(&nan.clone()));
        assert!(!Value::Float(0.0).identical(&Value::Float(-0.0)));
        assert!(!Value::Float(1.0).identical(&Value::Int(1)));

        let m = mapping(&[("a", Value::Float(f64::NAN))]);
        let other = mapping(&[("b", Value::Float(f64::NAN))]);
        assert!(Value::Mapping(m.clone()).identical(&Value::Mapping(m.clone())));
        assert!(!Value::Mapping(m).identical(&Value::Mapping(other)));
    }

    #[test]
    fn test_parse_index_key() {
        assert_eq!(parse_index_key("0"), Some(0));
        assert_eq!(parse_index_key("17"), Some(17));
        assert_eq!(parse_index_key("-1"), None);
        assert_eq!(parse_index_key("01"), None);
        assert_eq!(parse_index_key("1a"), None);
    }
}
