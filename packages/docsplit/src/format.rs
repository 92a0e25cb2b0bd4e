//! Document text formats: parsing and stringifying [`Value`] trees.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::value::{Mapping, Value};

/// Text format of a document file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// YAML, the default for new files.
    #[default]
    Yaml,
    /// Pretty-printed JSON.
    Json,
}

impl DocumentFormat {
    /// Extension used for files written in this format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    /// Format implied by a file's extension, if it is a document extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Serialize a value in this format.
    ///
    /// JSON output ends with a newline so files end cleanly.
    pub fn stringify(self, value: &Value) -> Result<String, String> {
        match self {
            Self::Yaml => serde_yaml_ng::to_string(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value)
                .map(|s| s + "\n")
                .map_err(|e| e.to_string()),
        }
    }
}

/// Parse document text.
///
/// The YAML parser also accepts JSON, so one entry point serves both
/// formats. Empty text parses to `Null`.
pub fn parse(text: &str) -> Result<Value, String> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let raw: serde_yaml_ng::Value = serde_yaml_ng::from_str(text).map_err(|e| e.to_string())?;
    from_yaml(raw)
}

/// Convert a parsed YAML value into the document model.
///
/// Scalar mapping keys are stringified (`200:` becomes `"200"`) and tags are
/// dropped. Composite mapping keys cannot name a file and are rejected.
fn from_yaml(raw: serde_yaml_ng::Value) -> Result<Value, String> {
    use serde_yaml_ng::Value as Yaml;

    Ok(match raw {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                return Err(format!("unsupported number {n}"));
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Yaml::Mapping(map) => {
            let mut mapping = Mapping::new();
            for (k, v) in map {
                mapping.insert(key_to_string(k)?, from_yaml(v)?);
            }
            Value::Mapping(mapping)
        }
        Yaml::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}

fn key_to_string(key: serde_yaml_ng::Value) -> Result<String, String> {
    use serde_yaml_ng::Value as Yaml;

    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Number(n) => Ok(n.to_string()),
        Yaml::Bool(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        Yaml::Tagged(tagged) => key_to_string(tagged.value),
        Yaml::Sequence(_) | Yaml::Mapping(_) => {
            Err("mapping keys must be scalars".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_scalars_and_nesting() {
        let value = parse("a: 1\nb: [true, 2.5, ~]\nc: text\n").unwrap();
        let m = value.as_mapping().unwrap();
        assert_eq!(m["a"], Value::Int(1));
        assert_eq!(
            m["b"],
            Value::Sequence(vec![Value::Bool(true), Value::Float(2.5), Value::Null])
        );
        assert_eq!(m["c"], Value::from("text"));
    }

    #[test]
    fn test_parse_numeric_keys_become_strings() {
        let value = parse("responses:\n  200:\n    description: OK\n").unwrap();
        let responses = value.as_mapping().unwrap()["responses"].as_mapping().unwrap();
        assert!(responses.contains_key("200"));
    }

    #[test]
    fn test_parse_json() {
        let value = parse(r#"{"info": {"title": "API"}}"#).unwrap();
        assert_eq!(
            value.as_mapping().unwrap()["info"].as_mapping().unwrap()["title"],
            Value::from("API")
        );
    }

    #[test]
    fn test_parse_empty_is_null() {
        assert_eq!(parse("").unwrap(), Value::Null);
        assert_eq!(parse("  \n").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_error() {
        assert!(parse("a: [1, 2").is_err());
    }

    #[test]
    fn test_stringify_yaml_reparses() {
        let value = parse("title: API\ndescription: \"line1\\nline2\"\ncount: 3\n").unwrap();
        let text = DocumentFormat::Yaml.stringify(&value).unwrap();
        assert_eq!(parse(&text).unwrap(), value);
    }

    #[test]
    fn test_stringify_json_ends_with_newline() {
        let value = parse("a: 1").unwrap();
        let text = DocumentFormat::Json.stringify(&value).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_stringify_numeric_string_keeps_type() {
        let value = parse("version: '1.0'").unwrap();
        let text = DocumentFormat::Yaml.stringify(&value).unwrap();
        assert_eq!(parse(&text).unwrap(), value);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b.yml")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("b.json")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("b.md")), None);
    }
}
