//! Loading and dumping of content documents.
//!
//! Documents are held as [`serde_json::Value`] regardless of their on-disk
//! format. With `preserve_order` enabled the key order of the source file
//! survives a load/dump cycle, and YAML mappings with duplicate keys load
//! with the last occurrence winning.
//!
//! Files are only written when their data actually changed, so a document
//! that no fix touched is never reformatted.

use crate::error::{PacklintError, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// On-disk format of a content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Markdown,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "yml" | "yaml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            "md" => Some(DocumentFormat::Markdown),
            _ => None,
        }
    }
}

/// Parse document text.
///
/// Markdown is carried as a JSON string so every artifact shares one data type.
pub fn parse(text: &str, format: DocumentFormat, path: &Path) -> Result<Value> {
    let parsed = match format {
        DocumentFormat::Yaml => {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string())
        }
        DocumentFormat::Json => serde_json::from_str::<Value>(text).map_err(|e| e.to_string()),
        DocumentFormat::Markdown => Ok(Value::String(text.to_string())),
    };

    parsed.map_err(|message| PacklintError::ParseError {
        path: path.to_path_buf(),
        message,
    })
}

/// Serialize a document to text.
pub fn dump(value: &Value, format: DocumentFormat) -> Result<String> {
    match format {
        DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(|e| {
            PacklintError::Other(anyhow::anyhow!("Failed to serialize YAML: {}", e))
        }),
        DocumentFormat::Json => {
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut ser).map_err(|e| {
                PacklintError::Other(anyhow::anyhow!("Failed to serialize JSON: {}", e))
            })?;
            buf.push(b'\n');
            String::from_utf8(buf)
                .map_err(|e| PacklintError::Other(anyhow::anyhow!("Invalid UTF-8 output: {}", e)))
        }
        DocumentFormat::Markdown => Ok(value.as_str().unwrap_or_default().to_string()),
    }
}

/// Read and parse a document from disk.
pub fn load(path: &Path) -> Result<(Value, DocumentFormat)> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| PacklintError::UnclassifiedFile {
        path: path.to_path_buf(),
    })?;
    let text = std::fs::read_to_string(path)?;
    Ok((parse(&text, format, path)?, format))
}

/// Write `value` to `path` unless it serializes identically to `original`.
///
/// Returns whether the file was written.
pub fn write_if_changed(
    path: &Path,
    original: &Value,
    value: &Value,
    format: DocumentFormat,
) -> Result<bool> {
    let new_text = dump(value, format)?;
    if dump(original, format)? == new_text {
        return Ok(false);
    }
    std::fs::write(path, new_text)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("a/b.yml")),
            Some(DocumentFormat::Yaml)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("pack_metadata.json")),
            Some(DocumentFormat::Json)
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("1_0_1.md")),
            Some(DocumentFormat::Markdown)
        );
        assert_eq!(DocumentFormat::from_path(Path::new("x.py")), None);
    }

    #[test]
    fn yaml_preserves_key_order() {
        let value = parse("zeta: 1\nalpha: 2\nmid: 3\n", DocumentFormat::Yaml, Path::new("x.yml"))
            .unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn yaml_tolerates_duplicate_keys() {
        let value = parse("id: a\nid: b\n", DocumentFormat::Yaml, Path::new("x.yml")).unwrap();
        assert_eq!(value["id"], "b");
    }

    #[test]
    fn empty_yaml_is_null() {
        let value = parse("  \n", DocumentFormat::Yaml, Path::new("x.yml")).unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn invalid_json_reports_path() {
        let err = parse("{", DocumentFormat::Json, Path::new("bad.json")).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn json_dump_uses_four_space_indent() {
        let text = dump(&json!({"a": {"b": 1}}), DocumentFormat::Json).unwrap();
        assert_eq!(text, "{\n    \"a\": {\n        \"b\": 1\n    }\n}\n");
    }

    #[test]
    fn yaml_dump_round_trips() {
        let source = "id: x\nname: y\nlist:\n- a\n- b\n";
        let value = parse(source, DocumentFormat::Yaml, Path::new("x.yml")).unwrap();
        assert_eq!(dump(&value, DocumentFormat::Yaml).unwrap(), source);
    }

    #[test]
    fn write_if_changed_skips_identical_data() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.yml");
        std::fs::write(&path, "# keep me\nid: x\n").unwrap();

        let (value, format) = load(&path).unwrap();
        let written = write_if_changed(&path, &value, &value.clone(), format).unwrap();

        assert!(!written);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "# keep me\nid: x\n"
        );
    }

    #[test]
    fn write_if_changed_writes_modified_data() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.json");
        std::fs::write(&path, "{\"id\": \"x\"}").unwrap();

        let (original, format) = load(&path).unwrap();
        let mut changed = original.clone();
        changed["id"] = json!("y");

        assert!(write_if_changed(&path, &original, &changed, format).unwrap());
        let reloaded = load(&path).unwrap().0;
        assert_eq!(reloaded["id"], "y");
    }
}
