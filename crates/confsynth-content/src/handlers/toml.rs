//! TOML format handler

use serde_json::Value;

use super::child_path;
use crate::error::{Error, Result};
use crate::format::{Format, FormatHandler};

/// Handler for TOML files
///
/// The document is converted to a `toml::Table` first so that shapes TOML
/// cannot hold (a non-table root, `null`, integers past `i64::MAX`) are
/// reported with their key path.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlHandler;

impl TomlHandler {
    pub fn new() -> Self {
        Self
    }
}

fn to_toml(value: &Value, path: &str) -> Result<toml::Value> {
    match value {
        Value::Null => Err(Error::unrepresentable("TOML", path, "null has no TOML form")),
        Value::Bool(b) => Ok(toml::Value::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(toml::Value::Integer(i))
            } else if n.is_u64() {
                Err(Error::unrepresentable(
                    "TOML",
                    path,
                    format!("integer {n} exceeds the 64-bit signed range"),
                ))
            } else {
                n.as_f64()
                    .map(toml::Value::Float)
                    .ok_or_else(|| Error::unrepresentable("TOML", path, "invalid number"))
            }
        }
        Value::String(s) => Ok(toml::Value::String(s.clone())),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| to_toml(item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>>>()
            .map(toml::Value::Array),
        Value::Object(map) => {
            let mut table = toml::Table::new();
            for (key, item) in map {
                table.insert(key.clone(), to_toml(item, &child_path(path, key))?);
            }
            Ok(toml::Value::Table(table))
        }
    }
}

impl FormatHandler for TomlHandler {
    fn format(&self) -> Format {
        Format::Toml
    }

    fn render(&self, document: &Value, marker: Option<&str>) -> Result<String> {
        let table = match to_toml(document, "")? {
            toml::Value::Table(table) => table,
            _ => {
                return Err(Error::unrepresentable(
                    "TOML",
                    "<root>",
                    "the document root must be a table",
                ));
            }
        };
        let body = toml::to_string(&table).map_err(|e| Error::serialize("TOML", e))?;

        let mut out = marker
            .and_then(|text| self.format().comment_style().header(text))
            .unwrap_or_default();
        out.push_str(&body);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_parses_back() {
        let doc = json!({
            "project": {"name": "demo", "version": "0.1.0", "keywords": ["a", "b"]},
            "tool": {"ruff": {"line-length": 100}}
        });
        let out = TomlHandler::new().render(&doc, None).unwrap();
        let parsed: toml::Table = toml::from_str(&out).unwrap();
        assert_eq!(parsed["project"]["name"].as_str(), Some("demo"));
        assert_eq!(parsed["tool"]["ruff"]["line-length"].as_integer(), Some(100));
    }

    #[test]
    fn test_null_is_rejected_with_path() {
        let err = TomlHandler::new()
            .render(&json!({"a": {"b": null}}), None)
            .unwrap_err();
        match err {
            Error::Unrepresentable { path, .. } => assert_eq!(path, "a.b"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_table_root_is_rejected() {
        let err = TomlHandler::new().render(&json!([1, 2]), None).unwrap_err();
        assert!(err.is_format_error());
    }

    #[test]
    fn test_marker_header() {
        let out = TomlHandler::new().render(&json!({"a": 1}), Some("generated")).unwrap();
        assert_eq!(out, "# generated\n\na = 1\n");
    }
}
