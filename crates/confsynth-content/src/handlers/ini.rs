//! INI format handler
//!
//! Layout follows the common `ini` encoder conventions:
//!
//! - top-level scalars first, as `key = value`
//! - nested objects become `[parent.child]` sections, emitted only when they
//!   hold scalars of their own; dots inside a key are escaped as `\.`
//! - scalar arrays become repeated `key[] = value` lines
//! - sections are separated by one blank line
//!
//! Values INI cannot hold (`null`, empty arrays and sections, arrays of
//! arrays or objects, a non-object root) are rejected instead of being
//! flattened or dropped.

use serde_json::{Map, Value};

use super::child_path;
use crate::error::{Error, Result};
use crate::format::{Format, FormatHandler, canonicalize};

/// Handler for INI files
#[derive(Debug, Default, Clone, Copy)]
pub struct IniHandler;

impl IniHandler {
    pub fn new() -> Self {
        Self
    }
}

/// Quote or escape a key or value so it survives an INI round trip.
fn safe(raw: &str) -> String {
    let needs_quotes = raw.contains(['=', '\r', '\n'])
        || raw.starts_with('[')
        || (raw.len() > 1 && raw.starts_with('"') && raw.ends_with('"'))
        || (raw.len() > 1 && raw.starts_with('\'') && raw.ends_with('\''))
        || raw != raw.trim();

    if needs_quotes {
        // A JSON string literal is valid INI quoting.
        Value::String(raw.to_string()).to_string()
    } else {
        raw.replace(';', "\\;").replace('#', "\\#")
    }
}

fn scalar(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(safe(s)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Err(Error::unrepresentable("INI", path, "null has no INI form")),
        Value::Array(_) | Value::Object(_) => Err(Error::unrepresentable(
            "INI",
            path,
            "nested structures inside arrays cannot be represented",
        )),
    }
}

fn encode(map: &Map<String, Value>, section: &str, path: &str) -> Result<String> {
    if map.is_empty() && !section.is_empty() {
        return Err(Error::unrepresentable(
            "INI",
            path,
            "empty sections have no INI form",
        ));
    }

    let mut out = String::new();
    let mut children = Vec::new();

    for (key, value) in map {
        let key_path = child_path(path, key);
        match value {
            Value::Array(items) if items.is_empty() => {
                return Err(Error::unrepresentable(
                    "INI",
                    key_path,
                    "empty arrays have no INI form",
                ));
            }
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let line = scalar(item, &format!("{key_path}[{i}]"))?;
                    out.push_str(&format!("{}[] = {line}\n", safe(key)));
                }
            }
            Value::Object(child) => children.push((key, child, key_path)),
            other => {
                out.push_str(&format!("{} = {}\n", safe(key), scalar(other, &key_path)?));
            }
        }
    }

    if !section.is_empty() && !out.is_empty() {
        out = format!("[{}]\n{out}", safe(section));
    }

    for (key, child, key_path) in children {
        let escaped = key.replace('.', "\\.");
        let child_section = if section.is_empty() {
            escaped
        } else {
            format!("{section}.{escaped}")
        };
        let rendered = encode(child, &child_section, &key_path)?;
        if !out.is_empty() && !rendered.is_empty() {
            out.push('\n');
        }
        out.push_str(&rendered);
    }

    Ok(out)
}

impl FormatHandler for IniHandler {
    fn format(&self) -> Format {
        Format::Ini
    }

    fn render(&self, document: &Value, marker: Option<&str>) -> Result<String> {
        let Value::Object(map) = canonicalize(document) else {
            return Err(Error::unrepresentable(
                "INI",
                "<root>",
                "the document root must be an object",
            ));
        };
        let body = encode(&map, "", "")?;

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
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("a=b", "\"a=b\"")]
    #[case(" padded ", "\" padded \"")]
    #[case("[bracket", "\"[bracket\"")]
    #[case("semi;colon", "semi\\;colon")]
    #[case("hash#tag", "hash\\#tag")]
    fn test_safe(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(safe(raw), expected);
    }

    #[test]
    fn test_null_is_rejected() {
        let err = IniHandler::new()
            .render(&serde_json::json!({"s": {"k": null}}), None)
            .unwrap_err();
        match err {
            Error::Unrepresentable { path, .. } => assert_eq!(path, "s.k"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
