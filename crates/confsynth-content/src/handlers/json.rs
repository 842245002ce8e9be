//! JSON format handler

use serde_json::Value;

use crate::error::{Error, Result};
use crate::format::{CommentStyle, Format, FormatHandler, canonicalize};

/// Key that carries the generated-file marker when comments are not allowed.
pub const MARKER_KEY: &str = "//";

/// Handler for JSON files
///
/// Output is pretty-printed with two-space indentation and sorted keys, so
/// re-rendering the same document always yields the same bytes.
#[derive(Debug, Clone, Copy)]
pub struct JsonHandler {
    /// Append a trailing newline.
    pub newline: bool,
    /// Emit the marker as a `//` comment line (JSONC) instead of a key.
    pub allow_comments: bool,
}

impl Default for JsonHandler {
    fn default() -> Self {
        Self {
            newline: true,
            allow_comments: false,
        }
    }
}

impl JsonHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_newline(mut self, newline: bool) -> Self {
        self.newline = newline;
        self
    }

    pub fn with_comments(mut self, allow_comments: bool) -> Self {
        self.allow_comments = allow_comments;
        self
    }
}

impl FormatHandler for JsonHandler {
    fn format(&self) -> Format {
        Format::Json
    }

    fn render(&self, document: &Value, marker: Option<&str>) -> Result<String> {
        let mut value = canonicalize(document);
        let mut out = String::new();

        match marker {
            Some(text) if self.allow_comments => {
                if let Some(header) = CommentStyle::DoubleSlash.header(text) {
                    out.push_str(&header);
                }
            }
            Some(text) => {
                if let Value::Object(map) = &mut value {
                    map.insert(MARKER_KEY.to_string(), Value::String(text.to_string()));
                    value = canonicalize(&value);
                }
            }
            None => {}
        }

        let body = serde_json::to_string_pretty(&value).map_err(|e| Error::serialize("JSON", e))?;
        out.push_str(&body);
        if self.newline {
            out.push('\n');
        }
        Ok(out)
    }
}
