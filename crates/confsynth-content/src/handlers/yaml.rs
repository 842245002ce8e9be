//! YAML format handler

use serde_json::Value;

use crate::error::{Error, Result};
use crate::format::{Format, FormatHandler, canonicalize};

/// Handler for YAML files
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlHandler;

impl YamlHandler {
    pub fn new() -> Self {
        Self
    }
}

impl FormatHandler for YamlHandler {
    fn format(&self) -> Format {
        Format::Yaml
    }

    fn render(&self, document: &Value, marker: Option<&str>) -> Result<String> {
        let body = serde_yaml::to_string(&canonicalize(document))
            .map_err(|e| Error::serialize("YAML", e))?;

        let mut out = marker
            .and_then(|text| self.format().comment_style().header(text))
            .unwrap_or_default();
        out.push_str(&body);
        Ok(out)
    }
}
