//! Format detection and handler trait

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::Result;
use crate::handlers::{IniHandler, JsonHandler, TomlHandler, YamlHandler};

/// Supported structured document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Yaml,
    Toml,
    Ini,
}

impl Format {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "ini" => Some(Self::Ini),
            _ => None,
        }
    }

    /// Detect format from a path's extension
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.rsplit('/').next().unwrap_or(path);
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Toml => "TOML",
            Self::Ini => "INI",
        }
    }

    /// Get the comment style for this format
    pub fn comment_style(&self) -> CommentStyle {
        match self {
            Self::Json => CommentStyle::None,
            Self::Yaml | Self::Toml | Self::Ini => CommentStyle::Hash,
        }
    }

    /// Get default file extensions for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Json => &["json"],
            Self::Yaml => &["yaml", "yml"],
            Self::Toml => &["toml"],
            Self::Ini => &["ini"],
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Comment syntax used for the generated-file marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// Hash: `# comment`
    Hash,
    /// C++ style: `// comment`
    DoubleSlash,
    /// No comment support (embed in data structure)
    None,
}

impl CommentStyle {
    /// Render `text` as a header line followed by a blank line.
    ///
    /// Returns `None` for [`CommentStyle::None`].
    pub fn header(&self, text: &str) -> Option<String> {
        match self {
            Self::Hash => Some(format!("# {text}\n\n")),
            Self::DoubleSlash => Some(format!("// {text}\n")),
            Self::None => None,
        }
    }
}

/// Renders a resolved, merged and patched document as text.
///
/// Implementations must be total over the documents they accept: anything
/// the target format cannot represent losslessly is an error, never a silent
/// truncation.
pub trait FormatHandler: Send + Sync + std::fmt::Debug {
    /// Format identifier
    fn format(&self) -> Format;

    /// Render `document`, prefixed with the generated-file `marker` if given.
    fn render(&self, document: &JsonValue, marker: Option<&str>) -> Result<String>;
}

/// The default handler for a format.
pub fn handler_for(format: Format) -> Box<dyn FormatHandler> {
    match format {
        Format::Json => Box::new(JsonHandler::new()),
        Format::Yaml => Box::new(YamlHandler::new()),
        Format::Toml => Box::new(TomlHandler::new()),
        Format::Ini => Box::new(IniHandler::new()),
    }
}

/// Recursively sort object keys.
pub fn canonicalize(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), canonicalize(v));
                }
            }
            JsonValue::Object(sorted)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
