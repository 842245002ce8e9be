//! Format handlers

mod ini;
mod json;
mod toml;
mod yaml;

pub use self::ini::IniHandler;
pub use self::json::{JsonHandler, MARKER_KEY};
pub use self::toml::TomlHandler;
pub use self::yaml::YamlHandler;

/// Append a key to a dotted diagnostic path.
pub(crate) fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}
