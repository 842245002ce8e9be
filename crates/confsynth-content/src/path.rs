//! Dotted key paths for override trees
//!
//! Overrides address nested keys with dot-separated paths. A literal dot
//! inside a key is written `\.`:
//!
//! ```
//! use confsynth_content::path::split_key_path;
//!
//! let segments = split_key_path(r"compilerOptions.paths.@app\/*").unwrap();
//! assert_eq!(segments, vec!["compilerOptions", "paths", r"@app\/*"]);
//!
//! let segments = split_key_path(r"files.exclude.\.git").unwrap();
//! assert_eq!(segments, vec!["files", "exclude", ".git"]);
//! ```

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::merge::{APPEND_MARKER, append_marker};
use crate::value::Value;

/// Split a dotted path into key segments, honouring `\.` escapes.
///
/// # Errors
///
/// Returns [`Error::InvalidKeyPath`] for an empty path or an empty segment.
pub fn split_key_path(path: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'.') => {
                current.push('.');
                chars.next();
            }
            '.' => segments.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    segments.push(current);

    if segments.iter().any(String::is_empty) {
        return Err(Error::InvalidKeyPath {
            path: path.to_string(),
            reason: "empty key segment".to_string(),
        });
    }
    Ok(segments)
}

/// Run `f` on the map that holds the last segment, creating maps as needed.
///
/// Any non-object value found on the way is replaced by an empty object.
fn with_parent_map<R>(
    root: &mut BTreeMap<String, Value>,
    segments: &[String],
    f: impl FnOnce(&mut BTreeMap<String, Value>) -> R,
) -> R {
    let Some((first, rest)) = segments.split_first() else {
        return f(root);
    };
    let slot = root.entry(first.clone()).or_insert_with(Value::object);
    if let Value::Object(map) = slot {
        return with_parent_map(map, rest, f);
    }
    let mut map = BTreeMap::new();
    let result = with_parent_map(&mut map, rest, f);
    *slot = Value::Object(map);
    result
}

/// Set `value` at `segments` in an override tree.
///
/// Setting [`Value::Undefined`] records a deletion.
pub fn set_override(root: &mut BTreeMap<String, Value>, segments: &[String], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    with_parent_map(root, parents, |parent| {
        parent.insert(last.clone(), value);
    });
}

/// Append `values` at `segments` in an override tree.
///
/// A concrete array already at the path is extended in place; otherwise an
/// append marker is recorded (or extended) for the merge step to resolve
/// against the base document.
pub fn append_override(
    root: &mut BTreeMap<String, Value>,
    segments: &[String],
    values: Vec<Value>,
) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    with_parent_map(root, parents, |parent| match parent.get_mut(last) {
        Some(Value::Array(items)) => items.extend(values),
        Some(Value::Object(marker)) if marker.contains_key(APPEND_MARKER) => {
            if let Some(Value::Array(pending)) = marker.get_mut(APPEND_MARKER) {
                pending.extend(values);
            }
        }
        _ => {
            parent.insert(last.clone(), append_marker(values));
        }
    });
}
