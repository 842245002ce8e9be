//! Normalized path handling for synthesized files
//!
//! Project files are addressed by forward-slash relative paths. All paths are
//! cleaned on construction (`.` and empty components dropped, `..` folded into
//! its parent where possible) so that two spellings of the same file compare
//! equal in the project's path registry.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// A path normalized to use forward slashes internally.
///
/// Converts to a platform-native `PathBuf` only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Leading `..` components that cannot be folded are kept, so
    /// [`NormalizedPath::escapes_root`] can detect them.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        Self {
            inner: clean(&raw),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a relative segment.
    pub fn join(&self, segment: &str) -> Self {
        if self.inner.is_empty() || self.inner == "." {
            return Self::new(segment);
        }
        let joined = format!("{}/{}", self.inner, segment.replace('\\', "/"));
        Self {
            inner: clean(&joined),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// Whether the path is rooted (`/x`, `//server/x`, or a `C:` drive).
    pub fn is_absolute(&self) -> bool {
        let bytes = self.inner.as_bytes();
        self.inner.starts_with('/')
            || (bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic())
    }

    /// Whether a relative path climbs above its starting directory.
    pub fn escapes_root(&self) -> bool {
        self.inner == ".." || self.inner.starts_with("../")
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }
}

/// Resolve a project-relative path against `root`.
///
/// Fails when `relative` is absolute or climbs out of `root`.
pub fn resolve_within(root: &NormalizedPath, relative: &str) -> Result<NormalizedPath> {
    let rel = NormalizedPath::new(relative);
    if rel.is_absolute() || rel.escapes_root() || rel.as_str() == "." {
        return Err(Error::OutsideRoot {
            path: relative.to_string(),
            root: root.to_string(),
        });
    }
    Ok(root.join(rel.as_str()))
}

fn clean(raw: &str) -> String {
    // Preserve a UNC prefix; everything else collapses repeated slashes.
    let (prefix, rest) = if raw.starts_with("//") && !raw.starts_with("///") {
        ("//", &raw[2..])
    } else if raw.starts_with('/') {
        ("/", raw.trim_start_matches('/'))
    } else {
        ("", raw)
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in rest.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                // `/..` is still `/`
                _ if !prefix.is_empty() => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let body = parts.join("/");
    if prefix.is_empty() && body.is_empty() {
        ".".to_string()
    } else {
        format!("{prefix}{body}")
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension() {
        assert_eq!(NormalizedPath::new("a/b.json").extension(), Some("json"));
        assert_eq!(NormalizedPath::new(".gitignore").extension(), None);
        assert_eq!(NormalizedPath::new("Makefile").extension(), None);
    }

    #[test]
    fn test_parent() {
        let path = NormalizedPath::new("/out/.github/workflows/build.yml");
        assert_eq!(
            path.parent().map(|p| p.to_string()),
            Some("/out/.github/workflows".to_string())
        );
        assert_eq!(
            NormalizedPath::new("/out").parent().map(|p| p.to_string()),
            Some("/".to_string())
        );
        assert_eq!(NormalizedPath::new("file.txt").parent(), None);
    }

    #[test]
    fn test_join_folds_dot_segments() {
        let root = NormalizedPath::new("/out");
        assert_eq!(root.join("./a/../b.json").as_str(), "/out/b.json");
    }

    #[test]
    fn test_resolve_within_rejects_escape() {
        let root = NormalizedPath::new("/out");
        assert!(resolve_within(&root, "../etc/passwd").is_err());
        assert!(resolve_within(&root, "a/../../b").is_err());
        assert!(resolve_within(&root, "/abs.json").is_err());
        assert!(resolve_within(&root, ".").is_err());
        assert_eq!(
            resolve_within(&root, "a/../b.json").unwrap().as_str(),
            "/out/b.json"
        );
    }
}
