//! Shared test utilities for the confsynth workspace.
//!
//! Dev-dependency only, never published.

use std::fs;
use std::path::Path;

use confsynth_fs::NormalizedPath;
use tempfile::TempDir;

/// A temporary output directory with helpers for asserting on synthesized
/// files.
///
/// # Example
///
/// ```rust,no_run
/// use confsynth_test_utils::TestOutdir;
///
/// let out = TestOutdir::new();
/// out.write("existing.txt", "keep me");
/// out.assert_file_exists("existing.txt");
/// ```
pub struct TestOutdir {
    temp_dir: TempDir,
}

impl Default for TestOutdir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestOutdir {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The root as a project outdir.
    pub fn outdir(&self) -> NormalizedPath {
        NormalizedPath::new(self.root())
    }

    /// Read a file relative to the root.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, path: &str) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Write a file relative to the root, creating parent directories.
    pub fn write(&self, path: &str, content: &str) {
        let full_path = self.root().join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full_path, content).unwrap();
    }

    pub fn exists(&self, path: &str) -> bool {
        self.root().join(path).exists()
    }

    /// Permission bits (`0o777` mask) of a file relative to the root.
    #[cfg(unix)]
    pub fn mode(&self, path: &str) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        let full_path = self.root().join(path);
        fs::metadata(&full_path)
            .unwrap_or_else(|_| panic!("Could not stat file: {}", full_path.display()))
            .permissions()
            .mode()
            & 0o777
    }

    /// Modification time, used to prove a file was left untouched.
    pub fn modified(&self, path: &str) -> std::time::SystemTime {
        fs::metadata(self.root().join(path))
            .and_then(|m| m.modified())
            .unwrap()
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
