//! Sample files: written once, then owned by the user

use tracing::{debug, info};

use confsynth_content::Resolver;
use confsynth_fs::{NormalizedPath, io};

use crate::error::Result;
use crate::file::{FileBase, FileOptions, FileOutcome, FileStatus, Synthesizable};

/// A starter file that is created only when nothing exists at its path.
///
/// Never readonly and never marked; an existing file is never overwritten.
#[derive(Debug, Clone)]
pub struct SampleFile {
    base: FileBase,
    contents: String,
}

impl SampleFile {
    pub fn new(path: impl Into<NormalizedPath>, contents: impl Into<String>) -> Self {
        let options = FileOptions::default().readonly(false).marker(false);
        Self {
            base: FileBase::new(path, options),
            contents: contents.into(),
        }
    }

    pub fn executable(mut self, executable: bool) -> Self {
        self.base.executable = executable;
        self
    }
}

impl Synthesizable for SampleFile {
    fn base(&self) -> &FileBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FileBase {
        &mut self.base
    }

    fn synthesize_content(&self, _resolver: &Resolver) -> Result<Option<String>> {
        Ok(Some(self.contents.clone()))
    }

    fn synthesize(&mut self, resolver: &Resolver, dry_run: bool) -> Result<FileOutcome> {
        let absolute = self.base.begin_synthesis()?;

        if absolute.exists() {
            self.base.record_change(false);
            debug!(path = %self.base.path(), "sample exists; leaving it alone");
            return Ok(self.base.outcome(FileStatus::Unchanged));
        }

        let Some(content) = self.synthesize_content(resolver)? else {
            return Ok(self.base.outcome(FileStatus::Skipped));
        };
        self.base.record_change(true);
        if !dry_run {
            io::write_atomic(&absolute, content.as_bytes())?;
            io::apply_mode(&absolute, self.base.mode())?;
            info!(path = %self.base.path(), "created sample");
        }
        Ok(self.base.outcome(FileStatus::Written))
    }
}

crate::file_component!(SampleFile);

#[cfg(test)]
mod tests {
    use super::*;
    use confsynth_fs::FileMode;

    fn attached(dir: &tempfile::TempDir, path: &str) -> SampleFile {
        let mut file = SampleFile::new(path, "hello\n");
        file.base.attach(NormalizedPath::new(dir.path()).join(path));
        file
    }

    #[test]
    fn test_existing_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "mine\n").unwrap();

        let mut file = attached(&dir, "README.md");
        let outcome = file.synthesize(&Resolver::new(), false).unwrap();
        assert_eq!(outcome.status, FileStatus::Unchanged);
        assert_eq!(file.base().changed(), Some(false));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "mine\n"
        );
    }

    #[test]
    fn test_dry_run_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = attached(&dir, "scripts/setup.sh").executable(true);
        assert_eq!(file.base().mode(), FileMode::EXECUTABLE);

        let outcome = file.synthesize(&Resolver::new(), true).unwrap();
        assert_eq!(outcome.status, FileStatus::Written);
        assert!(!dir.path().join("scripts/setup.sh").exists());
    }
}
