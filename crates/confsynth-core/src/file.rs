//! Generated files and the write-if-different protocol
//!
//! Every generated file embeds a [`FileBase`] and implements
//! [`Synthesizable`]. Implementors only produce text; the provided
//! [`Synthesizable::synthesize`] compares it against what is on disk, writes
//! when it differs and applies the permission matrix.

use serde::Serialize;
use tracing::{debug, info};

use confsynth_content::Resolver;
use confsynth_fs::{FileMode, NormalizedPath, io};

use crate::error::{Error, Result};

/// Text of the "generated file" marker.
pub const MARKER: &str =
    "~~ Generated by confsynth. To modify, edit your project definition and re-run synthesis.";

/// Options shared by every generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileOptions {
    pub readonly: bool,
    pub executable: bool,
    /// Tracked by version control; `false` adds the file to `.gitignore`.
    pub committed: bool,
    /// Embed the generated-file marker.
    pub marker: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            readonly: true,
            executable: false,
            committed: true,
            marker: true,
        }
    }
}

impl FileOptions {
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn executable(mut self, executable: bool) -> Self {
        self.executable = executable;
        self
    }

    pub fn committed(mut self, committed: bool) -> Self {
        self.committed = committed;
        self
    }

    pub fn marker(mut self, marker: bool) -> Self {
        self.marker = marker;
        self
    }
}

/// State common to all generated files.
#[derive(Debug, Clone)]
pub struct FileBase {
    path: NormalizedPath,
    absolute_path: Option<NormalizedPath>,
    pub readonly: bool,
    pub executable: bool,
    pub committed: bool,
    pub marker: bool,
    changed: Option<bool>,
    synthesized: bool,
}

impl FileBase {
    pub fn new(path: impl Into<NormalizedPath>, options: FileOptions) -> Self {
        Self {
            path: path.into(),
            absolute_path: None,
            readonly: options.readonly,
            executable: options.executable,
            committed: options.committed,
            marker: options.marker,
            changed: None,
            synthesized: false,
        }
    }

    /// Project-relative path.
    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// Path resolved against the owning project's outdir, once attached.
    pub fn absolute_path(&self) -> Option<&NormalizedPath> {
        self.absolute_path.as_ref()
    }

    pub(crate) fn attach(&mut self, absolute: NormalizedPath) {
        self.absolute_path = Some(absolute);
    }

    /// `None` until synthesized (or when synthesis skipped the file).
    pub fn changed(&self) -> Option<bool> {
        self.changed
    }

    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    pub fn mode(&self) -> FileMode {
        FileMode::from_flags(self.readonly, self.executable)
    }

    /// The marker text if this file carries one.
    pub fn marker_text(&self) -> Option<&'static str> {
        self.marker.then_some(MARKER)
    }

    /// Mark the file as synthesized and return its target path.
    ///
    /// # Errors
    ///
    /// Fails when the file was already synthesized or never attached.
    pub fn begin_synthesis(&mut self) -> Result<NormalizedPath> {
        if self.synthesized {
            return Err(Error::AlreadySynthesized {
                path: self.path.to_string(),
            });
        }
        let absolute = self.absolute_path.clone().ok_or_else(|| Error::NotAttached {
            path: self.path.to_string(),
        })?;
        self.synthesized = true;
        Ok(absolute)
    }

    pub(crate) fn record_change(&mut self, changed: bool) {
        self.changed = Some(changed);
    }

    pub(crate) fn outcome(&self, status: FileStatus) -> FileOutcome {
        FileOutcome {
            path: self.path.to_string(),
            status,
        }
    }
}

/// What synthesis did with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// No content was produced; nothing was written.
    Skipped,
    /// Content matched the file on disk.
    Unchanged,
    /// The file was written (or would be, in a dry run).
    Written,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub path: String,
    pub status: FileStatus,
}

/// A file that can render itself and be written by the driver.
pub trait Synthesizable: Send + Sync {
    fn base(&self) -> &FileBase;

    fn base_mut(&mut self) -> &mut FileBase;

    /// Render the file's text; `None` means the file is not written at all.
    fn synthesize_content(&self, resolver: &Resolver) -> Result<Option<String>>;

    /// Render, compare with disk and write when different.
    ///
    /// An unchanged file is left alone entirely, permissions included.
    fn synthesize(&mut self, resolver: &Resolver, dry_run: bool) -> Result<FileOutcome> {
        let absolute = self.base_mut().begin_synthesis()?;

        let Some(content) = self.synthesize_content(resolver)? else {
            debug!(path = %self.base().path(), "no content; skipping");
            return Ok(self.base().outcome(FileStatus::Skipped));
        };

        let existing = io::read_existing(&absolute)?;
        if existing.as_deref() == Some(content.as_bytes()) {
            self.base_mut().record_change(false);
            debug!(path = %self.base().path(), "unchanged");
            return Ok(self.base().outcome(FileStatus::Unchanged));
        }

        self.base_mut().record_change(true);
        if dry_run {
            info!(path = %self.base().path(), "would write");
            return Ok(self.base().outcome(FileStatus::Written));
        }

        if existing.is_some() {
            io::relax_permissions(&absolute)?;
        }
        io::write_atomic(&absolute, content.as_bytes())?;
        io::apply_mode(&absolute, self.base().mode())?;
        info!(path = %self.base().path(), mode = %self.base().mode(), "wrote");

        Ok(self.base().outcome(FileStatus::Written))
    }
}
