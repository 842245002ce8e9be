//! Ignore files (`.gitignore`, `.npmignore`, ...)

use confsynth_content::{CommentStyle, Resolver};
use confsynth_fs::NormalizedPath;

use crate::error::Result;
use crate::file::{FileBase, FileOptions, Synthesizable};

/// An ignore file: one pattern per line, in insertion order.
///
/// Excluding a pattern drops a previous `!pattern` include of it and the
/// other way round, so the last call wins.
#[derive(Debug, Clone)]
pub struct IgnoreFile {
    base: FileBase,
    patterns: Vec<String>,
}

fn negate(pattern: &str) -> String {
    format!("!{pattern}")
}

impl IgnoreFile {
    pub fn new(path: impl Into<NormalizedPath>, options: FileOptions) -> Self {
        Self {
            base: FileBase::new(path, options),
            patterns: Vec::new(),
        }
    }

    /// Ignore the given patterns.
    pub fn exclude<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            self.drop_pattern(&negate(pattern));
            self.push_unique(pattern.to_string());
        }
    }

    /// Re-include the given patterns (`!pattern`).
    pub fn include<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref();
            self.drop_pattern(pattern);
            self.push_unique(negate(pattern));
        }
    }

    /// Remove patterns exactly as written.
    pub fn remove_patterns<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.drop_pattern(pattern.as_ref());
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    fn drop_pattern(&mut self, pattern: &str) {
        self.patterns.retain(|p| p != pattern);
    }

    fn push_unique(&mut self, pattern: String) {
        if !self.patterns.contains(&pattern) {
            self.patterns.push(pattern);
        }
    }
}

impl Synthesizable for IgnoreFile {
    fn base(&self) -> &FileBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FileBase {
        &mut self.base
    }

    fn synthesize_content(&self, _resolver: &Resolver) -> Result<Option<String>> {
        let mut out = self
            .base
            .marker_text()
            .and_then(|text| CommentStyle::Hash.header(text))
            .unwrap_or_default();
        for pattern in &self.patterns {
            out.push_str(pattern);
            out.push('\n');
        }
        Ok(Some(out))
    }
}

crate::file_component!(IgnoreFile);
