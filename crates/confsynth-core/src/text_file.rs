//! Plain line-oriented files

use confsynth_content::Resolver;
use confsynth_fs::NormalizedPath;

use crate::error::Result;
use crate::file::{FileBase, FileOptions, Synthesizable};

/// A file rendered as lines of text, without a marker.
#[derive(Debug, Clone)]
pub struct TextFile {
    base: FileBase,
    lines: Vec<String>,
}

impl TextFile {
    pub fn new(path: impl Into<NormalizedPath>, options: FileOptions) -> Self {
        Self {
            base: FileBase::new(path, options.marker(false)),
            lines: Vec::new(),
        }
    }

    pub fn with_lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn add_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Synthesizable for TextFile {
    fn base(&self) -> &FileBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FileBase {
        &mut self.base
    }

    fn synthesize_content(&self, _resolver: &Resolver) -> Result<Option<String>> {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        Ok(Some(out))
    }
}

crate::file_component!(TextFile);
