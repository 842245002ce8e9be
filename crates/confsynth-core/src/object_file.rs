//! Structured files: an object graph rendered through a format handler
//!
//! Synthesis runs four steps in a fixed order:
//!
//! 1. resolve `obj` (honouring `omit_empty`)
//! 2. deep-merge the override tree onto the result
//! 3. apply queued patch batches, in call order
//! 4. render through the format handler

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;
use tracing::debug;

use confsynth_content::handlers::JsonHandler;
use confsynth_content::path::{append_override, set_override, split_key_path};
use confsynth_content::patch::apply_batches;
use confsynth_content::{
    Format, FormatHandler, JsonPatch, ResolveOptions, Resolver, Value, deep_merge, handler_for,
};
use confsynth_fs::NormalizedPath;

use crate::error::{Error, Result};
use crate::file::{FileBase, FileOptions, Synthesizable};

/// Options for [`ObjectFile`]
#[derive(Debug, Clone, Default)]
pub struct ObjectFileOptions {
    /// Initial object graph; `Undefined` is treated as `{}`.
    pub obj: Value,
    /// Drop empty containers, and skip the file when nothing is left.
    pub omit_empty: bool,
    pub file: FileOptions,
}

impl ObjectFileOptions {
    pub fn new(obj: impl Into<Value>) -> Self {
        Self {
            obj: obj.into(),
            ..Self::default()
        }
    }

    pub fn omit_empty(mut self, omit_empty: bool) -> Self {
        self.omit_empty = omit_empty;
        self
    }

    pub fn file(mut self, file: FileOptions) -> Self {
        self.file = file;
        self
    }
}

/// A JSON, YAML, TOML or INI file built from an object graph.
#[derive(Debug)]
pub struct ObjectFile {
    base: FileBase,
    obj: Value,
    omit_empty: bool,
    overrides: BTreeMap<String, Value>,
    patches: Vec<Vec<JsonPatch>>,
    handler: Box<dyn FormatHandler>,
}

impl ObjectFile {
    pub fn new(
        path: impl Into<NormalizedPath>,
        handler: Box<dyn FormatHandler>,
        options: ObjectFileOptions,
    ) -> Self {
        Self {
            base: FileBase::new(path, options.file),
            obj: options.obj,
            omit_empty: options.omit_empty,
            overrides: BTreeMap::new(),
            patches: Vec::new(),
            handler,
        }
    }

    /// Pick the handler from the path's extension.
    pub fn for_path(path: &str, options: ObjectFileOptions) -> Result<Self> {
        let format = Format::from_path(path).ok_or_else(|| Error::UnknownFormat {
            path: path.to_string(),
        })?;
        Ok(Self::new(path, handler_for(format), options))
    }

    pub fn json(path: impl Into<NormalizedPath>, options: ObjectFileOptions) -> Self {
        Self::new(path, Box::new(JsonHandler::new()), options)
    }

    /// JSON with the marker as a `//` comment line (tsconfig, VS Code settings).
    pub fn jsonc(path: impl Into<NormalizedPath>, options: ObjectFileOptions) -> Self {
        Self::new(
            path,
            Box::new(JsonHandler::new().with_comments(true)),
            options,
        )
    }

    pub fn yaml(path: impl Into<NormalizedPath>, options: ObjectFileOptions) -> Self {
        Self::new(path, handler_for(Format::Yaml), options)
    }

    pub fn toml(path: impl Into<NormalizedPath>, options: ObjectFileOptions) -> Self {
        Self::new(path, handler_for(Format::Toml), options)
    }

    pub fn ini(path: impl Into<NormalizedPath>, options: ObjectFileOptions) -> Self {
        Self::new(path, handler_for(Format::Ini), options)
    }

    pub fn format(&self) -> Format {
        self.handler.format()
    }

    pub fn obj(&self) -> &Value {
        &self.obj
    }

    /// Mutable access to the base object graph.
    pub fn obj_mut(&mut self) -> &mut Value {
        &mut self.obj
    }

    /// Set a value at a dotted path; `\.` escapes a literal dot.
    ///
    /// Intermediate keys are created as objects, replacing non-objects.
    /// Passing [`Value::Undefined`] deletes the key.
    pub fn add_override(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let segments = split_key_path(path)?;
        set_override(&mut self.overrides, &segments, value.into());
        Ok(())
    }

    /// Delete the key at a dotted path.
    pub fn add_deletion_override(&mut self, path: &str) -> Result<()> {
        self.add_override(path, Value::Undefined)
    }

    /// Append values to the array at a dotted path.
    ///
    /// Works whether or not the base object's array exists yet.
    pub fn add_to_array<I, V>(&mut self, path: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let segments = split_key_path(path)?;
        let values = values.into_iter().map(Into::into).collect();
        append_override(&mut self.overrides, &segments, values);
        Ok(())
    }

    /// Queue one batch of patch operations.
    pub fn patch(&mut self, ops: impl IntoIterator<Item = JsonPatch>) {
        let batch: Vec<_> = ops.into_iter().collect();
        if !batch.is_empty() {
            self.patches.push(batch);
        }
    }

    /// Resolve, merge and patch without rendering.
    ///
    /// `None` when `omit_empty` is set and the document is empty.
    pub fn document(&self, resolver: &Resolver) -> Result<Option<JsonValue>> {
        let options = ResolveOptions {
            omit_empty: self.omit_empty,
        };
        let mut doc = match resolver.resolve(&self.obj, options)? {
            Some(doc) => doc,
            None if self.omit_empty => return Ok(None),
            None => JsonValue::Object(Default::default()),
        };

        deep_merge(&mut doc, &self.overrides, resolver)?;
        apply_batches(&mut doc, &self.patches)?;
        Ok(Some(doc))
    }
}

impl Synthesizable for ObjectFile {
    fn base(&self) -> &FileBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FileBase {
        &mut self.base
    }

    fn synthesize_content(&self, resolver: &Resolver) -> Result<Option<String>> {
        let Some(doc) = self.document(resolver)? else {
            debug!(path = %self.base.path(), "empty document omitted");
            return Ok(None);
        };
        let text = self.handler.render(&doc, self.base.marker_text())?;
        Ok(Some(text))
    }
}

crate::file_component!(ObjectFile);
