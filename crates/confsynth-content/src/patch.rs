//! RFC-6902 JSON patch operations
//!
//! Patches are queued in batches (one batch per `patch(...)` call on a file)
//! and applied after overrides. A batch is applied to a copy of the document
//! and committed only when every operation in it succeeds.

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// What to do when a `test` operation does not match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TestFailureBehavior {
    /// Discard the batch silently and continue with later batches.
    #[default]
    Skip,
    /// Discard the batch, emit a warning and continue.
    Log,
    /// Fail synthesis of the file.
    Abort,
}

/// A single JSON patch operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum JsonPatch {
    Add {
        path: String,
        value: JsonValue,
    },
    Remove {
        path: String,
    },
    Replace {
        path: String,
        value: JsonValue,
    },
    Move {
        from: String,
        path: String,
    },
    Copy {
        from: String,
        path: String,
    },
    Test {
        path: String,
        value: JsonValue,
        #[serde(skip)]
        on_failure: TestFailureBehavior,
    },
}

impl JsonPatch {
    pub fn add(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::Add {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::Remove { path: path.into() }
    }

    pub fn replace(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::Replace {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn move_to(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Move {
            from: from.into(),
            path: path.into(),
        }
    }

    pub fn copy(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Copy {
            from: from.into(),
            path: path.into(),
        }
    }

    /// A `test` operation that skips its batch on mismatch.
    pub fn test(path: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self::test_with(path, value, TestFailureBehavior::Skip)
    }

    pub fn test_with(
        path: impl Into<String>,
        value: impl Into<JsonValue>,
        on_failure: TestFailureBehavior,
    ) -> Self {
        Self::Test {
            path: path.into(),
            value: value.into(),
            on_failure,
        }
    }

    /// Escape a single key for use inside a JSON pointer.
    pub fn escape_segment(key: &str) -> String {
        key.replace('~', "~0").replace('/', "~1")
    }

    pub fn op_name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Replace { .. } => "replace",
            Self::Move { .. } => "move",
            Self::Copy { .. } => "copy",
            Self::Test { .. } => "test",
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. }
            | Self::Remove { path }
            | Self::Replace { path, .. }
            | Self::Move { path, .. }
            | Self::Copy { path, .. }
            | Self::Test { path, .. } => path,
        }
    }
}

/// Outcome of applying one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    Applied,
    /// A `test` failed at `index`; the document was left untouched.
    Skipped { index: usize },
}

enum OpError {
    TestFailed,
    Invalid(String),
}

/// Apply every batch in order.
pub fn apply_batches(document: &mut JsonValue, batches: &[Vec<JsonPatch>]) -> Result<()> {
    for (batch, ops) in batches.iter().enumerate() {
        apply_batch(document, ops, batch)?;
    }
    Ok(())
}

/// Apply one batch atomically.
///
/// # Errors
///
/// [`Error::PatchTestFailed`] for a failing `test` whose behavior is
/// [`TestFailureBehavior::Abort`]; [`Error::PatchFailed`] for any other
/// operation that cannot be applied.
pub fn apply_batch(
    document: &mut JsonValue,
    ops: &[JsonPatch],
    batch: usize,
) -> Result<BatchOutcome> {
    let mut working = document.clone();

    for (index, op) in ops.iter().enumerate() {
        match apply_op(&mut working, op) {
            Ok(()) => {}
            Err(OpError::TestFailed) => {
                let on_failure = match op {
                    JsonPatch::Test { on_failure, .. } => *on_failure,
                    _ => TestFailureBehavior::Abort,
                };
                match on_failure {
                    TestFailureBehavior::Skip => {
                        debug!(batch, index, path = op.path(), "patch test failed; skipping batch");
                    }
                    TestFailureBehavior::Log => {
                        warn!(batch, index, path = op.path(), "patch test failed; skipping batch");
                    }
                    TestFailureBehavior::Abort => {
                        return Err(Error::PatchTestFailed {
                            batch,
                            index,
                            path: op.path().to_string(),
                        });
                    }
                }
                return Ok(BatchOutcome::Skipped { index });
            }
            Err(OpError::Invalid(message)) => {
                return Err(Error::PatchFailed {
                    batch,
                    index,
                    op: op.op_name(),
                    message,
                });
            }
        }
    }

    *document = working;
    Ok(BatchOutcome::Applied)
}

fn apply_op(doc: &mut JsonValue, op: &JsonPatch) -> std::result::Result<(), OpError> {
    match op {
        JsonPatch::Add { path, value } => add(doc, path, value.clone()),
        JsonPatch::Remove { path } => remove(doc, path).map(|_| ()),
        JsonPatch::Replace { path, value } => {
            validate_pointer(path)?;
            let slot = doc
                .pointer_mut(path)
                .ok_or_else(|| OpError::Invalid(format!("path '{path}' does not exist")))?;
            *slot = value.clone();
            Ok(())
        }
        JsonPatch::Move { from, path } => {
            if from == path {
                return Ok(());
            }
            if path.starts_with(&format!("{from}/")) {
                return Err(OpError::Invalid(format!(
                    "cannot move '{from}' into its own child '{path}'"
                )));
            }
            let value = remove(doc, from)?;
            add(doc, path, value)
        }
        JsonPatch::Copy { from, path } => {
            validate_pointer(from)?;
            let value = doc
                .pointer(from)
                .cloned()
                .ok_or_else(|| OpError::Invalid(format!("path '{from}' does not exist")))?;
            add(doc, path, value)
        }
        JsonPatch::Test { path, value, .. } => {
            validate_pointer(path)?;
            if doc.pointer(path) == Some(value) {
                Ok(())
            } else {
                Err(OpError::TestFailed)
            }
        }
    }
}

fn validate_pointer(pointer: &str) -> std::result::Result<(), OpError> {
    if pointer.is_empty() || pointer.starts_with('/') {
        Ok(())
    } else {
        Err(OpError::Invalid(format!(
            "pointer '{pointer}' must be empty or start with '/'"
        )))
    }
}

/// Split a pointer into its parent pointer and unescaped last token.
fn split_last(pointer: &str) -> std::result::Result<(&str, String), OpError> {
    validate_pointer(pointer)?;
    let idx = pointer
        .rfind('/')
        .ok_or_else(|| OpError::Invalid("the document root has no parent".to_string()))?;
    let token = pointer[idx + 1..].replace("~1", "/").replace("~0", "~");
    Ok((&pointer[..idx], token))
}

fn parse_index(token: &str, len: usize, allow_end: bool) -> std::result::Result<usize, OpError> {
    let valid = token == "0" || (!token.starts_with('0') && !token.is_empty());
    let index = token
        .parse::<usize>()
        .ok()
        .filter(|_| valid)
        .ok_or_else(|| OpError::Invalid(format!("'{token}' is not an array index")))?;
    let limit = if allow_end { len } else { len.saturating_sub(1) };
    if index > limit || (!allow_end && len == 0) {
        return Err(OpError::Invalid(format!(
            "index {index} out of bounds for array of length {len}"
        )));
    }
    Ok(index)
}

fn add(doc: &mut JsonValue, path: &str, value: JsonValue) -> std::result::Result<(), OpError> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent_ptr, token) = split_last(path)?;
    let parent = doc
        .pointer_mut(parent_ptr)
        .ok_or_else(|| OpError::Invalid(format!("parent of '{path}' does not exist")))?;

    match parent {
        JsonValue::Object(map) => {
            map.insert(token, value);
            Ok(())
        }
        JsonValue::Array(items) => {
            if token == "-" {
                items.push(value);
            } else {
                let index = parse_index(&token, items.len(), true)?;
                items.insert(index, value);
            }
            Ok(())
        }
        _ => Err(OpError::Invalid(format!(
            "parent of '{path}' is not a container"
        ))),
    }
}

fn remove(doc: &mut JsonValue, path: &str) -> std::result::Result<JsonValue, OpError> {
    let (parent_ptr, token) = split_last(path)?;
    let parent = doc
        .pointer_mut(parent_ptr)
        .ok_or_else(|| OpError::Invalid(format!("parent of '{path}' does not exist")))?;

    match parent {
        JsonValue::Object(map) => map
            .remove(&token)
            .ok_or_else(|| OpError::Invalid(format!("path '{path}' does not exist"))),
        JsonValue::Array(items) => {
            let index = parse_index(&token, items.len(), false)?;
            Ok(items.remove(index))
        }
        _ => Err(OpError::Invalid(format!("path '{path}' does not exist"))),
    }
}
