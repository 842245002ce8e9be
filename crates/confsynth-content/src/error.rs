//! Error types for confsynth-content

/// Result type for confsynth-content operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, merging, patching or rendering
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("resolution too deep: deferred values nested more than {max_depth} levels")]
    DepthExceeded { max_depth: usize },

    #[error("invalid key path '{path}': {reason}")]
    InvalidKeyPath { path: String, reason: String },

    #[error("patch test failed at batch {batch}, operation {index} (path '{path}')")]
    PatchTestFailed {
        batch: usize,
        index: usize,
        path: String,
    },

    #[error("patch operation {index} ({op}) in batch {batch} failed: {message}")]
    PatchFailed {
        batch: usize,
        index: usize,
        op: &'static str,
        message: String,
    },

    #[error("{format} cannot represent the value at '{path}': {reason}")]
    Unrepresentable {
        format: String,
        path: String,
        reason: String,
    },

    #[error("failed to serialize {format} content: {message}")]
    Serialize { format: String, message: String },
}

impl Error {
    pub fn unrepresentable(
        format: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Unrepresentable {
            format: format.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn serialize(format: impl Into<String>, message: impl ToString) -> Self {
        Self::Serialize {
            format: format.into(),
            message: message.to_string(),
        }
    }

    /// True for errors raised while turning a resolved document into text.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Unrepresentable { .. } | Self::Serialize { .. })
    }
}
