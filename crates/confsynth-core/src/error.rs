//! Error types for confsynth-core

use std::fmt;

/// Result type for confsynth-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes, used by callers to pick an exit code or message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Raised synchronously while the project is being defined.
    Definition,
    /// A deferred value or patch could not be resolved during synthesis.
    Resolution,
    /// A document cannot be represented in its target format.
    Format,
    /// Reading, writing or permission changes failed.
    Filesystem,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Definition => write!(f, "definition"),
            Self::Resolution => write!(f, "resolution"),
            Self::Format => write!(f, "format"),
            Self::Filesystem => write!(f, "filesystem"),
        }
    }
}

/// Errors that can occur while defining or synthesizing a project
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("there is already a file under {path}")]
    DuplicateFile { path: String },

    #[error("cannot determine the format of {path}")]
    UnknownFormat { path: String },

    #[error("component {id} does not belong to this project")]
    UnknownComponent { id: String },

    #[error("file {path} is not attached to a project")]
    NotAttached { path: String },

    #[error("file {path} has already been synthesized")]
    AlreadySynthesized { path: String },

    #[error("task already exists: {name}")]
    DuplicateTask { name: String },

    #[error("task not found: {name}")]
    TaskNotFound { name: String },

    #[error("cannot remove task {name}: required by {}", dependents.join(", "))]
    TaskHasDependents {
        name: String,
        dependents: Vec<String>,
    },

    #[error("task {task} spawns unknown task {target}")]
    UnknownSpawnTarget { task: String, target: String },

    #[error("invalid dependency spec '{spec}': {reason}")]
    InvalidDependencySpec { spec: String, reason: String },

    #[error("{name} ({dep_type}) is already declared as {existing}; cannot change it to {requested}")]
    DependencyConflict {
        name: String,
        dep_type: String,
        existing: String,
        requested: String,
    },

    #[error("{name} is declared with several types ({}); specify one", types.join(", "))]
    AmbiguousDependency { name: String, types: Vec<String> },

    #[error("dependency not found: {name}")]
    DependencyNotFound { name: String },

    #[error("the {registry} registry is frozen once synthesis has started")]
    RegistryFrozen { registry: &'static str },

    #[error("cannot {action} while the project is in the {phase} phase")]
    InvalidPhase { action: String, phase: String },

    #[error("component {component} failed: {message}")]
    Hook { component: String, message: String },

    #[error("failed to start the synthesis worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from confsynth-fs
    #[error(transparent)]
    Fs(#[from] confsynth_fs::Error),

    /// Content error from confsynth-content
    #[error(transparent)]
    Content(#[from] confsynth_content::Error),
}

impl Error {
    /// Build a hook failure for a user component.
    pub fn hook(component: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Hook {
            component: component.into(),
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        use confsynth_content::Error as ContentError;

        match self {
            Self::Fs(_) | Self::WorkerPool(_) => ErrorKind::Filesystem,
            Self::Content(ContentError::InvalidKeyPath { .. }) => ErrorKind::Definition,
            Self::Content(e) if e.is_format_error() => ErrorKind::Format,
            Self::Content(_) | Self::Hook { .. } => ErrorKind::Resolution,
            _ => ErrorKind::Definition,
        }
    }
}
