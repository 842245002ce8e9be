//! Filesystem layer for confsynth
//!
//! Provides normalized project-relative paths, locked atomic writes and the
//! POSIX permission matrix applied to synthesized files.

pub mod config;
pub mod error;
pub mod io;
pub mod mode;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use mode::FileMode;
pub use path::{NormalizedPath, resolve_within};
