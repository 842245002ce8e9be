//! Project model and synthesis driver for confsynth
//!
//! This crate turns a tree of in-memory component definitions into files on
//! disk, implementing:
//!
//! - **Project tree**: components in an arena, sub-projects sharing one path registry
//! - **File components**: structured (JSON, YAML, TOML, INI), text, ignore and sample files
//! - **Registries**: dependencies and tasks, frozen once synthesis starts
//! - **SynthEngine**: pre-synthesis hooks, parallel write-if-different, post-synthesis hooks
//!
//! # Architecture
//!
//! ```text
//!                  confsynth-core
//!                        |
//!          +-------------+-------------+
//!          |                           |
//!    confsynth-fs              confsynth-content
//! ```
//!
//! # Example
//!
//! ```no_run
//! use confsynth_core::{ObjectFile, ObjectFileOptions, Project, ProjectOptions, Result};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let mut project = Project::new(ProjectOptions::new("demo", "/tmp/demo"))?;
//!     let id = project.add_component(ObjectFile::json(
//!         "package.json",
//!         ObjectFileOptions::new(json!({"name": "demo"})),
//!     ))?;
//!     project
//!         .component_mut::<ObjectFile>(id)
//!         .expect("just added")
//!         .add_override("scripts.build", "tsc")?;
//!
//!     let report = project.synth()?;
//!     assert!(report.changed());
//!     Ok(())
//! }
//! ```

pub mod component;
pub mod config;
pub mod dependencies;
pub mod engine;
pub mod error;
pub mod file;
pub mod ignore_file;
pub mod logging;
pub mod object_file;
pub mod project;
pub mod sample_file;
pub mod tasks;
pub mod text_file;

pub use component::{Component, ComponentId};
pub use config::{CONFIG_FILE, SynthConfig};
pub use dependencies::{Dependencies, Dependency, DependencySpec, DependencyType};
pub use engine::{SynthEngine, SynthReport};
pub use error::{Error, ErrorKind, Result};
pub use file::{FileBase, FileOptions, FileOutcome, FileStatus, MARKER, Synthesizable};
pub use ignore_file::IgnoreFile;
pub use object_file::{ObjectFile, ObjectFileOptions};
pub use project::{Phase, Project, ProjectOptions};
pub use sample_file::SampleFile;
pub use tasks::{Task, TaskStep, Tasks};
pub use text_file::TextFile;

pub use confsynth_content::{JsonPatch, TestFailureBehavior, Value};
pub use confsynth_fs::NormalizedPath;
