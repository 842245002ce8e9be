//! Content model for confsynth
//!
//! Everything between a file's in-memory object graph and its rendered text:
//!
//! - [`Value`]: a JSON-like tree that may hold [`Value::Deferred`] thunks
//! - [`Resolver`]: flattens a `Value` into plain JSON, evaluating thunks
//! - [`path`]: dotted key paths used to build override trees
//! - [`merge`]: destructive deep merge of overrides, with append markers
//! - [`patch`]: RFC-6902 operations applied after overrides
//! - [`format`] and [`handlers`]: JSON, YAML, TOML and INI renderers

pub mod error;
pub mod format;
pub mod handlers;
pub mod merge;
pub mod patch;
pub mod path;
pub mod resolve;
pub mod value;

pub use error::{Error, Result};
pub use format::{CommentStyle, Format, FormatHandler, handler_for};
pub use handlers::{IniHandler, JsonHandler, TomlHandler, YamlHandler};
pub use merge::{APPEND_MARKER, deep_merge};
pub use patch::{BatchOutcome, JsonPatch, TestFailureBehavior, apply_batches};
pub use resolve::{DEFAULT_MAX_DEPTH, ResolveContext, ResolveOptions, Resolver};
pub use value::{Deferred, Value};
