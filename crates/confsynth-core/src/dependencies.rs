//! Dependency registry
//!
//! Dependencies are declared as `name@range` specs per [`DependencyType`].
//! At most one entry exists per `(name, type)`: re-adding a pair may upgrade
//! an unversioned entry to a versioned one, but never change a version.
//!
//! ```
//! use confsynth_core::dependencies::{Dependencies, DependencyType};
//!
//! let mut deps = Dependencies::new();
//! deps.add("@types/node", DependencyType::Dev).unwrap();
//! deps.add("@types/node@^20", DependencyType::Dev).unwrap();
//!
//! let dep = deps.get("@types/node", Some(DependencyType::Dev)).unwrap();
//! assert_eq!(dep.version.as_deref(), Some("^20"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use confsynth_content::Value;

use crate::error::{Error, Result};

/// Resolver argument carrying the registry snapshot.
pub const DEPENDENCIES_ARG: &str = "dependencies";

/// Where the registry is rendered, relative to the project outdir.
pub const DEPENDENCIES_MANIFEST: &str = ".confsynth/deps.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    Runtime,
    Dev,
    Peer,
    Build,
    Test,
    Bundled,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::Dev => "dev",
            Self::Peer => "peer",
            Self::Build => "build",
            Self::Test => "test",
            Self::Bundled => "bundled",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `name@version` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub name: String,
    pub version: Option<String>,
}

impl DependencySpec {
    /// Parse `name`, `name@range`, `@scope/name` or `@scope/name@range`.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidDependencySpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let scoped = spec.starts_with('@');
        let split_at = if scoped {
            spec[1..].find('@').map(|i| i + 1)
        } else {
            spec.find('@')
        };
        let (name, version) = match split_at {
            Some(i) => (&spec[..i], Some(&spec[i + 1..])),
            None => (spec, None),
        };

        if name.is_empty() || (scoped && name.len() == 1) {
            return Err(invalid("missing package name"));
        }
        if scoped && !name.contains('/') {
            return Err(invalid("scoped names look like @scope/name"));
        }
        if version.is_some_and(str::is_empty) {
            return Err(invalid("empty version after '@'"));
        }

        Ok(Self {
            name: name.to_string(),
            version: version.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, JsonValue>,
}

/// The project's dependency declarations.
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    deps: Vec<Dependency>,
    frozen: bool,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a dependency.
    ///
    /// # Errors
    ///
    /// [`Error::DependencyConflict`] if the pair is already declared with a
    /// different version, [`Error::RegistryFrozen`] once synthesis started.
    pub fn add(&mut self, spec: &str, dep_type: DependencyType) -> Result<&Dependency> {
        self.add_with_metadata(spec, dep_type, BTreeMap::new())
    }

    pub fn add_with_metadata(
        &mut self,
        spec: &str,
        dep_type: DependencyType,
        metadata: BTreeMap<String, JsonValue>,
    ) -> Result<&Dependency> {
        self.ensure_mutable()?;
        let DependencySpec { name, version } = DependencySpec::parse(spec)?;

        let index = match self
            .deps
            .iter()
            .position(|d| d.name == name && d.dep_type == dep_type)
        {
            Some(i) => {
                let existing = &mut self.deps[i];
                if let Some(new) = version {
                    match existing.version.as_deref() {
                        None => existing.version = Some(new),
                        Some(old) if old == new => {}
                        Some(old) => {
                            return Err(Error::DependencyConflict {
                                name,
                                dep_type: dep_type.to_string(),
                                existing: old.to_string(),
                                requested: new,
                            });
                        }
                    }
                }
                existing.metadata.extend(metadata);
                i
            }
            None => {
                self.deps.push(Dependency {
                    name,
                    version,
                    dep_type,
                    metadata,
                });
                self.deps.len() - 1
            }
        };
        Ok(&self.deps[index])
    }

    /// Look a dependency up; without a type the name must be unambiguous.
    pub fn try_get(
        &self,
        name: &str,
        dep_type: Option<DependencyType>,
    ) -> Result<Option<&Dependency>> {
        let mut matches = self
            .deps
            .iter()
            .filter(|d| d.name == name && dep_type.is_none_or(|t| d.dep_type == t))
            .collect::<Vec<_>>();

        if matches.len() > 1 {
            matches.sort_by_key(|d| d.dep_type);
            return Err(Error::AmbiguousDependency {
                name: name.to_string(),
                types: matches.iter().map(|d| d.dep_type.to_string()).collect(),
            });
        }
        Ok(matches.pop())
    }

    pub fn get(&self, name: &str, dep_type: Option<DependencyType>) -> Result<&Dependency> {
        self.try_get(name, dep_type)?
            .ok_or_else(|| Error::DependencyNotFound {
                name: name.to_string(),
            })
    }

    /// Remove a dependency; without a type every entry for `name` goes.
    pub fn remove(&mut self, name: &str, dep_type: Option<DependencyType>) -> Result<()> {
        self.ensure_mutable()?;
        self.deps
            .retain(|d| !(d.name == name && dep_type.is_none_or(|t| d.dep_type == t)));
        Ok(())
    }

    /// All dependencies ordered by name, then type.
    pub fn all(&self) -> Vec<&Dependency> {
        let mut all: Vec<_> = self.deps.iter().collect();
        all.sort_by(|a, b| (&a.name, a.dep_type).cmp(&(&b.name, b.dep_type)));
        all
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::RegistryFrozen {
                registry: "dependencies",
            });
        }
        Ok(())
    }

    /// JSON form handed to deferred values as the `dependencies` argument.
    pub fn snapshot(&self) -> JsonValue {
        json!({ "dependencies": self.all() })
    }

    /// Object graph of the rendered manifest, read from the resolver argument.
    pub fn manifest_value() -> Value {
        Value::deferred_with(|ctx| Value::from(ctx.arg(DEPENDENCIES_ARG).cloned()))
    }
}
