//! Projects: the root of a component tree
//!
//! A project owns an output directory, its components and its registries.
//! Sub-projects nest under a parent's outdir and share the parent's path
//! registry, so no two files anywhere in the tree can target the same
//! absolute path.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use confsynth_fs::{NormalizedPath, resolve_within};

use crate::component::{Component, ComponentId, Node, downcast_mut, downcast_ref};
use crate::config::SynthConfig;
use crate::dependencies::Dependencies;
use crate::engine::{SynthEngine, SynthReport};
use crate::error::{Error, Result};
use crate::file::{FileOptions, Synthesizable};
use crate::ignore_file::IgnoreFile;
use crate::object_file::ObjectFile;
use crate::tasks::Tasks;

/// Absolute path of every file in a project tree, mapped to its owner.
pub(crate) type PathRegistry = Arc<Mutex<BTreeMap<NormalizedPath, String>>>;

/// Lifecycle of a project tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Defining,
    PreSynth,
    Synth,
    PostSynth,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defining => write!(f, "defining"),
            Self::PreSynth => write!(f, "pre-synthesis"),
            Self::Synth => write!(f, "synthesis"),
            Self::PostSynth => write!(f, "post-synthesis"),
            Self::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectOptions {
    pub name: String,
    pub outdir: NormalizedPath,
    /// Own a `.gitignore` that uncommitted files are added to.
    pub git_ignore: bool,
    pub config: SynthConfig,
}

impl ProjectOptions {
    pub fn new(name: impl Into<String>, outdir: impl Into<NormalizedPath>) -> Self {
        Self {
            name: name.into(),
            outdir: outdir.into(),
            git_ignore: true,
            config: SynthConfig::default(),
        }
    }

    pub fn git_ignore(mut self, git_ignore: bool) -> Self {
        self.git_ignore = git_ignore;
        self
    }

    pub fn config(mut self, config: SynthConfig) -> Self {
        self.config = config;
        self
    }
}

pub struct Project {
    name: String,
    outdir: NormalizedPath,
    config: SynthConfig,
    pub(crate) phase: Phase,
    pub(crate) nodes: Vec<Node>,
    /// Absolute path -> file component.
    files: BTreeMap<NormalizedPath, ComponentId>,
    registry: PathRegistry,
    pub(crate) dependencies: Dependencies,
    pub(crate) tasks: Tasks,
    gitignore: Option<ComponentId>,
    pub(crate) subprojects: Vec<Project>,
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("name", &self.name)
            .field("outdir", &self.outdir)
            .field("phase", &self.phase)
            .field("components", &self.nodes.len())
            .field("subprojects", &self.subprojects)
            .finish()
    }
}

impl Project {
    pub fn new(options: ProjectOptions) -> Result<Self> {
        Self::with_registry(options, PathRegistry::default())
    }

    fn with_registry(options: ProjectOptions, registry: PathRegistry) -> Result<Self> {
        let mut project = Self {
            name: options.name,
            outdir: options.outdir,
            config: options.config,
            phase: Phase::Defining,
            nodes: Vec::new(),
            files: BTreeMap::new(),
            registry,
            dependencies: Dependencies::new(),
            tasks: Tasks::new(),
            gitignore: None,
            subprojects: Vec::new(),
        };
        if options.git_ignore {
            let id = project.add_component(IgnoreFile::new(".gitignore", FileOptions::default()))?;
            project.gitignore = Some(id);
        }
        Ok(project)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outdir(&self) -> &NormalizedPath {
        &self.outdir
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SynthConfig {
        &mut self.config
    }

    /// Attach a top-level component.
    ///
    /// File components claim their path here; a path already used anywhere
    /// in the project tree is rejected.
    pub fn add_component<C: Component>(&mut self, component: C) -> Result<ComponentId> {
        self.add_node(Box::new(component), None)
    }

    /// Attach a component under `parent`.
    pub fn add_child<C: Component>(&mut self, parent: ComponentId, component: C) -> Result<ComponentId> {
        if parent.0 >= self.nodes.len() {
            return Err(Error::UnknownComponent {
                id: parent.to_string(),
            });
        }
        self.add_node(Box::new(component), Some(parent))
    }

    fn add_node(
        &mut self,
        mut component: Box<dyn Component>,
        parent: Option<ComponentId>,
    ) -> Result<ComponentId> {
        if self.phase > Phase::PreSynth {
            return Err(Error::InvalidPhase {
                action: "add a component".to_string(),
                phase: self.phase.to_string(),
            });
        }

        let id = ComponentId(self.nodes.len());
        let mut ignored = None;

        if let Some(file) = component.as_file_mut() {
            let relative = file.base().path().clone();
            let absolute = resolve_within(&self.outdir, relative.as_str())?;
            self.claim_path(&absolute, &relative)?;
            file.base_mut().attach(absolute.clone());
            self.files.insert(absolute, id);
            if !file.base().committed {
                ignored = Some(format!("/{relative}"));
            }
            debug!(project = %self.name, path = %relative, "registered file");
        }

        self.nodes.push(Node::new(component, parent));
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        if let Some(pattern) = ignored
            && let Some(gitignore) = self.gitignore_mut()
        {
            gitignore.exclude([pattern]);
        }
        Ok(id)
    }

    fn claim_path(&self, absolute: &NormalizedPath, relative: &NormalizedPath) -> Result<()> {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if registry.contains_key(absolute) {
            return Err(Error::DuplicateFile {
                path: relative.to_string(),
            });
        }
        registry.insert(absolute.clone(), self.name.clone());
        Ok(())
    }

    /// The component behind `id`, unless it is running its own hook.
    pub fn get(&self, id: ComponentId) -> Option<&dyn Component> {
        self.nodes.get(id.0)?.component.as_deref()
    }

    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        self.nodes.get_mut(id.0)?.component.as_deref_mut()
    }

    pub fn component<T: Component>(&self, id: ComponentId) -> Option<&T> {
        downcast_ref(self.get(id)?)
    }

    pub fn component_mut<T: Component>(&mut self, id: ComponentId) -> Option<&mut T> {
        downcast_mut(self.get_mut(id)?)
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.nodes.get(id.0)?.parent
    }

    pub fn children(&self, id: ComponentId) -> &[ComponentId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Ids of every component in insertion order.
    pub fn components(&self) -> impl Iterator<Item = ComponentId> + '_ {
        (0..self.nodes.len()).map(ComponentId)
    }

    /// Every file of this project (not sub-projects), in insertion order.
    pub fn files(&self) -> impl Iterator<Item = &dyn Synthesizable> {
        self.nodes
            .iter()
            .filter_map(|node| node.component.as_deref()?.as_file())
    }

    /// Find a file by path relative to this project, searching sub-projects.
    pub fn try_find_file(&self, path: &str) -> Option<&dyn Synthesizable> {
        let absolute = self.outdir.join(path);
        self.find_by_absolute(&absolute)
    }

    fn find_by_absolute(&self, absolute: &NormalizedPath) -> Option<&dyn Synthesizable> {
        if let Some(id) = self.files.get(absolute) {
            return self.get(*id)?.as_file();
        }
        self.subprojects
            .iter()
            .find_map(|sub| sub.find_by_absolute(absolute))
    }

    /// Find a structured file by path relative to this project.
    pub fn try_find_object_file_mut(&mut self, path: &str) -> Option<&mut ObjectFile> {
        let absolute = self.outdir.join(path);
        self.find_object_file_mut(&absolute)
    }

    fn find_object_file_mut(&mut self, absolute: &NormalizedPath) -> Option<&mut ObjectFile> {
        if let Some(id) = self.files.get(absolute).copied() {
            return self.component_mut::<ObjectFile>(id);
        }
        self.subprojects
            .iter_mut()
            .find_map(|sub| sub.find_object_file_mut(absolute))
    }

    pub fn gitignore(&self) -> Option<&IgnoreFile> {
        self.component(self.gitignore?)
    }

    pub fn gitignore_mut(&mut self) -> Option<&mut IgnoreFile> {
        let id = self.gitignore?;
        self.component_mut(id)
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Registry access; mutations fail once synthesis has started.
    pub fn dependencies_mut(&mut self) -> &mut Dependencies {
        &mut self.dependencies
    }

    pub fn tasks(&self) -> &Tasks {
        &self.tasks
    }

    pub fn tasks_mut(&mut self) -> &mut Tasks {
        &mut self.tasks
    }

    /// Create a nested project whose outdir is relative to this one.
    pub fn add_subproject(&mut self, name: &str, outdir: &str) -> Result<&mut Project> {
        if self.phase != Phase::Defining {
            return Err(Error::InvalidPhase {
                action: "add a sub-project".to_string(),
                phase: self.phase.to_string(),
            });
        }
        let outdir = resolve_within(&self.outdir, outdir)?;
        let options = ProjectOptions::new(name, outdir).config(self.config.clone());
        let sub = Self::with_registry(options, Arc::clone(&self.registry))?;
        self.subprojects.push(sub);
        let last = self.subprojects.len() - 1;
        Ok(&mut self.subprojects[last])
    }

    pub fn subprojects(&self) -> &[Project] {
        &self.subprojects
    }

    pub fn subproject_mut(&mut self, name: &str) -> Option<&mut Project> {
        self.subprojects.iter_mut().find(|p| p.name == name)
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        for sub in &mut self.subprojects {
            sub.set_phase(phase);
        }
    }

    /// Synthesize the whole tree with this project's settings.
    pub fn synth(&mut self) -> Result<SynthReport> {
        SynthEngine::new(self.config.clone()).run(self)
    }
}
