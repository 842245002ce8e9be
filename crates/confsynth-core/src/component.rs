//! Components: the nodes of a project tree
//!
//! A project owns its components in an arena and hands out [`ComponentId`]s.
//! Files are components that also expose a [`Synthesizable`] view.

use std::any::Any;
use std::fmt;

use confsynth_fs::NormalizedPath;

use crate::error::Result;
use crate::file::Synthesizable;
use crate::project::Project;

/// Handle to a component within its project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Upcast helper so typed lookups can downcast `dyn Component`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A node in the project tree.
///
/// Hooks default to no-ops. A component is detached from its project while
/// its own `pre_synthesize` runs, so it can freely edit the rest of the tree.
pub trait Component: AsAny + Send + Sync {
    /// Short name used in logs and hook errors.
    fn name(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("component")
            .to_string()
    }

    /// Runs once before any file is written.
    fn pre_synthesize(&mut self, _project: &mut Project) -> Result<()> {
        Ok(())
    }

    /// Runs once after every file in the tree has been written.
    fn post_synthesize(&mut self, _outdir: &NormalizedPath) -> Result<()> {
        Ok(())
    }

    fn as_file(&self) -> Option<&dyn Synthesizable> {
        None
    }

    fn as_file_mut(&mut self) -> Option<&mut dyn Synthesizable> {
        None
    }
}

/// Implement [`Component`] for a type that implements [`Synthesizable`].
#[macro_export]
macro_rules! file_component {
    ($ty:ty) => {
        impl $crate::component::Component for $ty {
            fn name(&self) -> String {
                $crate::file::Synthesizable::base(self).path().to_string()
            }

            fn as_file(&self) -> Option<&dyn $crate::file::Synthesizable> {
                Some(self)
            }

            fn as_file_mut(&mut self) -> Option<&mut dyn $crate::file::Synthesizable> {
                Some(self)
            }
        }
    };
}

pub(crate) struct Node {
    pub(crate) component: Option<Box<dyn Component>>,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) children: Vec<ComponentId>,
}

impl Node {
    pub(crate) fn new(component: Box<dyn Component>, parent: Option<ComponentId>) -> Self {
        Self {
            component: Some(component),
            parent,
            children: Vec::new(),
        }
    }
}

pub(crate) fn downcast_ref<T: Component>(component: &dyn Component) -> Option<&T> {
    component.as_any().downcast_ref::<T>()
}

pub(crate) fn downcast_mut<T: Component>(component: &mut dyn Component) -> Option<&mut T> {
    component.as_any_mut().downcast_mut::<T>()
}
