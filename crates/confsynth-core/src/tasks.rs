//! Task registry
//!
//! A task is a named, ordered list of steps plus environment variables.
//! Steps either run something or spawn another task by name; spawning is
//! what makes one task a dependent of another.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use confsynth_content::Value;

use crate::error::{Error, Result};

/// Resolver argument carrying the registry snapshot.
pub const TASKS_ARG: &str = "tasks";

/// Where the registry is rendered, relative to the project outdir.
pub const TASKS_MANIFEST: &str = ".confsynth/tasks.json";

/// One step of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStep {
    /// Run a shell command.
    Exec(String),
    /// Run another task.
    Spawn(String),
    /// Print a message.
    Say(String),
    /// Run a command provided by the tool itself.
    Builtin(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Task {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<TaskStep>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Shell condition; the task is skipped when it exits non-zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn exec(&mut self, command: impl Into<String>) -> &mut Self {
        self.steps.push(TaskStep::Exec(command.into()));
        self
    }

    /// Insert a command before all existing steps.
    pub fn prepend_exec(&mut self, command: impl Into<String>) -> &mut Self {
        self.steps.insert(0, TaskStep::Exec(command.into()));
        self
    }

    pub fn spawn(&mut self, task: impl Into<String>) -> &mut Self {
        self.steps.push(TaskStep::Spawn(task.into()));
        self
    }

    pub fn say(&mut self, message: impl Into<String>) -> &mut Self {
        self.steps.push(TaskStep::Say(message.into()));
        self
    }

    pub fn builtin(&mut self, name: impl Into<String>) -> &mut Self {
        self.steps.push(TaskStep::Builtin(name.into()));
        self
    }

    pub fn env(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn condition(&mut self, condition: impl Into<String>) -> &mut Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn cwd(&mut self, cwd: impl Into<String>) -> &mut Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Drop all steps, keeping name, env and description.
    pub fn reset(&mut self) -> &mut Self {
        self.steps.clear();
        self
    }

    /// Names of the tasks this task spawns, in step order.
    pub fn spawns(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| match step {
            TaskStep::Spawn(target) => Some(target.as_str()),
            _ => None,
        })
    }
}

/// The project's tasks, keyed by unique name.
#[derive(Debug, Clone, Default)]
pub struct Tasks {
    tasks: BTreeMap<String, Task>,
    env: BTreeMap<String, String>,
    frozen: bool,
}

impl Tasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateTask`] when the name is taken.
    pub fn add_task(&mut self, name: &str) -> Result<&mut Task> {
        self.ensure_mutable()?;
        if self.tasks.contains_key(name) {
            return Err(Error::DuplicateTask {
                name: name.to_string(),
            });
        }
        Ok(self
            .tasks
            .entry(name.to_string())
            .or_insert_with(|| Task::new(name)))
    }

    pub fn try_find(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Mutable access to an existing task, while the registry is open.
    pub fn task_mut(&mut self, name: &str) -> Result<&mut Task> {
        self.ensure_mutable()?;
        self.tasks.get_mut(name).ok_or_else(|| Error::TaskNotFound {
            name: name.to_string(),
        })
    }

    /// Names of tasks that spawn `name`, sorted.
    pub fn dependents(&self, name: &str) -> Vec<String> {
        self.tasks
            .values()
            .filter(|task| task.name != name && task.spawns().any(|target| target == name))
            .map(|task| task.name.clone())
            .collect()
    }

    /// Remove a task that nothing else spawns.
    ///
    /// # Errors
    ///
    /// [`Error::TaskHasDependents`] lists every task still spawning it.
    pub fn remove_task(&mut self, name: &str) -> Result<Task> {
        self.ensure_mutable()?;
        if !self.tasks.contains_key(name) {
            return Err(Error::TaskNotFound {
                name: name.to_string(),
            });
        }
        let dependents = self.dependents(name);
        if !dependents.is_empty() {
            return Err(Error::TaskHasDependents {
                name: name.to_string(),
                dependents,
            });
        }
        self.tasks.remove(name).ok_or_else(|| Error::TaskNotFound {
            name: name.to_string(),
        })
    }

    /// Set an environment variable for every task.
    pub fn add_env(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.ensure_mutable()?;
        self.env.insert(key.into(), value.into());
        Ok(())
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn all(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.env.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Check that every spawned task exists.
    pub fn validate(&self) -> Result<()> {
        for task in self.tasks.values() {
            if let Some(target) = task.spawns().find(|t| !self.tasks.contains_key(*t)) {
                return Err(Error::UnknownSpawnTarget {
                    task: task.name.clone(),
                    target: target.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate, then reject further changes.
    pub(crate) fn freeze(&mut self) -> Result<()> {
        self.validate()?;
        self.frozen = true;
        Ok(())
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.frozen {
            return Err(Error::RegistryFrozen { registry: "tasks" });
        }
        Ok(())
    }

    /// JSON form handed to deferred values as the `tasks` argument.
    pub fn snapshot(&self) -> JsonValue {
        let mut out = Map::new();
        if !self.tasks.is_empty() {
            out.insert("tasks".to_string(), json!(self.tasks));
        }
        if !self.env.is_empty() {
            out.insert("env".to_string(), json!(self.env));
        }
        JsonValue::Object(out)
    }

    /// Object graph of the rendered manifest, read from the resolver argument.
    pub fn manifest_value() -> Value {
        Value::deferred_with(|ctx| Value::from(ctx.arg(TASKS_ARG).cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_task() {
        let mut tasks = Tasks::new();
        tasks.add_task("build").unwrap();
        let err = tasks.add_task("build").unwrap_err();
        assert_eq!(err.to_string(), "task already exists: build");
    }

    #[test]
    fn test_remove_with_dependents_lists_them() {
        let mut tasks = Tasks::new();
        tasks.add_task("compile").unwrap().exec("tsc");
        tasks.add_task("test").unwrap().exec("jest");
        tasks.add_task("build").unwrap().spawn("compile").spawn("test");
        tasks.add_task("release").unwrap().spawn("compile");

        match tasks.remove_task("compile").unwrap_err() {
            Error::TaskHasDependents { dependents, .. } => {
                assert_eq!(dependents, ["build", "release"]);
            }
            other => panic!("unexpected error: {other}"),
        }

        tasks.remove_task("release").unwrap();
        tasks.task_mut("build").unwrap().reset().exec("make");
        assert!(tasks.remove_task("compile").is_ok());
    }

    #[test]
    fn test_remove_missing_task() {
        let mut tasks = Tasks::new();
        assert!(matches!(
            tasks.remove_task("nope"),
            Err(Error::TaskNotFound { .. })
        ));
    }

    #[test]
    fn test_prepend_exec() {
        let mut tasks = Tasks::new();
        let task = tasks.add_task("test").unwrap();
        task.exec("jest").prepend_exec("eslint .");
        assert_eq!(
            task.steps,
            [TaskStep::Exec("eslint .".into()), TaskStep::Exec("jest".into())]
        );
    }

    #[test]
    fn test_freeze_validates_spawn_targets() {
        let mut tasks = Tasks::new();
        tasks.add_task("build").unwrap().spawn("compile");
        assert!(matches!(
            tasks.freeze(),
            Err(Error::UnknownSpawnTarget { .. })
        ));

        tasks.add_task("compile").unwrap();
        tasks.freeze().unwrap();
        assert!(matches!(
            tasks.add_task("late"),
            Err(Error::RegistryFrozen { registry: "tasks" })
        ));
    }

    #[test]
    fn test_snapshot_shape() {
        let mut tasks = Tasks::new();
        tasks.add_env("CI", "1").unwrap();
        tasks
            .add_task("build")
            .unwrap()
            .description("Full build")
            .exec("make")
            .env("MODE", "release");

        assert_eq!(
            tasks.snapshot(),
            json!({
                "env": {"CI": "1"},
                "tasks": {
                    "build": {
                        "name": "build",
                        "description": "Full build",
                        "steps": [{"exec": "make"}],
                        "env": {"MODE": "release"}
                    }
                }
            })
        );
    }
}
