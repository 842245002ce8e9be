//! Synthesis driver
//!
//! [`SynthEngine`] walks a project tree through its phases:
//!
//! - **pre-synthesis**: freeze the registries, register their manifests and
//!   run every component's `pre_synthesize` hook in insertion order
//! - **synthesis**: render and write every file, in parallel
//! - **post-synthesis**: run every component's `post_synthesize` hook
//!
//! The first error stops the run. Files already written stay written.

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use confsynth_content::Resolver;

use crate::config::SynthConfig;
use crate::dependencies::{DEPENDENCIES_ARG, DEPENDENCIES_MANIFEST, Dependencies};
use crate::error::{Error, Result};
use crate::file::{FileOutcome, FileStatus, Synthesizable};
use crate::object_file::{ObjectFile, ObjectFileOptions};
use crate::project::{Phase, Project};
use crate::tasks::{TASKS_ARG, TASKS_MANIFEST, Tasks};

/// Report from a synthesis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SynthReport {
    /// One entry per file in the tree, in synthesis order.
    pub files: Vec<FileOutcome>,
    /// Nothing was written; `Written` means "would be written".
    pub dry_run: bool,
}

impl SynthReport {
    /// Whether any file was (or would be) written.
    pub fn changed(&self) -> bool {
        self.files.iter().any(|f| f.status == FileStatus::Written)
    }

    pub fn status(&self, path: &str) -> Option<FileStatus> {
        self.files.iter().find(|f| f.path == path).map(|f| f.status)
    }

    /// Paths with the given status.
    pub fn paths_with(&self, status: FileStatus) -> Vec<&str> {
        self.files
            .iter()
            .filter(|f| f.status == status)
            .map(|f| f.path.as_str())
            .collect()
    }
}

/// Drives one project tree from definition to files on disk.
#[derive(Debug, Clone, Default)]
pub struct SynthEngine {
    config: SynthConfig,
}

impl SynthEngine {
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Synthesize `project` and all of its sub-projects.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidPhase`] if the project was already synthesized, or
    /// the first error raised by a hook, a resolution or a write.
    pub fn run(&self, project: &mut Project) -> Result<SynthReport> {
        if project.phase != Phase::Defining {
            return Err(Error::InvalidPhase {
                action: "synthesize".to_string(),
                phase: project.phase.to_string(),
            });
        }
        info!(
            project = %project.name(),
            outdir = %project.outdir(),
            dry_run = self.config.dry_run,
            "Synthesis started"
        );

        project.set_phase(Phase::PreSynth);
        freeze_registries(project)?;
        pre_synthesize(project)?;

        project.set_phase(Phase::Synth);
        let files = self.synthesize_files(project)?;

        project.set_phase(Phase::PostSynth);
        post_synthesize(project)?;

        project.set_phase(Phase::Done);
        let report = SynthReport {
            files,
            dry_run: self.config.dry_run,
        };
        info!(
            files = report.files.len(),
            written = report.paths_with(FileStatus::Written).len(),
            "Synthesis finished"
        );
        Ok(report)
    }

    fn synthesize_files(&self, project: &mut Project) -> Result<Vec<FileOutcome>> {
        let mut work = Vec::new();
        collect_files(project, &self.config, &mut work);
        debug!(files = work.len(), jobs = ?self.config.jobs, "Rendering files");

        let dry_run = self.config.dry_run;
        let render = move || {
            work.into_par_iter()
                .map(|(file, resolver)| file.synthesize(&resolver, dry_run))
                .collect::<Result<Vec<_>>>()
        };

        match self.config.jobs {
            Some(jobs) => rayon::ThreadPoolBuilder::new()
                .num_threads(jobs.max(1))
                .build()?
                .install(render),
            None => render(),
        }
    }
}

/// Freeze every registry in the tree and register the manifests of the
/// non-empty ones.
fn freeze_registries(project: &mut Project) -> Result<()> {
    project.dependencies.freeze();
    project.tasks.freeze()?;

    if !project.dependencies.is_empty() {
        let options = ObjectFileOptions::new(Dependencies::manifest_value()).omit_empty(true);
        project.add_component(ObjectFile::json(DEPENDENCIES_MANIFEST, options))?;
    }
    if !project.tasks.is_empty() {
        let options = ObjectFileOptions::new(Tasks::manifest_value()).omit_empty(true);
        project.add_component(ObjectFile::json(TASKS_MANIFEST, options))?;
    }

    for sub in &mut project.subprojects {
        freeze_registries(sub)?;
    }
    Ok(())
}

/// Components added by a hook run their own hook too, after everything
/// already in the tree.
fn pre_synthesize(project: &mut Project) -> Result<()> {
    let mut index = 0;
    while index < project.nodes.len() {
        if let Some(mut component) = project.nodes[index].component.take() {
            debug!(component = %component.name(), "pre_synthesize");
            let result = component.pre_synthesize(project);
            project.nodes[index].component = Some(component);
            result?;
        }
        index += 1;
    }

    for sub in &mut project.subprojects {
        pre_synthesize(sub)?;
    }
    Ok(())
}

fn post_synthesize(project: &mut Project) -> Result<()> {
    let outdir = project.outdir().clone();
    for node in &mut project.nodes {
        if let Some(component) = node.component.as_deref_mut() {
            debug!(component = %component.name(), "post_synthesize");
            component.post_synthesize(&outdir)?;
        }
    }

    for sub in &mut project.subprojects {
        post_synthesize(sub)?;
    }
    Ok(())
}

type FileWork<'a> = (&'a mut dyn Synthesizable, Arc<Resolver>);

/// Gather every file of the tree with the resolver of its own project.
fn collect_files<'a>(project: &'a mut Project, config: &SynthConfig, out: &mut Vec<FileWork<'a>>) {
    let resolver = Arc::new(
        Resolver::new()
            .with_max_depth(config.max_resolve_depth)
            .with_arg(DEPENDENCIES_ARG, project.dependencies.snapshot())
            .with_arg(TASKS_ARG, project.tasks.snapshot()),
    );

    for node in &mut project.nodes {
        if let Some(component) = node.component.as_deref_mut()
            && let Some(file) = component.as_file_mut()
        {
            out.push((file, Arc::clone(&resolver)));
        }
    }

    for sub in &mut project.subprojects {
        collect_files(sub, config, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileOptions;
    use crate::project::ProjectOptions;
    use crate::text_file::TextFile;

    #[test]
    fn test_report_queries() {
        let report = SynthReport {
            files: vec![
                FileOutcome {
                    path: "a.json".into(),
                    status: FileStatus::Unchanged,
                },
                FileOutcome {
                    path: "b.json".into(),
                    status: FileStatus::Written,
                },
            ],
            dry_run: false,
        };
        assert!(report.changed());
        assert_eq!(report.status("a.json"), Some(FileStatus::Unchanged));
        assert_eq!(report.status("c.json"), None);
        assert_eq!(report.paths_with(FileStatus::Written), ["b.json"]);
    }

    #[test]
    fn test_dry_run_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let outdir = confsynth_fs::NormalizedPath::new(dir.path());
        let config = SynthConfig::default().with_dry_run(true).with_jobs(2);
        let mut project =
            Project::new(ProjectOptions::new("dry", outdir.clone()).config(config)).unwrap();
        project
            .add_component(TextFile::new("notes.txt", FileOptions::default()).with_lines(["x"]))
            .unwrap();

        let report = project.synth().unwrap();
        assert!(report.dry_run);
        assert_eq!(report.status("notes.txt"), Some(FileStatus::Written));
        assert!(!outdir.join("notes.txt").exists());
        assert!(!outdir.join(".gitignore").exists());
    }

    #[test]
    fn test_second_run_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::new(
            ProjectOptions::new("once", confsynth_fs::NormalizedPath::new(dir.path()))
                .git_ignore(false),
        )
        .unwrap();
        project.synth().unwrap();
        assert_eq!(project.phase(), Phase::Done);
        assert!(matches!(
            project.synth(),
            Err(Error::InvalidPhase { .. })
        ));
    }
}
