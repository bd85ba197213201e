//! The plan → generate → materialize pipeline.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::context::ServiceContext;
use crate::materialize::fileset::{normalize_content, strip_code_fences, FileSet};
use crate::materialize::imports::enforce_same_folder_imports;
use crate::materialize::packages::ensure_package_chain;
use crate::materialize::relocate::relocate_into_dir;
use crate::materialize::requirements::{generate_requirements, DependencyReport};
use crate::materialize::workspace::{is_source, Workspace};
use crate::materialize::{MaterializeError, ProjectLayout, RewriteReport, MIN_SOURCE_FILES};
use crate::ports::llm::{CompletionRequest, LlmClient};
use crate::prompts::{PromptError, PromptStore, CODE_GENERATION, PLANNING};

/// Outcome reported to the caller: a success flag and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Whether the run succeeded.
    pub success: bool,
    /// What was written, or why the run stopped.
    pub message: String,
}

impl RunResult {
    /// A successful result.
    #[must_use]
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    /// A failed result.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

impl From<Result<Materialized, MaterializeError>> for RunResult {
    fn from(result: Result<Materialized, MaterializeError>) -> Self {
        match result {
            Ok(materialized) => Self::succeeded(materialized.summary()),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// How the dependency manifest came to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestOutcome {
    /// The model supplied it at the manifest location; generation was skipped.
    Supplied,
    /// It was inferred from the project's imports.
    Generated(DependencyReport),
}

/// Everything one materialization run did to the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Paths derived from the entry module.
    pub layout: ProjectLayout,
    /// Files written from the draft, relative to the repository root.
    pub written: Vec<String>,
    /// Package markers created.
    pub markers: Vec<String>,
    /// Import rewrite outcome.
    pub rewrite: RewriteReport,
    /// Dependency manifest outcome.
    pub manifest: ManifestOutcome,
}

impl Materialized {
    /// The caller-facing summary line.
    #[must_use]
    pub fn summary(&self) -> String {
        let entry = &self.layout.entry;
        let manifest = &self.layout.manifest_path;
        if self.written.len() == 1 {
            format!("Wrote module: {entry} (and {manifest})")
        } else {
            format!("Wrote {} files (entrypoint: {entry}) and {manifest}", self.written.len())
        }
    }
}

/// Drives the model and materializes its output under the repository root.
pub struct Agent<'a> {
    llm: &'a dyn LlmClient,
    workspace: Workspace<'a>,
    prompts: PromptStore,
    model: String,
    temperature: f32,
    planning_variant: String,
    code_gen_variant: String,
}

impl<'a> Agent<'a> {
    /// Builds an agent over the context's ports.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured prompt overrides cannot be loaded.
    pub fn new(ctx: &'a ServiceContext, config: &AgentConfig) -> Result<Self, PromptError> {
        let mut prompts = PromptStore::builtin();
        if let Some(dir) = &config.prompts_dir {
            prompts = prompts.with_overrides(ctx.fs.as_ref(), dir)?;
        }
        Ok(Self {
            llm: ctx.llm.as_ref(),
            workspace: Workspace::new(ctx.fs.as_ref(), &config.repo),
            prompts,
            model: config.model.clone(),
            temperature: config.temperature,
            planning_variant: config.planning_variant.clone(),
            code_gen_variant: config.code_gen_variant.clone(),
        })
    }

    /// Plans, generates, and materializes a project whose entry module is
    /// `module_path`, folding every outcome into a [`RunResult`].
    pub async fn create_program(&self, desc: &str, module_path: &str) -> RunResult {
        let result = self.materialize_program(desc, module_path).await;
        if let Err(e) = &result {
            warn!(error = %e, "create_program failed");
        }
        result.into()
    }

    /// Like [`Agent::create_program`] but returns the typed outcome.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`MaterializeError`].
    pub async fn materialize_program(
        &self,
        desc: &str,
        module_path: &str,
    ) -> Result<Materialized, MaterializeError> {
        let plan_prompt = self.prompts.get_prompt(PLANNING, &self.planning_variant, &[
            ("desc", desc),
            ("module_path", module_path),
        ])?;
        debug!(prompt = %plan_prompt, "planning prompt");
        let plan = self.complete(plan_prompt).await?.trim().to_string();
        if plan.is_empty() {
            return Err(MaterializeError::EmptyPlan);
        }
        debug!(plan = %plan, "model plan");

        let draft_prompt = self.prompts.get_prompt(CODE_GENERATION, &self.code_gen_variant, &[
            ("desc", desc),
            ("module_path", module_path),
            ("plan", &plan),
        ])?;
        debug!(prompt = %draft_prompt, "code generation prompt");
        let draft = self.complete(draft_prompt).await?;
        debug!(draft = %draft, "model draft");

        self.materialize_draft(&draft, module_path)
    }

    /// Runs every materialization stage over an already-obtained draft.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`MaterializeError`]; per-file rewrite and
    /// scan failures are reported in the result instead.
    pub fn materialize_draft(
        &self,
        draft_raw: &str,
        module_path: &str,
    ) -> Result<Materialized, MaterializeError> {
        let layout = ProjectLayout::for_entry(module_path);

        let (written, manifest_supplied) = match FileSet::parse(draft_raw) {
            Ok(files) => self.write_file_set(files, &layout)?,
            Err(e) => {
                warn!(error = %e, "draft is not a files map; falling back to single-file mode");
                self.write_single_module(draft_raw, &layout)?
            }
        };

        let mut markers = Vec::new();
        for path in written.iter().filter(|p| is_source(Path::new(p))) {
            markers.extend(ensure_package_chain(
                &self.workspace,
                path,
                layout.package_root.as_deref(),
            )?);
        }

        let rewrite = enforce_same_folder_imports(&self.workspace, &layout.project_root)?;

        let manifest = if manifest_supplied {
            ManifestOutcome::Supplied
        } else {
            ManifestOutcome::Generated(generate_requirements(
                &self.workspace,
                &layout.manifest_path,
                &[layout.scan_target()],
            )?)
        };

        info!(
            entry = %layout.entry,
            files = written.len(),
            markers = markers.len(),
            rewritten = rewrite.rewritten.len(),
            "materialized project"
        );
        Ok(Materialized { layout, written, markers, rewrite, manifest })
    }

    /// Known prompt tasks and their variants.
    #[must_use]
    pub fn list_available_prompts(&self) -> BTreeMap<String, Vec<String>> {
        self.prompts
            .list_available_tasks()
            .into_iter()
            .map(|task| {
                let variants = self.prompts.list_variants(task).into_iter().map(String::from);
                (task.to_string(), variants.collect())
            })
            .collect()
    }

    async fn complete(&self, prompt: String) -> Result<String, MaterializeError> {
        let request =
            CompletionRequest { model: self.model.clone(), prompt, temperature: self.temperature };
        let response =
            self.llm.complete(&request).await.map_err(|e| MaterializeError::Llm(e.to_string()))?;
        Ok(response.text)
    }

    /// Validates and writes a multi-file draft. Returns the written paths and
    /// whether one of them is the dependency manifest.
    fn write_file_set(
        &self,
        files: FileSet,
        layout: &ProjectLayout,
    ) -> Result<(Vec<String>, bool), MaterializeError> {
        let sources = files.source_files();
        if sources.len() < MIN_SOURCE_FILES {
            return Err(MaterializeError::TooFewSourceFiles {
                count: sources.len(),
                files: sources.into_iter().map(String::from).collect(),
            });
        }

        let mut relocated = BTreeMap::new();
        for (path, content) in files {
            let target = relocate_into_dir(&path, &layout.project_root);
            if !is_safe_relative(&target) {
                return Err(MaterializeError::UnsafePath(path));
            }
            if relocated.insert(target.clone(), content).is_some() {
                warn!(path = %target, "two draft entries relocate to the same path; keeping the last");
            }
        }

        if !relocated.contains_key(&layout.entry) {
            return Err(MaterializeError::MissingEntrypoint(layout.entry.clone()));
        }
        let manifest_supplied = relocated.contains_key(&layout.manifest_path);

        let mut written = Vec::with_capacity(relocated.len());
        for (path, content) in relocated {
            self.workspace.write(&path, &content)?;
            written.push(path);
        }
        Ok((written, manifest_supplied))
    }

    fn write_single_module(
        &self,
        draft_raw: &str,
        layout: &ProjectLayout,
    ) -> Result<(Vec<String>, bool), MaterializeError> {
        let draft = strip_code_fences(draft_raw);
        if draft.is_empty() {
            return Err(MaterializeError::EmptyDraft);
        }
        self.workspace.write(&layout.entry, &normalize_content(&draft))?;
        Ok((vec![layout.entry.clone()], false))
    }
}

/// A relocated path must name a file and never climb out of its directory.
fn is_safe_relative(path: &str) -> bool {
    !path.is_empty() && !path.ends_with('/') && path.split('/').all(|segment| segment != "..")
}
