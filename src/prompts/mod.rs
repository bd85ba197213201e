//! Prompt templates for the planning and code-generation calls.
//!
//! Templates are keyed by task and variant. Built-in variants ship with the
//! binary; a prompts directory may add or replace variants through one YAML
//! file per task (`planning.yaml`, `code_generation.yaml`) mapping variant
//! names to template text.

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::ports::filesystem::FileSystem;

/// Task name for the planning prompt.
pub const PLANNING: &str = "planning";
/// Task name for the code-generation prompt.
pub const CODE_GENERATION: &str = "code_generation";
/// Variant used when none is requested.
pub const DEFAULT_VARIANT: &str = "default";

const PLANNING_DEFAULT: &str = "\
You are a senior Python engineer planning a small project.

Task: {desc}
Entry module: {module_path}

Write a short numbered implementation plan. List every file the project
needs (at least two Python modules), what each file contains, and how the
entry module ties them together. Do not write any code yet.
";

const PLANNING_CONCISE: &str = "\
Plan a small Python project in at most eight numbered steps.

Task: {desc}
Entry module: {module_path}

Name each file and its responsibility. No code.
";

const CODE_GENERATION_DEFAULT: &str = r#"You are a senior Python engineer. Implement the plan below.

Task: {desc}
Entry module: {module_path}

Plan:
{plan}

Respond with ONLY a JSON object mapping relative file paths to complete file
contents, for example:
{"app.py": "from helper import greet\n\ngreet()\n", "helper.py": "def greet():\n    print('hi')\n"}

Rules:
- Include the entry module `{module_path}` and at least two Python files.
- Import sibling modules by bare name (`from helper import greet`).
- Do not wrap the JSON in markdown fences or add commentary.
"#;

const CODE_GENERATION_STRICT_JSON: &str = r#"Return a single JSON object and nothing else.
Keys: relative file paths. Values: full file contents as strings.

Task: {desc}
Entry module: {module_path}
Plan:
{plan}

The object must contain `{module_path}` and at least two `.py` files.
"#;

/// Errors from looking up or loading prompt templates.
#[derive(Debug, Error)]
pub enum PromptError {
    /// No templates exist for the task.
    #[error("unknown prompt task {0:?}")]
    UnknownTask(String),

    /// The task exists but has no template under that variant name.
    #[error("unknown variant {variant:?} for prompt task {task:?} (available: {available})")]
    UnknownVariant {
        /// Task that was looked up.
        task: String,
        /// Variant that was requested.
        variant: String,
        /// Comma-separated variants the task does have.
        available: String,
    },

    /// An override file could not be read or parsed.
    #[error("failed to load prompt overrides from {path}: {message}")]
    Load {
        /// Override file path.
        path: String,
        /// Read or parse failure.
        message: String,
    },
}

/// Task → variant → template.
#[derive(Debug, Clone)]
pub struct PromptStore {
    templates: BTreeMap<String, BTreeMap<String, String>>,
}

impl PromptStore {
    /// The templates compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            PLANNING.to_string(),
            BTreeMap::from([
                (DEFAULT_VARIANT.to_string(), PLANNING_DEFAULT.to_string()),
                ("concise".to_string(), PLANNING_CONCISE.to_string()),
            ]),
        );
        templates.insert(
            CODE_GENERATION.to_string(),
            BTreeMap::from([
                (DEFAULT_VARIANT.to_string(), CODE_GENERATION_DEFAULT.to_string()),
                ("strict_json".to_string(), CODE_GENERATION_STRICT_JSON.to_string()),
            ]),
        );
        Self { templates }
    }

    /// Merges `<dir>/<task>.yaml` files over the current templates. Missing
    /// files are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Load`] if a present file cannot be read or is
    /// not a map of variant names to strings.
    pub fn with_overrides(mut self, fs: &dyn FileSystem, dir: &Path) -> Result<Self, PromptError> {
        for (task, variants) in &mut self.templates {
            let path = dir.join(format!("{task}.yaml"));
            if !fs.exists(&path) {
                continue;
            }
            let load_error = |message: String| PromptError::Load {
                path: path.display().to_string(),
                message,
            };
            let text = fs.read_to_string(&path).map_err(|e| load_error(e.to_string()))?;
            let overrides: BTreeMap<String, String> =
                serde_yaml::from_str(&text).map_err(|e| load_error(e.to_string()))?;
            variants.extend(overrides);
        }
        Ok(self)
    }

    /// Renders the template for `task`/`variant` with the given values.
    ///
    /// # Errors
    ///
    /// Returns an error if the task or variant does not exist.
    pub fn get_prompt(
        &self,
        task: &str,
        variant: &str,
        vars: &[(&str, &str)],
    ) -> Result<String, PromptError> {
        let variants =
            self.templates.get(task).ok_or_else(|| PromptError::UnknownTask(task.to_string()))?;
        let template = variants.get(variant).ok_or_else(|| PromptError::UnknownVariant {
            task: task.to_string(),
            variant: variant.to_string(),
            available: variants.keys().cloned().collect::<Vec<_>>().join(", "),
        })?;
        Ok(render(template, vars))
    }

    /// Known task names, sorted.
    #[must_use]
    pub fn list_available_tasks(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Variants of `task`, sorted. Empty for an unknown task.
    #[must_use]
    pub fn list_variants(&self, task: &str) -> Vec<&str> {
        self.templates.get(task).map(|v| v.keys().map(String::as_str).collect()).unwrap_or_default()
    }
}

/// Replaces `{name}` placeholders that have a value. Other braces, including
/// JSON examples in the template, are left verbatim; substituted values are
/// not rescanned.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| vars.iter().find(|(k, _)| *k == &after[..close]).map(|(_, v)| (close, v)));
        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::live::LiveFileSystem;

    #[test]
    fn renders_known_placeholders_only() {
        let out = render("{desc} -> {module_path} {\"a.py\": 1} {unknown}", &[
            ("desc", "calc"),
            ("module_path", "proj/app.py"),
        ]);
        assert_eq!(out, "calc -> proj/app.py {\"a.py\": 1} {unknown}");
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        assert_eq!(render("{plan}", &[("plan", "{desc}"), ("desc", "x")]), "{desc}");
    }

    #[test]
    fn builtin_generation_prompt_includes_plan_and_json_example() {
        let store = PromptStore::builtin();
        let prompt = store
            .get_prompt(CODE_GENERATION, DEFAULT_VARIANT, &[
                ("desc", "a todo app"),
                ("module_path", "todo/app.py"),
                ("plan", "1. write it"),
            ])
            .unwrap();
        assert!(prompt.contains("1. write it"));
        assert!(prompt.contains("`todo/app.py`"));
        assert!(prompt.contains("{\"app.py\":"));
    }

    #[test]
    fn lists_tasks_and_variants() {
        let store = PromptStore::builtin();
        assert_eq!(store.list_available_tasks(), vec![CODE_GENERATION, PLANNING]);
        assert_eq!(store.list_variants(PLANNING), vec!["concise", "default"]);
        assert!(store.list_variants("nope").is_empty());
    }

    #[test]
    fn unknown_task_and_variant_are_errors() {
        let store = PromptStore::builtin();
        assert!(matches!(store.get_prompt("nope", "default", &[]), Err(PromptError::UnknownTask(_))));
        let err = store.get_prompt(PLANNING, "fancy", &[]).unwrap_err();
        assert!(err.to_string().contains("available: concise, default"));
    }

    #[test]
    fn overrides_add_and_replace_variants() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("planning.yaml"),
            "default: \"Plan {desc}\"\nterse: \"Steps for {desc}\"\n",
        )
        .unwrap();

        let store = PromptStore::builtin().with_overrides(&LiveFileSystem, dir.path()).unwrap();

        assert_eq!(store.get_prompt(PLANNING, "default", &[("desc", "x")]).unwrap(), "Plan x");
        assert_eq!(store.list_variants(PLANNING), vec!["concise", "default", "terse"]);
        assert_eq!(store.list_variants(CODE_GENERATION), vec!["default", "strict_json"]);
    }

    #[test]
    fn malformed_override_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("code_generation.yaml"), "- not\n- a map\n").unwrap();

        let result = PromptStore::builtin().with_overrides(&LiveFileSystem, dir.path());

        assert!(matches!(result, Err(PromptError::Load { .. })));
    }
}
