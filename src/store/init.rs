//! Bringing a new project into existence: directory, starting files,
//! ignore list, git history and first commit.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::{json, Value};

use super::git::Git;
use super::runner::{combined_output, shell, MANIFEST_FILE};
use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::sandbox::PathSandbox;

const GITIGNORE: &str = ".gitignore";

/// Creates fully formed, version-controlled projects.
///
/// A failure part-way through is propagated as-is and leaves whatever was
/// already created on disk; nothing is cleaned up.
#[derive(Debug, Clone)]
pub struct ProjectInitializer {
    sandbox: PathSandbox,
    config: Config,
}

impl ProjectInitializer {
    pub fn new(sandbox: PathSandbox, config: Config) -> Self {
        Self { sandbox, config }
    }

    /// Create `project` and return a transcript of the steps performed,
    /// ending in `Project created.`.
    pub fn initialize(&self, project: &str) -> StoreResult<String> {
        let dir = self.sandbox.resolve_project(project)?;
        if dir.exists() {
            return Err(StoreError::AlreadyExists {
                project: project.to_string(),
            });
        }

        tracing::info!(project, dir = %dir.display(), "Creating project");
        let mut transcript = Vec::new();

        fs::create_dir(&dir).map_err(StoreError::io(&dir))?;
        transcript.push(format!("Created {}", dir.display()));

        if let Some(template) = &self.config.template {
            if !template.is_dir() {
                return Err(StoreError::Template {
                    path: template.clone(),
                });
            }
            copy_tree(template, &dir)?;
            transcript.push(format!("Copied template {}", template.display()));
        }

        let manifest = dir.join(MANIFEST_FILE);
        if !manifest.exists() {
            let content = self.default_manifest()?;
            fs::write(&manifest, content).map_err(StoreError::io(&manifest))?;
            transcript.push(format!("Generated {MANIFEST_FILE}"));
        }
        self.fill_placeholders(&manifest, project)?;

        let git = Git::new(&dir, self.sandbox.root(), &self.config.author);
        transcript.push(git.init()?);

        if let Some(install) = &self.config.install_command {
            let output = shell(&dir, install)?;
            if !output.status.success() {
                return Err(StoreError::Subprocess {
                    command: install.clone(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                    exit_code: output.status.code(),
                });
            }
            transcript.push(combined_output(&output));
        }

        append_ignores(&dir.join(GITIGNORE), &self.config.ignore)?;
        transcript.push(format!("Ignored {}", self.config.ignore.join(", ")));

        git.add_all()?;
        transcript.push(git.commit(&format!("Initialize {project}"), &[])?);
        transcript.push("Project created.".to_string());

        Ok(transcript
            .into_iter()
            .filter(|step| !step.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    fn default_manifest(&self) -> StoreResult<String> {
        let test = self
            .config
            .default_test_command
            .as_deref()
            .unwrap_or("echo \"No tests defined\"");
        let manifest = json!({
            "name": "{{name}}",
            "author": "{{author}} <{{email}}>",
            "repository": "{{repository}}",
            "scripts": { "test": test },
        });
        serde_json::to_string_pretty(&manifest).map_err(|source| StoreError::Manifest {
            path: MANIFEST_FILE.into(),
            source,
        })
    }

    /// Substitute placeholders inside the manifest's string values, so the
    /// result stays valid JSON whatever the project or author names contain.
    fn fill_placeholders(&self, manifest: &Path, project: &str) -> StoreResult<()> {
        let content = fs::read_to_string(manifest).map_err(StoreError::io(manifest))?;
        let mut value: Value =
            serde_json::from_str(&content).map_err(|source| StoreError::Manifest {
                path: manifest.to_path_buf(),
                source,
            })?;

        let repository = repository_url(self.config.repository_prefix.as_deref(), project);
        fill_strings(
            &mut value,
            &[
                ("name", project),
                ("author", self.config.author.name.as_str()),
                ("email", self.config.author.email.as_str()),
                ("repository", repository.as_str()),
            ],
        );

        let filled = serde_json::to_string_pretty(&value).map_err(|source| StoreError::Manifest {
            path: manifest.to_path_buf(),
            source,
        })?;
        fs::write(manifest, filled).map_err(StoreError::io(manifest))
    }
}

fn repository_url(prefix: Option<&str>, project: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => {
            format!("{}/{}", prefix.trim_end_matches('/'), project)
        }
        _ => String::new(),
    }
}

/// Replace every `{{key}}` in `text` with its value.
fn substitute(text: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(text.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{{{key}}}}}"), value)
    })
}

fn fill_strings(value: &mut Value, values: &[(&str, &str)]) {
    match value {
        Value::String(text) => *text = substitute(text, values),
        Value::Array(items) => items.iter_mut().for_each(|item| fill_strings(item, values)),
        Value::Object(map) => map.values_mut().for_each(|item| fill_strings(item, values)),
        _ => {}
    }
}

fn append_ignores(path: &Path, entries: &[String]) -> StoreResult<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(StoreError::io(path))?;
    for entry in entries {
        writeln!(file, "{entry}").map_err(StoreError::io(path))?;
    }
    Ok(())
}

/// Recursively copy `from` into `to`, skipping version-control metadata.
fn copy_tree(from: &Path, to: &Path) -> StoreResult<()> {
    for entry in fs::read_dir(from).map_err(StoreError::io(from))? {
        let entry = entry.map_err(StoreError::io(from))?;
        let source = entry.path();
        if entry.file_name() == ".git" {
            continue;
        }
        let target = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(StoreError::io(&source))?;
        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(StoreError::io(&target))?;
            copy_tree(&source, &target)?;
        } else {
            fs::copy(&source, &target).map_err(StoreError::io(&source))?;
        }
    }
    Ok(())
}
