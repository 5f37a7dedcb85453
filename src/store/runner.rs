//! Runs a project's declared test command.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::sandbox::PathSandbox;

/// File in each project that declares its metadata and test script.
pub const MANIFEST_FILE: &str = "project.json";

/// Executes `scripts.test` from a project's manifest inside the project.
///
/// A failing test run is an ordinary outcome: its output is returned, not
/// raised, so the caller can see why the tests failed.
#[derive(Debug, Clone)]
pub struct TestRunner {
    sandbox: PathSandbox,
    default_command: Option<String>,
}

impl TestRunner {
    pub fn new(sandbox: PathSandbox, default_command: Option<String>) -> Self {
        Self {
            sandbox,
            default_command,
        }
    }

    pub fn run(&self, project: &str) -> StoreResult<String> {
        let dir = self.sandbox.resolve_project(project)?;
        let command = match declared_test_command(&dir)? {
            Some(command) => command,
            None => self
                .default_command
                .clone()
                .ok_or_else(|| StoreError::NoTestCommand {
                    project: project.to_string(),
                })?,
        };

        tracing::info!(project, command = %command, "Running tests");
        let output = shell(&dir, &command)?;
        let transcript = combined_output(&output);

        if output.status.success() {
            Ok(format!("Tests completed:\n{transcript}"))
        } else {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            tracing::warn!(project, exit_code = %code, "Tests failed");
            Ok(format!("Tests failed (exit code {code}):\n{transcript}"))
        }
    }
}

/// The `scripts.test` entry of the manifest in `dir`, if the manifest exists
/// and declares one.
fn declared_test_command(dir: &Path) -> StoreResult<Option<String>> {
    let path = dir.join(MANIFEST_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if dir.is_dir() {
                return Ok(None);
            }
            return Err(StoreError::io(dir)(e));
        }
        Err(e) => return Err(StoreError::io(&path)(e)),
    };

    let manifest: Value =
        serde_json::from_str(&content).map_err(|source| StoreError::Manifest {
            path: path.clone(),
            source,
        })?;

    Ok(manifest
        .pointer("/scripts/test")
        .and_then(Value::as_str)
        .map(str::to_string))
}

/// Run `command` through `sh -c` in `dir`, capturing stdout and stderr.
pub(crate) fn shell(dir: &Path, command: &str) -> StoreResult<Output> {
    Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .output()
        .map_err(|e| StoreError::Subprocess {
            command: command.to_string(),
            stderr: format!("failed to spawn: {e}"),
            exit_code: None,
        })
}

pub(crate) fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}
