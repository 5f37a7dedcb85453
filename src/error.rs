//! Error types for the project store and the command registry.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures raised by the project store, initializer and test runner.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A project or file path resolved outside its project under the root.
    #[error("Path escapes the project root: {}", path.display())]
    PathEscape { path: PathBuf },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A git, installer or shell invocation failed or could not be spawned.
    #[error("`{command}` failed{}{}", exit_suffix(*exit_code), stderr_suffix(stderr))]
    Subprocess {
        command: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("Project already exists: {project}")]
    AlreadyExists { project: String },

    #[error("Template directory not found: {}", path.display())]
    Template { path: PathBuf },

    #[error("Invalid project manifest at {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No test command declared for project {project}")]
    NoTestCommand { project: String },
}

impl StoreError {
    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn escape(path: impl Into<PathBuf>) -> Self {
        Self::PathEscape { path: path.into() }
    }

    /// True when the path exists but is the wrong kind for the operation
    /// (listing a file, reading a directory) or the file is not UTF-8 text.
    pub fn is_invalid_target(&self) -> bool {
        use std::io::ErrorKind;
        matches!(
            self,
            Self::Io { source, .. } if matches!(
                source.kind(),
                ErrorKind::NotADirectory | ErrorKind::IsADirectory | ErrorKind::InvalidData
            )
        )
    }

    /// True when the underlying cause is a missing file or directory.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

fn exit_suffix(code: Option<i32>) -> String {
    code.map(|c| format!(" (exit code {c})")).unwrap_or_default()
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Failures raised while dispatching a named command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// The command's attribute validator rejected the request.
    #[error("Invalid attributes for command '{command}'")]
    Validation { command: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type StoreResult<T> = Result<T, StoreError>;
