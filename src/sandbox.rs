//! Path confinement for project operations.
//!
//! Every project and file name an agent supplies is resolved here before the
//! store touches the filesystem or spawns git. Resolution is purely lexical:
//! nothing is read from disk, so a rejected path never causes a side effect.

use std::path::{Component, Path, PathBuf};

use crate::error::{StoreError, StoreResult};

const GIT_DIR: &str = ".git";

/// Resolves project-relative names into absolute paths under a fixed root.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: normalize(root.as_ref()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `segments` inside `project`.
    ///
    /// Fails with [`StoreError::PathEscape`] when the project name is not a
    /// single plain segment, or when the joined and normalized path leaves the
    /// project directory (through `..`, an absolute segment, or anything else)
    /// or passes through a `.git` directory.
    pub fn resolve<S: AsRef<Path>>(&self, project: &str, segments: &[S]) -> StoreResult<PathBuf> {
        validate_project_name(project)?;

        let mut candidate = self.root.join(project);
        for segment in segments {
            candidate.push(segment);
        }
        let candidate = normalize(&candidate);

        let relative = candidate
            .strip_prefix(&self.root)
            .map_err(|_| StoreError::escape(&candidate))?;

        let mut components = relative.components();
        match components.next() {
            Some(Component::Normal(first)) if first == project => {}
            _ => return Err(StoreError::escape(candidate)),
        }
        // Repository metadata is history, not content.
        let in_git_dir = components
            .any(|c| matches!(c, Component::Normal(name) if name.eq_ignore_ascii_case(GIT_DIR)));
        if in_git_dir {
            return Err(StoreError::escape(candidate));
        }
        Ok(candidate)
    }

    /// The directory of `project` itself, a direct child of the root.
    pub fn resolve_project(&self, project: &str) -> StoreResult<PathBuf> {
        self.resolve::<&str>(project, &[])
    }

    /// A file inside `project`; the project directory itself is rejected.
    pub fn resolve_file(&self, project: &str, file: &str) -> StoreResult<PathBuf> {
        let path = self.resolve(project, &[file])?;
        if path == self.root.join(project) {
            return Err(StoreError::escape(path));
        }
        Ok(path)
    }

    /// `path` relative to its project directory, as handed to git.
    pub fn relative(&self, project: &str, path: &Path) -> StoreResult<PathBuf> {
        path.strip_prefix(self.root.join(project))
            .map(Path::to_path_buf)
            .map_err(|_| StoreError::escape(path))
    }
}

fn validate_project_name(project: &str) -> StoreResult<()> {
    let mut components = Path::new(project).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None)
            if name == project && !project.contains(['/', '\\']) =>
        {
            Ok(())
        }
        _ => Err(StoreError::escape(project)),
    }
}

/// Lexically resolve `.` and `..` without consulting the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
