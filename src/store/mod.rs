//! Sandboxed, git-backed project store.
//!
//! # Commit-per-mutation
//!
//! Every write, move and remove is a two-step sequence: the working tree is
//! changed first, then the change is committed. The two steps are not atomic.
//! If the commit fails the filesystem change stays in place, uncommitted, and
//! the commit error is returned to the caller. Nothing is rolled back;
//! [`MutationObserver`] is notified at both steps so a compensating action
//! can be attached later.

mod git;
mod init;
mod runner;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use init::ProjectInitializer;
pub use runner::{TestRunner, MANIFEST_FILE};

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::models::{CommitSummary, Mutation};
use crate::sandbox::PathSandbox;
use git::Git;

/// Hook around the mutate-then-commit sequence.
pub trait MutationObserver: Send + Sync {
    /// The working tree of `project` now reflects `mutation`; the commit has
    /// not happened yet.
    fn mutated(&self, _project: &str, _mutation: &Mutation) {}

    /// The commit for `mutation` failed; the working tree is ahead of history.
    fn commit_failed(&self, _project: &str, _mutation: &Mutation, _error: &StoreError) {}
}

/// Default observer: records commit failures in the log.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl MutationObserver for LoggingObserver {
    fn commit_failed(&self, project: &str, mutation: &Mutation, error: &StoreError) {
        tracing::warn!(
            project,
            mutation = %mutation,
            "Commit failed; working tree left uncommitted: {}",
            error
        );
    }
}

/// Project and file operations confined to one root directory.
///
/// The store keeps no state between calls beyond its configuration: every
/// operation reads the filesystem afresh.
#[derive(Clone)]
pub struct VersionedStore {
    sandbox: PathSandbox,
    config: Config,
    observer: Arc<dyn MutationObserver>,
}

impl VersionedStore {
    /// Open a store rooted at `config.home`, creating the directory if needed.
    pub fn open(config: Config) -> StoreResult<Self> {
        let home = std::path::absolute(&config.home).map_err(StoreError::io(&config.home))?;
        fs::create_dir_all(&home).map_err(StoreError::io(&home))?;
        tracing::debug!(home = %home.display(), "Opened project store");

        Ok(Self {
            sandbox: PathSandbox::new(&home),
            config: Config { home, ..config },
            observer: Arc::new(LoggingObserver),
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn MutationObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn root(&self) -> &Path {
        self.sandbox.root()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn initializer(&self) -> ProjectInitializer {
        ProjectInitializer::new(self.sandbox.clone(), self.config.clone())
    }

    pub fn test_runner(&self) -> TestRunner {
        TestRunner::new(
            self.sandbox.clone(),
            self.config.default_test_command.clone(),
        )
    }

    // ============================================================
    // Read operations
    // ============================================================

    pub fn list_projects(&self) -> StoreResult<Vec<String>> {
        read_dir_names(self.root())
    }

    /// Entries of `dir` (relative to the project, `.` for its top level).
    pub fn list_files(&self, project: &str, dir: &str) -> StoreResult<Vec<String>> {
        let path = self.sandbox.resolve(project, &[dir])?;
        read_dir_names(&path)
    }

    pub fn read_file(&self, project: &str, file: &str) -> StoreResult<String> {
        let path = self.sandbox.resolve_file(project, file)?;
        fs::read_to_string(&path).map_err(StoreError::io(&path))
    }

    /// Commits of `project`, newest first.
    pub fn history(&self, project: &str) -> StoreResult<Vec<CommitSummary>> {
        let dir = self.project_dir(project)?;
        self.git(&dir).log()
    }

    // ============================================================
    // Mutations
    // ============================================================

    pub fn initialize(&self, project: &str) -> StoreResult<String> {
        self.initializer().initialize(project)
    }

    /// Create or overwrite `file` with `content` and commit it.
    pub fn write_file(&self, project: &str, file: &str, content: &str) -> StoreResult<String> {
        let path = self.sandbox.resolve_file(project, file)?;
        let relative = self.sandbox.relative(project, &path)?;
        let dir = self.project_dir(project)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
        }
        fs::write(&path, content).map_err(StoreError::io(&path))?;

        let mutation = Mutation::Write {
            file: display(&relative),
        };
        self.commit(project, &dir, &mutation, &[relative.as_path()], |git| {
            git.add(&relative)
        })?;
        Ok("File written.".to_string())
    }

    /// Rename `from` to `to` through git so the history records a move.
    pub fn move_file(&self, project: &str, from: &str, to: &str) -> StoreResult<String> {
        let source = self.sandbox.resolve_file(project, from)?;
        let target = self.sandbox.resolve_file(project, to)?;
        let source_rel = self.sandbox.relative(project, &source)?;
        let target_rel = self.sandbox.relative(project, &target)?;
        let dir = self.project_dir(project)?;

        let created = create_parents(&target)?;
        if let Err(e) = self.git(&dir).mv(&source_rel, &target_rel) {
            for made in created.iter().rev() {
                if let Err(cleanup) = fs::remove_dir(made) {
                    tracing::debug!(dir = %made.display(), "Left directory in place: {}", cleanup);
                }
            }
            return Err(e);
        }

        let mutation = Mutation::Move {
            from: display(&source_rel),
            to: display(&target_rel),
        };
        self.commit(project, &dir, &mutation, &[source_rel.as_path(), target_rel.as_path()], |_| {
            Ok(String::new())
        })?;
        Ok("File moved.".to_string())
    }

    /// Delete `file` through git and commit the removal.
    pub fn remove_file(&self, project: &str, file: &str) -> StoreResult<String> {
        let path = self.sandbox.resolve_file(project, file)?;
        let relative = self.sandbox.relative(project, &path)?;
        let dir = self.project_dir(project)?;

        self.git(&dir).rm(&relative)?;

        let mutation = Mutation::Remove {
            file: display(&relative),
        };
        self.commit(project, &dir, &mutation, &[relative.as_path()], |_| {
            Ok(String::new())
        })?;
        Ok("File removed.".to_string())
    }

    pub fn test(&self, project: &str) -> StoreResult<String> {
        self.test_runner().run(project)
    }

    // ============================================================
    // Helpers
    // ============================================================

    fn git<'a>(&'a self, dir: &'a Path) -> Git<'a> {
        Git::new(dir, self.sandbox.root(), &self.config.author)
    }

    /// Resolve `project` and require that it exists; mutations never create
    /// a project implicitly.
    fn project_dir(&self, project: &str) -> StoreResult<PathBuf> {
        let dir = self.sandbox.resolve_project(project)?;
        fs::metadata(&dir).map_err(StoreError::io(&dir))?;
        Ok(dir)
    }

    /// Stage (via `stage`) and commit a mutation already applied to the tree.
    /// Only `paths` go into the commit; other staged changes stay staged.
    fn commit(
        &self,
        project: &str,
        dir: &Path,
        mutation: &Mutation,
        paths: &[&Path],
        stage: impl FnOnce(&Git<'_>) -> StoreResult<String>,
    ) -> StoreResult<()> {
        self.observer.mutated(project, mutation);

        let git = self.git(dir);
        let result = stage(&git).and_then(|_| git.commit(&mutation.commit_message(), paths));
        match result {
            Ok(_) => {
                tracing::info!(project, mutation = %mutation, "Committed");
                Ok(())
            }
            Err(e) => {
                self.observer.commit_failed(project, mutation, &e);
                Err(e)
            }
        }
    }
}

/// Create the missing ancestors of `path`, returning them outermost first.
fn create_parents(path: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut missing = Vec::new();
    let mut current = path.parent();
    while let Some(dir) = current {
        if dir.exists() {
            break;
        }
        missing.push(dir.to_path_buf());
        current = dir.parent();
    }
    missing.reverse();

    for dir in &missing {
        fs::create_dir(dir).map_err(StoreError::io(dir))?;
    }
    Ok(missing)
}

fn read_dir_names(path: &Path) -> StoreResult<Vec<String>> {
    fs::read_dir(path)
        .map_err(StoreError::io(path))?
        .map(|entry| {
            entry
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .map_err(StoreError::io(path))
        })
        .collect()
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
