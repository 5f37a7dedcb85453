//! Thin wrapper over the `git` executable, scoped to one project directory.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use crate::config::Author;
use crate::error::{StoreError, StoreResult};
use crate::models::CommitSummary;

const FIELD_SEP: char = '\u{1f}';

/// Runs git inside a project directory as the configured author.
///
/// Repository discovery never climbs above `ceiling` (the store root), so a
/// project without its own `.git` fails instead of landing in an enclosing
/// repository.
pub struct Git<'a> {
    dir: &'a Path,
    ceiling: &'a Path,
    author: &'a Author,
}

impl<'a> Git<'a> {
    pub fn new(dir: &'a Path, ceiling: &'a Path, author: &'a Author) -> Self {
        Self {
            dir,
            ceiling,
            author,
        }
    }

    /// Run git with `args`, returning trimmed stdout on success.
    pub fn run<I, S>(&self, args: I) -> StoreResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let command = format!(
            "git {}",
            args.iter()
                .map(|a| a.as_ref().to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        tracing::debug!(dir = %self.dir.display(), "{}", command);

        let output = Command::new("git")
            .args(&args)
            .current_dir(self.dir)
            .env("GIT_CEILING_DIRECTORIES", self.ceiling)
            .env("GIT_AUTHOR_NAME", &self.author.name)
            .env("GIT_AUTHOR_EMAIL", &self.author.email)
            .env("GIT_COMMITTER_NAME", &self.author.name)
            .env("GIT_COMMITTER_EMAIL", &self.author.email)
            .output()
            .map_err(|e| StoreError::Subprocess {
                command: command.clone(),
                stderr: format!("failed to spawn: {e}"),
                exit_code: None,
            })?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
        } else {
            Err(StoreError::Subprocess {
                command,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                exit_code: output.status.code(),
            })
        }
    }

    pub fn init(&self) -> StoreResult<String> {
        let out = self.run(["init"])?;
        self.run(["config", "--local", "user.name", self.author.name.as_str()])?;
        self.run(["config", "--local", "user.email", self.author.email.as_str()])?;
        Ok(out)
    }

    pub fn add(&self, path: &Path) -> StoreResult<String> {
        self.run([OsStr::new("add"), OsStr::new("--"), path.as_os_str()])
    }

    pub fn add_all(&self) -> StoreResult<String> {
        self.run(["add", "."])
    }

    pub fn mv(&self, from: &Path, to: &Path) -> StoreResult<String> {
        self.run([
            OsStr::new("mv"),
            OsStr::new("--"),
            from.as_os_str(),
            to.as_os_str(),
        ])
    }

    pub fn rm(&self, path: &Path) -> StoreResult<String> {
        self.run([OsStr::new("rm"), OsStr::new("--"), path.as_os_str()])
    }

    /// Commit `paths` alone, leaving anything else in the index staged. With
    /// no paths the whole index is committed. Empty commits are allowed so
    /// that every logical mutation produces exactly one history entry.
    pub fn commit(&self, message: &str, paths: &[&Path]) -> StoreResult<String> {
        let mut args = vec![
            OsStr::new("-c"),
            OsStr::new("commit.gpgsign=false"),
            OsStr::new("commit"),
            OsStr::new("--allow-empty"),
            OsStr::new("-m"),
            OsStr::new(message),
        ];
        if !paths.is_empty() {
            args.push(OsStr::new("--only"));
            args.push(OsStr::new("--"));
            args.extend(paths.iter().map(|p| p.as_os_str()));
        }
        self.run(args)
    }

    pub fn log(&self) -> StoreResult<Vec<CommitSummary>> {
        let out = self.run(["log", "--format=%H%x1f%an%x1f%s"])?;
        Ok(out.lines().filter_map(parse_log_line).collect())
    }
}

fn parse_log_line(line: &str) -> Option<CommitSummary> {
    let mut fields = line.splitn(3, FIELD_SEP);
    Some(CommitSummary {
        id: fields.next()?.to_string(),
        author: fields.next()?.to_string(),
        message: fields.next().unwrap_or_default().to_string(),
    })
}
