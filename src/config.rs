//! Store configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `KEEPER_*` environment variables, then command-line overrides applied by
//! the binary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "keeper";
const CONFIG_FILE: &str = "config.json";

/// Identity recorded on every commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            name: "keeper".to_string(),
            email: "keeper@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding every project.
    pub home: PathBuf,
    pub author: Author,
    /// Directory copied into each new project. A manifest is generated when unset.
    pub template: Option<PathBuf>,
    /// Prefix joined with the project name for the manifest's repository field
    /// (e.g. `https://github.com/acme`).
    pub repository_prefix: Option<String>,
    /// Test command for projects whose manifest declares none.
    pub default_test_command: Option<String>,
    /// Shell command run inside a new project before its first commit.
    pub install_command: Option<String>,
    /// Entries written to each new project's `.gitignore`.
    pub ignore: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home: default_home(),
            author: Author::default(),
            template: None,
            repository_prefix: None,
            default_test_command: None,
            install_command: None,
            ignore: vec!["node_modules".to_string(), "target".to_string()],
        }
    }
}

impl Config {
    /// A default configuration rooted at `home`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            ..Self::default()
        }
    }

    /// Load from `path` (or the user config file when `None`), then apply
    /// environment overrides. A missing default file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        Ok(config.with_env())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply `KEEPER_*` environment variables over the current values.
    pub fn with_env(self) -> Self {
        self.with_vars(|key| std::env::var(key).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(home) = var("KEEPER_HOME") {
            self.home = PathBuf::from(home);
        }
        if let Some(name) = var("KEEPER_AUTHOR_NAME") {
            self.author.name = name;
        }
        if let Some(email) = var("KEEPER_AUTHOR_EMAIL") {
            self.author.email = email;
        }
        if let Some(template) = var("KEEPER_TEMPLATE") {
            self.template = Some(PathBuf::from(template));
        }
        if let Some(prefix) = var("KEEPER_REPOSITORY_PREFIX") {
            self.repository_prefix = Some(prefix);
        }
        self
    }
}

fn default_home() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join("projects"))
        .unwrap_or_else(|| PathBuf::from("data/projects"))
}

fn config_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Some(path)
}
