//! The command catalog exposed to agents.
//!
//! A [`CommandRegistry`] is an ordered list of [`Command`]s built once from a
//! store and a test runner. Order is part of the contract: callers may address
//! commands by position. Each command validates its attributes without
//! touching the filesystem, then executes against the bound store.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::error::CommandError;
use crate::models::{text_attribute, Attributes, CommandExample, CommandInfo};
use crate::store::{TestRunner, VersionedStore};

/// The operations in the catalog, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    List,
    Initialize,
    Files,
    Read,
    Write,
    Move,
    Remove,
    Test,
}

impl CommandKind {
    pub const ALL: [CommandKind; 8] = [
        Self::List,
        Self::Initialize,
        Self::Files,
        Self::Read,
        Self::Write,
        Self::Move,
        Self::Remove,
        Self::Test,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Initialize => "initialize",
            Self::Files => "files",
            Self::Read => "read",
            Self::Write => "write",
            Self::Move => "move",
            Self::Remove => "remove",
            Self::Test => "test",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::List => "Lists all available projects.",
            Self::Initialize => "Creates a new project with the specified name.",
            Self::Files => "Lists all files in the specified project.",
            Self::Read => "Reads the contents of a file in the specified project.",
            Self::Write => {
                "Writes the provided content to the specified file in the specified project."
            }
            Self::Move => "Moves the specified file in the specified project to a new name.",
            Self::Remove => "Removes the specified file from the specified project.",
            Self::Test => "Runs tests for the specified project.",
        }
    }

    pub fn example(self) -> CommandExample {
        let attributes = match self {
            Self::List => json!({}),
            Self::Initialize | Self::Files | Self::Test => json!({ "project": "my-project" }),
            Self::Read | Self::Write | Self::Remove => {
                json!({ "project": "my-project", "file": "example.txt" })
            }
            Self::Move => json!({
                "project": "my-project",
                "file": "example.txt",
                "to": "new-example.txt"
            }),
        };
        let body = match self {
            Self::Write => Some("This is the content of the example.txt file.".to_string()),
            _ => None,
        };
        CommandExample {
            attributes: as_object(attributes),
            body,
        }
    }

    /// Attribute names this command requires to be text.
    fn required(self) -> &'static [&'static str] {
        match self {
            Self::List => &[],
            Self::Initialize | Self::Files | Self::Test => &["project"],
            Self::Read | Self::Write | Self::Remove => &["project", "file"],
            Self::Move => &["project", "file", "to"],
        }
    }

    /// Pure check of attribute presence and shape; never touches the filesystem.
    pub fn validate(self, attributes: &Attributes, body: Option<&str>) -> bool {
        let required_present = self
            .required()
            .iter()
            .all(|key| text_attribute(attributes, key).is_some());
        let optional_ok = match self {
            Self::Files => attributes.get("directory").map_or(true, Value::is_string),
            _ => true,
        };
        let body_ok = match self {
            Self::Write => body.is_some(),
            _ => true,
        };
        required_present && optional_ok && body_ok
    }
}

fn as_object(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

/// One named, self-describing operation bound to a store and test runner.
#[derive(Clone)]
pub struct Command {
    kind: CommandKind,
    store: Arc<VersionedStore>,
    runner: Arc<TestRunner>,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }

    pub fn example(&self) -> CommandExample {
        self.kind.example()
    }

    pub fn info(&self) -> CommandInfo {
        CommandInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
            example: self.example(),
        }
    }

    pub fn validate(&self, attributes: &Attributes, body: Option<&str>) -> bool {
        self.kind.validate(attributes, body)
    }

    /// Run the bound operation. Does not re-run [`Command::validate`]; input
    /// it would have rejected surfaces as [`CommandError::Validation`].
    pub fn execute(&self, attributes: &Attributes, body: Option<&str>) -> Result<String, CommandError> {
        let text = |key: &str| {
            text_attribute(attributes, key).ok_or_else(|| CommandError::Validation {
                command: self.name().to_string(),
            })
        };

        let result = match self.kind {
            CommandKind::List => self.store.list_projects().map(|names| names.join("\n")),
            CommandKind::Initialize => self.store.initialize(text("project")?),
            CommandKind::Files => {
                let directory = text_attribute(attributes, "directory").unwrap_or(".");
                self.store
                    .list_files(text("project")?, directory)
                    .map(|names| names.join("\n"))
            }
            CommandKind::Read => self.store.read_file(text("project")?, text("file")?),
            CommandKind::Write => {
                let content = body.ok_or_else(|| CommandError::Validation {
                    command: self.name().to_string(),
                })?;
                self.store
                    .write_file(text("project")?, text("file")?, content)
            }
            CommandKind::Move => {
                self.store
                    .move_file(text("project")?, text("file")?, text("to")?)
            }
            CommandKind::Remove => self.store.remove_file(text("project")?, text("file")?),
            CommandKind::Test => self.runner.run(text("project")?),
        };

        Ok(result?)
    }
}

/// Ordered, immutable catalog of commands.
#[derive(Clone)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    pub fn new(store: VersionedStore, runner: TestRunner) -> Self {
        let store = Arc::new(store);
        let runner = Arc::new(runner);
        let commands = CommandKind::ALL
            .into_iter()
            .map(|kind| Command {
                kind,
                store: Arc::clone(&store),
                runner: Arc::clone(&runner),
            })
            .collect();
        Self { commands }
    }

    /// Registry whose test runner shares the store's configuration.
    pub fn from_store(store: VersionedStore) -> Self {
        let runner = store.test_runner();
        Self::new(store, runner)
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name() == name)
    }

    pub fn catalog(&self) -> Vec<CommandInfo> {
        self.commands.iter().map(Command::info).collect()
    }

    /// Look up `name`, gate on its validator, then execute.
    pub fn dispatch(
        &self,
        name: &str,
        attributes: &Attributes,
        body: Option<&str>,
    ) -> Result<String, CommandError> {
        let command = self
            .get(name)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))?;

        if !command.validate(attributes, body) {
            tracing::warn!(command = name, "Rejected invalid attributes");
            return Err(CommandError::Validation {
                command: name.to_string(),
            });
        }

        tracing::debug!(command = name, "Dispatching");
        command.execute(attributes, body)
    }
}
