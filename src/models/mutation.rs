use std::fmt;

/// A logical change to a project's working tree. Each one is paired with
/// exactly one commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Write { file: String },
    Move { from: String, to: String },
    Remove { file: String },
}

impl Mutation {
    /// The commit message recorded for this mutation.
    pub fn commit_message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write { file } => write!(f, "Write {file}"),
            Self::Move { from, to } => write!(f, "Move {from} to {to}"),
            Self::Remove { file } => write!(f, "Remove {file}"),
        }
    }
}
