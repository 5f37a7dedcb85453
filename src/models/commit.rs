use serde::{Deserialize, Serialize};

/// A commit in a project's history, newest first when listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub id: String,
    pub author: String,
    pub message: String,
}
