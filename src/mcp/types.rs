//! Request types for MCP tools.

use rmcp::schemars::JsonSchema;
use serde::Deserialize;

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectRequest {
    #[schemars(description = "Project name: a single directory name such as 'my-project'")]
    pub project: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListFilesRequest {
    #[schemars(description = "Project name")]
    pub project: String,
    #[schemars(
        description = "Directory inside the project to list, relative to the project root. Defaults to the project root."
    )]
    #[serde(default)]
    pub directory: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FileRequest {
    #[schemars(description = "Project name")]
    pub project: String,
    #[schemars(description = "File path relative to the project root, e.g. 'src/main.rs'")]
    pub file: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WriteFileRequest {
    #[schemars(description = "Project name")]
    pub project: String,
    #[schemars(description = "File path relative to the project root")]
    pub file: String,
    #[schemars(description = "Complete new content of the file")]
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MoveFileRequest {
    #[schemars(description = "Project name")]
    pub project: String,
    #[schemars(description = "Current file path relative to the project root")]
    pub file: String,
    #[schemars(description = "New file path relative to the project root")]
    pub to: String,
}
