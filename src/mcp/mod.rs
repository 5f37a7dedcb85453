//! MCP server exposing the command catalog as tools.

mod types;

use std::sync::Arc;

pub use types::*;

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde_json::Value;

use crate::commands::CommandRegistry;
use crate::error::CommandError;
use crate::models::Attributes;

#[derive(Clone)]
pub struct McpServer {
    registry: Arc<CommandRegistry>,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            tool_router: Self::tool_router(),
        }
    }

    /// Route a command through the registry on the blocking pool.
    ///
    /// Validation failures are protocol errors; store failures are returned
    /// as tool errors so the agent can read the message and adjust.
    pub async fn dispatch(
        &self,
        name: &str,
        attributes: Attributes,
        body: Option<String>,
    ) -> Result<CallToolResult, McpError> {
        let registry = Arc::clone(&self.registry);
        let command = name.to_string();
        let result = tokio::task::spawn_blocking(move || {
            registry.dispatch(&command, &attributes, body.as_deref())
        })
        .await
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        match result {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e @ (CommandError::UnknownCommand(_) | CommandError::Validation { .. })) => {
                Err(McpError::invalid_params(e.to_string(), None))
            }
            Err(CommandError::Store(e)) => {
                tracing::warn!(command = name, "Tool failed: {}", e);
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}

fn attributes<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> Attributes {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value)))
        .collect()
}

#[tool_router]
impl McpServer {
    #[tool(description = "List the names of all projects, one per line.")]
    async fn list_projects(&self) -> Result<CallToolResult, McpError> {
        self.dispatch("list", Attributes::new(), None).await
    }

    #[tool(
        description = "Create a new project with its own git history. Generates a project.json manifest (name, author, repository, scripts.test), a .gitignore, and the first commit. Fails if the project already exists. Returns a transcript ending in 'Project created.'"
    )]
    async fn initialize_project(
        &self,
        params: Parameters<ProjectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        self.dispatch("initialize", attributes([("project", req.project)]), None)
            .await
    }

    #[tool(
        description = "List the entries of a directory in a project, one per line. Includes hidden entries such as .git."
    )]
    async fn list_files(
        &self,
        params: Parameters<ListFilesRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        let mut attrs = vec![("project", req.project)];
        if let Some(directory) = req.directory {
            attrs.push(("directory", directory));
        }
        self.dispatch("files", attributes(attrs), None).await
    }

    #[tool(description = "Read the full text content of a file in a project.")]
    async fn read_file(&self, params: Parameters<FileRequest>) -> Result<CallToolResult, McpError> {
        let req = params.0;
        self.dispatch(
            "read",
            attributes([("project", req.project), ("file", req.file)]),
            None,
        )
        .await
    }

    #[tool(
        description = "Create or overwrite a file in a project with the given content, then commit it. Parent directories are created as needed. Side effect: one git commit."
    )]
    async fn write_file(
        &self,
        params: Parameters<WriteFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        self.dispatch(
            "write",
            attributes([("project", req.project), ("file", req.file)]),
            Some(req.content),
        )
        .await
    }

    #[tool(
        description = "Rename a tracked file within a project (git mv), then commit. Side effect: one git commit."
    )]
    async fn move_file(
        &self,
        params: Parameters<MoveFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        self.dispatch(
            "move",
            attributes([
                ("project", req.project),
                ("file", req.file),
                ("to", req.to),
            ]),
            None,
        )
        .await
    }

    #[tool(
        description = "Delete a tracked file from a project (git rm), then commit. Side effect: one git commit."
    )]
    async fn remove_file(
        &self,
        params: Parameters<FileRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        self.dispatch(
            "remove",
            attributes([("project", req.project), ("file", req.file)]),
            None,
        )
        .await
    }

    #[tool(
        description = "Run the project's test command (scripts.test in project.json) and return its output. A failing run is returned as text, not as an error, so you can read why it failed."
    )]
    async fn test_project(
        &self,
        params: Parameters<ProjectRequest>,
    ) -> Result<CallToolResult, McpError> {
        let req = params.0;
        self.dispatch("test", attributes([("project", req.project)]), None)
            .await
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "keeper".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"Keeper stores projects as directories, each with its own git history.

Every write, move and remove is committed immediately, so the history is an
audit log of your changes. Paths are always relative to the project root and
can never leave it: '..' segments, absolute paths and anything inside .git
are rejected.

WORKFLOW:
1. list_projects to see what exists; initialize_project to create a new one
2. list_files / read_file to explore
3. write_file / move_file / remove_file to change files (one commit each)
4. test_project to run the project's declared tests (scripts.test in project.json)

To change how a project is tested, write a new project.json with a
"scripts": { "test": "<shell command>" } entry."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(registry: CommandRegistry) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server via stdio");

    let service = McpServer::new(registry);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}
