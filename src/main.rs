use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keeper::commands::CommandRegistry;
use keeper::config::Config;
use keeper::models::Attributes;
use keeper::store::VersionedStore;
use keeper::{api, mcp};

#[derive(Parser)]
#[command(name = "keeper")]
#[command(about = "Sandboxed, git-backed project storage for AI agents")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding all projects (overrides config and KEEPER_HOME)
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "17020")]
        port: u16,
    },
    /// Start MCP server via stdio
    Mcp,
    /// Print the command catalog as JSON
    Commands,
    /// Dispatch a single command and print its result
    Run {
        /// Command name (list, initialize, files, read, write, move, remove, test)
        name: String,

        /// Attribute as key=value; repeat for several
        #[arg(short = 'a', long = "attr", value_parser = parse_attribute)]
        attributes: Vec<(String, String)>,

        /// Body text
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,

        /// Read the body from a file, or from stdin when '-'
        #[arg(long)]
        body_file: Option<PathBuf>,
    },
}

fn parse_attribute(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

/// Initialize tracing with output to stderr (for MCP and run modes) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "keeper=debug,tower_http=debug".into()),
    );

    if use_stderr {
        // stdout carries the protocol or the command result
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn read_body(body: Option<String>, body_file: Option<PathBuf>) -> anyhow::Result<Option<String>> {
    match (body, body_file) {
        (Some(body), _) => Ok(Some(body)),
        (None, Some(path)) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read body from stdin")?;
            Ok(Some(buf))
        }
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Failed to read body from {}", path.display())),
        (None, None) => Ok(None),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, None | Some(Commands::Serve { .. }));
    init_tracing(use_stderr);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(home) = cli.home {
        config.home = home;
    }
    let store = VersionedStore::open(config)?;

    match cli.command.unwrap_or(Commands::Serve { port: 17020 }) {
        Commands::Serve { port } => {
            tracing::info!("Starting Keeper server on port {}", port);

            let app = api::create_router(store);

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("Keeper server listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await?;
        }
        Commands::Mcp => {
            mcp::run_stdio_server(CommandRegistry::from_store(store)).await?;
        }
        Commands::Commands => {
            let registry = CommandRegistry::from_store(store);
            println!("{}", serde_json::to_string_pretty(&registry.catalog())?);
        }
        Commands::Run {
            name,
            attributes,
            body,
            body_file,
        } => {
            let body = read_body(body, body_file)?;
            let attributes: Attributes = attributes
                .into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect();

            let registry = CommandRegistry::from_store(store);
            let output = tokio::task::spawn_blocking(move || {
                registry.dispatch(&name, &attributes, body.as_deref())
            })
            .await??;
            println!("{}", output);
        }
    }

    Ok(())
}
