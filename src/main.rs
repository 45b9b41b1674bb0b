//! todo-sync command-line client.
//!
//! ```text
//! todo-sync [--config todo.toml] [--url https://host/] <list|add|complete|delete>
//! ```
//!
//! Set `TODO_SYNC_TOKEN` to authenticate requests and `RUST_LOG=todo_sync=debug`
//! to see the HTTP exchange log.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use todo_sync::config::loader::{apply_env_overrides, load_config};
use todo_sync::http::StaticTokenProvider;
use todo_sync::observability::logging::init_logging;
use todo_sync::{ClientConfig, RemoteTodoService, TodoItem, TodoService};

/// Environment variable holding a pre-issued token.
const TOKEN_ENV: &str = "TODO_SYNC_TOKEN";

#[derive(Parser)]
#[command(name = "todo-sync")]
#[command(about = "Command-line client for a hosted to-do table", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service base address (overrides the configuration)
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all items
    List,
    /// Add a new item
    Add { title: String },
    /// Mark an item complete (or incomplete with --undo)
    Complete {
        id: String,
        #[arg(long)]
        undo: bool,
    },
    /// Delete an item
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = ClientConfig::default();
            apply_env_overrides(&mut config);
            config
        }
    };
    if let Some(url) = cli.url {
        config.endpoint.service_uri = url;
    }

    init_logging(&config.observability);
    tracing::debug!(service_uri = %config.endpoint.service_uri, table = %config.endpoint.table, "Configuration loaded");

    let mut service = RemoteTodoService::new(config)?;
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        service = service.with_token_provider(Arc::new(StaticTokenProvider::new(token)));
    }

    match cli.command {
        Commands::List => {
            let items = service.get_items().await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        Commands::Add { title } => {
            let saved = service.save_item(Some(&TodoItem::new(title))).await?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        Commands::Complete { id, undo } => {
            let mut item = fetch(&service, &id).await?;
            item.is_complete = !undo;
            let saved = service.save_item(Some(&item)).await?;
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        Commands::Delete { id } => {
            let item = fetch(&service, &id).await?;
            service.remove_item(Some(&item)).await?;
            println!("Deleted {}", id);
        }
    }

    Ok(())
}

async fn fetch(service: &RemoteTodoService, id: &str) -> Result<TodoItem, Box<dyn std::error::Error>> {
    match service.get_item(id).await? {
        Some(item) => Ok(item),
        None => Err(format!("No item with id '{}'", id).into()),
    }
}
