//! `shelf`: command-line front-end for the book collection.

mod commands;
mod error;

use crate::commands::App;
use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use shelf_config::Config;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shelf", version, about = "Personal book collection", long_about = None)]
struct Cli {
    /// Configuration file to use instead of the ones in the config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add documents to the collection
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List items in the collection
    List {
        /// Include soft-deleted items
        #[arg(short, long)]
        all: bool,
    },
    /// Find items (including soft-deleted ones) by id prefix
    Find { prefix: String },
    /// Soft-delete an item
    Delete { prefix: String },
    /// Soft-delete every active item
    DeleteAll,
    /// Restore a soft-deleted item
    Restore { prefix: String },
    /// Mark an item as read
    Read { prefix: String },
    /// Mark an item as unread
    Unread { prefix: String },
    /// Add tags to an item
    Tag {
        prefix: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Remove tags from an item
    Untag {
        prefix: String,
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Permanently remove an item and its cover
    Purge { prefix: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err:?}");
            return ExitCode::FAILURE;
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log)))
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "command failed");
            eprintln!("error: {}", *err);
            ExitCode::FAILURE
        },
    }
}

fn load_config(file: Option<&Path>) -> Result<Config> {
    Config::load(file).or_raise(|| ErrorKind::Config)
}

async fn run(command: Command, config: Config) -> Result<()> {
    if let Some(parent) = config.database.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Database)?;
    }
    let app = App::open(&config).await?;
    let result = match command {
        Command::Add { paths } => app.add(&paths).await,
        Command::List { all } => app.list(all).await,
        Command::Find { prefix } => app.find(&prefix).await,
        Command::Delete { prefix } => app.set_deleted(&prefix, true).await,
        Command::DeleteAll => app.delete_all().await,
        Command::Restore { prefix } => app.set_deleted(&prefix, false).await,
        Command::Read { prefix } => app.set_read(&prefix, true).await,
        Command::Unread { prefix } => app.set_read(&prefix, false).await,
        Command::Tag { prefix, tags } => app.tag(&prefix, &tags, true).await,
        Command::Untag { prefix, tags } => app.tag(&prefix, &tags, false).await,
        Command::Purge { prefix } => app.purge(&prefix).await,
    };
    app.close().await;
    result
}
