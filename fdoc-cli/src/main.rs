//! fdoc CLI - Command-line interface for fdoc
//!
//! Dependency diagrams for Vue/TypeScript projects, and a sandbox that
//! runs a snippet and documents what it produced.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "fdoc")]
#[command(author = "fdoc Contributors")]
#[command(version)]
#[command(about = "Import graphs and live snippet fixtures for front-end projects", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .fdoc/config.json in the project root
    Init,

    /// Scan the configured directories and build the reverse index
    Index {
        /// Also write the import graph as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what a file depends on
    Deps {
        file: PathBuf,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which files import a file
    Dependents {
        file: PathBuf,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show index statistics, hotspots and import cycles
    Status {
        /// List indexed files
        #[arg(long)]
        files: bool,
    },

    /// Export the import graph to JSON
    Export {
        /// Output file
        #[arg(short, long, default_value = "fdoc-graph.json")]
        output: PathBuf,
    },

    /// Inspect one cache namespace (files, folders or indexes) after indexing
    Cache {
        namespace: String,

        /// Show a single entry
        key: Option<String>,
    },

    /// Index, then keep the file cache in sync with changes on disk
    Watch,

    /// Run a snippet in the sandbox and print what it logged last
    Exec {
        /// File holding the snippet (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Append the result as a doc comment after the snippet
        #[arg(long, conflicts_with = "fixture")]
        comment: bool,

        /// Write the result to a new fixture file
        #[arg(long)]
        fixture: bool,
    },

    /// List doc comments in a file, or delete one
    Comments {
        file: PathBuf,

        /// Number of the comment to delete (as listed)
        #[arg(short, long)]
        delete: Option<usize>,
    },

    /// Print a configured documentation page
    Docs { name: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let root = cli.root;
    let result = match cli.command {
        Commands::Init => commands::init(&root),
        Commands::Index { output } => commands::index(&root, output.as_deref()).await,
        Commands::Deps { file, json } => commands::deps(&root, &file, json).await,
        Commands::Dependents { file, json } => commands::dependents(&root, &file, json).await,
        Commands::Status { files } => commands::status(&root, files).await,
        Commands::Export { output } => commands::export(&root, &output).await,
        Commands::Cache { namespace, key } => commands::cache(&root, &namespace, key.as_deref()).await,
        Commands::Watch => commands::watch(&root).await,
        Commands::Exec {
            file,
            comment,
            fixture,
        } => commands::exec(&root, file.as_deref(), comment, fixture).await,
        Commands::Comments { file, delete } => commands::comments(&root, &file, delete),
        Commands::Docs { name } => commands::docs(&root, &name).await,
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
