//! # docsmith CLI
//!
//! Command-line interface for the docsmith documentation builder.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docsmith")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "docsmith.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new docsmith project
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Build every page under the content directory
    Build,

    /// Compile a single page and print the result
    Compile {
        /// MDX or Markdown file
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = CompileFormat::Html)]
        format: CompileFormat,
    },

    /// Build, then rebuild whenever content changes
    Watch,
}

#[derive(Copy, Clone, ValueEnum)]
pub enum CompileFormat {
    /// Rendered HTML body
    Html,
    /// The whole compiled document
    Json,
    /// Page outline only
    Sections,
    /// Table of contents fragment
    Toc,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `compile` output can be piped
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_project(path.as_deref()),
        Commands::Build => commands::build_site(&cli.config),
        Commands::Compile { file, format } => commands::compile_file(&cli.config, &file, format),
        Commands::Watch => commands::watch_site(&cli.config).await,
    }
}
