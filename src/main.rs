use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsnip::config::{Config, OutputStructure};
use docsnip::walker::SnippetExtractor;
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser)]
#[command(
    name = "docsnip",
    version,
    about = "Extracts tagged code snippets from source trees for documentation"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: PathBuf,

    /// Override the configured output directory structure
    #[arg(long, value_enum)]
    structure: Option<OutputStructure>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Delete the snippet output directory instead of extracting
    Clear,
}

#[tokio::main]
async fn main() {
    env_logger::init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_file(&cli.config)?;
    if let Some(structure) = cli.structure {
        config.output_directory_structure = structure;
    }

    match cli.command {
        Some(Command::Clear) => clear_output_directory(&config).await,
        None => SnippetExtractor::new(config)?.run().await,
    }
}

async fn clear_output_directory(config: &Config) -> Result<()> {
    let dir = &config.snippet_output_directory;
    if tokio::fs::try_exists(dir).await? {
        tokio::fs::remove_dir_all(dir)
            .await
            .with_context(|| format!("Failed to remove output directory {}", dir.display()))?;
        log::info!("Removed output directory {}", dir.display());
    } else {
        eprintln!("Output directory does not exist: {}", dir.display());
    }
    Ok(())
}
