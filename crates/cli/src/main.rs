//! storyloom CLI
//!
//! Main entry point for the storyloom command-line tool.
//! Builds a retrieval corpus from category directories of documents and
//! generates stories grounded in it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, IngestCommand, RetrieveCommand, StatsCommand, StoryCommand};
use std::path::PathBuf;
use storyloom_core::{config::AppConfig, logging};
use tracing::Instrument;

/// storyloom - retrieval-grounded story generation over a document corpus
#[derive(Parser, Debug)]
#[command(name = "storyloom")]
#[command(about = "Retrieval-grounded story generation over a document corpus", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "STORYLOOM_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "STORYLOOM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "STORYLOOM_JSON_LOGS")]
    json_logs: bool,

    /// Generation provider (ollama, groq, openai)
    #[arg(short, long, global = true, env = "STORYLOOM_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "STORYLOOM_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the corpus index from the document directory
    Ingest(IngestCommand),

    /// Find the chunks nearest to a query
    Retrieve(RetrieveCommand),

    /// Generate a story, optionally grounded in a category
    Story(StoryCommand),

    /// Show corpus snapshot statistics
    Stats(StatsCommand),

    /// List recorded story sessions
    History(HistoryCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.json_logs,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color, config.json_logs)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Retrieve(_) => "retrieve",
        Commands::Story(_) => "story",
        Commands::Stats(_) => "stats",
        Commands::History(_) => "history",
    };
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match cli.command {
            Commands::Ingest(cmd) => cmd.execute(&config).await,
            Commands::Retrieve(cmd) => cmd.execute(&config).await,
            Commands::Story(cmd) => cmd.execute(&config).await,
            Commands::Stats(cmd) => cmd.execute(&config),
            Commands::History(cmd) => cmd.execute(&config),
        }
    }
    .instrument(span)
    .await;

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    Ok(result?)
}
