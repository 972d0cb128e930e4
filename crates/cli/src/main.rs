//! Support CLI
//!
//! Main entry point for the `support` command-line tool.
//! Answers customer-support questions from a local corpus with retrieval
//! and a language model.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, CorpusCommand, FollowUpCommand, RetrieveCommand};
use std::path::PathBuf;
use std::process::ExitCode;
use support_core::{config::AppConfig, logging, AppResult};

/// Support CLI - grounded answers from your support corpus
#[derive(Parser, Debug)]
#[command(name = "support")]
#[command(about = "Grounded customer-support answers from a local corpus", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "SUPPORT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "SUPPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Corpus file or directory (default: data/faq.txt)
    #[arg(long, global = true, env = "SUPPORT_CORPUS")]
    corpus: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (gemini, ollama)
    #[arg(short, long, global = true, env = "SUPPORT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "SUPPORT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a support question
    Ask(AskCommand),

    /// Ask a follow-up question
    FollowUp(FollowUpCommand),

    /// Show retrieved facts without generating an answer
    Retrieve(RetrieveCommand),

    /// Inspect the support corpus
    Corpus(CorpusCommand),

    /// Interactive conversation
    Chat(ChatCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Ask(_) => "ask",
            Commands::FollowUp(_) => "follow-up",
            Commands::Retrieve(_) => "retrieve",
            Commands::Corpus(_) => "corpus",
            Commands::Chat(_) => "chat",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    // Load base configuration from file and environment
    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.corpus,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Corpus: {:?}", config.corpus_path());
    tracing::debug!("Provider: {} ({})", config.provider, config.model);
    tracing::debug!(
        "Embeddings: {} ({})",
        config.embedding_provider,
        config.embedding_model
    );

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::FollowUp(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Corpus(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
