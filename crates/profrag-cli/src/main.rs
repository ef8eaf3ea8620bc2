//! profrag CLI - Command-line interface
//!
//! Usage:
//!   profrag ask <question> [--history FILE] [--no-stream] [--config FILE]
//!   profrag check [--config FILE]

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use profrag_core::config::{AppConfig, LoggingConfig};
use profrag_core::Message;
use profrag_rag::ProfessorRag;
use profrag_vector::PineconeIndex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "profrag")]
#[command(about = "Professor recommendations from a rating index")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask for a professor recommendation
    Ask {
        /// Question to ask
        question: String,
        /// JSON file holding earlier turns as [{"role", "content"}]
        #[arg(long)]
        history: Option<PathBuf>,
        /// Wait for the full answer instead of streaming it
        #[arg(long)]
        no_stream: bool,
    },
    /// Validate configuration and resolve the index host
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config =
        AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Ask {
            question,
            history,
            no_stream,
        } => ask(&config, question, history.as_deref(), no_stream).await,
        Commands::Check => check(&config).await,
    }
}

/// Logs go to stderr so the answer alone lands on stdout
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "profrag_rag={level},profrag_vector={level}",
            level = logging.level
        )
        .into()
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn ask(
    config: &AppConfig,
    question: String,
    history: Option<&Path>,
    no_stream: bool,
) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;

    let history = match history {
        Some(path) => load_history(path)?,
        None => Vec::new(),
    };
    let conversation = build_conversation(history, question)?;

    let rag = ProfessorRag::from_config(config)
        .await
        .context("failed to initialize providers")?;

    let mut stdout = std::io::stdout();
    if no_stream {
        let answer = rag.answer(&conversation).await?;
        writeln!(stdout, "{answer}")?;
        return Ok(());
    }

    let mut stream = rag.answer_stream(&conversation).await?;
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        stdout.write_all(fragment.as_bytes())?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok(())
}

async fn check(config: &AppConfig) -> anyhow::Result<()> {
    config.validate().context("invalid configuration")?;
    println!("Configuration OK");
    println!("  chat model:      {}", config.openai.chat_model);
    println!("  embedding model: {}", config.openai.embedding_model);
    println!("  top_k:           {}", config.rag.top_k);

    let index = PineconeIndex::connect(&config.pinecone)
        .await
        .context("failed to resolve vector index")?;
    println!(
        "Index '{}' reachable at {} (namespace '{}')",
        config.pinecone.index_name,
        index.host_url(),
        index.namespace()
    );

    Ok(())
}

fn load_history(path: &Path) -> anyhow::Result<Vec<Message>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read history file {}", path.display()))?;
    parse_history(&content).with_context(|| format!("invalid history file {}", path.display()))
}

fn parse_history(content: &str) -> anyhow::Result<Vec<Message>> {
    Ok(serde_json::from_str(content)?)
}

/// Append the question as the final user turn
fn build_conversation(mut history: Vec<Message>, question: String) -> anyhow::Result<Vec<Message>> {
    if question.trim().is_empty() {
        bail!("question cannot be empty");
    }
    history.push(Message::user(question));
    Ok(history)
}
