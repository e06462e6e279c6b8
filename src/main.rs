//! starhub - hub-and-spoke specialist orchestration
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use starhub::llm::{create_provider, LLMProvider, ScriptedProvider};
use starhub::{Config, ProviderKind, Repl};
use tracing_subscriber::EnvFilter;

/// starhub - route a task through specialist LLM workers and synthesize one answer
#[derive(Parser, Debug)]
#[command(name = "starhub")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Task to run once (non-interactive)
    #[arg(long, short = 't')]
    task: Option<String>,

    /// Model used by workers and synthesis
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Provider backend: ollama or openai
    #[arg(long)]
    provider: Option<String>,

    /// Config file to use instead of ~/.config/starhub/config.toml
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Print each worker's contribution and enable debug logging
    #[arg(long, short = 'd')]
    debug: bool,

    /// Use the offline scripted provider instead of a real model
    #[arg(long)]
    dry_run: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing(debug: bool) -> anyhow::Result<()> {
    let default_level = if debug { "starhub=debug" } else { "starhub=warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("{}", Config::default_config_toml());
        return Ok(());
    }

    init_tracing(args.debug)?;

    // Build configuration
    let mut config = match args.config {
        Some(ref path) => {
            let _ = dotenvy::dotenv();
            Config::load_from_path(path)?
        }
        None => Config::load(),
    };

    // Apply CLI overrides
    if let Some(ref provider) = args.provider {
        config.set_provider(provider.parse::<ProviderKind>()?);
    }

    if let Some(ref model) = args.model {
        config.set_model(model.clone());
    }

    if args.debug {
        config.orchestration.debug = true;
    }

    // Reject a bad roster before touching the network
    config.build_roster()?;

    let llm: Arc<dyn LLMProvider> = if args.dry_run {
        Arc::new(ScriptedProvider::new())
    } else {
        create_provider(&config)?
    };

    tracing::debug!(provider = llm.name(), model = %config.model.name, "Provider ready");

    // Single task mode
    if let Some(task) = args.task {
        starhub::cli::run_task(&config, llm, &task).await?;
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::new(config, llm);
    repl.run().await?;

    Ok(())
}
