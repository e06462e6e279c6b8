//! starhub - hub-and-spoke orchestration of specialist LLM workers
//!
//! A task enters a star-shaped graph: the hub routes it through each
//! specialist of a fixed roster exactly once, every specialist reads the
//! shared transcript and appends one contribution, and once all have spoken
//! the hub synthesizes a single final answer.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Generation service abstraction with Ollama and OpenAI-compatible backends
//! - **Agent**: Roster, orchestration state, hub, workers, and the graph executor
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use starhub::agent::GraphExecutor;
//! use starhub::llm::create_provider;
//! use starhub::Config;
//!
//! #[tokio::main]
//! async fn main() -> starhub::Result<()> {
//!     let config = Config::load();
//!     let llm = create_provider(&config)?;
//!     let executor = GraphExecutor::from_config(&config, llm)?;
//!
//!     let report = executor.run("Explain the main trade-offs of renewable energy.").await?;
//!     println!("{}", report.answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;

// Re-export commonly used items
pub use agent::{GraphExecutor, ProgressEvent, RunReport};
pub use cli::Repl;
pub use core::{Config, HubError, ProviderKind, Result};
