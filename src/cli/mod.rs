//! CLI module - command-line interface
//!
//! Contains the REPL, command parsing, and console progress output.

pub mod commands;
pub mod progress;
pub mod repl;

use std::sync::Arc;

use crate::agent::{GraphExecutor, RunReport};
use crate::core::{Config, Result};
use crate::llm::LLMProvider;

pub use repl::Repl;

/// Run one task with console progress and print the final synthesis
pub async fn run_task(config: &Config, llm: Arc<dyn LLMProvider>, task: &str) -> Result<RunReport> {
    let executor = GraphExecutor::from_config(config, llm)?
        .with_progress(progress::console_sink(config.orchestration.debug));

    let report = executor.run(task).await?;
    println!("{}", progress::format_final(&report.answer));
    Ok(report)
}
