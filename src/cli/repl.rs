//! Interactive REPL for starhub
//!
//! Each input line is a task routed through the full roster.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use crate::agent::{GraphExecutor, OrchestrationState};
use crate::cli::commands::{handle_command, CommandResult};
use crate::cli::progress::{console_sink, format_final};
use crate::core::{Config, Result};
use crate::llm::LLMProvider;

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    config: Config,
    llm: Arc<dyn LLMProvider>,
    last_run: Option<OrchestrationState>,
}

impl Repl {
    pub fn new(config: Config, llm: Arc<dyn LLMProvider>) -> Self {
        Self {
            config,
            llm,
            last_run: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        self.llm.list_models().await
    }

    /// State of the most recent run, finished or aborted
    pub fn last_run(&self) -> Option<&OrchestrationState> {
        self.last_run.as_ref()
    }

    pub fn clear(&mut self) {
        self.last_run = None;
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("Task: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            match handle_command(&input, self).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Clear) => {
                    println!("Last run cleared.\n");
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                }
                Ok(CommandResult::None) => {}
                Ok(CommandResult::Retry) => {
                    if let Some(state) = self.last_run.take() {
                        self.execute(state).await;
                    }
                }
                Ok(CommandResult::Continue(task)) => {
                    self.execute(OrchestrationState::new(task)).await;
                }
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    /// Drive `state` to completion and keep it as the last run either way
    async fn execute(&mut self, mut state: OrchestrationState) {
        let executor = match GraphExecutor::from_config(&self.config, Arc::clone(&self.llm)) {
            Ok(executor) => executor.with_progress(console_sink(self.config.orchestration.debug)),
            Err(e) => {
                eprintln!("\nError: {}\n", e);
                self.last_run = Some(state);
                return;
            }
        };

        match executor.drive(&mut state).await {
            Ok(answer) => println!("{}\n", format_final(&answer)),
            Err(e) => {
                eprintln!("\nError: {}", e);
                eprintln!("Type 'retry' to resume from the failed step.\n");
            }
        }

        self.last_run = Some(state);
    }

    fn print_banner(&self) {
        println!("starhub: hub-and-spoke specialist orchestration");
        println!("Provider: {}", self.llm.name());
        println!("Model:    {}", self.config.model.name);
        println!(
            "Roster:   {}",
            self.config
                .roster
                .iter()
                .map(|w| w.id.as_str())
                .collect::<Vec<_>>()
                .join(" → ")
        );
        println!();
        println!("Commands: help, roster, status, history, retry, exit");
        println!("────────────────────────────────────────────────────────────");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedProvider;

    #[tokio::test]
    async fn test_aborted_run_is_kept_for_retry() {
        let llm = Arc::new(ScriptedProvider::new().fail_on_call(2));
        let mut repl = Repl::new(Config::default(), llm);

        repl.execute(OrchestrationState::new("task")).await;
        let aborted = repl.last_run().unwrap();
        assert_eq!(aborted.visited().len(), 1);
        assert!(aborted.final_answer().is_none());

        let state = repl.last_run.take().unwrap();
        repl.execute(state).await;
        let finished = repl.last_run().unwrap();
        assert_eq!(finished.visited().len(), 4);
        assert!(finished.final_answer().is_some());
    }

    #[tokio::test]
    async fn test_state_survives_executor_build_failure() {
        let llm = Arc::new(ScriptedProvider::new().fail_on_call(1));
        let mut repl = Repl::new(Config::default(), llm);
        repl.execute(OrchestrationState::new("task")).await;

        repl.config_mut().roster.clear();
        let state = repl.last_run.take().unwrap();
        repl.execute(state).await;

        let kept = repl.last_run().unwrap();
        assert_eq!(kept.task(), "task");
        assert!(kept.final_answer().is_none());
    }
}
