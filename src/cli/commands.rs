//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::cli::repl::Repl;
use crate::core::Result;

/// Result of parsing a command
pub enum CommandResult {
    /// Treat input as a new task
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Resume the last aborted run
    Retry,
    /// Exit the REPL
    Exit,
    /// Clear the last run
    Clear,
    /// No output needed
    None,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, repl: &mut Repl) -> Result<CommandResult> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(CommandResult::None);
    }

    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0].trim_start_matches('/').to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "clear" | "reset" => {
            repl.clear();
            Ok(CommandResult::Clear)
        }

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "roster" => {
            let lines: Vec<String> = repl
                .config()
                .roster
                .iter()
                .enumerate()
                .map(|(i, w)| format!("  {}. {:<12} {}", i + 1, w.id, w.instruction))
                .collect();
            Ok(CommandResult::Handled(format!(
                "Roster (routing order):\n{}",
                lines.join("\n")
            )))
        }

        "models" => {
            let models = repl.list_models().await?;
            Ok(CommandResult::Handled(format!(
                "Available models ({}):\n{}\n\nCurrent: {}",
                repl.provider_name(),
                models
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n"),
                repl.config().model.name
            )))
        }

        "status" => Ok(CommandResult::Handled(status_text(repl))),

        "history" => match repl.last_run() {
            Some(state) => Ok(CommandResult::Handled(state.format_transcript())),
            None => Ok(CommandResult::Handled("No run yet.".to_string())),
        },

        "retry" | "resume" => match repl.last_run() {
            Some(state) if state.final_answer().is_none() => Ok(CommandResult::Retry),
            Some(_) => Ok(CommandResult::Handled(
                "Last run already finished.".to_string(),
            )),
            None => Ok(CommandResult::Handled("No run to resume.".to_string())),
        },

        "debug" => {
            let new_state = !repl.config().orchestration.debug;
            repl.config_mut().orchestration.debug = new_state;
            Ok(CommandResult::Handled(format!(
                "Show contributions: {}",
                if new_state { "ON" } else { "OFF" }
            )))
        }

        "set" => Ok(handle_set_command(args, repl)),

        _ => {
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Handle 'set' subcommands
fn handle_set_command(args: &str, repl: &mut Repl) -> CommandResult {
    let parts: Vec<&str> = args.splitn(2, ' ').collect();
    let key = parts[0].to_lowercase();
    let value = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match key.as_str() {
        "model" => {
            if value.is_empty() {
                return CommandResult::Handled(format!(
                    "Current model: {}",
                    repl.config().model.name
                ));
            }
            repl.config_mut().set_model(value);
            CommandResult::Handled(format!("Model set to: {}", value))
        }

        "temperature" | "temp" => match value.parse::<f32>() {
            Ok(t) if (0.0..=2.0).contains(&t) => {
                repl.config_mut().model.temperature = Some(t);
                CommandResult::Handled(format!("Temperature set to: {}", t))
            }
            _ => CommandResult::Handled("Temperature must be between 0.0 and 2.0".to_string()),
        },

        "" => CommandResult::Handled(
            "Usage: set <model|temperature> <value>\n\
             Examples:\n\
               set model gpt-4o\n\
               set temperature 0.3"
                .to_string(),
        ),

        _ => CommandResult::Handled(format!(
            "Unknown setting: {}. Available: model, temperature",
            key
        )),
    }
}

fn status_text(repl: &Repl) -> String {
    let config = repl.config();
    let last = match repl.last_run() {
        Some(state) if state.final_answer().is_some() => {
            format!("finished ({} messages)", state.history().len())
        }
        Some(state) => format!(
            "aborted after {}/{} workers",
            state.visited().len(),
            config.roster.len()
        ),
        None => "none".to_string(),
    };

    format!(
        "starhub status:\n\
         ─────────────────────────────\n\
         Provider:      {}\n\
         Model:         {}\n\
         Workers:       {}\n\
         Last run:      {}\n\
         Contributions: {}",
        repl.provider_name(),
        config.model.name,
        config
            .roster
            .iter()
            .map(|w| w.id.as_str())
            .collect::<Vec<_>>()
            .join(" → "),
        last,
        if config.orchestration.debug {
            "shown"
        } else {
            "hidden"
        }
    )
}

/// Generate help text
fn help_text() -> String {
    r#"starhub commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit
  clear, reset     Forget the last run
  status           Show current configuration
  roster           List specialists in routing order
  models           List models offered by the provider
  history          Show the transcript of the last run
  retry            Resume the last aborted run
  debug            Toggle printing of each contribution

  set model <name>           Use another model
  set temperature <0.0-2.0>  Change sampling temperature

Anything else is sent to the hub as a new task.
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::llm::ScriptedProvider;
    use std::sync::Arc;

    fn repl() -> Repl {
        Repl::new(Config::default(), Arc::new(ScriptedProvider::new()))
    }

    #[test]
    fn test_plain_text_is_a_task() {
        let mut repl = repl();
        let result = tokio_test::block_on(handle_command("Explain X.", &mut repl)).unwrap();
        assert!(matches!(result, CommandResult::Continue(task) if task == "Explain X."));
    }

    #[test]
    fn test_roster_lists_in_order() {
        let mut repl = repl();
        match tokio_test::block_on(handle_command("roster", &mut repl)).unwrap() {
            CommandResult::Handled(text) => {
                let researcher = text.find("researcher").unwrap();
                let writer = text.find("writer").unwrap();
                assert!(researcher < writer);
            }
            _ => panic!("roster should be handled"),
        }
    }

    #[test]
    fn test_set_model_and_temperature() {
        let mut repl = repl();
        tokio_test::block_on(handle_command("set model llama3", &mut repl)).unwrap();
        assert_eq!(repl.config().model.name, "llama3");

        tokio_test::block_on(handle_command("set temperature 0.4", &mut repl)).unwrap();
        assert_eq!(repl.config().model.temperature, Some(0.4));

        tokio_test::block_on(handle_command("set temperature 9", &mut repl)).unwrap();
        assert_eq!(repl.config().model.temperature, Some(0.4));
    }

    #[test]
    fn test_retry_without_run() {
        let mut repl = repl();
        let result = tokio_test::block_on(handle_command("retry", &mut repl)).unwrap();
        assert!(matches!(result, CommandResult::Handled(_)));
    }

    #[test]
    fn test_unknown_slash_command() {
        let mut repl = repl();
        let result = tokio_test::block_on(handle_command("/frobnicate", &mut repl)).unwrap();
        assert!(matches!(result, CommandResult::Handled(text) if text.contains("Unknown command")));
    }

    #[test]
    fn test_models_uses_provider() {
        let mut repl = repl();
        match tokio_test::block_on(handle_command("models", &mut repl)).unwrap() {
            CommandResult::Handled(text) => assert!(text.contains("scripted")),
            _ => panic!("models should be handled"),
        }
    }
}
