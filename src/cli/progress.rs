//! Console rendering of progress events

use crate::agent::{ProgressEvent, ProgressSink};

const RULE: &str = "────────────────────────────────────────────────────────────";
const DOUBLE_RULE: &str = "════════════════════════════════════════════════════════════";

/// Render one event as console lines
///
/// Worker contributions are only shown when `show_contributions` is set.
pub fn render(event: &ProgressEvent, show_contributions: bool) -> Option<String> {
    match event {
        ProgressEvent::RunStarted { task, .. } => Some(format!("Task: {}\n{}", task, RULE)),
        ProgressEvent::Routed { worker } => {
            Some(format!("\n[HUB] routing → {}", worker.to_uppercase()))
        }
        ProgressEvent::WorkerStarted { worker } => {
            Some(format!("\n[{}] working...", worker.to_uppercase()))
        }
        ProgressEvent::WorkerCompleted {
            worker,
            content,
            visited,
            total,
        } => {
            if show_contributions {
                Some(format!(
                    "[{}] done ({}/{})\n{}",
                    worker.to_uppercase(),
                    visited,
                    total,
                    content
                ))
            } else {
                Some(format!("[{}] done ({}/{})", worker.to_uppercase(), visited, total))
            }
        }
        ProgressEvent::Synthesizing => {
            Some("\n[HUB] all specialists done → synthesizing final answer".to_string())
        }
        ProgressEvent::Completed { .. } => None,
        ProgressEvent::Failed { step, error } => {
            Some(format!("\n[HUB] run aborted during {}: {}", step, error))
        }
    }
}

/// Sink that prints events to stdout
pub fn console_sink(show_contributions: bool) -> ProgressSink {
    ProgressSink::Callback(Box::new(move |event| {
        if let Some(line) = render(event, show_contributions) {
            println!("{}", line);
        }
    }))
}

/// Banner around the final answer
pub fn format_final(answer: &str) -> String {
    format!(
        "\n{}\nFINAL SYNTHESIS\n{}\n{}",
        DOUBLE_RULE, DOUBLE_RULE, answer
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_line() {
        let line = render(
            &ProgressEvent::Routed {
                worker: "critic".to_string(),
            },
            false,
        )
        .unwrap();
        assert!(line.contains("[HUB] routing → CRITIC"));
    }

    #[test]
    fn test_contributions_hidden_by_default() {
        let event = ProgressEvent::WorkerCompleted {
            worker: "analyst".to_string(),
            content: "secret sauce".to_string(),
            visited: 2,
            total: 4,
        };
        assert!(!render(&event, false).unwrap().contains("secret sauce"));
        assert!(render(&event, true).unwrap().contains("secret sauce"));
    }

    #[test]
    fn test_final_banner() {
        let text = format_final("42");
        assert!(text.contains("FINAL SYNTHESIS"));
        assert!(text.ends_with("42"));
    }
}
