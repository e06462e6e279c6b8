//! Orchestration state
//!
//! The single record threaded through every hub and worker step: the
//! append-only transcript, the workers that already contributed, and the
//! routing decision for the next step.
//!
//! Mutators are crate-private. Observers outside the crate only ever see a
//! shared reference or cloned events.

use crate::agent::roster::Roster;
use crate::core::{HubError, Message, Result, Role};

/// Where the hub sends control next
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    /// No decision made yet
    #[default]
    Unset,
    /// Run this worker next
    Worker(String),
    /// All workers done; synthesize and stop
    Finalize,
}

/// Mutable state of one orchestration run
#[derive(Debug, Clone)]
pub struct OrchestrationState {
    history: Vec<Message>,
    visited: Vec<String>,
    route: Route,
}

impl OrchestrationState {
    /// Seed a run with the user's task
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            history: vec![Message::user(task)],
            visited: Vec::new(),
            route: Route::Unset,
        }
    }

    /// Transcript so far, oldest first
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Workers that contributed, in contribution order
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn has_visited(&self, id: &str) -> bool {
        self.visited.iter().any(|v| v == id)
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    /// The original task text
    pub fn task(&self) -> &str {
        self.history
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    /// Synthesized answer, once the hub has finalized
    pub fn final_answer(&self) -> Option<&str> {
        self.history
            .last()
            .filter(|m| m.role == Role::Orchestrator)
            .map(|m| m.content.as_str())
    }

    /// Total characters of transcript content
    pub fn history_chars(&self) -> usize {
        self.history.iter().map(|m| m.content.chars().count()).sum()
    }

    pub(crate) fn set_route(&mut self, route: Route) {
        self.route = route;
    }

    /// Append a worker's single contribution and mark it visited
    pub(crate) fn record_contribution(
        &mut self,
        roster: &Roster,
        id: &str,
        content: impl Into<String>,
    ) -> Result<()> {
        if !roster.contains(id) {
            return Err(HubError::invariant(format!(
                "worker '{}' is not in the roster",
                id
            )));
        }
        if self.has_visited(id) {
            return Err(HubError::invariant(format!(
                "worker '{}' already contributed",
                id
            )));
        }

        self.history.push(Message::worker(id, content));
        self.visited.push(id.to_string());
        Ok(())
    }

    /// Append the hub's synthesis
    pub(crate) fn record_synthesis(&mut self, content: impl Into<String>) {
        self.history.push(Message::orchestrator(content));
    }

    /// Verify visited/history agreement against the roster
    pub fn check_invariants(&self, roster: &Roster) -> Result<()> {
        for (i, id) in self.visited.iter().enumerate() {
            if !roster.contains(id) {
                return Err(HubError::invariant(format!(
                    "visited contains unknown worker '{}'",
                    id
                )));
            }
            if self.visited[..i].contains(id) {
                return Err(HubError::invariant(format!(
                    "worker '{}' visited twice",
                    id
                )));
            }

            let contributions = self
                .history
                .iter()
                .filter(|m| m.role == Role::Worker && m.author.as_deref() == Some(id.as_str()))
                .count();
            if contributions != 1 {
                return Err(HubError::invariant(format!(
                    "worker '{}' has {} contributions",
                    id, contributions
                )));
            }
        }

        let worker_messages = self
            .history
            .iter()
            .filter(|m| m.role == Role::Worker)
            .count();
        if worker_messages != self.visited.len() {
            return Err(HubError::invariant(format!(
                "{} worker messages but {} visited workers",
                worker_messages,
                self.visited.len()
            )));
        }

        Ok(())
    }

    /// Render the transcript for display
    pub fn format_transcript(&self) -> String {
        let mut output = String::new();
        for msg in &self.history {
            output.push_str(&format!("\n[{}]\n{}\n", msg.label(), msg.content));
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::roster::WorkerDefinition;

    fn roster() -> Roster {
        Roster::new(vec![
            WorkerDefinition::new("a", "first"),
            WorkerDefinition::new("b", "second"),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_state_is_seeded() {
        let state = OrchestrationState::new("Explain X.");
        assert_eq!(state.history().len(), 1);
        assert_eq!(state.history()[0].role, Role::User);
        assert_eq!(state.task(), "Explain X.");
        assert!(state.visited().is_empty());
        assert_eq!(state.route(), &Route::Unset);
        assert!(state.final_answer().is_none());
    }

    #[test]
    fn test_record_contribution() {
        let roster = roster();
        let mut state = OrchestrationState::new("task");
        state.record_contribution(&roster, "a", "facts").unwrap();

        assert_eq!(state.visited().to_vec(), vec!["a".to_string()]);
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.history()[1].author.as_deref(), Some("a"));
        assert!(state.check_invariants(&roster).is_ok());
    }

    #[test]
    fn test_second_contribution_rejected() {
        let roster = roster();
        let mut state = OrchestrationState::new("task");
        state.record_contribution(&roster, "a", "one").unwrap();

        let err = state.record_contribution(&roster, "a", "two").unwrap_err();
        assert!(matches!(err, HubError::StateInvariant(_)));
        assert_eq!(state.history().len(), 2);
    }

    #[test]
    fn test_unknown_worker_rejected() {
        let mut state = OrchestrationState::new("task");
        let err = state.record_contribution(&roster(), "z", "?").unwrap_err();
        assert!(matches!(err, HubError::StateInvariant(_)));
        assert!(state.visited().is_empty());
    }

    #[test]
    fn test_final_answer_and_transcript() {
        let roster = roster();
        let mut state = OrchestrationState::new("task");
        state.record_contribution(&roster, "a", "facts").unwrap();
        state.record_synthesis("answer");

        assert_eq!(state.final_answer(), Some("answer"));
        let transcript = state.format_transcript();
        assert!(transcript.contains("[USER]"));
        assert!(transcript.contains("[A]"));
        assert!(transcript.contains("[ORCHESTRATOR]"));
    }

    #[test]
    fn test_invariants_catch_duplicate_visit() {
        let roster = roster();
        let mut state = OrchestrationState::new("task");
        state.record_contribution(&roster, "a", "facts").unwrap();
        state.visited.push("a".to_string());

        let err = state.check_invariants(&roster).unwrap_err();
        assert!(matches!(err, HubError::StateInvariant(msg) if msg.contains("visited twice")));
    }

    #[test]
    fn test_invariants_catch_unrecorded_contribution() {
        let roster = roster();
        let mut state = OrchestrationState::new("task");
        state.history.push(Message::worker("b", "stray"));

        let err = state.check_invariants(&roster).unwrap_err();
        assert!(matches!(err, HubError::StateInvariant(msg) if msg.contains("1 worker messages")));
    }

    #[test]
    fn test_history_chars_counts_characters() {
        let state = OrchestrationState::new("crítico ✓");
        assert_eq!(state.history_chars(), 9);
    }
}
