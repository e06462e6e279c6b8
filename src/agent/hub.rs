//! Hub controller
//!
//! Center of the star. On every cycle the hub either names the next worker
//! that has not contributed yet, or, once all have, writes the synthesis.

use std::sync::Arc;

use crate::agent::roster::Roster;
use crate::agent::state::{OrchestrationState, Route};
use crate::agent::worker::generate;
use crate::core::{HubError, Result, Step};
use crate::llm::{GenerateOptions, LLMProvider};

/// Outcome of one hub decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Dispatch this worker
    RunWorker(String),
    /// Synthesize and terminate
    Finalize,
}

impl From<&RoutingDecision> for Route {
    fn from(decision: &RoutingDecision) -> Self {
        match decision {
            RoutingDecision::RunWorker(id) => Route::Worker(id.clone()),
            RoutingDecision::Finalize => Route::Finalize,
        }
    }
}

/// Routing policy and synthesis step
pub struct HubController {
    roster: Arc<Roster>,
    llm: Arc<dyn LLMProvider>,
    model: String,
    synthesis_prompt: String,
    options: GenerateOptions,
}

impl HubController {
    pub fn new(
        roster: Arc<Roster>,
        llm: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        synthesis_prompt: impl Into<String>,
    ) -> Self {
        Self {
            roster,
            llm,
            model: model.into(),
            synthesis_prompt: synthesis_prompt.into(),
            options: GenerateOptions::default(),
        }
    }

    /// Set generation options for the synthesis call
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// First roster worker not yet visited, else `Finalize`
    ///
    /// Reads the state only, so repeated calls on an unchanged state agree.
    pub fn decide(&self, state: &OrchestrationState) -> RoutingDecision {
        self.roster
            .iter()
            .find(|worker| !state.has_visited(&worker.id))
            .map(|worker| RoutingDecision::RunWorker(worker.id.clone()))
            .unwrap_or(RoutingDecision::Finalize)
    }

    /// Decide and record the decision in `state.route`
    pub fn route(&self, state: &mut OrchestrationState) -> RoutingDecision {
        let decision = self.decide(state);

        match &decision {
            RoutingDecision::RunWorker(id) => tracing::info!(worker = %id, "Hub routing"),
            RoutingDecision::Finalize => {
                tracing::info!("All specialists done, synthesizing final answer")
            }
        }

        state.set_route(Route::from(&decision));
        decision
    }

    /// Generate the final answer from the full transcript and append it
    pub async fn synthesize(&self, state: &mut OrchestrationState) -> Result<String> {
        if state.route() != &Route::Finalize {
            return Err(HubError::invariant(
                "synthesis requested before every worker contributed",
            ));
        }

        let content = generate(
            self.llm.as_ref(),
            &self.model,
            &self.options,
            &self.synthesis_prompt,
            state.history(),
        )
        .await
        .map_err(|e| HubError::generation(Step::Synthesis, state.visited(), e))?;

        state.record_synthesis(content.clone());
        Ok(content)
    }
}

impl std::fmt::Debug for HubController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubController")
            .field("roster", &self.roster.ids())
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::roster::WorkerDefinition;
    use crate::core::{Message, Role};
    use crate::llm::ScriptedProvider;

    fn hub(llm: Arc<ScriptedProvider>) -> HubController {
        let roster = Roster::new(vec![
            WorkerDefinition::new("a", "first"),
            WorkerDefinition::new("b", "second"),
        ])
        .unwrap();
        HubController::new(Arc::new(roster), llm, "m", "Synthesize.")
    }

    #[test]
    fn test_decide_scans_in_roster_order() {
        let hub = hub(Arc::new(ScriptedProvider::new()));
        let roster = hub.roster().clone();
        let mut state = OrchestrationState::new("task");

        assert_eq!(hub.decide(&state), RoutingDecision::RunWorker("a".into()));
        state.record_contribution(&roster, "a", "x").unwrap();
        assert_eq!(hub.decide(&state), RoutingDecision::RunWorker("b".into()));
        state.record_contribution(&roster, "b", "y").unwrap();
        assert_eq!(hub.decide(&state), RoutingDecision::Finalize);
    }

    #[test]
    fn test_decide_skips_out_of_order_visits() {
        let hub = hub(Arc::new(ScriptedProvider::new()));
        let roster = hub.roster().clone();
        let mut state = OrchestrationState::new("task");
        state.record_contribution(&roster, "b", "y").unwrap();

        assert_eq!(hub.decide(&state), RoutingDecision::RunWorker("a".into()));
    }

    #[test]
    fn test_decide_is_idempotent() {
        let hub = hub(Arc::new(ScriptedProvider::new()));
        let state = OrchestrationState::new("task");
        assert_eq!(hub.decide(&state), hub.decide(&state));
    }

    #[test]
    fn test_route_records_decision() {
        let hub = hub(Arc::new(ScriptedProvider::new()));
        let mut state = OrchestrationState::new("task");
        hub.route(&mut state);
        assert_eq!(state.route(), &Route::Worker("a".into()));
    }

    #[tokio::test]
    async fn test_synthesis_uses_full_history() {
        let llm = Arc::new(ScriptedProvider::new().reply_with(|_, _| "final".to_string()));
        let hub = hub(Arc::clone(&llm));
        let roster = hub.roster().clone();
        let mut state = OrchestrationState::new("task");
        state.record_contribution(&roster, "a", "x").unwrap();
        state.record_contribution(&roster, "b", "y").unwrap();
        assert_eq!(hub.route(&mut state), RoutingDecision::Finalize);

        let answer = hub.synthesize(&mut state).await.unwrap();

        assert_eq!(answer, "final");
        assert_eq!(state.final_answer(), Some("final"));
        let call = &llm.calls()[0];
        assert_eq!(call[0], Message::system("Synthesize."));
        assert_eq!(call.len(), 4);
        assert_eq!(state.history().last().map(|m| m.role), Some(Role::Orchestrator));
    }

    #[tokio::test]
    async fn test_synthesis_refused_before_finalize() {
        let llm = Arc::new(ScriptedProvider::new());
        let hub = hub(Arc::clone(&llm));
        let mut state = OrchestrationState::new("task");

        let err = hub.synthesize(&mut state).await.unwrap_err();
        assert!(matches!(err, HubError::StateInvariant(_)));
        assert_eq!(llm.call_count(), 0);
    }
}
