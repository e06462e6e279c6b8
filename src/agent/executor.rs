//! Graph executor
//!
//! Drives the star-shaped state machine:
//!
//! ```text
//! Entry -> Routing -> Dispatched(worker) -> Routing -> ... -> Synthesizing -> Terminated
//! ```
//!
//! Every worker hands control back to `Routing`; no worker ever routes to
//! another worker. Each generation call is awaited to completion before the
//! next step is considered, so exactly one writer touches the state at a time.

use std::fmt;
use std::sync::Arc;

use crate::agent::events::{ProgressEvent, ProgressSink};
use crate::agent::hub::{HubController, RoutingDecision};
use crate::agent::roster::Roster;
use crate::agent::state::OrchestrationState;
use crate::agent::worker::SpecialistWorker;
use crate::core::{Config, HubError, Result};
use crate::llm::{GenerateOptions, LLMProvider};

/// Executor phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Entry,
    /// Hub is about to decide
    Routing,
    /// A worker is executing
    Dispatched(String),
    Synthesizing,
    Terminated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Entry => write!(f, "entry"),
            Phase::Routing => write!(f, "routing"),
            Phase::Dispatched(id) => write!(f, "dispatched({})", id),
            Phase::Synthesizing => write!(f, "synthesizing"),
            Phase::Terminated => write!(f, "terminated"),
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Content of the synthesis message
    pub answer: String,
    /// Phases visited, in order
    pub phases: Vec<Phase>,
    /// Final orchestration state
    pub state: OrchestrationState,
}

impl RunReport {
    /// Number of worker dispatches in this run
    pub fn worker_runs(&self) -> usize {
        self.phases
            .iter()
            .filter(|p| matches!(p, Phase::Dispatched(_)))
            .count()
    }
}

/// Runs tasks through the hub and its workers
pub struct GraphExecutor {
    roster: Arc<Roster>,
    hub: HubController,
    workers: Vec<SpecialistWorker>,
    sink: ProgressSink,
    context_warn_chars: usize,
}

impl GraphExecutor {
    /// Build an executor where every worker and the hub share one model
    pub fn new(
        roster: Roster,
        llm: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        synthesis_prompt: impl Into<String>,
    ) -> Self {
        Self::with_options(
            roster,
            llm,
            model,
            synthesis_prompt,
            GenerateOptions::default(),
        )
    }

    fn with_options(
        roster: Roster,
        llm: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        synthesis_prompt: impl Into<String>,
        options: GenerateOptions,
    ) -> Self {
        let model = model.into();
        let roster = Arc::new(roster);

        let workers = roster
            .iter()
            .map(|definition| {
                SpecialistWorker::new(definition.clone(), Arc::clone(&llm), model.clone())
                    .with_options(options.clone())
            })
            .collect();

        let hub = HubController::new(Arc::clone(&roster), llm, model, synthesis_prompt)
            .with_options(options);

        Self {
            roster,
            hub,
            workers,
            sink: ProgressSink::Silent,
            context_warn_chars: 0,
        }
    }

    /// Build from configuration
    ///
    /// Fails with a roster misconfiguration before any generation call.
    pub fn from_config(config: &Config, llm: Arc<dyn LLMProvider>) -> Result<Self> {
        let roster = config.build_roster()?;
        let options = GenerateOptions {
            temperature: config.model.temperature,
            ..Default::default()
        };

        Ok(Self::with_options(
            roster,
            llm,
            config.model.name.clone(),
            config.orchestration.synthesis_prompt.clone(),
            options,
        )
        .with_context_warning(config.orchestration.context_warn_chars))
    }

    /// Deliver progress events to `sink`
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        self.sink = sink;
        self
    }

    /// Warn once the transcript passes `chars` characters (0 disables)
    pub fn with_context_warning(mut self, chars: usize) -> Self {
        self.context_warn_chars = chars;
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn hub(&self) -> &HubController {
        &self.hub
    }

    /// Run a task from a fresh state
    pub async fn run(&self, task: &str) -> Result<RunReport> {
        let mut state = OrchestrationState::new(task);
        let mut phases = Vec::new();
        let answer = self.execute(&mut state, &mut phases).await?;

        Ok(RunReport {
            answer,
            phases,
            state,
        })
    }

    /// Run over a caller-owned state and return the synthesized answer
    ///
    /// On failure the state keeps every contribution made before the failing
    /// step. Driving the same state again resumes at the first worker that has
    /// not contributed.
    pub async fn drive(&self, state: &mut OrchestrationState) -> Result<String> {
        let mut phases = Vec::new();
        self.execute(state, &mut phases).await
    }

    async fn execute(
        &self,
        state: &mut OrchestrationState,
        phases: &mut Vec<Phase>,
    ) -> Result<String> {
        let result = self.step_until_terminated(state, phases).await;

        if let Err(e) = &result {
            let step = match e {
                HubError::Generation { step, .. } => step.to_string(),
                _ => phases.last().map(|p| p.to_string()).unwrap_or_default(),
            };
            tracing::error!(step = %step, visited = state.visited().len(), error = %e, "Run aborted");
            self.sink.emit(ProgressEvent::Failed {
                step,
                error: e.to_string(),
            });
        }

        result
    }

    async fn step_until_terminated(
        &self,
        state: &mut OrchestrationState,
        phases: &mut Vec<Phase>,
    ) -> Result<String> {
        if state.final_answer().is_some() {
            return Err(HubError::invariant("state already holds a final answer"));
        }
        state.check_invariants(&self.roster)?;

        let mut phase = Phase::Entry;
        let mut answer = None;
        let mut dispatches = 0;
        let mut context_warned = false;

        loop {
            tracing::debug!(phase = %phase, "Executor transition");
            phases.push(phase.clone());

            phase = match phase {
                Phase::Entry => {
                    self.sink.emit(ProgressEvent::RunStarted {
                        task: state.task().to_string(),
                        roster_size: self.roster.len(),
                    });
                    Phase::Routing
                }

                Phase::Routing => match self.hub.route(state) {
                    RoutingDecision::RunWorker(id) => {
                        self.sink.emit(ProgressEvent::Routed { worker: id.clone() });
                        Phase::Dispatched(id)
                    }
                    RoutingDecision::Finalize => Phase::Synthesizing,
                },

                Phase::Dispatched(id) => {
                    dispatches += 1;
                    if dispatches > self.roster.len() {
                        return Err(HubError::invariant(format!(
                            "{} dispatches for a roster of {}",
                            dispatches,
                            self.roster.len()
                        )));
                    }

                    let worker = self.worker(&id)?;
                    self.sink.emit(ProgressEvent::WorkerStarted { worker: id.clone() });
                    worker.run(&self.roster, state).await?;
                    self.sink.emit(ProgressEvent::WorkerCompleted {
                        worker: id,
                        content: state
                            .history()
                            .last()
                            .map(|m| m.content.clone())
                            .unwrap_or_default(),
                        visited: state.visited().len(),
                        total: self.roster.len(),
                    });

                    if !context_warned && self.context_exceeded(state) {
                        context_warned = true;
                        tracing::warn!(
                            chars = state.history_chars(),
                            limit = self.context_warn_chars,
                            "Transcript is growing large; every remaining call receives all of it"
                        );
                    }
                    Phase::Routing
                }

                Phase::Synthesizing => {
                    self.sink.emit(ProgressEvent::Synthesizing);
                    let content = self.hub.synthesize(state).await?;
                    state.check_invariants(&self.roster)?;
                    self.sink.emit(ProgressEvent::Completed {
                        answer: content.clone(),
                    });
                    answer = Some(content);
                    Phase::Terminated
                }

                Phase::Terminated => break,
            };
        }

        answer.ok_or_else(|| HubError::invariant("terminated without a synthesis"))
    }

    fn worker(&self, id: &str) -> Result<&SpecialistWorker> {
        self.workers
            .iter()
            .find(|w| w.id() == id)
            .ok_or_else(|| HubError::invariant(format!("no worker bound for '{}'", id)))
    }

    fn context_exceeded(&self, state: &OrchestrationState) -> bool {
        self.context_warn_chars > 0 && state.history_chars() > self.context_warn_chars
    }
}

impl fmt::Debug for GraphExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphExecutor")
            .field("hub", &self.hub)
            .field("workers", &self.workers)
            .field("sink", &self.sink)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::roster::WorkerDefinition;
    use crate::llm::ScriptedProvider;

    fn executor(llm: Arc<ScriptedProvider>, ids: &[&str]) -> GraphExecutor {
        let roster = Roster::new(
            ids.iter()
                .map(|id| WorkerDefinition::new(*id, format!("You are {}.", id)))
                .collect(),
        )
        .unwrap();
        GraphExecutor::new(roster, llm, "m", "Synthesize.")
    }

    #[tokio::test]
    async fn test_phase_sequence_is_a_star() {
        let llm = Arc::new(ScriptedProvider::new());
        let report = executor(llm, &["a", "b"]).run("task").await.unwrap();

        assert_eq!(
            report.phases,
            vec![
                Phase::Entry,
                Phase::Routing,
                Phase::Dispatched("a".into()),
                Phase::Routing,
                Phase::Dispatched("b".into()),
                Phase::Routing,
                Phase::Synthesizing,
                Phase::Terminated,
            ]
        );
        assert_eq!(report.worker_runs(), 2);
    }

    #[tokio::test]
    async fn test_drive_refuses_finished_state() {
        let llm = Arc::new(ScriptedProvider::new());
        let executor = executor(Arc::clone(&llm), &["a"]);
        let mut state = OrchestrationState::new("task");
        executor.drive(&mut state).await.unwrap();
        let calls = llm.call_count();

        let err = executor.drive(&mut state).await.unwrap_err();
        assert!(matches!(err, HubError::StateInvariant(_)));
        assert_eq!(llm.call_count(), calls);
    }

    #[tokio::test]
    async fn test_failed_event_names_step() {
        let llm = Arc::new(ScriptedProvider::new().fail_on_call(2));
        let (sink, mut rx) = ProgressSink::channel();
        let executor = executor(llm, &["a", "b"]).with_progress(sink);

        assert!(executor.run("task").await.is_err());

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        match last {
            Some(ProgressEvent::Failed { step, .. }) => assert_eq!(step, "worker 'b'"),
            other => panic!("unexpected last event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_drive_rejects_state_from_another_roster() {
        let failing = Arc::new(ScriptedProvider::new().fail_on_call(2));
        let mut state = OrchestrationState::new("task");
        assert!(executor(failing, &["a", "b"]).drive(&mut state).await.is_err());
        assert_eq!(state.visited().to_vec(), vec!["a".to_string()]);

        let llm = Arc::new(ScriptedProvider::new());
        let other = executor(Arc::clone(&llm), &["c"]);
        let err = other.drive(&mut state).await.unwrap_err();

        assert!(matches!(err, HubError::StateInvariant(msg) if msg.contains("unknown worker 'a'")));
        assert_eq!(llm.call_count(), 0);
        assert_eq!(state.history().len(), 2);
    }
}
