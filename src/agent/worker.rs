//! Specialist workers
//!
//! A worker is one spoke of the star: it reads the whole transcript under its
//! own system instruction and appends exactly one contribution.

use std::sync::Arc;

use crate::agent::roster::{Roster, WorkerDefinition};
use crate::agent::state::OrchestrationState;
use crate::core::{HubError, Message, Result, Step};
use crate::llm::{GenerateOptions, LLMProvider};

/// Call the model with `instruction` as leading context ahead of `history`
///
/// Blank output counts as a failed generation.
pub(crate) async fn generate(
    llm: &dyn LLMProvider,
    model: &str,
    options: &GenerateOptions,
    instruction: &str,
    history: &[Message],
) -> Result<String> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::system(instruction));
    messages.extend(history.iter().cloned());

    let response = llm.chat(model, &messages, Some(options.clone())).await?;

    if response.content.trim().is_empty() {
        return Err(HubError::EmptyResponse(model.to_string()));
    }

    if let Some(usage) = &response.usage {
        tracing::debug!(
            model = %response.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Generation finished"
        );
    }

    Ok(response.content)
}

/// One specialist bound to a generation service
#[derive(Clone)]
pub struct SpecialistWorker {
    definition: WorkerDefinition,
    llm: Arc<dyn LLMProvider>,
    model: String,
    options: GenerateOptions,
}

impl SpecialistWorker {
    pub fn new(
        definition: WorkerDefinition,
        llm: Arc<dyn LLMProvider>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            definition,
            llm,
            model: model.into(),
            options: GenerateOptions::default(),
        }
    }

    /// Set generation options
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn instruction(&self) -> &str {
        &self.definition.instruction
    }

    /// Produce this worker's contribution and mark it visited
    ///
    /// A failed or blank generation leaves `state` untouched and returns
    /// [`HubError::Generation`] naming this worker and the workers already done.
    pub async fn run(&self, roster: &Roster, state: &mut OrchestrationState) -> Result<()> {
        tracing::info!(worker = %self.id(), "Worker generating");

        let content = generate(
            self.llm.as_ref(),
            &self.model,
            &self.options,
            self.instruction(),
            state.history(),
        )
        .await
        .map_err(|e| HubError::generation(Step::Worker(self.id().to_string()), state.visited(), e))?;

        state.record_contribution(roster, self.id(), content)?;

        tracing::info!(
            worker = %self.id(),
            visited = state.visited().len(),
            total = roster.len(),
            "Worker contributed"
        );
        Ok(())
    }
}

impl std::fmt::Debug for SpecialistWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialistWorker")
            .field("id", &self.definition.id)
            .field("model", &self.model)
            .field("provider", &self.llm.name())
            .finish()
    }
}
