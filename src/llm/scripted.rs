//! Scripted in-memory provider
//!
//! Answers without any network access and records every request. Backs the
//! CLI's `--dry-run` mode and the test suites.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::core::{HubError, Message, Result, Role};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

type ReplyFn = Box<dyn Fn(usize, &[Message]) -> String + Send + Sync>;

/// Provider that replies from a closure and logs what it was asked
pub struct ScriptedProvider {
    reply: ReplyFn,
    fail_on: Option<usize>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    /// Reply with the call number and the first line of the leading instruction
    pub fn new() -> Self {
        Self {
            reply: Box::new(|n, messages| {
                let instruction = messages
                    .iter()
                    .find(|m| m.role == Role::System)
                    .and_then(|m| m.content.lines().next())
                    .unwrap_or("no instruction");
                format!("Reply #{} ({} messages seen) under: {}", n, messages.len(), instruction)
            }),
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the reply closure; it gets the 1-based call number
    pub fn reply_with<F>(mut self, reply: F) -> Self
    where
        F: Fn(usize, &[Message]) -> String + Send + Sync + 'static,
    {
        self.reply = Box::new(reply);
        self
    }

    /// Fail the given 1-based call
    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let n = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| HubError::provider("scripted provider lock poisoned"))?;
            calls.push(messages.to_vec());
            calls.len()
        };

        if self.fail_on == Some(n) {
            return Err(HubError::provider(format!("scripted failure on call {}", n)));
        }

        let content = (self.reply)(n, messages);
        Ok(LLMResponse {
            usage: Some(TokenUsage::new(messages.len() as u32, 1)),
            content,
            model: model.to_string(),
        })
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec!["scripted".to_string()])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
