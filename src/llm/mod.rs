//! LLM module - generation service integrations
//!
//! Provides the provider abstraction plus Ollama and OpenAI-compatible backends,
//! and a scripted offline provider.

pub mod ollama;
pub mod openai;
pub mod scripted;
pub mod traits;

use std::sync::Arc;

use crate::core::{Config, ProviderKind, Result};

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use scripted::ScriptedProvider;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

/// Create the configured LLM provider
pub fn create_provider(config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let provider: Arc<dyn LLMProvider> = match config.provider.kind {
        ProviderKind::Ollama => Arc::new(OllamaClient::from_config(config)?),
        ProviderKind::OpenAi => Arc::new(OpenAiClient::from_config(&config.provider.openai)?),
    };
    Ok(provider)
}
