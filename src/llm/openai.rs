//! OpenAI-compatible client
//!
//! Talks to `/chat/completions` on api.openai.com or any server exposing the
//! same wire format.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::config::OpenAiConfig;
use crate::core::{HubError, Message, Result};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};

/// OpenAI-compatible API client
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

impl OpenAiClient {
    /// Create a client, reading the API key from the configured env var
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(config: &OpenAiConfig, api_key: impl Into<String>) -> Result<Self> {
        // Fail on a malformed base URL now rather than on the first request
        config.endpoint("chat/completions")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config: config.clone(),
        })
    }

    fn to_wire_message(msg: &Message) -> WireMessage<'_> {
        WireMessage {
            role: msg.role.wire_name(),
            content: &msg.content,
            name: msg.author.as_deref(),
        }
    }

    fn to_llm_response(response: ChatCompletionResponse) -> Result<LLMResponse> {
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| HubError::provider("Response contained no choices"))?;

        Ok(LLMResponse {
            content,
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
            model: response.model,
        })
    }
}

#[async_trait]
impl LLMProvider for OpenAiClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let options = options.unwrap_or_default();
        let request = ChatCompletionRequest {
            model,
            messages: messages.iter().map(Self::to_wire_message).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        tracing::debug!(model, messages = messages.len(), "Sending chat completion request");

        let response = self
            .client
            .post(self.config.endpoint("chat/completions")?)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 => HubError::provider("Authentication failed"),
                404 => HubError::ModelNotFound(model.to_string()),
                429 => HubError::provider(format!("Rate limited: {}", error_text)),
                code => HubError::provider(format!("API error ({}): {}", code, error_text)),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        Self::to_llm_response(completion)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.config.endpoint("models")?)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(HubError::provider("Failed to list models"));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_message_carries_worker_name() {
        let msg = Message::worker("critic", "Weak sourcing");
        let wire = OpenAiClient::to_wire_message(&msg);
        assert_eq!(wire.role, "assistant");
        assert_eq!(wire.name, Some("critic"));

        let json = serde_json::to_string(&OpenAiClient::to_wire_message(&Message::user("q"))).unwrap();
        assert!(!json.contains("name"));
    }

    #[test]
    fn test_response_conversion() {
        let raw = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "Final answer"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let response = OpenAiClient::to_llm_response(parsed).unwrap();
        assert_eq!(response.content, "Final answer");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_response_without_choices_is_an_error() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"model": "gpt-4o-mini", "choices": []}"#).unwrap();
        assert!(OpenAiClient::to_llm_response(parsed).is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let config = OpenAiConfig {
            base_url: "not a url".to_string(),
            ..OpenAiConfig::default()
        };
        assert!(OpenAiClient::with_api_key(&config, "sk-test").is_err());
    }
}
