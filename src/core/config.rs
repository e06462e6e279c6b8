//! Configuration management for starhub
//!
//! Supports environment variables, config files, and runtime overrides.
//! The roster and the synthesis instruction are plain configuration, so adding
//! or removing a specialist never needs a code change.
//!
//! Config file location: ~/.config/starhub/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::agent::roster::{default_specialists, Roster, WorkerDefinition};
use crate::core::error::{HubError, Result};

/// Instruction prepended to the transcript for the final synthesis
pub const DEFAULT_SYNTHESIS_PROMPT: &str = "You are an orchestrator. All specialist agents have shared \
their perspectives. Synthesize everything into one final, well-structured answer.";

/// Main configuration for starhub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Generation service backend
    pub provider: ProviderConfig,
    /// Model configuration
    pub model: ModelConfig,
    /// Orchestration behavior
    #[serde(default)]
    pub orchestration: OrchestrationConfig,
    /// Ordered specialist roster
    #[serde(default = "default_specialists")]
    pub roster: Vec<WorkerDefinition>,
}

/// Which generation backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Local Ollama server
    Ollama,
    /// OpenAI or any compatible chat-completions endpoint
    OpenAi,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "openai" | "open-ai" => Ok(ProviderKind::OpenAi),
            other => Err(HubError::config(format!(
                "Unknown provider '{}'. Expected 'ollama' or 'openai'",
                other
            ))),
        }
    }
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Selected backend
    pub kind: ProviderKind,
    /// Ollama server settings
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// OpenAI-compatible endpoint settings
    #[serde(default)]
    pub openai: OpenAiConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// OpenAI-compatible endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API base, e.g. https://api.openai.com/v1
    pub base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model used by every worker and by the synthesis step
    pub name: String,
    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Orchestration behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    /// Instruction used for the final synthesis
    pub synthesis_prompt: String,
    /// Warn once the transcript grows past this many characters (0 disables)
    pub context_warn_chars: usize,
    /// Whether to show debug output
    pub debug: bool,
}

fn env_flag(name: &str) -> Option<bool> {
    env::var(name).ok().map(|v| v == "true" || v == "1")
}

impl Default for Config {
    fn default() -> Self {
        let provider = ProviderConfig::default();
        let model = ModelConfig::for_provider(provider.kind);

        Self {
            provider,
            model,
            orchestration: OrchestrationConfig::default(),
            roster: default_specialists(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: env::var("STARHUB_PROVIDER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(ProviderKind::OpenAi),
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            synthesis_prompt: DEFAULT_SYNTHESIS_PROMPT.to_string(),
            context_warn_chars: 48_000,
            debug: env_flag("STARHUB_DEBUG").unwrap_or(false),
        }
    }
}

impl ModelConfig {
    /// Default model for a provider, overridable with STARHUB_MODEL
    pub fn for_provider(kind: ProviderKind) -> Self {
        let fallback = match kind {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Ollama => "qwen3:8b",
        };

        Self {
            name: env::var("STARHUB_MODEL").unwrap_or_else(|_| fallback.to_string()),
            temperature: None,
        }
    }
}

impl OpenAiConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        env::var(&self.api_key_env)
            .map_err(|_| HubError::config(format!("{} is not set", self.api_key_env)))
    }

    /// Build an endpoint URL below the configured base
    pub fn endpoint(&self, path: &str) -> Result<url::Url> {
        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };

        url::Url::parse(&base)
            .and_then(|b| b.join(path.trim_start_matches('/')))
            .map_err(|e| HubError::config(format!("Invalid base_url '{}': {}", self.base_url, e)))
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("starhub")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        if !Self::config_exists() {
            tracing::debug!("No config file; using defaults");
            return Self::default();
        }

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %Self::config_file().display(),
                    error = %e,
                    "Ignoring unreadable config file; using defaults"
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default file only
    pub fn load_from_file() -> Result<Self> {
        Self::load_from_path(&Self::config_file())
    }

    /// Load configuration from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HubError::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| HubError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HubError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| HubError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| HubError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(Self::config_file(), content)
            .map_err(|e| HubError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Save configuration and return the path
    pub fn save_and_get_path(&self) -> Result<PathBuf> {
        self.save()?;
        Ok(Self::config_file())
    }

    /// Check if a config file exists
    pub fn config_exists() -> bool {
        Self::config_file().exists()
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.provider.ollama.host, self.provider.ollama.port
        )
    }

    /// Switch backend, resetting the model to that backend's default
    pub fn set_provider(&mut self, kind: ProviderKind) {
        if self.provider.kind != kind {
            self.provider.kind = kind;
            self.model = ModelConfig::for_provider(kind);
        }
    }

    /// Update the model
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model.name = model.into();
    }

    /// Validate the configured roster
    pub fn build_roster(&self) -> Result<Roster> {
        Roster::new(self.roster.clone())
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.ollama.port, 11434);
        assert_eq!(config.roster.len(), 4);
        assert_eq!(config.orchestration.synthesis_prompt, DEFAULT_SYNTHESIS_PROMPT);
        assert!(config.build_roster().is_ok());
    }

    #[test]
    fn test_config_roundtrip_keeps_roster_order() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[[roster]]"));

        let parsed = Config::from_toml(&toml_str).unwrap();
        let ids: Vec<_> = parsed.roster.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["researcher", "analyst", "critic", "writer"]);
    }

    #[test]
    fn test_custom_roster_from_toml() {
        let parsed = Config::from_toml(
            r#"
            [provider]
            kind = "ollama"

            [model]
            name = "llama3"

            [[roster]]
            id = "skeptic"
            instruction = "Doubt everything."
            "#,
        )
        .unwrap();

        assert_eq!(parsed.provider.kind, ProviderKind::Ollama);
        assert_eq!(parsed.model.name, "llama3");
        assert_eq!(parsed.roster.len(), 1);
        assert_eq!(parsed.roster[0].id, "skeptic");
        assert_eq!(parsed.provider.ollama.port, 11434);
    }

    #[test]
    fn test_partial_tables_keep_custom_roster() {
        let parsed = Config::from_toml(
            r#"
            [provider]
            kind = "ollama"

            [provider.ollama]
            host = "gpu-box"

            [model]
            name = "llama3"

            [orchestration]
            debug = true

            [[roster]]
            id = "skeptic"
            instruction = "Doubt everything."
            "#,
        )
        .unwrap();

        assert!(parsed.orchestration.debug);
        assert_eq!(parsed.orchestration.synthesis_prompt, DEFAULT_SYNTHESIS_PROMPT);
        assert_eq!(parsed.orchestration.context_warn_chars, 48_000);
        assert_eq!(parsed.provider.ollama.host, "gpu-box");
        assert_eq!(parsed.provider.ollama.port, 11434);
        assert_eq!(parsed.roster.len(), 1);
        assert_eq!(parsed.roster[0].id, "skeptic");
    }

    #[test]
    fn test_empty_roster_is_rejected() {
        let mut config = Config::default();
        config.roster.clear();
        assert!(matches!(config.build_roster(), Err(HubError::EmptyRoster)));
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert!("bedrock".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_openai_endpoint() {
        let mut openai = OpenAiConfig::default();
        openai.base_url = "https://api.example.com/v1".to_string();
        let url = openai.endpoint("chat/completions").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/chat/completions");
    }

    #[test]
    fn test_ollama_url() {
        let mut config = Config::default();
        config.provider.ollama.host = "localhost".to_string();
        config.provider.ollama.port = 11434;
        assert_eq!(config.ollama_url(), "http://localhost:11434");
    }

    #[test]
    fn test_config_dir() {
        assert!(Config::config_dir().to_string_lossy().contains("starhub"));
    }
}
