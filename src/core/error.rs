//! Custom error types for starhub
//!
//! Provides a unified error handling system across all modules.

use std::fmt;

use thiserror::Error;

/// The orchestration step that was active when a generation call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A specialist worker was generating its contribution
    Worker(String),
    /// The hub was generating the final synthesis
    Synthesis,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Worker(id) => write!(f, "worker '{}'", id),
            Step::Synthesis => write!(f, "synthesis"),
        }
    }
}

/// Main error type for starhub operations
#[derive(Error, Debug)]
pub enum HubError {
    /// A generation call failed; the run was aborted
    #[error("Generation failed during {step} (completed: [{}]): {source}", .completed.join(", "))]
    Generation {
        step: Step,
        completed: Vec<String>,
        #[source]
        source: Box<HubError>,
    },

    /// No workers configured
    #[error("Roster misconfiguration: no workers configured")]
    EmptyRoster,

    /// Two roster entries share an id
    #[error("Roster misconfiguration: duplicate worker id '{0}'")]
    DuplicateWorker(String),

    /// A roster entry is unusable (blank id or instruction)
    #[error("Roster misconfiguration: {0}")]
    InvalidWorker(String),

    /// Orchestration state invariant broken
    #[error("State invariant violated: {0}")]
    StateInvariant(String),

    /// Ollama connection or API errors
    #[error("Ollama error: {0}")]
    Ollama(String),

    /// Errors from OpenAI-compatible endpoints
    #[error("Provider error: {0}")]
    Provider(String),

    /// The model answered with nothing usable
    #[error("Model '{0}' returned an empty response")]
    EmptyResponse(String),

    /// Model not available
    #[error("Model '{0}' not available. For Ollama run: ollama pull {0}")]
    ModelNotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for starhub operations
pub type Result<T> = std::result::Result<T, HubError>;

impl HubError {
    /// Create an Ollama error
    pub fn ollama(msg: impl Into<String>) -> Self {
        Self::Ollama(msg.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state invariant error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::StateInvariant(msg.into())
    }

    /// Wrap a provider failure with the step that was running
    pub fn generation(step: Step, completed: &[String], source: HubError) -> Self {
        Self::Generation {
            step,
            completed: completed.to_vec(),
            source: Box::new(source),
        }
    }

    /// Whether this error means the roster was rejected before a run
    pub fn is_roster_misconfiguration(&self) -> bool {
        matches!(
            self,
            Self::EmptyRoster | Self::DuplicateWorker(_) | Self::InvalidWorker(_)
        )
    }
}
