//! Shared types used across starhub modules
//!
//! Contains the transcript message structure and its role tags.

use serde::{Deserialize, Serialize};

/// Who produced a message in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Leading instruction sent to the model; never stored in history
    System,
    /// The task author
    User,
    /// A specialist worker contribution
    Worker,
    /// The hub's final synthesis
    Orchestrator,
}

impl Role {
    /// Role name understood by chat-completion style APIs
    pub fn wire_name(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Worker | Role::Orchestrator => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Worker => write!(f, "worker"),
            Role::Orchestrator => write!(f, "orchestrator"),
        }
    }
}

/// A message in the shared transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role tag of the sender
    pub role: Role,
    /// Content of the message
    pub content: String,
    /// Worker id for worker contributions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            author: None,
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            author: None,
        }
    }

    /// Create a contribution authored by a worker
    pub fn worker(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Worker,
            content: content.into(),
            author: Some(id.into()),
        }
    }

    /// Create the hub's synthesis message
    pub fn orchestrator(content: impl Into<String>) -> Self {
        Self {
            role: Role::Orchestrator,
            content: content.into(),
            author: None,
        }
    }

    /// Label used when rendering the transcript
    pub fn label(&self) -> String {
        match &self.author {
            Some(author) => author.to_uppercase(),
            None => self.role.to_string().to_uppercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_roles() {
        assert_eq!(Message::user("hi").role.wire_name(), "user");
        assert_eq!(Message::system("be brief").role.wire_name(), "system");
        assert_eq!(Message::worker("critic", "no").role.wire_name(), "assistant");
        assert_eq!(Message::orchestrator("done").role.wire_name(), "assistant");
    }

    #[test]
    fn test_label() {
        assert_eq!(Message::worker("analyst", "x").label(), "ANALYST");
        assert_eq!(Message::orchestrator("x").label(), "ORCHESTRATOR");
    }

    #[test]
    fn test_author_skipped_when_absent() {
        let json = serde_json::to_string(&Message::user("task")).unwrap();
        assert!(!json.contains("author"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
