//! Specialist roster
//!
//! Workers are plain data records in a fixed order. The hub scans this order
//! to pick the next specialist, so the order here is the routing order.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::{HubError, Result};

/// Static definition of one specialist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDefinition {
    /// Identifier, unique within the roster
    pub id: String,
    /// System instruction sent ahead of the transcript
    pub instruction: String,
}

impl WorkerDefinition {
    pub fn new(id: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            instruction: instruction.into(),
        }
    }
}

/// The four default specialists, in routing order
pub fn default_specialists() -> Vec<WorkerDefinition> {
    vec![
        WorkerDefinition::new(
            "researcher",
            "You are a knowledgeable researcher. \
             Provide relevant facts, data, and background on the topic.",
        ),
        WorkerDefinition::new(
            "analyst",
            "You are a data analyst. \
             Examine the information gathered so far and identify key patterns, \
             trends, and deeper implications.",
        ),
        WorkerDefinition::new(
            "critic",
            "You are a critical thinker. \
             Identify weaknesses, counterarguments, risks, or missing perspectives \
             in the discussion so far.",
        ),
        WorkerDefinition::new(
            "writer",
            "You are a skilled writer. \
             Synthesize all previous contributions into a clear, concise, \
             well-structured response.",
        ),
    ]
}

const MAX_ID_LEN: usize = 64;

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// A validated, ordered, non-empty set of workers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    workers: Vec<WorkerDefinition>,
}

impl Roster {
    /// Validate and build a roster
    ///
    /// Rejects an empty list, blank or malformed ids, blank instructions, and
    /// duplicate ids. Ids travel as the OpenAI message `name`, which only
    /// accepts `[a-zA-Z0-9_-]{1,64}`.
    pub fn new(workers: Vec<WorkerDefinition>) -> Result<Self> {
        if workers.is_empty() {
            return Err(HubError::EmptyRoster);
        }

        let mut seen = HashSet::new();
        for worker in &workers {
            if worker.id.trim().is_empty() {
                return Err(HubError::InvalidWorker("worker id is blank".to_string()));
            }
            if !is_valid_id(&worker.id) {
                return Err(HubError::InvalidWorker(format!(
                    "worker id '{}' must be 1-{} ASCII letters, digits, '_' or '-'",
                    worker.id, MAX_ID_LEN
                )));
            }
            if worker.instruction.trim().is_empty() {
                return Err(HubError::InvalidWorker(format!(
                    "worker '{}' has no instruction",
                    worker.id
                )));
            }
            if !seen.insert(worker.id.as_str()) {
                return Err(HubError::DuplicateWorker(worker.id.clone()));
            }
        }

        Ok(Self { workers })
    }

    /// Workers in routing order
    pub fn iter(&self) -> impl Iterator<Item = &WorkerDefinition> {
        self.workers.iter()
    }

    /// Worker ids in routing order
    pub fn ids(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.id.clone()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&WorkerDefinition> {
        self.workers.iter().find(|w| w.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Always false for a constructed roster
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            workers: default_specialists(),
        }
    }
}
