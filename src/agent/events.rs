//! Progress events
//!
//! Emitted at each routing decision and worker boundary so a presentation
//! layer can follow a run. Events are owned values; observers never get
//! access to the orchestration state itself.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Something that happened during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Run seeded with the task
    RunStarted { task: String, roster_size: usize },
    /// Hub routed control to a worker
    Routed { worker: String },
    /// Worker is generating
    WorkerStarted { worker: String },
    /// Worker appended its contribution and entered `visited`
    WorkerCompleted {
        worker: String,
        content: String,
        visited: usize,
        total: usize,
    },
    /// Every worker is done; the hub is synthesizing
    Synthesizing,
    /// Run reached its terminal state
    Completed { answer: String },
    /// Run aborted
    Failed { step: String, error: String },
}

/// Callback invoked for every progress event
pub type ProgressCallback = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Where progress events go
#[derive(Default)]
pub enum ProgressSink {
    /// Drop events
    #[default]
    Silent,
    /// Call a closure
    Callback(ProgressCallback),
    /// Push into a channel
    Channel(mpsc::UnboundedSender<ProgressEvent>),
}

impl ProgressSink {
    /// Create a channel-backed sink and its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::Channel(tx), rx)
    }

    pub fn emit(&self, event: ProgressEvent) {
        match self {
            ProgressSink::Silent => {}
            ProgressSink::Callback(callback) => callback(&event),
            ProgressSink::Channel(tx) => {
                // A dropped receiver only means nobody is watching.
                let _ = tx.send(event);
            }
        }
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressSink::Silent => write!(f, "ProgressSink::Silent"),
            ProgressSink::Callback(_) => write!(f, "ProgressSink::Callback"),
            ProgressSink::Channel(_) => write!(f, "ProgressSink::Channel"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_callback_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let sink = ProgressSink::Callback(Box::new(move |event| {
            captured.lock().unwrap().push(event.clone());
        }));

        sink.emit(ProgressEvent::Synthesizing);
        assert_eq!(seen.lock().unwrap().as_slice(), &[ProgressEvent::Synthesizing]);
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ProgressSink::channel();
        drop(rx);
        sink.emit(ProgressEvent::Synthesizing);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&ProgressEvent::Routed {
            worker: "critic".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"kind":"routed","worker":"critic"}"#);
    }
}
