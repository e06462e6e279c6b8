//! Agent module - hub-and-spoke orchestration
//!
//! A fixed roster of specialist workers is visited one at a time by a central
//! hub, which synthesizes the final answer once every worker has contributed.

pub mod events;
pub mod executor;
pub mod hub;
pub mod roster;
pub mod state;
pub mod worker;

pub use events::{ProgressCallback, ProgressEvent, ProgressSink};
pub use executor::{GraphExecutor, Phase, RunReport};
pub use hub::{HubController, RoutingDecision};
pub use roster::{default_specialists, Roster, WorkerDefinition};
pub use state::{OrchestrationState, Route};
pub use worker::SpecialistWorker;
