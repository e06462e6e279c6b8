//! Core module - shared infrastructure for starhub
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the application.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ProviderKind};
pub use error::{HubError, Result, Step};
pub use types::{Message, Role};
