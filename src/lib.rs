//! CaseDB ABAC - case access resolution engine
//!
//! Resolves, per principal, the effective case-level rights granted by
//! organization and user access/share policies, caches the result and keeps
//! it consistent with policy writes.

pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod policy;
pub mod repository;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
pub use service::AbacService;
pub use state::{AbacState, HasAbac};
