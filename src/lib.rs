//! Dubber - Batch Lip-Sync Processing
//!
//! Hexagonal Architecture:
//! - domain/: task queue and status model
//! - ports/: trait seams for the media tools and the processing service
//! - adapters/: subprocess/HTTP implementations and inbound HTTP routers
//! - application/: media preparation pipeline and the processing session
//! - config: environment configuration
//!
//! # Binaries
//! - `orchestrator`: task form UI, in-memory queue, media preparation, dispatch
//! - `processor`: /process endpoint wrapping the lip-sync inference tool

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports for convenience
pub use application::session::ProcessingSession;
pub use config::{OrchestratorConfig, ProcessorConfig};
pub use domain::tasks;
