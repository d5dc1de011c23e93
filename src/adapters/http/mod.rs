//! Inbound HTTP adapters.
//!
//! `ui` is the orchestrator's surface (form page, uploads, batch
//! control, SSE); `process` is the processing service's single endpoint.

pub mod process;
pub mod ui;
