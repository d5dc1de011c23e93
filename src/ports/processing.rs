use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Payload for `POST /process`. Shared by the orchestrator's client and
/// the service's handler so the two binaries cannot drift apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub face: PathBuf,
    #[serde(default)]
    pub audio: Option<PathBuf>,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_downscale")]
    pub downscale_percentage: u32,
    #[serde(default)]
    pub archive_folder: String,
}

fn default_iterations() -> u32 {
    1
}

fn default_downscale() -> u32 {
    100
}

/// Success body returned by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub output_file: PathBuf,
}

/// Error body returned by the service on 400/500.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum DispatchError {
    /// The service answered with a non-success status; carries the body's
    /// `error` field
    Rejected(String),
    /// The request itself failed before a response arrived
    Transport(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Rejected(message) => write!(f, "{}", message),
            DispatchError::Transport(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Dispatches a prepared face/audio pair to the processing service.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ProcessingClient: Send + Sync {
    async fn process(&self, request: ProcessRequest) -> Result<PathBuf, DispatchError>;
}
