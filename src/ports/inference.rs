use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Tuning knobs carried with a processing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceParams {
    pub iterations: u32,
    pub downscale_percentage: u32,
}

#[derive(Debug)]
pub enum InferenceError {
    /// The inference tool could not be started
    Spawn(io::Error),
    /// Nonzero exit; carries the captured stderr (or the exit status
    /// when stderr was empty)
    Failed(String),
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::Spawn(e) => write!(f, "Processing failed: {}", e),
            InferenceError::Failed(detail) => write!(f, "Processing failed: {}", detail),
        }
    }
}

impl std::error::Error for InferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InferenceError::Spawn(e) => Some(e),
            InferenceError::Failed(_) => None,
        }
    }
}

/// Runs the lip-sync model over a face/audio pair, writing the rendered
/// video to `outfile`.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait LipSyncRunner: Send + Sync {
    async fn run(
        &self,
        face: &Path,
        audio: &Path,
        outfile: &Path,
        params: InferenceParams,
    ) -> Result<PathBuf, InferenceError>;
}
