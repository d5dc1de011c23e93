use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum TtsError {
    /// The engine binary could not be started
    Spawn(io::Error),
    /// The engine ran but reported a failure
    Synthesis(String),
}

impl fmt::Display for TtsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtsError::Spawn(e) => write!(f, "Failed to run TTS engine: {}", e),
            TtsError::Synthesis(e) => write!(f, "TTS synthesis failed: {}", e),
        }
    }
}

impl std::error::Error for TtsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TtsError::Spawn(e) => Some(e),
            TtsError::Synthesis(_) => None,
        }
    }
}

/// Synthesizes spoken audio from text, optionally cloning the voice of a
/// reference clip. With no reference the engine falls back to its default
/// voice.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait TtsSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        speaker_wav: Option<PathBuf>,
        out: &Path,
        language: &str,
    ) -> Result<(), TtsError>;
}
