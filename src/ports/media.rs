use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Output;

/// Extracts the audio track of a media file into a wav file.
///
/// Callers inspect the returned `Output` status themselves.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AudioExtractor: Send + Sync {
    async fn extract_audio(&self, video: &Path, out: &Path) -> io::Result<Output>;
}
