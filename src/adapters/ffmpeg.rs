use crate::ports::media::AudioExtractor;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;

/// Audio extraction via the ffmpeg CLI.
///
/// `-q:a 0 -map a` keeps the best-quality audio stream and drops video.
#[derive(Clone, Copy)]
pub struct FfmpegExtractor;

impl FfmpegExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract_audio(&self, video: &Path, out: &Path) -> io::Result<Output> {
        Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-q:a")
            .arg("0")
            .arg("-map")
            .arg("a")
            .arg(out)
            .output()
            .await
    }
}
