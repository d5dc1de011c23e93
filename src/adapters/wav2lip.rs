use crate::ports::inference::{InferenceError, InferenceParams, LipSyncRunner};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Lip-sync inference via the bundled python tool.
pub struct Wav2LipCli {
    /// Directory containing inference.py and its model checkpoints
    tool_dir: PathBuf,
}

impl Wav2LipCli {
    pub fn new(tool_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool_dir: tool_dir.into(),
        }
    }
}

#[async_trait]
impl LipSyncRunner for Wav2LipCli {
    async fn run(
        &self,
        face: &Path,
        audio: &Path,
        outfile: &Path,
        _params: InferenceParams,
    ) -> Result<PathBuf, InferenceError> {
        // The tool's CLI only defines the three path flags; the tuning
        // knobs in params have no switches in the current revision.
        println!(
            "Running inference: --face {:?} --audio {:?} --outfile {:?}",
            face, audio, outfile
        );

        let output = Command::new("python3")
            .arg("inference.py")
            .arg("--face")
            .arg(face)
            .arg("--audio")
            .arg(audio)
            .arg("--outfile")
            .arg(outfile)
            .current_dir(&self.tool_dir)
            .output()
            .await
            .map_err(InferenceError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            };
            return Err(InferenceError::Failed(detail));
        }

        Ok(outfile.to_path_buf())
    }
}
