use crate::ports::tts::{TtsError, TtsSynthesizer};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;

const XTTS_MODEL: &str = "tts_models/multilingual/multi-dataset/xtts_v2";

/// Speech synthesis via the Coqui `tts` CLI using the XTTS v2 model.
///
/// The compute device is probed once at construction: synthesis runs on
/// the GPU when a CUDA device is present, on CPU otherwise.
pub struct XttsCli {
    use_cuda: bool,
}

impl XttsCli {
    /// Probe for a CUDA device and build the adapter accordingly.
    pub async fn detect() -> Self {
        let use_cuda = cuda_available().await;
        if use_cuda {
            println!("TTS: CUDA device detected, synthesis will run on GPU");
        } else {
            println!("TTS: no CUDA device, synthesis will run on CPU");
        }
        Self { use_cuda }
    }

    pub fn with_device(use_cuda: bool) -> Self {
        Self { use_cuda }
    }
}

/// nvidia-smi exits 0 only when a driver and at least one GPU are present
async fn cuda_available() -> bool {
    match Command::new("nvidia-smi").arg("-L").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[async_trait]
impl TtsSynthesizer for XttsCli {
    async fn synthesize(
        &self,
        text: &str,
        speaker_wav: Option<PathBuf>,
        out: &Path,
        language: &str,
    ) -> Result<(), TtsError> {
        let started = Instant::now();

        let mut command = Command::new("tts");
        command
            .env("TTS_SKIP_TOS", "true")
            .arg("--model_name")
            .arg(XTTS_MODEL)
            .arg("--text")
            .arg(text)
            .arg("--language_idx")
            .arg(language)
            .arg("--out_path")
            .arg(out);
        if let Some(speaker) = speaker_wav {
            command.arg("--speaker_wav").arg(speaker);
        }
        if self.use_cuda {
            command.arg("--use_cuda").arg("true");
        }

        let output = command.output().await.map_err(TtsError::Spawn)?;
        if !output.status.success() {
            return Err(TtsError::Synthesis(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        println!(
            "TTS audio generated in {:.2} seconds.",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
