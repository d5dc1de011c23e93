//! Per-task media preparation: stage the face video, resolve the audio
//! source, optionally synthesize speech over it.

use crate::config::OrchestratorConfig;
use crate::domain::tasks::{sanitize_name, Task};
use crate::ports::media::AudioExtractor;
use crate::ports::processing::DispatchError;
use crate::ports::tts::{TtsError, TtsSynthesizer};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Face/audio pair ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMedia {
    pub face: PathBuf,
    pub audio: Option<PathBuf>,
}

/// Everything that can take a task down. Flattened to a message at the
/// task boundary; the batch keeps going either way.
#[derive(Debug)]
pub enum TaskError {
    MissingInput,
    Tts(TtsError),
    Downstream(DispatchError),
    Io(io::Error),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::MissingInput => write!(f, "No video file provided."),
            TaskError::Tts(e) => write!(f, "{}", e),
            TaskError::Downstream(e) => write!(f, "{}", e),
            TaskError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TaskError::MissingInput => None,
            TaskError::Tts(e) => Some(e),
            TaskError::Downstream(e) => Some(e),
            TaskError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for TaskError {
    fn from(err: io::Error) -> Self {
        TaskError::Io(err)
    }
}

impl From<TtsError> for TaskError {
    fn from(err: TtsError) -> Self {
        TaskError::Tts(err)
    }
}

impl From<DispatchError> for TaskError {
    fn from(err: DispatchError) -> Self {
        TaskError::Downstream(err)
    }
}

fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}

/// Run the fixed media-preparation steps for one task.
///
/// Ordering matters: TTS runs last so a synthesized clip replaces
/// whichever audio was resolved before it.
pub async fn prepare_media<E, T>(
    config: &OrchestratorConfig,
    extractor: &E,
    tts: &T,
    task: &Task,
) -> Result<PreparedMedia, TaskError>
where
    E: AudioExtractor,
    T: TtsSynthesizer,
{
    let name = sanitize_name(&task.name);
    let upload_dir = PathBuf::from(&config.upload_dir);
    tokio::fs::create_dir_all(&upload_dir).await?;

    // 1. Stage the face video under a task-qualified name
    let source_video = task.video.as_ref().ok_or(TaskError::MissingInput)?;
    let video_path = upload_dir.join(format!("{}_video{}", name, dotted_extension(source_video)));
    tokio::fs::copy(source_video, &video_path).await?;
    println!("Task '{}': video file moved to: {:?}", task.name, video_path);

    // 2. Resolve the audio source
    let mut audio_path = if task.use_video_audio {
        let dest = upload_dir.join(format!("{}_extracted_audio.wav", name));
        // No existence check afterwards; a bad path surfaces as a 400
        // from the processing service
        match extractor.extract_audio(&video_path, &dest).await {
            Ok(output) if output.status.success() => {
                println!(
                    "Task '{}': audio extracted from video to: {:?}",
                    task.name, dest
                );
            }
            Ok(output) => {
                eprintln!(
                    "Task '{}': audio extraction exited with {}",
                    task.name, output.status
                );
            }
            Err(e) => {
                eprintln!("Task '{}': could not run audio extraction: {}", task.name, e);
            }
        }
        Some(dest)
    } else if let Some(source_audio) = &task.audio {
        let dest = upload_dir.join(format!("{}_audio{}", name, dotted_extension(source_audio)));
        tokio::fs::copy(source_audio, &dest).await?;
        println!("Task '{}': audio file moved to: {:?}", task.name, dest);
        Some(dest)
    } else {
        println!("Task '{}': no audio file provided.", task.name);
        None
    };

    // 3. Synthesized speech replaces whatever audio was resolved above
    if !task.tts_text.trim().is_empty() {
        if audio_path.is_none() {
            println!(
                "Task '{}': no speaker audio provided. Using default voice.",
                task.name
            );
        }
        let tts_out = upload_dir.join(format!("{}_tts_output.wav", name));
        tts.synthesize(
            &task.tts_text,
            audio_path.clone(),
            &tts_out,
            &config.tts_language,
        )
        .await?;
        println!(
            "Task '{}': TTS audio generated and saved to: {:?}",
            task.name, tts_out
        );
        audio_path = Some(tts_out);
    }

    Ok(PreparedMedia {
        face: video_path,
        audio: audio_path,
    })
}
