//! The processing service endpoint: validate the face/audio pair,
//! extract audio when none was sent, run the lip-sync tool.

use crate::config::ProcessorConfig;
use crate::ports::inference::{InferenceParams, LipSyncRunner};
use crate::ports::media::AudioExtractor;
use crate::ports::processing::{ProcessErrorBody, ProcessRequest, ProcessResponse};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Shared state for the processing route.
pub struct ProcessorState<E, R> {
    pub config: ProcessorConfig,
    pub extractor: E,
    pub runner: R,
}

pub fn router<E, R>(state: Arc<ProcessorState<E, R>>) -> Router
where
    E: AudioExtractor + 'static,
    R: LipSyncRunner + 'static,
{
    Router::new()
        .route("/process", post(process::<E, R>))
        .with_state(state)
}

async fn process<E, R>(
    State(state): State<Arc<ProcessorState<E, R>>>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, (StatusCode, Json<ProcessErrorBody>)>
where
    E: AudioExtractor + 'static,
    R: LipSyncRunner + 'static,
{
    println!("Received face video path: {:?}", request.face);
    println!("Received audio file path: {:?}", request.audio);

    if request.face.as_os_str().is_empty() || !request.face.exists() {
        eprintln!(
            "Face video file not provided or doesn't exist at path: {:?}",
            request.face
        );
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Face video file not provided or doesn't exist.",
        ));
    }

    let audio = match &request.audio {
        Some(path) => path.clone(),
        None => extract_audio_from_video(&state.extractor, &request.face)
            .await
            .ok_or_else(|| {
                reject(
                    StatusCode::BAD_REQUEST,
                    "Failed to extract audio from the video.",
                )
            })?,
    };

    if !request.archive_folder.is_empty() {
        println!("Archive folder for this request: {}", request.archive_folder);
    }

    // Unique per request so concurrent calls never collide on one path
    let output_file = PathBuf::from(&state.config.upload_dir)
        .join(format!("output_{}.mp4", Uuid::new_v4()));

    let params = InferenceParams {
        iterations: request.iterations,
        downscale_percentage: request.downscale_percentage,
    };
    match state
        .runner
        .run(&request.face, &audio, &output_file, params)
        .await
    {
        Ok(path) => {
            println!(
                "Processing completed successfully. Output file saved at: {:?}",
                path
            );
            Ok(Json(ProcessResponse {
                message: Some("Processing completed".to_string()),
                output_file: path,
            }))
        }
        Err(e) => {
            eprintln!("{}", e);
            Err(reject(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))
        }
    }
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<ProcessErrorBody>) {
    (
        status,
        Json(ProcessErrorBody {
            error: message.to_string(),
        }),
    )
}

/// Extract audio next to the face video. `None` when the tool failed or
/// wrote nothing.
async fn extract_audio_from_video<E: AudioExtractor>(
    extractor: &E,
    face: &Path,
) -> Option<PathBuf> {
    let stem = face.file_stem()?.to_str()?;
    let audio_path = face.with_file_name(format!("{}_extracted.wav", stem));

    println!("Extracting audio from video: {:?}", face);
    match extractor.extract_audio(face, &audio_path).await {
        Ok(output) if output.status.success() && audio_path.exists() => {
            println!("Audio extracted and saved at: {:?}", audio_path);
            Some(audio_path)
        }
        Ok(output) => {
            eprintln!(
                "Failed to extract audio from the video: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            None
        }
        Err(e) => {
            eprintln!("Error extracting audio from video {:?}: {}", face, e);
            None
        }
    }
}
