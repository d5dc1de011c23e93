//! Inbound HTTP for the orchestrator: the task form UI, upload staging,
//! batch control, and the status event stream.

use crate::application::session::ProcessingSession;
use crate::config::OrchestratorConfig;
use crate::domain::tasks::{TaskRow, TaskSpec};
use crate::ports::media::AudioExtractor;
use crate::ports::processing::ProcessingClient;
use crate::ports::tts::TtsSynthesizer;
use axum::{
    body::Bytes,
    extract::{multipart::Field, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Redirect, Response,
    },
    routing::{get, post},
    BoxError, Json, Router,
};
use futures::{Stream, StreamExt, TryStreamExt};
use std::convert::Infallible;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::{fs::File, io::BufWriter, sync::Mutex};
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

/// Shared state for the UI routes.
pub struct UiState<C, E, T> {
    pub session: Arc<ProcessingSession<C, E, T>>,
    pub config: OrchestratorConfig,
    batch: Mutex<Option<CancellationToken>>,
    running: AtomicBool,
}

impl<C, E, T> UiState<C, E, T> {
    pub fn new(session: Arc<ProcessingSession<C, E, T>>, config: OrchestratorConfig) -> Self {
        Self {
            session,
            config,
            batch: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }
}

pub fn router<C, E, T>(state: Arc<UiState<C, E, T>>) -> Router
where
    C: ProcessingClient + 'static,
    E: AudioExtractor + 'static,
    T: TtsSynthesizer + 'static,
{
    Router::new()
        .route("/", get(index::<C, E, T>))
        .route("/tasks", get(list_tasks::<C, E, T>).post(add_task::<C, E, T>))
        .route("/start", post(start::<C, E, T>))
        .route("/cancel", post(cancel::<C, E, T>))
        .route("/events", get(events::<C, E, T>))
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

async fn index<C, E, T>(State(state): State<Arc<UiState<C, E, T>>>) -> Html<String>
where
    C: ProcessingClient + 'static,
    E: AudioExtractor + 'static,
    T: TtsSynthesizer + 'static,
{
    let rows = state.session.rows().await;
    let outputs = state.session.outputs().await;

    let task_rows: String = rows
        .iter()
        .map(|row| format!("<tr><td>{}</td><td>{}</td></tr>", row.name, row.status))
        .collect();
    let output_items: String = outputs
        .iter()
        .map(|path| format!("<li>{}</li>", path.display()))
        .collect();

    Html(format!(
        r#"
        <!doctype html>
        <html>
            <head>
                <title>Lip-Sync Batch Processor</title>
            </head>
            <body>
                <h1>Lip-Sync Batch Processor</h1>
                <form action="/tasks" method="post" enctype="multipart/form-data">
                    <div><label>Task Name: <input type="text" name="task_name"></label></div>
                    <div><label>Face File (MP4 or Image): <input type="file" name="video"></label></div>
                    <div><label>Text for TTS: <textarea name="tts_text" rows="5"></textarea></label></div>
                    <div><label>Use Audio from Video: <input type="checkbox" name="use_video_audio" checked></label></div>
                    <div><label>Audio File: <input type="file" name="audio"></label></div>
                    <div><label>Number of Iterations: <input type="number" name="iterations" value="1" min="1"></label></div>
                    <div><label>Downscale Percentage: <input type="range" name="downscale_percentage" min="10" max="100" value="100"></label></div>
                    <div><label>Archive Folder Path: <input type="text" name="archive_folder" value="{}"></label></div>
                    <div><input type="submit" value="Add Task"></div>
                </form>
                <form action="/start" method="post"><input type="submit" value="Start Processing Tasks"></form>
                <form action="/cancel" method="post"><input type="submit" value="Cancel"></form>
                <h2>Tasks</h2>
                <table border="1"><tr><th>Task Name</th><th>Status</th></tr>{}</table>
                <h2>Output Files</h2>
                <ul>{}</ul>
                <script>
                    const source = new EventSource('/events');
                    source.onmessage = () => window.location.reload();
                </script>
            </body>
        </html>
        "#,
        state.config.upload_dir, task_rows, output_items
    ))
}

async fn list_tasks<C, E, T>(State(state): State<Arc<UiState<C, E, T>>>) -> Json<Vec<TaskRow>>
where
    C: ProcessingClient + 'static,
    E: AudioExtractor + 'static,
    T: TtsSynthesizer + 'static,
{
    Json(state.session.rows().await)
}

// Handler that accepts the task form and stages uploaded files.
async fn add_task<C, E, T>(
    State(state): State<Arc<UiState<C, E, T>>>,
    mut multipart: Multipart,
) -> Result<Redirect, (StatusCode, String)>
where
    C: ProcessingClient + 'static,
    E: AudioExtractor + 'static,
    T: TtsSynthesizer + 'static,
{
    let mut spec = TaskSpec {
        iterations: 1,
        downscale_percentage: 100,
        archive_folder: state.config.upload_dir.clone(),
        ..TaskSpec::default()
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(field_name) = field.name().map(str::to_owned) else {
            continue;
        };
        match field_name.as_str() {
            "video" | "audio" => {
                let Some(file_name) = field.file_name().map(str::to_owned) else {
                    continue;
                };
                // Browsers send an empty part when no file was chosen
                if file_name.is_empty() {
                    continue;
                }
                let staged = stage_upload(&state.config.waiting_dir, &file_name, field).await?;
                if field_name == "video" {
                    spec.video = Some(staged);
                } else {
                    spec.audio = Some(staged);
                }
            }
            "task_name" => spec.name = read_text(field).await?,
            "tts_text" => spec.tts_text = read_text(field).await?,
            "use_video_audio" => {
                let value = read_text(field).await?;
                spec.use_video_audio = matches!(value.as_str(), "on" | "true" | "1");
            }
            "iterations" => spec.iterations = read_text(field).await?.parse().unwrap_or(1),
            "downscale_percentage" => {
                spec.downscale_percentage = read_text(field).await?.parse().unwrap_or(100)
            }
            "archive_folder" => {
                let value = read_text(field).await?;
                if !value.trim().is_empty() {
                    spec.archive_folder = value;
                }
            }
            _ => {}
        }
    }

    state.session.add_task(spec).await;
    Ok(Redirect::to("/"))
}

async fn start<C, E, T>(State(state): State<Arc<UiState<C, E, T>>>) -> Response
where
    C: ProcessingClient + 'static,
    E: AudioExtractor + 'static,
    T: TtsSynthesizer + 'static,
{
    if state.session.is_empty().await {
        return "No tasks to process.".into_response();
    }
    if state.running.swap(true, Ordering::SeqCst) {
        return (StatusCode::CONFLICT, "Processing is already running.").into_response();
    }

    let cancel = CancellationToken::new();
    *state.batch.lock().await = Some(cancel.clone());

    let worker_state = state.clone();
    tokio::spawn(async move {
        worker_state.session.run_batch(cancel).await;
        worker_state.running.store(false, Ordering::SeqCst);
    });

    Redirect::to("/").into_response()
}

async fn cancel<C, E, T>(State(state): State<Arc<UiState<C, E, T>>>) -> Redirect
where
    C: ProcessingClient + 'static,
    E: AudioExtractor + 'static,
    T: TtsSynthesizer + 'static,
{
    if let Some(token) = &*state.batch.lock().await {
        token.cancel();
        println!("Cancellation requested; the current task will finish first");
    }
    Redirect::to("/")
}

// One SSE message per task status transition.
async fn events<C, E, T>(
    State(state): State<Arc<UiState<C, E, T>>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    C: ProcessingClient + 'static,
    E: AudioExtractor + 'static,
    T: TtsSynthesizer + 'static,
{
    let receiver = state.session.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|event| async move {
        match event {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(data) => Some(Ok(Event::default().data(data))),
                Err(_) => None,
            },
            // A lagged receiver just skips ahead
            Err(_) => None,
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn read_text(field: Field<'_>) -> Result<String, (StatusCode, String)> {
    field
        .text()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

async fn stage_upload(
    waiting_dir: &str,
    file_name: &str,
    field: Field<'_>,
) -> Result<PathBuf, (StatusCode, String)> {
    let Some(file_name) = safe_file_name(file_name) else {
        return Err((StatusCode::BAD_REQUEST, "Invalid path".to_owned()));
    };
    let dir = PathBuf::from(waiting_dir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let path = dir.join(file_name);
    println!("Saving new file to {:?}", path);
    stream_to_file(&path, field).await?;
    Ok(path)
}

/// Reduce an uploaded filename to its final component; traversal or
/// absolute paths are rejected rather than flattened.
fn safe_file_name(file_name: &str) -> Option<String> {
    let path = Path::new(file_name);
    if path
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return None;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .map(String::from)
}

// Save a `Stream` to a file
async fn stream_to_file<S, E>(path: &PathBuf, stream: S) -> Result<(), (StatusCode, String)>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<BoxError>,
{
    async {
        let body_with_io_error = stream.map_err(|err| io::Error::new(io::ErrorKind::Other, err));
        let body_reader = StreamReader::new(body_with_io_error);
        futures::pin_mut!(body_reader);

        let mut file = BufWriter::new(File::create(path).await?);
        tokio::io::copy(&mut body_reader, &mut file).await?;

        Ok::<_, io::Error>(())
    }
    .await
    .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))
}
