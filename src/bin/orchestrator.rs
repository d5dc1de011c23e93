//! Orchestrator Binary - the task-facing half of the system.
//!
//! It wires up:
//! - The subprocess adapters (ffmpeg extraction, Coqui TTS)
//! - The reqwest client for the processing service
//! - The processing session (queue + sequential batch worker)
//! - The form UI / SSE HTTP layer

use dubber::adapters::client::HttpProcessingClient;
use dubber::adapters::ffmpeg::FfmpegExtractor;
use dubber::adapters::http::ui::{router, UiState};
use dubber::adapters::xtts::XttsCli;
use dubber::application::session::ProcessingSession;
use dubber::config::OrchestratorConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = OrchestratorConfig::from_env();

    tracing_subscriber::fmt::init();

    let client = HttpProcessingClient::new(config.processing_url.clone());
    let extractor = FfmpegExtractor::new();
    let tts = XttsCli::detect().await;

    let session = Arc::new(ProcessingSession::new(
        config.clone(),
        client,
        extractor,
        tts,
    ));
    let state = Arc::new(UiState::new(session, config.clone()));

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.addr, config.port))
        .await
        .expect("Failed to bind TCP listener");
    println!("Listening at {}:{}", config.addr, config.port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
