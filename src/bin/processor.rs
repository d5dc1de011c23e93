//! Processor Binary - the processing service.
//!
//! A single /process endpoint that validates the face/audio pair,
//! extracts audio from the video when none was sent, and runs the
//! lip-sync inference tool.

use dubber::adapters::ffmpeg::FfmpegExtractor;
use dubber::adapters::http::process::{router, ProcessorState};
use dubber::adapters::wav2lip::Wav2LipCli;
use dubber::config::ProcessorConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = ProcessorConfig::from_env();

    tracing_subscriber::fmt::init();

    let addr = config.addr.clone();
    let port = config.port.clone();

    let state = Arc::new(ProcessorState {
        extractor: FfmpegExtractor::new(),
        runner: Wav2LipCli::new(&config.inference_dir),
        config,
    });

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", addr, port))
        .await
        .expect("Failed to bind TCP listener");
    println!("Listening at {}:{}", addr, port);
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
