//! Configuration for the two deployment processes.

use std::env;

/// Configuration for the orchestrator process.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Directory all task media artifacts are copied into
    pub upload_dir: String,
    /// Staging directory for raw browser uploads
    pub waiting_dir: String,
    /// Full URL of the processing service endpoint
    pub processing_url: String,
    /// Language passed to the TTS engine
    pub tts_language: String,
}

impl OrchestratorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("0.0.0.0")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("7860")),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| String::from("/app/uploads")),
            waiting_dir: env::var("WAITING_DIR").unwrap_or_else(|_| String::from("/app/waiting")),
            processing_url: env::var("PROCESSING_URL")
                .unwrap_or_else(|_| String::from("http://processing-container:5000/process")),
            tts_language: env::var("TTS_LANGUAGE").unwrap_or_else(|_| String::from("fr")),
        }
    }
}

/// Configuration for the processing service.
#[derive(Clone, Debug)]
pub struct ProcessorConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Directory output videos are written into
    pub upload_dir: String,
    /// Directory containing the inference tool checkout
    pub inference_dir: String,
}

impl ProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            addr: env::var("ADDR").unwrap_or_else(|_| String::from("0.0.0.0")),
            port: env::var("PORT").unwrap_or_else(|_| String::from("5000")),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| String::from("/app/uploads")),
            inference_dir: env::var("INFERENCE_DIR").unwrap_or_else(|_| String::from("/app")),
        }
    }
}
