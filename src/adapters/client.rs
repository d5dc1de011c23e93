use crate::ports::processing::{
    DispatchError, ProcessErrorBody, ProcessRequest, ProcessResponse, ProcessingClient,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::PathBuf;

/// reqwest-backed client for the processing service.
///
/// No request timeout is configured: an inference run can take many
/// minutes and the batch blocks on it either way.
pub struct HttpProcessingClient {
    client: Client,
    endpoint: String,
}

impl HttpProcessingClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ProcessingClient for HttpProcessingClient {
    async fn process(&self, request: ProcessRequest) -> Result<PathBuf, DispatchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        if response.status() == StatusCode::OK {
            let body: ProcessResponse = response
                .json()
                .await
                .map_err(|e| DispatchError::Transport(e.to_string()))?;
            Ok(body.output_file)
        } else {
            let message = match response.json::<ProcessErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => String::from("Unknown error"),
            };
            Err(DispatchError::Rejected(message))
        }
    }
}
