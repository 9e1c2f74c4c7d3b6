//! Failures of a backend call that never produced an API response.

use super::types::{ApiError, GenerationResult};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// A 2xx response whose body (or one stream event) is not a response body.
    #[error("invalid response body: {message}")]
    Decode { status: u16, message: String },
}

impl From<BackendError> for GenerationResult {
    /// Transport errors get status 0; decode errors keep the HTTP status.
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::Transport(_) => GenerationResult::transport_failure(e.to_string()),
            BackendError::Decode { status, .. } => {
                GenerationResult::failure(status, ApiError::new(e.to_string()))
            }
        }
    }
}
