//! Model metadata lookup: `GET {base}/v1beta/models/{model_id}`.

use std::sync::Arc;

use async_trait::async_trait;
use model_spec_core::{parse_model_metadata, MetadataParseError, TokenLimits};

use crate::llm::DEFAULT_API_BASE;

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Transport(String),
    #[error("metadata request returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("metadata body: {0}")]
    Parse(#[from] MetadataParseError),
    #[error("metadata for {0} yields a zero character limit")]
    ZeroLimit(String),
}

/// Fetches a URL with the API key header. Abstraction for testing.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET the URL and return the body of a 2xx response.
    async fn get(&self, url: &str, api_key: &str) -> Result<String, MetadataError>;
}

/// Reqwest-based HTTP client.
#[derive(Default)]
pub struct ReqwestHttpClient {
    http: reqwest::Client,
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, api_key: &str) -> Result<String, MetadataError> {
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", api_key)
            .send()
            .await
            .map_err(|e| MetadataError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MetadataError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(MetadataError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

/// The metadata collaborator: token limits of one model.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn get_model_metadata(
        &self,
        api_key: &str,
        model_id: &str,
    ) -> Result<TokenLimits, MetadataError>;
}

/// Metadata lookup against the Generative Language API.
pub struct GeminiMetadataClient {
    base_url: String,
    http_client: Arc<dyn HttpClient>,
}

impl GeminiMetadataClient {
    /// Public endpoint and reqwest client.
    pub fn new() -> Self {
        Self::with_client(DEFAULT_API_BASE.to_string(), Arc::new(ReqwestHttpClient::default()))
    }

    /// Create with custom base URL and HTTP client.
    pub fn with_client(base_url: String, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// Base URL from `QUICKREAD_API_BASE`, else the public endpoint.
    pub fn from_env() -> Self {
        match std::env::var("QUICKREAD_API_BASE") {
            Ok(base) if !base.trim().is_empty() => Self::with_client(
                base.trim().to_string(),
                Arc::new(ReqwestHttpClient::default()),
            ),
            _ => Self::new(),
        }
    }

    fn model_url(&self, model_id: &str) -> String {
        format!("{}/v1beta/models/{}", self.base_url, model_id)
    }
}

impl Default for GeminiMetadataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataClient for GeminiMetadataClient {
    async fn get_model_metadata(
        &self,
        api_key: &str,
        model_id: &str,
    ) -> Result<TokenLimits, MetadataError> {
        let body = self.http_client.get(&self.model_url(model_id), api_key).await?;
        Ok(parse_model_metadata(&body)?)
    }
}
