//! Vision API interaction: send one document, get back its JSON answer.
//!
//! The HTTP call sits behind [`VisionBackend`] so the client logic (MIME
//! gate, retries, timeout, response cleanup) can be exercised without a
//! network. [`GeminiBackend`] is the production implementation.
//!
//! ## Retry Strategy
//!
//! Transport errors, timeouts, HTTP 429 and 5xx are transient under load and
//! are retried with exponential backoff (`retry_backoff_ms * 2^(attempt-1)`).
//! Other statuses (bad key, bad request) fail on the first attempt.

use crate::config::ExtractionConfig;
use crate::document::is_supported_mime;
use crate::error::{DocumentError, VisionParseError};
use crate::pipeline::encode::{encode_request, GenerateContentRequest};
use crate::pipeline::postprocess::{clean_response, EMPTY_JSON};
use crate::prompts::DEFAULT_PROMPT;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// Raw HTTP answer from the vision API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

/// Transport for `generateContent` requests.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Send one request. An `Err` means no HTTP response was obtained.
    async fn send(&self, request: &GenerateContentRequest) -> Result<BackendResponse, DocumentError>;
}

/// `reqwest`-backed transport for the Gemini `generateContent` endpoint.
pub struct GeminiBackend {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(config: &ExtractionConfig) -> Result<Self, VisionParseError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| VisionParseError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl VisionBackend for GeminiBackend {
    async fn send(&self, request: &GenerateContentRequest) -> Result<BackendResponse, DocumentError> {
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| DocumentError::Transport {
                detail: e.without_url().to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| DocumentError::Transport {
            detail: e.without_url().to_string(),
        })?;

        Ok(BackendResponse { status, body })
    }
}

/// Extracts structured fields from one document per call.
///
/// Holds no per-call state; clone freely (the backend is shared).
#[derive(Clone)]
pub struct ExtractionClient {
    backend: Arc<dyn VisionBackend>,
    config: ExtractionConfig,
}

impl ExtractionClient {
    /// Client talking to the configured Gemini endpoint.
    pub fn new(config: ExtractionConfig) -> Result<Self, VisionParseError> {
        let backend = GeminiBackend::new(&config)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Client using a caller-provided transport (tests, proxies, caching layers).
    pub fn with_backend(config: ExtractionConfig, backend: Arc<dyn VisionBackend>) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract fields from a file, returning the model's cleaned JSON text.
    ///
    /// Fails only with [`VisionParseError::UnsupportedFileType`], before any
    /// request is made. Every other failure (non-200, transport, malformed
    /// body) yields the literal `"{}"`; use [`Self::extract_detailed`] to tell
    /// those apart.
    pub async fn extract(
        &self,
        file_bytes: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, VisionParseError> {
        match self.extract_detailed(file_bytes, mime_type, prompt).await {
            Ok(text) => Ok(text),
            Err(DocumentError::UnsupportedFileType { mime_type }) => {
                Err(VisionParseError::UnsupportedFileType { mime_type })
            }
            Err(e) => {
                warn!("Extraction failed, falling back to empty result: {}", e);
                Ok(EMPTY_JSON.to_string())
            }
        }
    }

    /// [`Self::extract`] with [`DEFAULT_PROMPT`].
    pub async fn extract_default(
        &self,
        file_bytes: &[u8],
        mime_type: &str,
    ) -> Result<String, VisionParseError> {
        self.extract(file_bytes, mime_type, DEFAULT_PROMPT).await
    }

    /// Extract fields, keeping the failure cause.
    pub async fn extract_detailed(
        &self,
        file_bytes: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<String, DocumentError> {
        self.extract_with_retries(file_bytes, mime_type, prompt)
            .await
            .0
    }

    /// Extract fields, returning the outcome and how many retries it took.
    pub(crate) async fn extract_with_retries(
        &self,
        file_bytes: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> (Result<String, DocumentError>, u8) {
        if !is_supported_mime(mime_type) {
            return (
                Err(DocumentError::UnsupportedFileType {
                    mime_type: mime_type.to_string(),
                }),
                0,
            );
        }

        let request = encode_request(file_bytes, mime_type, prompt);
        let mut last_err = DocumentError::Transport {
            detail: "no attempt made".into(),
        };

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = backoff_ms(self.config.retry_backoff_ms, attempt);
                warn!(
                    "Retry {}/{} after {}ms: {}",
                    attempt, self.config.max_retries, backoff, last_err
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.attempt(&request).await {
                Ok(text) => {
                    debug!("Extraction succeeded after {} retries ({} chars)", attempt, text.len());
                    return (Ok(text), retry_count(attempt));
                }
                Err(e) if e.is_retryable() => last_err = e,
                Err(e) => return (Err(e), retry_count(attempt)),
            }
        }

        (Err(last_err), retry_count(self.config.max_retries))
    }

    /// One request/response round trip, bounded by the configured timeout.
    async fn attempt(&self, request: &GenerateContentRequest) -> Result<String, DocumentError> {
        let secs = self.config.api_timeout_secs;
        let response = timeout(Duration::from_secs(secs), self.backend.send(request))
            .await
            .map_err(|_| DocumentError::Timeout { secs })??;

        debug!("Vision API responded with HTTP {}", response.status);

        if response.status != 200 {
            return Err(DocumentError::HttpStatus {
                status: response.status,
                detail: truncate(&response.body, 200),
            });
        }

        clean_response(&response.body)
    }
}

/// Upper bound on a single retry delay.
const MAX_BACKOFF_MS: u64 = 60_000;

/// `base * 2^(attempt-1)`, saturating and capped at [`MAX_BACKOFF_MS`].
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    let factor = 2u64.checked_pow(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    base.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

fn retry_count(attempt: u32) -> u8 {
    u8::try_from(attempt).unwrap_or(u8::MAX)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}
