//! Configuration for the extraction client and batch orchestrator.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`] or read from the environment with
//! [`ExtractionConfig::from_env`]. The config is injected into
//! [`crate::pipeline::extract::ExtractionClient`] at construction; nothing in
//! the library reads the API key from global state.

use crate::error::VisionParseError;
use crate::progress::BatchProgressCallback;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Largest accepted `max_retries`; the count is reported as a `u8`.
pub const MAX_RETRIES: u32 = u8::MAX as u32;

/// Configuration for a batch extraction run.
///
/// # Example
/// ```rust
/// use visionparse::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .api_key("test-key")
///     .concurrency(8)
///     .model("gemini-1.5-pro")
///     .build()
///     .unwrap();
/// assert!(config.endpoint().ends_with("gemini-1.5-pro:generateContent"));
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// API key sent as the `key` query parameter.
    pub api_key: String,

    /// API root, without a trailing slash. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Number of documents extracted at once. Default: 4.
    ///
    /// Results are always returned in document order regardless of this value.
    pub concurrency: usize,

    /// Retry attempts on a transient failure (transport, timeout, 429, 5xx). Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds; doubles per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-request timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Optional progress sink.
    pub progress_callback: Option<Arc<dyn BatchProgressCallback>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            concurrency: 4,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read settings from the environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `GEMINI_API_KEY` | `api_key` (required) |
    /// | `VISIONPARSE_MODEL` | `model` |
    /// | `VISIONPARSE_BASE_URL` | `base_url` |
    pub fn from_env() -> Result<Self, VisionParseError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(VisionParseError::MissingApiKey)?;

        let mut builder = Self::builder().api_key(api_key);
        if let Ok(model) = std::env::var("VISIONPARSE_MODEL") {
            if !model.is_empty() {
                builder = builder.model(model);
            }
        }
        if let Ok(url) = std::env::var("VISIONPARSE_BASE_URL") {
            if !url.is_empty() {
                builder = builder.base_url(url);
            }
        }
        builder.build()
    }

    /// Full `generateContent` URL for the configured model (without the key).
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn BatchProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, VisionParseError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(VisionParseError::MissingApiKey);
        }
        if c.model.trim().is_empty() {
            return Err(VisionParseError::InvalidConfig("Model must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(VisionParseError::InvalidConfig(format!(
                "Base URL must be http(s), got '{}'",
                c.base_url
            )));
        }
        if c.max_retries > MAX_RETRIES {
            return Err(VisionParseError::InvalidConfig(format!(
                "Max retries must be ≤ {MAX_RETRIES}, got {}",
                c.max_retries
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(VisionParseError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ExtractionConfig::builder().api_key("k").build().unwrap();
        assert_eq!(c.concurrency, 4);
        assert_eq!(c.max_retries, 2);
        assert_eq!(
            c.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn missing_key_rejected() {
        let err = ExtractionConfig::builder().build().unwrap_err();
        assert!(matches!(err, VisionParseError::MissingApiKey));
    }

    #[test]
    fn concurrency_clamped_to_one() {
        let c = ExtractionConfig::builder()
            .api_key("k")
            .concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let c = ExtractionConfig::builder()
            .api_key("k")
            .base_url("http://localhost:8080/v1/")
            .model("m")
            .build()
            .unwrap();
        assert_eq!(c.endpoint(), "http://localhost:8080/v1/models/m:generateContent");
    }

    #[test]
    fn invalid_base_url_rejected() {
        let err = ExtractionConfig::builder()
            .api_key("k")
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, VisionParseError::InvalidConfig(_)));
    }

    #[test]
    fn excessive_retries_rejected() {
        let err = ExtractionConfig::builder()
            .api_key("k")
            .max_retries(MAX_RETRIES + 1)
            .build()
            .unwrap_err();
        assert!(matches!(err, VisionParseError::InvalidConfig(_)));

        let c = ExtractionConfig::builder()
            .api_key("k")
            .max_retries(MAX_RETRIES)
            .build()
            .unwrap();
        assert_eq!(c.max_retries, MAX_RETRIES);
    }

    #[test]
    fn debug_redacts_key() {
        let c = ExtractionConfig::builder().api_key("secret").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
