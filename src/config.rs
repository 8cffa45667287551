//! Configuration types for document analysis.
//!
//! Everything the service needs at runtime lives in [`AnalyzerConfig`],
//! constructed once at process start (usually from CLI flags and environment
//! variables) and handed to [`crate::analyze::Analyzer::from_config`]. Request
//! handlers never read the environment themselves.

use crate::error::AnalyzerError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Default LLM model when neither the config nor the environment names one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default prompt truncation threshold, in characters.
pub const DEFAULT_MAX_DOCUMENT_CHARS: usize = 128_000;

/// Configuration for the analysis service.
///
/// Built via [`AnalyzerConfig::builder()`] or using
/// [`AnalyzerConfig::default()`].
///
/// # Example
/// ```rust
/// use docanalyzer::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .model("gpt-4o-mini")
///     .temperature(0.2)
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.api_timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// LLM model identifier, e.g. "gpt-4o", "claude-sonnet-4-20250514".
    /// If None, [`DEFAULT_MODEL`] is used when a provider is named.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the completion. Default: 0.5.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate. Default: 4096.
    pub max_tokens: usize,

    /// Timeout for the single LLM call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Documents longer than this many characters are truncated before
    /// being placed in the prompt. Default: 128 000.
    pub max_document_chars: usize,

    /// Maximum accepted request body size in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,

    /// Custom system prompt. If None, uses the built-in evaluator prompt.
    pub system_prompt: Option<String>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.5,
            max_tokens: 4096,
            api_timeout_secs: 60,
            max_document_chars: DEFAULT_MAX_DOCUMENT_CHARS,
            max_upload_bytes: 20 * 1024 * 1024,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_document_chars", &self.max_document_chars)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_document_chars(mut self, n: usize) -> Self {
        self.config.max_document_chars = n;
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzerError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_document_chars == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "Document character limit must be ≥ 1".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "Upload size limit must be ≥ 1 byte".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
