//! LLM interaction: one grading request per document.
//!
//! [`AnalysisClient`] owns everything that shapes the call (system prompt,
//! sampling options, timeout, truncation limit) and delegates the actual
//! network exchange to a [`CompletionBackend`]. In production the backend is
//! [`ProviderBackend`], a thin wrapper over an `edgequake_llm` provider; tests
//! substitute a scripted backend.
//!
//! There is no retry. A failed or malformed reply fails the request.

use crate::criteria::Criteria;
use crate::error::AnalyzerError;
use crate::pipeline::reply::{parse_reply, RawAnalysis};
use crate::prompts::{build_prompt, system_message, DEFAULT_SYSTEM_PROMPT, EMPTY_DOCUMENT_FEEDBACK};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A single rendered completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// The reply must be a single JSON object.
    pub json_response: bool,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// Anything that can turn a [`CompletionRequest`] into reply text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AnalyzerError>;
}

/// [`CompletionBackend`] over an `edgequake_llm` provider.
#[derive(Clone)]
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

impl std::fmt::Debug for ProviderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderBackend")
            .field("provider", &"<dyn LLMProvider>")
            .finish()
    }
}

#[async_trait]
impl CompletionBackend for ProviderBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AnalyzerError> {
        let messages = vec![
            ChatMessage::system(system_message(&request.system, request.json_response)),
            ChatMessage::user(request.user.as_str()),
        ];
        let options = build_options(request);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| AnalyzerError::LlmApiError {
                message: e.to_string(),
            })?;

        debug!(
            "LLM reply: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

fn build_options(request: &CompletionRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        ..Default::default()
    }
}

/// Sends a document to the LLM for grading and validates the reply.
///
/// Holds no per-call mutable state; one instance is shared by all requests.
#[derive(Clone)]
pub struct AnalysisClient {
    backend: Arc<dyn CompletionBackend>,
    system_prompt: String,
    temperature: f32,
    max_tokens: usize,
    timeout: Duration,
    max_document_chars: usize,
}

impl std::fmt::Debug for AnalysisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisClient")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("max_document_chars", &self.max_document_chars)
            .finish_non_exhaustive()
    }
}

impl AnalysisClient {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.5,
            max_tokens: 4096,
            timeout: Duration::from_secs(60),
            max_document_chars: crate::config::DEFAULT_MAX_DOCUMENT_CHARS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: usize) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_document_chars(mut self, n: usize) -> Self {
        self.max_document_chars = n;
        self
    }

    /// Grade `text` against `criteria`.
    ///
    /// Empty (or whitespace-only) text never reaches the backend: the result
    /// is a canned message with every criterion scored 0. Otherwise exactly
    /// one backend call is made.
    pub async fn analyze(
        &self,
        text: &str,
        criteria: &Criteria,
    ) -> Result<RawAnalysis, AnalyzerError> {
        if text.trim().is_empty() {
            warn!("Document text is empty; skipping LLM call");
            return Ok(empty_document_analysis(criteria));
        }

        let request = CompletionRequest {
            system: self.system_prompt.clone(),
            user: build_prompt(text, criteria, self.max_document_chars),
            json_response: true,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        info!(
            "Sending analysis request ({} chars of prompt, {} criteria)",
            request.user.len(),
            criteria.len()
        );
        let start = Instant::now();

        let reply = tokio::time::timeout(self.timeout, self.backend.complete(&request))
            .await
            .map_err(|_| {
                warn!("LLM call exceeded {:?}", self.timeout);
                AnalyzerError::LlmTimeout {
                    secs: self.timeout.as_secs(),
                }
            })??;

        debug!("LLM call finished in {:?}", start.elapsed());
        parse_reply(&reply).inspect_err(|e| warn!("Rejecting LLM reply: {}", e))
    }
}

fn empty_document_analysis(criteria: &Criteria) -> RawAnalysis {
    let scores: Map<String, Value> = criteria
        .names()
        .map(|name| (name.to_string(), Value::from(0)))
        .collect();
    RawAnalysis {
        feedback: EMPTY_DOCUMENT_FEEDBACK.to_string(),
        scores,
    }
}
