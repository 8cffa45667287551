//! Document analysis entry point.
//!
//! [`Analyzer`] ties the pipeline stages together for one upload:
//! extract text, grade it with a single LLM call, then aggregate the scores.
//! It is built once at start-up and shared (behind an `Arc`) by every
//! request handler.

use crate::config::{AnalyzerConfig, DEFAULT_MODEL};
use crate::criteria::Criteria;
use crate::error::AnalyzerError;
use crate::output::AnalysisResult;
use crate::pipeline::extract::{extract_in_background, UploadedDocument};
use crate::pipeline::llm::{AnalysisClient, CompletionBackend, ProviderBackend};
use crate::pipeline::score;
use crate::prompts::DEFAULT_SYSTEM_PROMPT;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Grades uploaded documents.
#[derive(Debug, Clone)]
pub struct Analyzer {
    client: AnalysisClient,
}

impl Analyzer {
    /// Wrap an already configured client.
    pub fn new(client: AnalysisClient) -> Self {
        Self { client }
    }

    /// Resolve the provider named by `config` and build an analyzer from it.
    pub async fn from_config(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let provider = resolve_provider(config).await?;
        Ok(Self::with_backend(Arc::new(ProviderBackend::new(provider)), config))
    }

    /// Build an analyzer over an arbitrary backend, applying the sampling,
    /// timeout and truncation settings from `config`.
    pub fn with_backend(backend: Arc<dyn CompletionBackend>, config: &AnalyzerConfig) -> Self {
        let client = AnalysisClient::new(backend)
            .with_system_prompt(
                config
                    .system_prompt
                    .as_deref()
                    .unwrap_or(DEFAULT_SYSTEM_PROMPT),
            )
            .with_sampling(config.temperature, config.max_tokens)
            .with_timeout(Duration::from_secs(config.api_timeout_secs))
            .with_max_document_chars(config.max_document_chars);
        Self { client }
    }

    /// Analyse one document.
    ///
    /// `criteria` of `None`, or an empty set, means the built-in defaults. Extraction failure
    /// stops the pipeline before any LLM call is made.
    pub async fn analyze(
        &self,
        document: UploadedDocument,
        criteria: Option<Criteria>,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let start = Instant::now();
        let filename = document.filename.clone();
        info!("Analysing '{}' ({} bytes)", filename, document.bytes.len());

        // ── Step 1: Extract text ─────────────────────────────────────────
        let text = extract_in_background(document).await?;

        // ── Step 2: Grade ────────────────────────────────────────────────
        let criteria = criteria.filter(|c| !c.is_empty()).unwrap_or_default();
        debug!(
            "Using criteria: {}",
            criteria.names().collect::<Vec<_>>().join(", ")
        );
        let raw = self.client.analyze(&text, &criteria).await?;

        // ── Step 3: Aggregate ────────────────────────────────────────────
        let overall_score = score::aggregate(&raw.scores);

        info!(
            "Analysis of '{}' complete in {:?} (overall score: {:?})",
            filename,
            start.elapsed(),
            overall_score
        );

        Ok(AnalysisResult {
            feedback: raw.feedback,
            scores: raw.scores,
            overall_score,
        })
    }
}

// ── Provider resolution ─────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, AnalyzerError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        AnalyzerError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`].
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`,
///    when both are set.
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** via [`ProviderFactory::from_env`].
pub async fn resolve_provider(
    config: &AnalyzerConfig,
) -> Result<Arc<dyn LLMProvider>, AnalyzerError> {
    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    // 1) Caller-built provider
    if let Some(ref provider) = config.provider {
        info!("Using pre-built LLM provider");
        return Ok(Arc::clone(provider));
    }

    // 2) Provider named in config or on the command line
    if let Some(ref name) = config.provider_name {
        info!("Using LLM provider '{}' with model '{}'", name, model);
        return create_provider(name, model);
    }

    // 3) Deployment-level provider/model pair
    if let (Some(name), Some(env_model)) = (
        non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_env("EDGEQUAKE_MODEL"),
    ) {
        info!("Using LLM provider '{}' with model '{}' from environment", name, env_model);
        return create_provider(&name, &env_model);
    }

    // 4) OpenAI key present
    if non_empty_env("OPENAI_API_KEY").is_some() {
        info!("OPENAI_API_KEY found, grading with OpenAI model '{}'", model);
        return create_provider("openai", model);
    }

    // 5) Whatever the factory can find
    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| AnalyzerError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "The grading service needs an LLM. Pass --provider/--model, set \
                EDGEQUAKE_LLM_PROVIDER and EDGEQUAKE_MODEL, or export a provider API key \
                such as OPENAI_API_KEY.\nFactory error: {e}"
            ),
        })?;

    Ok(llm_provider)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
