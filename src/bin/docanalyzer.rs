//! HTTP server binary for docanalyzer.
//!
//! Maps CLI flags and environment variables to `AnalyzerConfig`, resolves the
//! LLM provider once, then serves until Ctrl-C.

use anyhow::{Context, Result};
use clap::Parser;
use docanalyzer::{serve, Analyzer, AnalyzerConfig, AppState};
use std::io;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on the default address with an auto-detected provider
  OPENAI_API_KEY=sk-... docanalyzer

  # Pick provider and model explicitly
  docanalyzer --provider anthropic --model claude-sonnet-4-20250514

  # Grade a document
  curl -F file=@essay.pdf http://localhost:8000/v1/analyzer/document

  # Grade against custom criteria
  curl -F file=@essay.docx \
       -F 'criteria={"Argument": "Is the thesis defended?"}' \
       http://localhost:8000/v1/analyzer/document

ENVIRONMENT:
  OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, ...   provider credentials
  EDGEQUAKE_LLM_PROVIDER + EDGEQUAKE_MODEL                 provider pair
  RUST_LOG                                                 log filter override
"#;

#[derive(Parser, Debug)]
#[command(
    name = "docanalyzer",
    version,
    about = "Serve LLM-based document grading over HTTP",
    long_about = "Accepts PDF, DOCX, Markdown and plain-text uploads, grades them against \
named criteria with a language model, and returns feedback with per-criterion scores.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "DOCANALYZER_BIND", default_value = "0.0.0.0:8000")]
    bind: String,

    /// LLM model ID (e.g. gpt-4o, gpt-4o-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOCANALYZER_TEMPERATURE", default_value_t = 0.5)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "DOCANALYZER_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Timeout for the LLM call, in seconds.
    #[arg(long, env = "DOCANALYZER_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Documents longer than this many characters are truncated in the prompt.
    #[arg(long, env = "DOCANALYZER_MAX_CHARS", default_value_t = 128_000)]
    max_chars: usize,

    /// Maximum upload size in MiB.
    #[arg(long, env = "DOCANALYZER_MAX_UPLOAD_MB", default_value_t = 20)]
    max_upload_mb: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "DOCANALYZER_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Debug-level logging.
    #[arg(short, long, env = "DOCANALYZER_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else {
        "docanalyzer=info,tower_http=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli).await?;
    info!("Configuration: {:?}", config);

    let analyzer = Analyzer::from_config(&config)
        .await
        .context("Failed to initialise LLM provider")?;
    let state = AppState::new(analyzer, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;

    serve(listener, state, shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl-C, shutting down"),
        Err(e) => {
            warn!("Cannot listen for Ctrl-C ({}); serving until killed", e);
            std::future::pending::<()>().await
        }
    }
}

/// Map CLI args to `AnalyzerConfig`.
async fn build_config(cli: &Cli) -> Result<AnalyzerConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut config = AnalyzerConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .max_document_chars(cli.max_chars)
        .max_upload_bytes(cli.max_upload_mb.saturating_mul(1024 * 1024))
        .build()
        .context("Invalid configuration")?;

    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.system_prompt = system_prompt;

    Ok(config)
}
