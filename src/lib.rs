//! # docanalyzer
//!
//! Grade uploaded documents against named criteria with a large language
//! model, and serve that over HTTP.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (multipart)
//!  │
//!  ├─ 1. Extract  PDF / DOCX / Markdown / text → plain text (spawn_blocking)
//!  ├─ 2. Prompt   document + criteria → grading instructions
//!  ├─ 3. LLM      exactly one completion call, bounded by a timeout
//!  ├─ 4. Validate reply must be {"feedback": …, "scores": {…}}
//!  └─ 5. Score    overall_score = mean of the numeric scores
//! ```
//!
//! An empty document skips steps 2–4: every criterion is scored 0 and a
//! fixed feedback message is returned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docanalyzer::{AnalyzerConfig, Analyzer, AppState, start_server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = AnalyzerConfig::default();
//!     let analyzer = Analyzer::from_config(&config).await?;
//!     let state = AppState::new(analyzer, config.max_upload_bytes);
//!     start_server("0.0.0.0:8000", state).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docanalyzer` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod criteria;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{resolve_provider, Analyzer};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use criteria::{Criteria, DEFAULT_CRITERIA};
pub use error::{AnalyzerError, ErrorKind};
pub use output::{AnalysisResult, ResponseEnvelope};
pub use pipeline::extract::{DocumentFormat, UploadedDocument};
pub use pipeline::llm::{AnalysisClient, CompletionBackend, CompletionRequest, ProviderBackend};
pub use server::{router, serve, start_server, AppState};
