//! Pipeline stages for document analysis.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own without the HTTP layer or a live provider.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ llm ──▶ reply ──▶ score
//! (bytes→text) (one call) (validate) (mean)
//! ```
//!
//! 1. [`extract`]: dispatch on extension, pull plain text out of PDF, DOCX,
//!    Markdown or text; runs in `spawn_blocking`
//! 2. [`llm`]: build the grading prompt and make the single LLM call;
//!    the only stage with network I/O
//! 3. [`reply`]: strip fences and validate the `{feedback, scores}` object
//! 4. [`score`]: average the numeric scores into `overall_score`

pub mod extract;
pub mod llm;
pub mod reply;
pub mod score;
