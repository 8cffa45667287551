//! HTTP front end.
//!
//! One analysis route plus a welcome message and a health check. Every reply
//! from the analysis route, success or failure, is a
//! [`ResponseEnvelope`]; the HTTP status always equals the envelope `code`.

use crate::analyze::Analyzer;
use crate::criteria::Criteria;
use crate::error::AnalyzerError;
use crate::output::{AnalysisResult, ResponseEnvelope};
use crate::pipeline::extract::UploadedDocument;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Path of the analysis endpoint.
pub const ANALYZE_ROUTE: &str = "/v1/analyzer/document";

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    /// Request bodies larger than this are rejected while reading.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(analyzer: Analyzer, max_upload_bytes: usize) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            max_upload_bytes,
        }
    }
}

/// Build the router with all endpoints and middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route(ANALYZE_ROUTE, post(analyze_document))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on {}", addr);
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Bind `addr` and serve forever.
pub async fn start_server(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    info!("Starting document analyzer on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, state, std::future::pending::<()>()).await
}

// ── Handlers ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct WelcomeResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn root() -> impl IntoResponse {
    Json(WelcomeResponse {
        message: "Welcome to the Document Analyzer API",
    })
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Fields collected from the multipart form.
#[derive(Debug, Default)]
struct AnalyzeForm {
    file: Option<Vec<u8>>,
    part_filename: Option<String>,
    filename: Option<String>,
    criteria: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, AnalyzerError> {
    let mut form = AnalyzeForm::default();
    loop {
        let field = multipart.next_field().await.map_err(stream_error)?;
        let Some(field) = field else { break };

        match field.name() {
            Some("file") => {
                form.part_filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(stream_error)?;
                form.file = Some(bytes.to_vec());
            }
            Some("filename") => {
                form.filename = Some(field.text().await.map_err(|e| {
                    AnalyzerError::MalformedRequest {
                        detail: format!("unreadable 'filename' field: {}", e.body_text()),
                    }
                })?);
            }
            Some("criteria") => {
                form.criteria = Some(field.text().await.map_err(|e| {
                    AnalyzerError::MalformedRequest {
                        detail: format!("unreadable 'criteria' field: {}", e.body_text()),
                    }
                })?);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// Classify a multipart stream failure.
///
/// Syntax errors in the body are the caller's fault. Exceeding the body
/// limit and transport failures are reported as a failed upload read.
fn stream_error(err: MultipartError) -> AnalyzerError {
    let status = err.status();
    let detail = err.body_text();
    if status.is_client_error() && status != StatusCode::PAYLOAD_TOO_LARGE {
        AnalyzerError::MalformedRequest { detail }
    } else {
        AnalyzerError::UploadRead { detail }
    }
}

async fn analyze_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ResponseEnvelope<AnalysisResult>>, AnalyzerError> {
    let multipart = multipart.map_err(|e| AnalyzerError::MalformedRequest {
        detail: e.body_text(),
    })?;
    let form = read_form(multipart).await?;

    let bytes = form.file.ok_or(AnalyzerError::MissingField { field: "file" })?;
    let filename = form
        .filename
        .filter(|f| !f.trim().is_empty())
        .or(form.part_filename)
        .unwrap_or_default();

    // Criteria are checked before any extraction work starts.
    let criteria = Criteria::parse_optional(form.criteria.as_deref())?;

    let result = state
        .analyzer
        .analyze(UploadedDocument::new(bytes, filename), criteria)
        .await?;
    Ok(Json(ResponseEnvelope::success(result)))
}

// ── Error mapping ────────────────────────────────────────────────────────

impl IntoResponse for AnalyzerError {
    fn into_response(self) -> Response {
        let envelope = ResponseEnvelope::<Value>::error(&self);
        let status =
            StatusCode::from_u16(envelope.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!("Request failed ({}): {}", envelope.code, self);
        } else {
            warn!("Request rejected ({}): {}", envelope.code, self);
        }
        (status, Json(envelope)).into_response()
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    AnalyzerError::Internal(format!("handler panicked: {detail}")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_becomes_internal_envelope() {
        let resp = handle_panic(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_keep_their_status() {
        let resp = AnalyzerError::InvalidCriteria {
            reason: "Criteria must be a valid JSON object string.".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn parsing_errors_are_500() {
        let resp = AnalyzerError::UnsupportedFormat {
            filename: "a.rtf".into(),
            extension: ".rtf".into(),
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
