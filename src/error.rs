//! Error types for the docanalyzer library.
//!
//! Two layers describe every failure:
//!
//! * [`ErrorKind`]: the closed, caller-visible taxonomy. Each kind owns a
//!   default HTTP-style status code and message, and is what ends up in the
//!   `{code, message}` part of a response envelope.
//!
//! * [`AnalyzerError`]: the diagnostic error actually propagated through
//!   the pipeline. Its `Display` output is meant for operators (logs); the
//!   caller only ever sees [`AnalyzerError::code`] and
//!   [`AnalyzerError::public_message`], which never include library or
//!   provider internals.

use serde::Serialize;
use thiserror::Error;

/// Caller-visible failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed caller input not otherwise classified.
    BadRequest,
    /// Caller-supplied criteria is not a JSON object of string → string.
    InvalidCriteriaFormat,
    /// The upload stream could not be read.
    FileReadError,
    /// Extraction failed or the extension is unsupported.
    DocumentParsingError,
    /// The remote call failed or its reply was malformed.
    LlmAnalysisError,
    /// Anything else.
    InternalServerError,
}

impl ErrorKind {
    /// HTTP-style status code associated with this kind.
    pub const fn code(self) -> u16 {
        match self {
            ErrorKind::BadRequest | ErrorKind::InvalidCriteriaFormat => 400,
            ErrorKind::FileReadError
            | ErrorKind::DocumentParsingError
            | ErrorKind::LlmAnalysisError
            | ErrorKind::InternalServerError => 500,
        }
    }

    /// Default message reported to the caller.
    pub const fn default_message(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::InvalidCriteriaFormat => "Invalid criteria format",
            ErrorKind::FileReadError => "File read error",
            ErrorKind::DocumentParsingError => "Document parsing error",
            ErrorKind::LlmAnalysisError => "LLM analysis error",
            ErrorKind::InternalServerError => "Internal server error",
        }
    }

    /// Default message with an optional caller-safe detail suffix.
    pub fn message_with(self, detail: Option<&str>) -> String {
        match detail {
            Some(d) if !d.is_empty() => format!("{}: {}", self.default_message(), d),
            _ => self.default_message().to_string(),
        }
    }
}

/// All errors returned by the docanalyzer library.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The request body could not be decoded as a multipart form.
    #[error("Malformed request: {detail}")]
    MalformedRequest { detail: String },

    /// The multipart form has no `file` part.
    #[error("Missing required form field '{field}'")]
    MissingField { field: &'static str },

    /// The `criteria` form field is not a JSON object of strings.
    #[error("Invalid criteria: {reason}")]
    InvalidCriteria { reason: String },

    /// Reading the bytes of an uploaded part failed.
    #[error("Failed to read uploaded file: {detail}")]
    UploadRead { detail: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The filename's extension is not one of `.pdf`, `.docx`, `.md`, `.txt`.
    #[error("Unsupported file extension '{extension}' for '{filename}'")]
    UnsupportedFormat { filename: String, extension: String },

    /// A Markdown or text file contains an invalid UTF-8 byte sequence.
    #[error("'{filename}' is not valid UTF-8: {source}")]
    InvalidEncoding {
        filename: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The PDF or DOCX structure could not be parsed.
    #[error("{format} '{filename}' is corrupt: {detail}")]
    CorruptDocument {
        format: &'static str,
        filename: String,
        detail: String,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The provider returned an error (transport, quota, authentication).
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The provider did not answer within the configured timeout.
    #[error("LLM call timed out after {secs}s")]
    LlmTimeout { secs: u64 },

    /// The reply was not the JSON object the prompt asked for.
    #[error("Malformed LLM reply: {detail}")]
    MalformedReply { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyzerError {
    /// The caller-visible classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalyzerError::MalformedRequest { .. } | AnalyzerError::MissingField { .. } => {
                ErrorKind::BadRequest
            }
            AnalyzerError::InvalidCriteria { .. } => ErrorKind::InvalidCriteriaFormat,
            AnalyzerError::UploadRead { .. } => ErrorKind::FileReadError,
            AnalyzerError::UnsupportedFormat { .. }
            | AnalyzerError::InvalidEncoding { .. }
            | AnalyzerError::CorruptDocument { .. } => ErrorKind::DocumentParsingError,
            AnalyzerError::LlmApiError { .. }
            | AnalyzerError::LlmTimeout { .. }
            | AnalyzerError::MalformedReply { .. } => ErrorKind::LlmAnalysisError,
            AnalyzerError::ProviderNotConfigured { .. }
            | AnalyzerError::InvalidConfig(_)
            | AnalyzerError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// HTTP-style status code for the response envelope.
    pub fn code(&self) -> u16 {
        self.kind().code()
    }

    /// Message for the response envelope.
    ///
    /// Only details that describe the caller's own input are appended;
    /// parser, provider and internal diagnostics stay in the logs.
    pub fn public_message(&self) -> String {
        let detail = match self {
            AnalyzerError::MalformedRequest { detail } => Some(detail.clone()),
            AnalyzerError::MissingField { field } => {
                Some(format!("missing required form field '{field}'"))
            }
            AnalyzerError::InvalidCriteria { reason } => Some(reason.clone()),
            AnalyzerError::UnsupportedFormat { extension, .. } => {
                Some(format!("unsupported file extension '{extension}'"))
            }
            AnalyzerError::InvalidEncoding { .. } => Some("file is not valid UTF-8 text".into()),
            AnalyzerError::LlmTimeout { secs } => Some(format!("timed out after {secs}s")),
            _ => None,
        };
        self.kind().message_with(detail.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_match_taxonomy() {
        assert_eq!(ErrorKind::BadRequest.code(), 400);
        assert_eq!(ErrorKind::InvalidCriteriaFormat.code(), 400);
        assert_eq!(ErrorKind::FileReadError.code(), 500);
        assert_eq!(ErrorKind::DocumentParsingError.code(), 500);
        assert_eq!(ErrorKind::LlmAnalysisError.code(), 500);
        assert_eq!(ErrorKind::InternalServerError.code(), 500);
    }

    #[test]
    fn message_with_appends_detail() {
        assert_eq!(
            ErrorKind::InvalidCriteriaFormat.message_with(Some("not an object")),
            "Invalid criteria format: not an object"
        );
        assert_eq!(ErrorKind::BadRequest.message_with(None), "Bad request");
        assert_eq!(ErrorKind::BadRequest.message_with(Some("")), "Bad request");
    }

    #[test]
    fn corrupt_document_hides_parser_detail() {
        let e = AnalyzerError::CorruptDocument {
            format: "PDF",
            filename: "a.pdf".into(),
            detail: "xref table broken at offset 1234".into(),
        };
        assert_eq!(e.kind(), ErrorKind::DocumentParsingError);
        assert_eq!(e.public_message(), "Document parsing error");
        assert!(e.to_string().contains("offset 1234"), "got: {e}");
    }

    #[test]
    fn llm_api_error_hides_provider_detail() {
        let e = AnalyzerError::LlmApiError {
            message: "401 invalid api key sk-abc".into(),
        };
        assert_eq!(e.code(), 500);
        assert_eq!(e.public_message(), "LLM analysis error");
    }

    #[test]
    fn unsupported_format_names_extension() {
        let e = AnalyzerError::UnsupportedFormat {
            filename: "slides.pptx".into(),
            extension: ".pptx".into(),
        };
        assert_eq!(
            e.public_message(),
            "Document parsing error: unsupported file extension '.pptx'"
        );
    }

    #[test]
    fn internal_is_generic() {
        let e = AnalyzerError::Internal("task panicked: index out of bounds".into());
        assert_eq!(e.kind(), ErrorKind::InternalServerError);
        assert_eq!(e.public_message(), "Internal server error");
    }

    #[test]
    fn kind_serialises_screaming_snake() {
        let json = serde_json::to_string(&ErrorKind::LlmAnalysisError).unwrap();
        assert_eq!(json, "\"LLM_ANALYSIS_ERROR\"");
    }
}
