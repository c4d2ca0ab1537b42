//! Error types for the tcm-reportkit library.
//!
//! One enum covers the two user-visible failure boundaries:
//!
//! * **Generation** — the Gemini call failed, timed out, or returned text
//!   from which no JSON value could be recovered. Surfaced with a
//!   distinguished variant per cause so the UI can show a specific retry
//!   prompt (plain retry vs. retry-with-smaller-scope vs. check-your-network).
//!
//! * **Export** — the rendered report contained no visible content, or the
//!   rasterisation backend could not produce a bitmap. A partial PDF is
//!   never returned; export is all-or-nothing.
//!
//! Structural malformation *inside* an already-parsed response is not an
//! error anywhere: the payload normaliser and the menu normaliser degrade to
//! placeholders instead, because a partially useful report beats a discarded
//! one. Nothing in this crate retries automatically — retry is always a
//! fresh caller-initiated action.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the tcm-reportkit library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Extraction errors ─────────────────────────────────────────────────
    /// Every fallback stage of the JSON extractor failed.
    ///
    /// Carries the original raw model output for diagnostics. The UI maps
    /// this to "AI returned non-standard output, please retry."
    #[error("AI response is not valid JSON; no parseable value could be recovered")]
    NotJson { raw: String },

    /// JSON parsing failed *and* the response was cut off at the token
    /// limit. Distinguished from [`ReportError::NotJson`] so the user is
    /// told to retry with a reduced scope rather than simply "retry".
    #[error("AI output was truncated at the token limit before a complete JSON value was produced.\nRetry with a smaller scope or raise max_output_tokens.")]
    OutputTruncated,

    // ── Generation errors ─────────────────────────────────────────────────
    /// The generation call exceeded its deadline. The in-flight request is
    /// aborted when the timed-out future is dropped.
    #[error("AI generation timed out after {ms}ms")]
    GenerationTimeout { ms: u64 },

    /// The API host name could not be resolved.
    #[error("Unable to resolve the Gemini API host (DNS failure).\nCheck your network/DNS settings.")]
    DnsFailure,

    /// The connection to the API endpoint was refused.
    #[error("Connection to the Gemini API was refused.\nCheck network proxy or firewall settings.")]
    ConnectionRefused,

    /// The TCP connection could not be established within the transport's
    /// connect timeout (distinct from the overall generation deadline).
    #[error("Unable to reach the Gemini API (network timeout).\nCheck outbound network access and try again.")]
    ConnectTimeout,

    /// The API answered with a non-success status or an error payload.
    #[error("Gemini API error: {message}")]
    ApiError { message: String },

    /// No API key was supplied to the provider.
    #[error("Missing Gemini API key.\nSet GEMINI_API_KEY or pass a key explicitly.")]
    MissingApiKey,

    // ── Export errors ─────────────────────────────────────────────────────
    /// Bounds detection found no non-blank pixel in the rendered report.
    #[error("No visible report content was detected; nothing to export.")]
    EmptyContent,

    /// The rasterisation backend could not produce a bitmap.
    #[error("Rasterisation failed: {detail}")]
    RasterFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// The raw model output preserved for diagnostics, when available.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            ReportError::NotJson { raw } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_json_keeps_raw_text() {
        let e = ReportError::NotJson {
            raw: "hello world".into(),
        };
        assert_eq!(e.raw_output(), Some("hello world"));
        assert!(e.to_string().contains("not valid JSON"));
    }

    #[test]
    fn timeout_display_includes_deadline() {
        let e = ReportError::GenerationTimeout { ms: 120_000 };
        assert!(e.to_string().contains("120000ms"));
    }

    #[test]
    fn truncation_is_distinguished_from_not_json() {
        let msg = ReportError::OutputTruncated.to_string();
        assert!(msg.contains("truncated"));
        assert!(msg.contains("smaller scope"));
    }

    #[test]
    fn network_errors_have_actionable_hints() {
        assert!(ReportError::DnsFailure.to_string().contains("DNS"));
        assert!(ReportError::ConnectionRefused.to_string().contains("refused"));
        assert!(ReportError::ConnectTimeout.to_string().contains("network"));
    }
}
