//! Text generation providers.
//!
//! [`TextGenerator`] is the seam between report generation and the hosted
//! model. Library code holds an `Arc<dyn TextGenerator>` so tests can
//! substitute a scripted provider, and [`GeminiProvider`] is the production
//! implementation over the Gemini REST API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::error::Error as StdError;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ReportError;

pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// One generation request. `json_schema` is only sent when present and
/// `response_json` is set.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub response_json: bool,
    pub max_output_tokens: u32,
    pub json_schema: Option<Value>,
}

/// Why the model stopped emitting tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    /// The output hit `max_output_tokens` and may be cut off mid-value.
    MaxTokens,
    Other(String),
}

impl FinishReason {
    fn from_api(raw: &str) -> Self {
        match raw {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// The provider's answer: concatenated candidate text plus the finish
/// reason, which the caller needs to tell truncation from garbage.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    pub finish_reason: FinishReason,
}

/// A text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResponse, ReportError>;
}

// ── Gemini ───────────────────────────────────────────────────────────────

/// Gemini REST provider (`models/{model}:generateContent`).
#[derive(Debug)]
pub struct GeminiProvider {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl GeminiProvider {
    /// Build a provider for the public Gemini endpoint.
    ///
    /// # Errors
    /// [`ReportError::MissingApiKey`] when the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ReportError> {
        Self::with_endpoint(api_key, DEFAULT_GEMINI_ENDPOINT)
    }

    /// Build a provider against a custom endpoint. Used by tests to point
    /// at a local mock server.
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, ReportError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ReportError::MissingApiKey);
        }
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| ReportError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(GeminiProvider {
            api_key,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn request_body(request: &GenerationRequest) -> Value {
        let mut generation_config = json!({
            "maxOutputTokens": request.max_output_tokens,
        });
        if request.response_json {
            generation_config["responseMimeType"] = json!("application/json");
            if let Some(schema) = &request.json_schema {
                generation_config["responseJsonSchema"] = schema.clone();
            }
        }
        json!({
            "contents": [{"parts": [{"text": request.prompt}]}],
            "generationConfig": generation_config,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, ReportError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, request.model, self.api_key
        );
        debug!(model = %request.model, max_output_tokens = request.max_output_tokens,
               "sending generation request");

        let response = self
            .client
            .post(&url)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;

        if !status.is_success() {
            warn!(%status, "generation request rejected");
            return Err(ReportError::ApiError {
                message: unwrap_api_error(&body, status.as_u16()),
            });
        }

        let payload: Value = serde_json::from_str(&body).map_err(|e| ReportError::ApiError {
            message: format!("unparseable API response: {e}"),
        })?;
        Ok(parse_generate_content(&payload))
    }
}

/// Flatten a `generateContent` response into text + finish reason. Parts
/// are concatenated; a missing candidate yields empty text, which the
/// extractor upstream turns into an empty report rather than an error.
fn parse_generate_content(payload: &Value) -> GenerationResponse {
    let candidate = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first());

    let text = candidate
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default();

    let finish_reason = candidate
        .and_then(|c| c.get("finishReason"))
        .and_then(Value::as_str)
        .map(FinishReason::from_api)
        .unwrap_or(FinishReason::Other("UNKNOWN".to_string()));

    debug!(finish_reason = ?finish_reason, text_len = text.len(), "generation response received");
    GenerationResponse {
        text,
        finish_reason,
    }
}

/// Map a transport failure onto the distinguished network variants by
/// walking the error source chain for the underlying `io::Error`.
fn map_transport_error(error: reqwest::Error) -> ReportError {
    if error.is_timeout() {
        return ReportError::ConnectTimeout;
    }

    let mut source: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            match io_error.kind() {
                std::io::ErrorKind::ConnectionRefused => return ReportError::ConnectionRefused,
                std::io::ErrorKind::TimedOut => return ReportError::ConnectTimeout,
                _ => {}
            }
        }
        let message = cause.to_string().to_lowercase();
        if message.contains("dns") || message.contains("lookup") {
            return ReportError::DnsFailure;
        }
        source = cause.source();
    }

    if error.is_connect() {
        return ReportError::ConnectionRefused;
    }
    ReportError::ApiError {
        message: error.to_string(),
    }
}

/// API error bodies usually arrive as `{"error": {"message": …}}`; surface
/// the nested message when present, the whole body otherwise.
fn unwrap_api_error(body: &str, status: u16) -> String {
    let trimmed = body.trim();
    if trimmed.starts_with('{') && trimmed.contains("\"error\"") {
        if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
            if let Some(nested) = parsed
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
            {
                let nested = nested.trim();
                if !nested.is_empty() {
                    return nested.to_string();
                }
            }
        }
    }
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_api_key_is_rejected() {
        assert!(matches!(
            GeminiProvider::new("").unwrap_err(),
            ReportError::MissingApiKey
        ));
        assert!(matches!(
            GeminiProvider::new("   ").unwrap_err(),
            ReportError::MissingApiKey
        ));
    }

    #[test]
    fn request_body_includes_schema_only_in_json_mode() {
        let mut request = GenerationRequest {
            model: "gemini-2.5-flash".into(),
            prompt: "hello".into(),
            response_json: true,
            max_output_tokens: 10_000,
            json_schema: Some(json!({"type": "object"})),
        };
        let body = GeminiProvider::request_body(&request);
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseJsonSchema"],
            json!({"type": "object"})
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 10_000);

        request.response_json = false;
        let body = GeminiProvider::request_body(&request);
        assert!(body["generationConfig"].get("responseMimeType").is_none());
        assert!(body["generationConfig"].get("responseJsonSchema").is_none());
    }

    #[test]
    fn response_parts_are_concatenated() {
        let payload = json!({
            "candidates": [{
                "content": {"parts": [{"text": "{\"a\""}, {"text": ":1}"}]},
                "finishReason": "STOP"
            }]
        });
        let response = parse_generate_content(&payload);
        assert_eq!(response.text, "{\"a\":1}");
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[test]
    fn max_tokens_finish_reason_is_recognised() {
        let payload = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"trunc"}]}, "finishReason": "MAX_TOKENS"}]
        });
        let response = parse_generate_content(&payload);
        assert_eq!(response.finish_reason, FinishReason::MaxTokens);
    }

    #[test]
    fn missing_candidates_yield_empty_text() {
        let response = parse_generate_content(&json!({}));
        assert_eq!(response.text, "");
        assert_eq!(
            response.finish_reason,
            FinishReason::Other("UNKNOWN".to_string())
        );
    }

    #[test]
    fn nested_api_error_message_is_unwrapped() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(unwrap_api_error(body, 400), "API key not valid");
    }

    #[test]
    fn opaque_error_body_keeps_status_context() {
        assert_eq!(unwrap_api_error("", 503), "HTTP 503");
        assert_eq!(
            unwrap_api_error("Service Unavailable", 503),
            "HTTP 503: Service Unavailable"
        );
    }
}
