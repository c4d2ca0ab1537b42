//! The report generation boundary.
//!
//! One async entry point ties the pipeline together: prompt assembly, the
//! provider call under a hard deadline, JSON extraction and payload
//! normalisation. This is the only place the crate awaits the network for
//! generation, so the timeout wraps exactly one future; dropping it on
//! expiry aborts the in-flight HTTP request.

use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::GenerationConfig;
use crate::error::ReportError;
use crate::extract::extract;
use crate::input::{DiagnosisInput, StrategyLevel};
use crate::prompts::{build_report_prompt, response_json_schema};
use crate::provider::{FinishReason, GenerationRequest, TextGenerator};
use crate::report::{normalize_report, ReportPayload};

/// A generated report plus the context the portal renders around it.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub payload: ReportPayload,
    /// The extracted JSON before normalisation, kept for persistence.
    pub raw: serde_json::Value,
    pub strategy: StrategyLevel,
    pub diagnosis_summary: String,
    pub finish_reason: FinishReason,
}

fn current_date_text() -> String {
    let now = OffsetDateTime::now_utc();
    format!("{}年{}月{}日", now.year(), u8::from(now.month()), now.day())
}

/// Generate a wellness report for one diagnosis.
///
/// # Errors
/// * [`ReportError::GenerationTimeout`] when the deadline elapses.
/// * [`ReportError::OutputTruncated`] when extraction fails on a response
///   that stopped at the token limit. A truncated response that still
///   parses is accepted as-is.
/// * [`ReportError::NotJson`] and the network/API variants as surfaced by
///   the provider and the extractor.
pub async fn generate_report(
    provider: Arc<dyn TextGenerator>,
    input: &DiagnosisInput,
    config: &GenerationConfig,
) -> Result<GeneratedReport, ReportError> {
    let prompt = build_report_prompt(input, &current_date_text());
    let request = GenerationRequest {
        model: config.model.clone(),
        prompt,
        response_json: true,
        max_output_tokens: config.max_output_tokens,
        json_schema: config.structured_schema.then(response_json_schema),
    };

    debug!(model = %config.model, timeout_ms = config.timeout_ms, "generating report");
    let response = match timeout(
        Duration::from_millis(config.timeout_ms),
        provider.generate(&request),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            warn!(timeout_ms = config.timeout_ms, "generation deadline elapsed");
            return Err(ReportError::GenerationTimeout {
                ms: config.timeout_ms,
            });
        }
    };

    let raw = match extract(&response.text) {
        Ok(value) => value,
        Err(err) => {
            if response.finish_reason == FinishReason::MaxTokens {
                warn!("response hit the token limit and did not parse");
                return Err(ReportError::OutputTruncated);
            }
            return Err(err);
        }
    };

    let payload = normalize_report(&raw);
    info!(finish_reason = ?response.finish_reason, "report generated");
    Ok(GeneratedReport {
        payload,
        raw,
        strategy: input.strategy(),
        diagnosis_summary: input.summary(),
        finish_reason: response.finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ScoreEntry;
    use crate::provider::GenerationResponse;
    use async_trait::async_trait;

    struct ScriptedProvider {
        text: String,
        finish_reason: FinishReason,
        delay_ms: u64,
    }

    #[async_trait]
    impl TextGenerator for ScriptedProvider {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<GenerationResponse, ReportError> {
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            Ok(GenerationResponse {
                text: self.text.clone(),
                finish_reason: self.finish_reason.clone(),
            })
        }
    }

    fn sample_input() -> DiagnosisInput {
        DiagnosisInput::new(ScoreEntry::new("脾虛", 55))
    }

    fn config_with_timeout(ms: u64) -> GenerationConfig {
        GenerationConfig::builder().timeout_ms(ms).build().unwrap()
    }

    #[tokio::test]
    async fn parses_and_normalises_a_clean_response() {
        let provider = Arc::new(ScriptedProvider {
            text: r#"{"goal": "調理脾胃", "two_week_menu": {"Day 1": {"早餐": "燕麥粥"}}}"#.into(),
            finish_reason: FinishReason::Stop,
            delay_ms: 0,
        });
        let report = generate_report(provider, &sample_input(), &config_with_timeout(5_000))
            .await
            .unwrap();
        assert_eq!(report.payload.goal, "調理脾胃");
        assert_eq!(report.strategy, StrategyLevel::Severe);
        assert!(report.diagnosis_summary.starts_with("首要：脾虛(55分)"));
    }

    #[tokio::test]
    async fn deadline_maps_to_generation_timeout() {
        let provider = Arc::new(ScriptedProvider {
            text: "{}".into(),
            finish_reason: FinishReason::Stop,
            delay_ms: 5_000,
        });
        let err = generate_report(provider, &sample_input(), &config_with_timeout(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::GenerationTimeout { ms: 20 }));
    }

    #[tokio::test]
    async fn unparseable_truncated_output_is_reported_as_truncation() {
        let provider = Arc::new(ScriptedProvider {
            text: r#"{"goal": "調理脾胃", "two_week_menu": {"Day 1"#.into(),
            finish_reason: FinishReason::MaxTokens,
            delay_ms: 0,
        });
        let err = generate_report(provider, &sample_input(), &config_with_timeout(5_000))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::OutputTruncated));
    }

    #[tokio::test]
    async fn truncated_but_parseable_output_is_accepted() {
        let provider = Arc::new(ScriptedProvider {
            text: r#"{"goal": "調理脾胃"}"#.into(),
            finish_reason: FinishReason::MaxTokens,
            delay_ms: 0,
        });
        let report = generate_report(provider, &sample_input(), &config_with_timeout(5_000))
            .await
            .unwrap();
        assert_eq!(report.payload.goal, "調理脾胃");
        assert_eq!(report.finish_reason, FinishReason::MaxTokens);
    }

    #[tokio::test]
    async fn unparseable_complete_output_keeps_not_json() {
        let provider = Arc::new(ScriptedProvider {
            text: "I could not produce a report today.".into(),
            finish_reason: FinishReason::Stop,
            delay_ms: 0,
        });
        let err = generate_report(provider, &sample_input(), &config_with_timeout(5_000))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::NotJson { .. }));
    }
}
