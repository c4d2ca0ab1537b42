//! Configuration for generation and export.
//!
//! Both configs follow the builder pattern with a validating `build()`.
//! Defaults match the production portal; tests override page geometry to
//! keep synthetic bitmaps small.

use crate::error::ReportError;

// ── Generation ───────────────────────────────────────────────────────────

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 10_000;
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// How a report generation call is made.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model name, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// Token budget for the response.
    pub max_output_tokens: u32,
    /// Overall deadline for the generation call, in milliseconds.
    pub timeout_ms: u64,
    /// Send the response JSON schema along with the JSON MIME hint.
    pub structured_schema: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            structured_schema: true,
        }
    }
}

impl GenerationConfig {
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct GenerationConfigBuilder {
    model: Option<String>,
    max_output_tokens: Option<u32>,
    timeout_ms: Option<u64>,
    structured_schema: Option<bool>,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn structured_schema(mut self, enabled: bool) -> Self {
        self.structured_schema = Some(enabled);
        self
    }

    pub fn build(self) -> Result<GenerationConfig, ReportError> {
        let defaults = GenerationConfig::default();
        let config = GenerationConfig {
            model: self.model.unwrap_or(defaults.model),
            max_output_tokens: self.max_output_tokens.unwrap_or(defaults.max_output_tokens),
            timeout_ms: self.timeout_ms.unwrap_or(defaults.timeout_ms),
            structured_schema: self.structured_schema.unwrap_or(defaults.structured_schema),
        };
        if config.model.trim().is_empty() {
            return Err(ReportError::InvalidConfig("model must not be empty".into()));
        }
        if config.max_output_tokens == 0 {
            return Err(ReportError::InvalidConfig(
                "max_output_tokens must be positive".into(),
            ));
        }
        if config.timeout_ms == 0 {
            return Err(ReportError::InvalidConfig(
                "timeout_ms must be positive".into(),
            ));
        }
        Ok(config)
    }
}

// ── Export ───────────────────────────────────────────────────────────────

/// Geometry and thresholds for the paginated PDF export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// A4 portrait by default.
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    /// Uniform printable margin on every page edge.
    pub margin_mm: f32,
    /// A pixel is blank when alpha is below this.
    pub blank_alpha: u8,
    /// A pixel is blank when every RGB channel is above this.
    pub white_threshold: u8,
    /// Grid step of the coarse bounds scan.
    pub bounds_stride: u32,
    /// Padding added around detected content, in source pixels.
    pub bounds_pad: u32,
    /// Horizontal sampling step of the row ink score.
    pub ink_stride: u32,
    /// Break search window, as a fraction of the ideal slice height.
    pub search_range_frac: f32,
    /// Slice height clamp, as fractions of the ideal slice height.
    pub min_slice_frac: f32,
    pub max_slice_frac: f32,
    /// A row is whitespace when its ink count is at or below
    /// `max(2, whitespace_frac * sampled_columns)`.
    pub whitespace_frac: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 8.0,
            blank_alpha: 16,
            white_threshold: 248,
            bounds_stride: 2,
            bounds_pad: 4,
            ink_stride: 3,
            search_range_frac: 0.15,
            min_slice_frac: 0.72,
            max_slice_frac: 1.2,
            whitespace_frac: 0.01,
        }
    }
}

impl ExportConfig {
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::default()
    }

    /// Printable width between the margins.
    pub fn content_width_mm(&self) -> f32 {
        self.page_width_mm - self.margin_mm * 2.0
    }

    /// Printable height between the margins.
    pub fn content_height_mm(&self) -> f32 {
        self.page_height_mm - self.margin_mm * 2.0
    }
}

#[derive(Debug, Default)]
pub struct ExportConfigBuilder {
    page_width_mm: Option<f32>,
    page_height_mm: Option<f32>,
    margin_mm: Option<f32>,
}

impl ExportConfigBuilder {
    pub fn page_size_mm(mut self, width: f32, height: f32) -> Self {
        self.page_width_mm = Some(width);
        self.page_height_mm = Some(height);
        self
    }

    pub fn margin_mm(mut self, margin: f32) -> Self {
        self.margin_mm = Some(margin);
        self
    }

    pub fn build(self) -> Result<ExportConfig, ReportError> {
        let mut config = ExportConfig::default();
        if let Some(width) = self.page_width_mm {
            config.page_width_mm = width;
        }
        if let Some(height) = self.page_height_mm {
            config.page_height_mm = height;
        }
        if let Some(margin) = self.margin_mm {
            config.margin_mm = margin;
        }
        if config.page_width_mm <= 0.0 || config.page_height_mm <= 0.0 {
            return Err(ReportError::InvalidConfig(
                "page size must be positive".into(),
            ));
        }
        if config.margin_mm < 0.0 || config.margin_mm * 2.0 >= config.page_width_mm.min(config.page_height_mm)
        {
            return Err(ReportError::InvalidConfig(
                "margins must leave a printable area".into(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_defaults_are_sane() {
        let config = GenerationConfig::builder().build().unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_output_tokens, 10_000);
        assert_eq!(config.timeout_ms, 120_000);
        assert!(config.structured_schema);
    }

    #[test]
    fn generation_rejects_zero_budgets() {
        assert!(GenerationConfig::builder()
            .max_output_tokens(0)
            .build()
            .is_err());
        assert!(GenerationConfig::builder().timeout_ms(0).build().is_err());
        assert!(GenerationConfig::builder().model("  ").build().is_err());
    }

    #[test]
    fn export_defaults_describe_a4() {
        let config = ExportConfig::builder().build().unwrap();
        assert_eq!(config.page_width_mm, 210.0);
        assert_eq!(config.page_height_mm, 297.0);
        assert_eq!(config.content_width_mm(), 194.0);
        assert_eq!(config.content_height_mm(), 281.0);
    }

    #[test]
    fn export_rejects_margins_wider_than_the_page() {
        let result = ExportConfig::builder()
            .page_size_mm(100.0, 100.0)
            .margin_mm(60.0)
            .build();
        assert!(matches!(result, Err(ReportError::InvalidConfig(_))));
    }
}
