//! # tcm-reportkit
//!
//! Generate integrative TCM wellness reports with a hosted generative
//! model and export them as paginated A4 PDFs.
//!
//! ## Pipeline
//!
//! ```text
//! DiagnosisInput ──► prompts ──► provider ──► extract ──► report ──► ReportPayload
//!                    (prompt +   (Gemini      (robust     (typed
//!                     schema)     REST)        JSON)       coercion)
//!
//! RgbaImage ──► export::bounds ──► export::slicer ──► export::pdf ──► ExportedPdf
//! ```
//!
//! The generation half is resilient by construction: the extractor peels
//! fences, prose and near-miss JSON off model output, and the normalisers
//! degrade malformed structure to placeholders instead of failing. The
//! export half cuts the rendered report into page-height slices whose
//! breaks land on whitespace rows, so no line of text is ever sawn in half.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tcm_reportkit::{
//!     generate_report, DiagnosisInput, GeminiProvider, GenerationConfig, ScoreEntry,
//! };
//!
//! # async fn run() -> Result<(), tcm_reportkit::ReportError> {
//! let provider = Arc::new(GeminiProvider::new(std::env::var("GEMINI_API_KEY").unwrap_or_default())?);
//! let input = DiagnosisInput::new(ScoreEntry::new("脾虛", 55));
//! let config = GenerationConfig::builder().build()?;
//! let report = generate_report(provider, &input, &config).await?;
//! println!("{}", serde_json::to_string_pretty(&report.payload).unwrap());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod generate;
pub mod input;
pub mod menu;
pub mod prompts;
pub mod provider;
pub mod report;
pub mod store;

pub use config::{ExportConfig, GenerationConfig};
pub use error::ReportError;
pub use export::{export_raster, export_surface, ExportedPdf, Rasterizer};
pub use extract::extract;
pub use generate::{generate_report, GeneratedReport};
pub use input::{DiagnosisInput, ScoreEntry, StrategyLevel};
pub use menu::{normalize_menu, WeekMenu};
pub use provider::{
    FinishReason, GeminiProvider, GenerationRequest, GenerationResponse, TextGenerator,
};
pub use report::{normalize_report, ReportPayload};
pub use store::{MemoryStore, NewReport, ReportStore, SavedReport};
