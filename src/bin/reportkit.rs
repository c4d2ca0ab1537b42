//! Command-line front end.
//!
//! `reportkit generate` turns a diagnosis into report JSON; `reportkit
//! export` turns a rendered report PNG into a paginated PDF.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use tcm_reportkit::input::{CONSTITUTION_NAMES, ORGAN_NAMES};
use tcm_reportkit::{
    export_raster, generate_report, DiagnosisInput, ExportConfig, GeminiProvider,
    GenerationConfig, ScoreEntry,
};

#[derive(Parser)]
#[command(
    name = "reportkit",
    version,
    about = "Generate TCM wellness reports and export them as paginated PDFs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a report from a diagnosis and print it as JSON.
    Generate(GenerateArgs),
    /// Export a rendered report PNG as a paginated A4 PDF.
    Export(ExportArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Primary organ finding as name:score, e.g. 脾虛:55
    #[arg(long)]
    primary: String,

    /// Secondary findings as name:score, repeatable.
    #[arg(long = "secondary")]
    secondary: Vec<String>,

    /// Constitution references as name:score, repeatable.
    #[arg(long = "constitution")]
    constitutions: Vec<String>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model name.
    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.5-flash")]
    model: String,

    /// Response token budget.
    #[arg(long, default_value_t = 10_000)]
    max_output_tokens: u32,

    /// Generation deadline in milliseconds.
    #[arg(long, default_value_t = 120_000)]
    timeout_ms: u64,

    /// Skip the structured-output JSON schema hint.
    #[arg(long)]
    no_schema: bool,

    /// Write the report JSON here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
    /// Rendered report bitmap (PNG).
    input: PathBuf,

    /// Output PDF path. Defaults to a timestamped filename in the
    /// current directory.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Page margin in millimetres.
    #[arg(long, default_value_t = 8.0)]
    margin_mm: f32,
}

/// Parse `name:score` (full-width colon accepted).
fn parse_score_entry(raw: &str) -> Result<ScoreEntry> {
    let (name, score) = raw
        .rsplit_once([':', '：'])
        .with_context(|| format!("expected name:score, got '{raw}'"))?;
    let score: u8 = score
        .trim()
        .parse()
        .with_context(|| format!("invalid score in '{raw}'"))?;
    if score > 100 {
        bail!("score must be 0-100 in '{raw}'");
    }
    let name = name.trim();
    if name.is_empty() {
        bail!("empty name in '{raw}'");
    }
    Ok(ScoreEntry::new(name, score))
}

fn parse_entries(raw: &[String]) -> Result<Vec<ScoreEntry>> {
    raw.iter().map(|s| parse_score_entry(s)).collect()
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static template is valid"),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

async fn run_generate(args: GenerateArgs) -> Result<()> {
    let input = DiagnosisInput {
        primary: parse_score_entry(&args.primary)?,
        secondary: parse_entries(&args.secondary)?,
        constitutions: parse_entries(&args.constitutions)?,
    };
    for entry in std::iter::once(&input.primary).chain(&input.secondary) {
        if !ORGAN_NAMES.contains(&entry.name.as_str()) {
            eprintln!("warning: '{}' is not a known organ finding", entry.name);
        }
    }
    for entry in &input.constitutions {
        if !CONSTITUTION_NAMES.contains(&entry.name.as_str()) {
            eprintln!("warning: '{}' is not a known constitution type", entry.name);
        }
    }
    let config = GenerationConfig::builder()
        .model(args.model)
        .max_output_tokens(args.max_output_tokens)
        .timeout_ms(args.timeout_ms)
        .structured_schema(!args.no_schema)
        .build()?;
    let provider = Arc::new(GeminiProvider::new(args.api_key)?);

    let bar = spinner("Generating report...");
    let result = generate_report(provider, &input, &config).await;
    bar.finish_and_clear();
    let report = result?;

    eprintln!("strategy: {}", report.strategy.text());
    eprintln!("diagnosis: {}", report.diagnosis_summary);

    let json = serde_json::to_string_pretty(&report.payload)?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

async fn run_export(args: ExportArgs) -> Result<()> {
    let config = ExportConfig::builder().margin_mm(args.margin_mm).build()?;
    let image = image::open(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?
        .to_rgba8();

    let bar = spinner("Paginating and assembling PDF...");
    let exported = tokio::task::spawn_blocking(move || export_raster(&image, &config)).await?;
    bar.finish_and_clear();
    let exported = exported?;

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&exported.filename));
    exported.write_to(&path)?;
    eprintln!(
        "{} page(s) written to {}",
        exported.page_count,
        path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Generate(args) => run_generate(args).await,
        Command::Export(args) => run_export(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_entries_parse_both_colon_forms() {
        let entry = parse_score_entry("脾虛:55").unwrap();
        assert_eq!((entry.name.as_str(), entry.score), ("脾虛", 55));
        let entry = parse_score_entry("胃虛：70").unwrap();
        assert_eq!((entry.name.as_str(), entry.score), ("胃虛", 70));
    }

    #[test]
    fn malformed_entries_are_rejected() {
        assert!(parse_score_entry("no-colon").is_err());
        assert!(parse_score_entry("脾虛:abc").is_err());
        assert!(parse_score_entry("脾虛:120").is_err());
        assert!(parse_score_entry(":55").is_err());
    }
}
