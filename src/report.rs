//! Report payload coercion.
//!
//! [`normalize_report`] turns an arbitrary extracted JSON value into a
//! strictly-typed [`ReportPayload`]. It never fails: missing or null fields
//! become empty strings, scalars are stringified, blank array entries are
//! dropped, and the two-week menu goes through [`crate::menu::normalize_menu`].
//! The renderer downstream can then assume every leaf is a plain string.

use serde::Serialize;
use serde_json::Value;

use crate::menu::{normalize_menu, WeekMenu};

/// Coerce any JSON value to display text.
///
/// Null becomes the empty string, strings are trimmed, other scalars keep
/// their JSON rendering, and containers fall back to compact JSON so a
/// misplaced object still shows up somewhere rather than vanishing.
pub fn normalize_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn field_text(value: &Value, key: &str) -> String {
    value.get(key).map(normalize_text).unwrap_or_default()
}

fn nested_text(value: &Value, outer: &str, inner: &str) -> String {
    value
        .get(outer)
        .and_then(|v| v.get(inner))
        .map(normalize_text)
        .unwrap_or_default()
}

/// String list with blank entries filtered out.
fn text_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(normalize_text)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn titled_list(value: &Value, key: &str) -> Vec<TitledItem> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| TitledItem {
                    title: field_text(item, "title"),
                    content: field_text(item, "content"),
                })
                .collect()
        })
        .unwrap_or_default()
}

// ── Payload types ────────────────────────────────────────────────────────

/// A titled paragraph, used for warnings, diet rules and lifestyle advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitledItem {
    pub title: String,
    pub content: String,
}

/// The four-quadrant western/TCM analysis block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct IntegrativeStrategy {
    pub western_analysis: String,
    pub western_strategy: String,
    pub tcm_analysis: String,
    pub tcm_strategy: String,
}

/// Month-keyed seasonal advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct SeasonalGuidance {
    pub february: String,
    pub march: String,
}

/// One recommended product from a product line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductPick {
    pub line: String,
    pub name: String,
    pub reason: String,
    pub principle: String,
}

/// The fully-normalised wellness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPayload {
    pub goal: String,
    pub intro_title: String,
    pub intro_paragraphs: Vec<String>,
    pub integrative_strategy: IntegrativeStrategy,
    pub red_light_items: Vec<TitledItem>,
    pub green_light_list: Vec<String>,
    pub diet_rules: Vec<TitledItem>,
    pub lifestyle_solutions: Vec<TitledItem>,
    pub seasonal_guidance: SeasonalGuidance,
    pub two_week_menu: WeekMenu,
    pub product_intro: String,
    pub product_recommendations: Vec<ProductPick>,
    pub conclusion: String,
}

/// Normalise an extracted JSON value into a [`ReportPayload`].
pub fn normalize_report(payload: &Value) -> ReportPayload {
    let product_recommendations = payload
        .get("product_recommendations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| ProductPick {
                    line: field_text(item, "line"),
                    name: field_text(item, "name"),
                    reason: field_text(item, "reason"),
                    principle: field_text(item, "principle"),
                })
                .collect()
        })
        .unwrap_or_default();

    ReportPayload {
        goal: field_text(payload, "goal"),
        intro_title: field_text(payload, "intro_title"),
        intro_paragraphs: text_list(payload, "intro_paragraphs"),
        integrative_strategy: IntegrativeStrategy {
            western_analysis: nested_text(payload, "integrative_strategy", "western_analysis"),
            western_strategy: nested_text(payload, "integrative_strategy", "western_strategy"),
            tcm_analysis: nested_text(payload, "integrative_strategy", "tcm_analysis"),
            tcm_strategy: nested_text(payload, "integrative_strategy", "tcm_strategy"),
        },
        red_light_items: titled_list(payload, "red_light_items"),
        green_light_list: text_list(payload, "green_light_list"),
        diet_rules: titled_list(payload, "diet_rules"),
        lifestyle_solutions: titled_list(payload, "lifestyle_solutions"),
        seasonal_guidance: SeasonalGuidance {
            february: nested_text(payload, "seasonal_guidance", "february"),
            march: nested_text(payload, "seasonal_guidance", "march"),
        },
        two_week_menu: normalize_menu(payload.get("two_week_menu").unwrap_or(&Value::Null)),
        product_intro: field_text(payload, "product_intro"),
        product_recommendations,
        conclusion: field_text(payload, "conclusion"),
    }
}
