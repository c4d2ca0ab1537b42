//! Report persistence.
//!
//! [`ReportStore`] is a narrow save/list seam; durability is whatever the
//! backing implementation offers. [`MemoryStore`] is the in-process
//! fallback used when no external store is configured: records survive for
//! the life of the process only, which is acceptable because every report
//! can be regenerated from its diagnosis.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Mutex;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::ReportError;

/// A report to be saved. Blank identity fields get placeholder values so a
/// record is never half-labelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub client_name: String,
    pub client_phone: String,
    pub diagnosis: String,
    pub content: Value,
}

/// A persisted report record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedReport {
    pub id: u64,
    pub client_name: String,
    pub client_phone: String,
    pub diagnosis: String,
    /// The report payload as a JSON string, opaque to the store.
    pub content: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Where reports go after generation.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a report, returning its assigned id.
    async fn save_report(&self, report: NewReport) -> Result<u64, ReportError>;

    /// All saved reports, newest first.
    async fn list_reports(&self) -> Result<Vec<SavedReport>, ReportError>;
}

// ── In-memory fallback ───────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    seq: u64,
    reports: Vec<SavedReport>,
}

/// Process-local store. Newest records sit at the front of the list.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn or_placeholder(value: String, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn save_report(&self, report: NewReport) -> Result<u64, ReportError> {
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| ReportError::Internal(format!("timestamp formatting failed: {e}")))?;
        let content = match report.content {
            Value::String(text) => text,
            other => other.to_string(),
        };

        let mut state = self
            .state
            .lock()
            .map_err(|_| ReportError::Internal("report store lock poisoned".into()))?;
        state.seq += 1;
        let record = SavedReport {
            id: state.seq,
            client_name: or_placeholder(report.client_name, "Anonymous"),
            client_phone: or_placeholder(report.client_phone, "N/A"),
            diagnosis: or_placeholder(report.diagnosis, "N/A"),
            content,
            created_at,
        };
        debug!(id = record.id, "report saved");
        state.reports.insert(0, record);
        Ok(state.seq)
    }

    async fn list_reports(&self) -> Result<Vec<SavedReport>, ReportError> {
        let state = self
            .state
            .lock()
            .map_err(|_| ReportError::Internal("report store lock poisoned".into()))?;
        Ok(state.reports.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(name: &str) -> NewReport {
        NewReport {
            client_name: name.to_string(),
            client_phone: "91234567".to_string(),
            diagnosis: "首要：脾虛(55分)".to_string(),
            content: json!({"goal": "調理脾胃"}),
        }
    }

    #[tokio::test]
    async fn ids_are_sequential_and_listing_is_newest_first() {
        let store = MemoryStore::new();
        let first = store.save_report(report("Alice")).await.unwrap();
        let second = store.save_report(report("Bob")).await.unwrap();
        assert_eq!((first, second), (1, 2));

        let reports = store.list_reports().await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].client_name, "Bob");
        assert_eq!(reports[1].client_name, "Alice");
    }

    #[tokio::test]
    async fn blank_identity_fields_get_placeholders() {
        let store = MemoryStore::new();
        store
            .save_report(NewReport {
                client_name: "  ".into(),
                client_phone: String::new(),
                diagnosis: String::new(),
                content: json!({}),
            })
            .await
            .unwrap();
        let saved = &store.list_reports().await.unwrap()[0];
        assert_eq!(saved.client_name, "Anonymous");
        assert_eq!(saved.client_phone, "N/A");
        assert_eq!(saved.diagnosis, "N/A");
    }

    #[tokio::test]
    async fn object_content_is_stored_as_json_text() {
        let store = MemoryStore::new();
        store.save_report(report("Alice")).await.unwrap();
        let saved = &store.list_reports().await.unwrap()[0];
        assert_eq!(saved.content, r#"{"goal":"調理脾胃"}"#);
        assert!(OffsetDateTime::parse(&saved.created_at, &Rfc3339).is_ok());
    }

    #[tokio::test]
    async fn string_content_is_stored_verbatim() {
        let store = MemoryStore::new();
        store
            .save_report(NewReport {
                client_name: "Alice".into(),
                client_phone: "91234567".into(),
                diagnosis: "d".into(),
                content: json!("already a string"),
            })
            .await
            .unwrap();
        let saved = &store.list_reports().await.unwrap()[0];
        assert_eq!(saved.content, "already a string");
    }
}
