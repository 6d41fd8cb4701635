//! Produces downloadable export bundles (model history, logs, update audit
//! trail) in either pretty JSON or RFC-4180 CSV.

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::error::Result;
use crate::log::{AuditLog, AuditQuery, AuditRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone)]
pub enum ExportWindow {
    Last24h,
    Last7d,
    Last30d,
    Custom {
        from: Option<String>,
        to: Option<String>,
    },
}

impl ExportWindow {
    /// Resolves to a half-open `[from, to)` range anchored at `now`.
    /// Custom bounds use lenient ISO parsing; an unparseable bound is
    /// simply dropped rather than erroring.
    pub fn resolve(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match self {
            ExportWindow::Last24h => (Some(now - ChronoDuration::hours(24)), Some(now)),
            ExportWindow::Last7d => (Some(now - ChronoDuration::days(7)), Some(now)),
            ExportWindow::Last30d => (Some(now - ChronoDuration::days(30)), Some(now)),
            ExportWindow::Custom { from, to } => (
                from.as_deref().and_then(crate::log::parse_lenient_timestamp),
                to.as_deref().and_then(crate::log::parse_lenient_timestamp),
            ),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ExportResult {
    pub file_name: String,
    pub mime_type: String,
    pub content: String,
    pub content_bytes: u64,
    pub sha256: String,
}

pub struct ExportAggregator<'a> {
    audit_log: &'a AuditLog,
}

impl<'a> ExportAggregator<'a> {
    pub fn new(audit_log: &'a AuditLog) -> Self {
        Self { audit_log }
    }

    pub fn export_model_history(
        &self,
        format: ExportFormat,
        window: ExportWindow,
        now: DateTime<Utc>,
    ) -> Result<ExportResult> {
        self.export_family("model-history", Some("model".to_string()), format, window, now)
    }

    pub fn export_logs(
        &self,
        format: ExportFormat,
        window: ExportWindow,
        now: DateTime<Utc>,
    ) -> Result<ExportResult> {
        self.export_family("logs", None, format, window, now)
    }

    pub fn export_update_audit_trail(
        &self,
        format: ExportFormat,
        window: ExportWindow,
        now: DateTime<Utc>,
    ) -> Result<ExportResult> {
        self.export_family("update-audit-trail", Some("update".to_string()), format, window, now)
    }

    fn export_family(
        &self,
        base_name: &str,
        family: Option<String>,
        format: ExportFormat,
        window: ExportWindow,
        now: DateTime<Utc>,
    ) -> Result<ExportResult> {
        let (date_from, date_to) = window.resolve(now);
        let query = AuditQuery {
            date_from,
            date_to,
            family,
            severity: None,
            code_only: false,
        };
        let records = self.audit_log.query(&query)?;
        Ok(build_export(base_name, format, &records)?)
    }
}

fn build_export(base_name: &str, format: ExportFormat, records: &[AuditRecord]) -> Result<ExportResult> {
    let (content, ext, mime_type) = match format {
        ExportFormat::Json => (serde_json::to_string_pretty(records)?, "json", "application/json"),
        ExportFormat::Csv => (records_to_csv(records), "csv", "text/csv"),
    };

    let content_bytes = content.len() as u64;
    let sha256 = dexter_utils::hash::calculate_checksum_bytes(content.as_bytes());

    Ok(ExportResult {
        file_name: format!("{base_name}.{ext}"),
        mime_type: mime_type.to_string(),
        content,
        content_bytes,
        sha256,
    })
}

/// Hand-rolled RFC-4180 writer: quotes a field only when it contains a
/// comma, quote, or line break, doubling embedded quotes.
pub fn records_to_csv(records: &[AuditRecord]) -> String {
    let mut out = String::new();
    out.push_str("timestamp,severity,family,code,message\r\n");
    for record in records {
        let fields = [
            record.timestamp.to_rfc3339(),
            record.severity.as_str().to_string(),
            record.family.clone(),
            record.code.clone(),
            record.message.clone(),
        ];
        out.push_str(
            &fields
                .iter()
                .map(|field| csv_escape(field))
                .collect::<Vec<_>>()
                .join(","),
        );
        out.push_str("\r\n");
    }
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::log::Severity;

    fn anchor() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-06-15T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_csv_escapes_commas_and_quotes() {
        let record = AuditRecord {
            timestamp: anchor(),
            severity: Severity::Info,
            family: "runtime".to_string(),
            code: "c1".to_string(),
            message: "hello, \"world\"".to_string(),
        };
        let csv = records_to_csv(&[record]);
        assert!(csv.contains("\"hello, \"\"world\"\"\""));
    }

    #[test]
    fn test_export_json_then_reparse_is_identical() {
        let dir = tempdir().unwrap();
        let log = AuditLog::with_dir(dir.path().to_path_buf());
        log.append(&AuditRecord {
            timestamp: anchor(),
            severity: Severity::Info,
            family: "update".to_string(),
            code: "check.complete".to_string(),
            message: "checked".to_string(),
        })
        .unwrap();

        let aggregator = ExportAggregator::new(&log);
        let export = aggregator
            .export_update_audit_trail(ExportFormat::Json, ExportWindow::Last30d, anchor())
            .unwrap();

        let reparsed: Vec<AuditRecord> = serde_json::from_str(&export.content).unwrap();
        let reexported = serde_json::to_string_pretty(&reparsed).unwrap();
        assert_eq!(reexported, export.content);
    }

    #[test]
    fn test_sha256_matches_content_bytes() {
        let dir = tempdir().unwrap();
        let log = AuditLog::with_dir(dir.path().to_path_buf());
        let aggregator = ExportAggregator::new(&log);

        let export = aggregator
            .export_logs(ExportFormat::Csv, ExportWindow::Last24h, anchor())
            .unwrap();
        assert_eq!(
            export.sha256,
            dexter_utils::hash::calculate_checksum_bytes(export.content.as_bytes())
        );
        assert_eq!(export.content_bytes, export.content.len() as u64);
    }

    #[test]
    fn test_window_last_24h_excludes_older_records() {
        let dir = tempdir().unwrap();
        let log = AuditLog::with_dir(dir.path().to_path_buf());
        let old = anchor() - ChronoDuration::hours(48);

        log.append(&AuditRecord {
            timestamp: old,
            severity: Severity::Info,
            family: "model".to_string(),
            code: "pull".to_string(),
            message: "pulled".to_string(),
        })
        .unwrap();

        let aggregator = ExportAggregator::new(&log);
        let export = aggregator
            .export_model_history(ExportFormat::Json, ExportWindow::Last24h, anchor())
            .unwrap();
        let records: Vec<AuditRecord> = serde_json::from_str(&export.content).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_custom_window_with_invalid_bound_is_lenient() {
        let window = ExportWindow::Custom {
            from: Some("garbage".to_string()),
            to: Some("2026-06-15T12:00:00Z".to_string()),
        };
        let (from, to) = window.resolve(anchor());
        assert!(from.is_none());
        assert!(to.is_some());
    }
}
