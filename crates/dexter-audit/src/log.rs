//! Append-only audit log: one JSON record per line, soft-rotated by size.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Soft per-segment size cap. A segment is rotated once it crosses this
/// threshold; the cap is soft because a single append is never split mid
/// record.
const SEGMENT_SOFT_CAP_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl From<dexter_events::LogLevel> for Severity {
    fn from(level: dexter_events::LogLevel) -> Self {
        match level {
            dexter_events::LogLevel::Debug => Self::Debug,
            dexter_events::LogLevel::Info => Self::Info,
            dexter_events::LogLevel::Warning => Self::Warning,
            dexter_events::LogLevel::Error => Self::Error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub family: String,
    pub code: String,
    pub message: String,
}

/// Query bounds for `AuditLog::query`/`count`. Ranges are half-open
/// (`[dateFrom, dateTo)`); invalid bound strings are dropped rather than
/// rejected.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub family: Option<String>,
    pub severity: Option<Severity>,
    pub code_only: bool,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a query from caller-supplied lenient ISO timestamp strings;
    /// unparseable bounds are silently dropped, not rejected.
    pub fn from_str_bounds(
        date_from: Option<&str>,
        date_to: Option<&str>,
        family: Option<String>,
        severity: Option<Severity>,
        code_only: bool,
    ) -> Self {
        Self {
            date_from: date_from.and_then(parse_lenient_timestamp),
            date_to: date_to.and_then(parse_lenient_timestamp),
            family,
            severity,
            code_only,
        }
    }

    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(from) = self.date_from {
            if record.timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.timestamp >= to {
                return false;
            }
        }
        if let Some(family) = &self.family {
            if &record.family != family {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if record.severity != severity {
                return false;
            }
        }
        if self.code_only && record.code.is_empty() {
            return false;
        }
        true
    }
}

pub fn parse_lenient_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditCount {
    pub count: u64,
    pub estimated_bytes_json: u64,
    pub estimated_bytes_csv: u64,
}

pub struct AuditLog {
    dir: PathBuf,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            dir: dexter_config::paths::logs_dir(),
        }
    }

    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Appends one record. The write is flushed before returning so a
    /// crash immediately after never loses an already-acknowledged event.
    pub fn append(&self, record: &AuditRecord) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.current_segment_path()?;

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    pub fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>> {
        let mut out = Vec::new();
        for path in self.segment_paths()? {
            let content = fs::read_to_string(&path)?;
            for line in content.lines() {
                if line.trim().is_empty() {
                    continue;
                }
                let record: AuditRecord = match serde_json::from_str(line) {
                    Ok(record) => record,
                    Err(err) => {
                        tracing::warn!(path = %path.display(), %err, "skipping unparseable audit line");
                        continue;
                    }
                };
                if query.matches(&record) {
                    out.push(record);
                }
            }
        }
        Ok(out)
    }

    pub fn count(&self, query: &AuditQuery) -> Result<AuditCount> {
        let records = self.query(query)?;
        let estimated_bytes_json = serde_json::to_vec_pretty(&records)?.len() as u64;
        let estimated_bytes_csv = crate::export::records_to_csv(&records).len() as u64;
        Ok(AuditCount {
            count: records.len() as u64,
            estimated_bytes_json,
            estimated_bytes_csv,
        })
    }

    fn segment_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)? {
                let entry = entry?;
                let name = entry.file_name();
                let name = name.to_string_lossy();
                if name.starts_with("app-") && name.ends_with(".ndjson") {
                    paths.push(entry.path());
                }
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn current_segment_path(&self) -> Result<PathBuf> {
        let segments = self.segment_paths()?;
        if let Some(last) = segments.last() {
            let size = fs::metadata(last).map(|meta| meta.len()).unwrap_or(0);
            if size < SEGMENT_SOFT_CAP_BYTES {
                return Ok(last.clone());
            }
        }
        let next_index = segments.len() + 1;
        Ok(self.dir.join(format!("app-{next_index:05}.ndjson")))
    }
}
