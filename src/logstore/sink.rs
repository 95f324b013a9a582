//! Date-partitioned JSON-lines log sink.
//!
//! # Responsibilities
//! - Append one JSON line per record to `<prefix>-YYYY-MM-DD.log`
//! - Open the day's file lazily, switching when the date changes
//! - List log files and read the tail of one of them
//!
//! # Design Decisions
//! - Appends are best-effort: failures are reported, never propagated
//! - One mutex guards the open handle so lines never interleave
//! - Reads tolerate malformed lines, substituting `{"raw": ...}`

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{LogStoreConfig, LogTimezone};
use crate::logstore::record::LogRecord;
use crate::observability::metrics;

const DATE_FORMAT: &str = "%Y-%m-%d";
const EXTENSION: &str = ".log";

/// Errors raised by log store operations.
#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("log file not found: {0}")]
    NotFound(String),

    #[error("log store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The last records of one log file.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogTail {
    pub filename: String,
    /// Non-empty lines in the file before truncation.
    pub total_lines: usize,
    pub logs: Vec<Value>,
}

struct OpenFile {
    name: String,
    file: File,
}

/// Append-only store of proxy log records.
pub struct LogSink {
    directory: PathBuf,
    file_prefix: String,
    timezone: LogTimezone,
    current: Mutex<Option<OpenFile>>,
}

impl LogSink {
    /// Create a sink over the configured directory.
    ///
    /// The directory is created eagerly; if that fails the sink still works
    /// and retries on every append.
    pub fn new(config: &LogStoreConfig) -> Self {
        let directory = PathBuf::from(&config.directory);
        if let Err(e) = fs::create_dir_all(&directory) {
            tracing::warn!(
                directory = %directory.display(),
                error = %e,
                "Failed to create log directory"
            );
        }

        Self {
            directory,
            file_prefix: config.file_prefix.clone(),
            timezone: config.timezone,
            current: Mutex::new(None),
        }
    }

    /// Directory holding the log files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name for the given date.
    pub fn file_name_for(&self, date: NaiveDate) -> String {
        format!("{}-{}{}", self.file_prefix, date.format(DATE_FORMAT), EXTENSION)
    }

    /// File name that today's records go to.
    pub fn current_file_name(&self) -> String {
        let today = match self.timezone {
            LogTimezone::Utc => Utc::now().date_naive(),
            LogTimezone::Local => Local::now().date_naive(),
        };
        self.file_name_for(today)
    }

    /// Append a record, swallowing and reporting any failure.
    pub fn append(&self, record: &LogRecord) {
        if let Err(e) = self.try_append(record) {
            metrics::record_log_write_failure();
            tracing::warn!(
                request_id = %record.request_id,
                direction = ?record.direction,
                error = %e,
                "Failed to write proxy log record"
            );
        }
    }

    /// Append a record, returning any failure to the caller.
    pub fn try_append(&self, record: &LogRecord) -> Result<(), LogStoreError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let name = self.current_file_name();
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());

        let reopen = current.as_ref().map_or(true, |open| open.name != name);
        if reopen {
            fs::create_dir_all(&self.directory)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.directory.join(&name))?;
            tracing::debug!(file = %name, "Opened log file");
            *current = Some(OpenFile { name, file });
        }

        let result = match current.as_mut() {
            Some(open) => open.file.write_all(line.as_bytes()),
            None => Ok(()),
        };
        if result.is_err() {
            // Force a reopen next time in case the file was removed underneath us.
            *current = None;
        }
        Ok(result?)
    }

    /// Names of the log files, most recent first.
    pub async fn list_files(&self) -> Result<Vec<String>, LogStoreError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.is_log_file_name(name) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort_by(|a, b| b.cmp(a));
        Ok(names)
    }

    /// Read the last `limit` records of `filename` in chronological order.
    pub async fn read_tail(&self, filename: &str, limit: usize) -> Result<LogTail, LogStoreError> {
        if !is_plain_file_name(filename) {
            return Err(LogStoreError::NotFound(filename.to_string()));
        }

        let path = self.directory.join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(LogStoreError::NotFound(filename.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LogStoreError::NotFound(filename.to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        let bytes = tokio::fs::read(&path).await?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).collect();

        let total_lines = lines.len();
        let logs = lines[total_lines.saturating_sub(limit)..]
            .iter()
            .map(|line| parse_line(line))
            .collect();

        Ok(LogTail {
            filename: filename.to_string(),
            total_lines,
            logs,
        })
    }

    fn is_log_file_name(&self, name: &str) -> bool {
        name.strip_prefix(self.file_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(EXTENSION))
            .map(|date| NaiveDate::parse_from_str(date, DATE_FORMAT).is_ok())
            .unwrap_or(false)
    }
}

fn parse_line(line: &str) -> Value {
    serde_json::from_str(line).unwrap_or_else(|_| json!({ "raw": line }))
}

/// A bare file name that cannot escape the log directory.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}
