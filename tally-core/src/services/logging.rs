//! Logging service - structured event logging to DuckDB
//!
//! Privacy-safe by construction: events carry a name, an optional error
//! kind, and an optional message. No user data (usernames, amounts,
//! descriptions, hashes) is ever logged. Events land in logs.duckdb next
//! to the ledger database so they survive restarts but never mix with
//! financial records.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use duckdb::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::log_migrations::LOG_MIGRATIONS;

/// Counter for generating unique ids within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique id based on timestamp + counter.
/// Lower 16 bits count within the millisecond; upper 48 hold the timestamp.
fn generate_id() -> u64 {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    (timestamp << 16) | counter
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// A log event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEvent {
    /// Create a new log event with just an event name
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            error_kind: None,
            error_message: None,
        }
    }

    /// Attach error information derived from an engine error
    pub fn with_error(mut self, error: &Error) -> Self {
        self.error_kind = Some(
            match error {
                Error::Validation(_) => "validation",
                Error::DuplicateUsername => "duplicate_username",
                Error::AuthenticationFailed => "authentication_failed",
                Error::NotAuthenticated => "not_authenticated",
                Error::UnknownAccount(_) => "unknown_account",
                Error::Storage(_) => "storage",
                Error::Config(_) => "config",
                Error::Io(_) => "io",
                Error::Json(_) => "json",
            }
            .to_string(),
        );
        self.error_message = Some(error.to_string());
        self
    }
}

/// A recorded event as read back from the log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub event_id: u64,
    pub ts_ms: i64,
    pub event: String,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
}

/// Logging service writing to a dedicated logs database
pub struct LoggingService {
    conn: Mutex<Connection>,
}

impl LoggingService {
    /// Open (or create) logs.duckdb inside the data directory
    pub fn new(data_dir: &Path) -> Result<Self> {
        let conn = Connection::open(data_dir.join("logs.duckdb"))
            .map_err(|e| Error::storage(e.to_string()))?;
        for (name, sql) in LOG_MIGRATIONS {
            conn.execute_batch(sql)
                .map_err(|e| Error::storage(format!("log migration {} failed: {}", name, e)))?;
        }
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Record an event
    pub fn record(&self, event: &LogEvent) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sys_events (event_id, ts_ms, event, error_kind, error_message)
             VALUES (?, ?, ?, ?, ?)",
            params![
                generate_id() as i64,
                now_ms(),
                event.event,
                event.error_kind,
                event.error_message,
            ],
        )
        .map_err(|e| Error::storage(e.to_string()))?;
        Ok(())
    }

    /// Record an event, swallowing log-side failures. The ledger must
    /// keep working when only the event log is broken.
    pub fn record_best_effort(&self, event: &LogEvent) {
        if let Err(e) = self.record(event) {
            eprintln!("[tally] failed to record event '{}': {}", event.event, e);
        }
    }

    /// Most recent entries, newest first
    pub fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT event_id, ts_ms, event, error_kind, error_message
                 FROM sys_events ORDER BY event_id DESC LIMIT ?",
            )
            .map_err(|e| Error::storage(e.to_string()))?;

        let entries = stmt
            .query_map([limit as i64], |row| {
                Ok(LogEntry {
                    event_id: row.get::<_, i64>(0)? as u64,
                    ts_ms: row.get(1)?,
                    event: row.get(2)?,
                    error_kind: row.get(3)?,
                    error_message: row.get(4)?,
                })
            })
            .map_err(|e| Error::storage(e.to_string()))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(entries)
    }
}
