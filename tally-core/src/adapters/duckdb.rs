//! DuckDB repository implementation

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use duckdb::{params, Connection};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, NewTransaction, Transaction, TransactionKind};
use crate::ports::LedgerRepository;
use crate::services::MigrationService;

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

fn storage_err(e: impl std::fmt::Display) -> Error {
    Error::storage(e.to_string())
}

/// DuckDB repository implementation
///
/// The connection mutex serializes every statement, so "read max seq,
/// insert next record" in `append_transaction` is a single critical
/// section and sequence numbers can never collide.
pub struct DuckDbRepository {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl DuckDbRepository {
    /// Open (or create) a ledger database.
    ///
    /// Includes retry logic with exponential backoff for file locking
    /// errors, which can occur when another process still holds the file
    /// (e.g., a presentation layer starting while a previous instance
    /// shuts down). After the bounded retries the error propagates; we
    /// never wait indefinitely.
    pub fn new(db_path: &Path) -> Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Connection::open(db_path) {
                Ok(conn) => {
                    return Ok(Self {
                        conn: Mutex::new(conn),
                        db_path: db_path.to_path_buf(),
                    });
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        eprintln!(
                            "[tally] Database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    return Err(storage_err(e));
                }
            }
        }

        Err(last_error
            .map(storage_err)
            .unwrap_or_else(|| Error::storage(format!(
                "failed to open database after {} retries",
                MAX_RETRIES
            ))))
    }

    /// Ensure database schema exists (runs pending migrations)
    pub fn ensure_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        MigrationService::new(&conn).run_pending()?;
        Ok(())
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// Raw account row: account_id, username, password_hash, created_at
type RawAccount = (String, String, String, String);

/// Raw transaction row: account_id, seq, txn_date, category, amount, kind,
/// description, created_at
type RawTransaction = (String, i64, String, String, String, String, String, String);

fn read_raw_account(row: &duckdb::Row) -> duckdb::Result<RawAccount> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn read_raw_transaction(row: &duckdb::Row) -> duckdb::Result<RawTransaction> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn account_from_raw(raw: RawAccount) -> Result<Account> {
    let (id, username, password_hash, created_at) = raw;
    Ok(Account {
        id: Uuid::parse_str(&id)
            .map_err(|_| Error::storage(format!("malformed account id in store: {id:?}")))?,
        username,
        password_hash,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn transaction_from_raw(raw: RawTransaction) -> Result<Transaction> {
    let (account_id, seq, date, category, amount, kind, description, created_at) = raw;
    Ok(Transaction {
        seq,
        account_id: Uuid::parse_str(&account_id)
            .map_err(|_| Error::storage(format!("malformed account id in store: {account_id:?}")))?,
        date: parse_date(&date)?,
        category,
        // Amounts round-trip as strings; binary floats would drift
        amount: Decimal::from_str(&amount)
            .map_err(|_| Error::storage(format!("malformed amount in store: {amount:?}")))?,
        kind: TransactionKind::parse(&kind)
            .ok_or_else(|| Error::storage(format!("malformed kind in store: {kind:?}")))?,
        description,
        created_at: parse_timestamp(&created_at)?,
    })
}

impl LedgerRepository for DuckDbRepository {
    fn add_account(&self, account: &Account) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        // Explicit check inside the lock; the UNIQUE constraint is the
        // backstop against anything that slips past it.
        let taken: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sys_accounts WHERE username = ?",
                [&account.username],
                |row| row.get(0),
            )
            .map_err(storage_err)?;
        if taken > 0 {
            return Err(Error::DuplicateUsername);
        }

        conn.execute(
            "INSERT INTO sys_accounts (account_id, username, password_hash, created_at)
             VALUES (?, ?, ?, ?)",
            params![
                account.id.to_string(),
                account.username,
                account.password_hash,
                format_timestamp(&account.created_at),
            ],
        )
        .map_err(|e| {
            let msg = e.to_string();
            if msg.to_lowercase().contains("constraint") {
                Error::DuplicateUsername
            } else {
                storage_err(e)
            }
        })?;
        Ok(())
    }

    fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT account_id, username, password_hash, created_at::VARCHAR
                 FROM sys_accounts WHERE username = ?",
            )
            .map_err(storage_err)?;

        // Only a no-rows outcome means "absent"; a failing store must
        // surface as Storage, never masquerade as a missing account.
        match stmt.query_row([username], read_raw_account) {
            Ok(raw) => Ok(Some(account_from_raw(raw)?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT account_id, username, password_hash, created_at::VARCHAR
                 FROM sys_accounts WHERE account_id = ?",
            )
            .map_err(storage_err)?;

        match stmt.query_row([id.to_string()], read_raw_account) {
            Ok(raw) => Ok(Some(account_from_raw(raw)?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    fn append_transaction(&self, draft: &NewTransaction) -> Result<Transaction> {
        // One lock section around existence check, seq assignment, and
        // insert: concurrent appends serialize here.
        let conn = self.conn.lock().unwrap();

        let account_exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sys_accounts WHERE account_id = ?",
                [draft.account_id.to_string()],
                |row| row.get(0),
            )
            .map_err(storage_err)?;
        if account_exists == 0 {
            return Err(Error::unknown_account(draft.account_id.to_string()));
        }

        let next_seq: i64 = conn
            .query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM sys_transactions WHERE account_id = ?",
                [draft.account_id.to_string()],
                |row| row.get(0),
            )
            .map_err(storage_err)?;

        // Normalize to cent scale before the insert, half away from zero
        // like the DECIMAL(18,2) cast rounds, so the record returned here
        // equals what any later read sees.
        let amount = draft
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO sys_transactions
                 (account_id, seq, txn_date, category, amount, kind, description, created_at)
             VALUES (?, ?, ?, ?, CAST(? AS DECIMAL(18, 2)), ?, ?, ?)",
            params![
                draft.account_id.to_string(),
                next_seq,
                draft.date.to_string(),
                draft.category,
                amount.to_string(),
                draft.kind.as_str(),
                draft.description,
                format_timestamp(&created_at),
            ],
        )
        .map_err(storage_err)?;

        Ok(Transaction {
            seq: next_seq,
            account_id: draft.account_id,
            date: draft.date,
            category: draft.category.clone(),
            amount,
            kind: draft.kind,
            description: draft.description.clone(),
            created_at,
        })
    }

    fn get_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        let conn = self.conn.lock().unwrap();
        // amount::VARCHAR keeps the decimal exact; reading DECIMAL columns
        // through the f64 binding would reintroduce float drift.
        let mut stmt = conn
            .prepare(
                "SELECT account_id, seq, txn_date::VARCHAR, category, amount::VARCHAR,
                        kind, description, created_at::VARCHAR
                 FROM sys_transactions
                 WHERE account_id = ?
                 ORDER BY seq",
            )
            .map_err(storage_err)?;

        let rows = stmt
            .query_map([account_id.to_string()], read_raw_transaction)
            .map_err(storage_err)?;

        // A row that fails to read or parse fails the whole call; dropping
        // it would silently under-compute every derived balance.
        let mut transactions = Vec::new();
        for raw in rows {
            transactions.push(transaction_from_raw(raw.map_err(storage_err)?)?);
        }
        Ok(transactions)
    }

    fn get_transaction_count(&self, account_id: Uuid) -> Result<i64> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sys_transactions WHERE account_id = ?",
                [account_id.to_string()],
                |row| row.get(0),
            )
            .map_err(storage_err)?;
        Ok(count)
    }
}

/// Render a timestamp the way DuckDB's TIMESTAMP type casts it back:
/// naive UTC, microsecond precision, no offset suffix.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // DuckDB renders TIMESTAMP columns without offset or 'T' separator
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
                .map(|dt| dt.and_utc())
        })
        .map_err(|_| Error::storage(format!("malformed timestamp in store: {s:?}")))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::storage(format!("malformed date in store: {s:?}")))
}
