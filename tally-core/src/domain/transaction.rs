//! Transaction domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a transaction. The amount itself is always a non-negative
/// magnitude; the sign lives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

/// A single immutable ledger record.
///
/// `seq` is assigned by the repository at append time and increases
/// monotonically within the owning account. Insertion order is the
/// canonical order; `date` is calendar metadata, not a sort guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Per-account sequence number, starting at 1
    pub seq: i64,
    pub account_id: Uuid,
    /// Calendar date, no time-of-day
    pub date: NaiveDate,
    /// Freeform label. The UI may offer a fixed dropdown, but the engine
    /// accepts any non-empty string.
    pub category: String,
    /// Non-negative magnitude; direction is carried by `kind`
    pub amount: Decimal,
    pub kind: TransactionKind,
    /// Free text, possibly empty
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// The signed contribution of this record to a balance
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// A transaction as submitted to `append`, before the repository has
/// assigned its sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransaction {
    pub account_id: Uuid,
    pub date: NaiveDate,
    pub category: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    pub description: String,
}

impl NewTransaction {
    /// Validate the draft. Malformed records are rejected here, at append
    /// time, never at derivation time.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.amount.is_sign_negative() {
            return Err("amount must not be negative");
        }
        if self.category.trim().is_empty() {
            return Err("category cannot be empty");
        }
        Ok(())
    }
}
