//! Ledger service - append and list operations

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{NewTransaction, Transaction, TransactionKind};
use crate::ports::LedgerRepository;

/// Read-side projection over a ledger snapshot. Filtering never touches
/// stored data; all fields are optional and combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// Inclusive lower bound on the transaction date
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    /// Inclusive upper bound on the transaction date
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub kind: Option<TransactionKind>,
}

impl TransactionFilter {
    fn matches(&self, tx: &Transaction) -> bool {
        if self.from_date.is_some_and(|from| tx.date < from) {
            return false;
        }
        if self.to_date.is_some_and(|to| tx.date > to) {
            return false;
        }
        if self.category.as_deref().is_some_and(|c| tx.category != c) {
            return false;
        }
        if self.kind.is_some_and(|k| tx.kind != k) {
            return false;
        }
        true
    }
}

/// Ledger service for the append-only transaction store
pub struct LedgerService {
    repository: Arc<dyn LedgerRepository>,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    /// Append a record to an account's ledger.
    ///
    /// Validation happens here, never at derivation time: a negative
    /// amount or blank category is rejected with `Validation` before the
    /// store is touched. The repository assigns the sequence number.
    pub fn append(
        &self,
        account_id: Uuid,
        date: NaiveDate,
        category: impl Into<String>,
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Result<Transaction> {
        let draft = NewTransaction {
            account_id,
            date,
            category: category.into(),
            amount,
            kind,
            description: description.into(),
        };
        draft.validate().map_err(Error::validation)?;
        self.repository.append_transaction(&draft)
    }

    /// Append a record dated today. This is what a presentation layer
    /// without a date picker calls.
    pub fn append_today(
        &self,
        account_id: Uuid,
        category: impl Into<String>,
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
    ) -> Result<Transaction> {
        self.append(
            account_id,
            Utc::now().date_naive(),
            category,
            amount,
            kind,
            description,
        )
    }

    /// All records for an account in insertion order, optionally narrowed
    /// by a read-side filter. The result is a detached snapshot.
    pub fn list(
        &self,
        account_id: Uuid,
        filter: Option<&TransactionFilter>,
    ) -> Result<Vec<Transaction>> {
        let transactions = self.repository.get_transactions(account_id)?;
        Ok(match filter {
            Some(f) => transactions.into_iter().filter(|tx| f.matches(tx)).collect(),
            None => transactions,
        })
    }
}
