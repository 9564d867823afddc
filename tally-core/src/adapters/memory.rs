//! In-memory repository for tests and demo/preview use
//!
//! Implements the same contract as the DuckDB adapter with a plain mutex
//! over vectors. Snapshots are clones, so callers can never reach back
//! into the store through a returned sequence.

use std::collections::HashMap;
use std::sync::Mutex;

use rust_decimal::RoundingStrategy;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{Account, NewTransaction, Transaction};
use crate::ports::LedgerRepository;

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    /// account id -> ledger, seq ascending
    ledgers: HashMap<Uuid, Vec<Transaction>>,
}

/// Ephemeral repository backed by process memory
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<Inner>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerRepository for MemoryRepository {
    fn add_account(&self, account: &Account) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.accounts.iter().any(|a| a.username == account.username) {
            return Err(Error::DuplicateUsername);
        }
        inner.accounts.push(account.clone());
        Ok(())
    }

    fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .accounts
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.accounts.iter().find(|a| a.id == id).cloned())
    }

    fn append_transaction(&self, draft: &NewTransaction) -> Result<Transaction> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.accounts.iter().any(|a| a.id == draft.account_id) {
            return Err(Error::unknown_account(draft.account_id.to_string()));
        }

        let ledger = inner.ledgers.entry(draft.account_id).or_default();
        let tx = Transaction {
            seq: ledger.len() as i64 + 1,
            account_id: draft.account_id,
            date: draft.date,
            category: draft.category.clone(),
            // Cent scale, half away from zero; must match the DuckDB
            // adapter's DECIMAL(18,2) normalization
            amount: draft
                .amount
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            kind: draft.kind,
            description: draft.description.clone(),
            created_at: chrono::Utc::now(),
        };
        ledger.push(tx.clone());
        Ok(tx)
    }

    fn get_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.ledgers.get(&account_id).cloned().unwrap_or_default())
    }

    fn get_transaction_count(&self, account_id: Uuid) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.ledgers.get(&account_id).map_or(0, |l| l.len() as i64))
    }
}
