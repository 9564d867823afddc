//! Balance service - derived balances and aggregates
//!
//! A thin repository-backed wrapper over `domain::report`. Nothing here is
//! cached or stored; every call snapshots the ledger and recomputes, so
//! the result can never disagree with the records.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::report;
use crate::domain::result::Result;
use crate::domain::DailyFlow;
use crate::ports::LedgerRepository;

/// Balance service for on-demand derivation
pub struct BalanceService {
    repository: Arc<dyn LedgerRepository>,
}

impl BalanceService {
    pub fn new(repository: Arc<dyn LedgerRepository>) -> Self {
        Self { repository }
    }

    /// Signed fold of the account's ledger: income − expense
    pub fn current_balance(&self, account_id: Uuid) -> Result<Decimal> {
        let transactions = self.repository.get_transactions(account_id)?;
        Ok(report::current_balance(&transactions))
    }

    /// Per-date income/expense series, date ascending, for charting
    pub fn time_series(&self, account_id: Uuid) -> Result<Vec<DailyFlow>> {
        let transactions = self.repository.get_transactions(account_id)?;
        Ok(report::daily_flows(&transactions))
    }

    /// Net total per category for summary displays
    pub fn by_category(&self, account_id: Uuid) -> Result<BTreeMap<String, Decimal>> {
        let transactions = self.repository.get_transactions(account_id)?;
        Ok(report::net_by_category(&transactions))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::adapters::MemoryRepository;
    use crate::domain::{Account, NewTransaction, TransactionKind};

    fn setup() -> (Arc<MemoryRepository>, BalanceService, Uuid) {
        let repo = Arc::new(MemoryRepository::new());
        let account = Account::new(Uuid::new_v4(), "alice", "$argon2id$stub");
        repo.add_account(&account).unwrap();
        let svc = BalanceService::new(repo.clone());
        (repo, svc, account.id)
    }

    fn append(repo: &MemoryRepository, account_id: Uuid, cents: i64, kind: TransactionKind) {
        repo.append_transaction(&NewTransaction {
            account_id,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            category: "Other".to_string(),
            amount: Decimal::new(cents, 2),
            kind,
            description: String::new(),
        })
        .unwrap();
    }

    #[test]
    fn test_empty_account_balances_to_zero() {
        let (_repo, svc, account_id) = setup();
        assert_eq!(svc.current_balance(account_id).unwrap(), Decimal::ZERO);
        assert!(svc.time_series(account_id).unwrap().is_empty());
        assert!(svc.by_category(account_id).unwrap().is_empty());
    }

    #[test]
    fn test_balances_do_not_mix_across_accounts() {
        let (repo, svc, alice) = setup();
        let bob = Account::new(Uuid::new_v4(), "bob", "$argon2id$stub");
        repo.add_account(&bob).unwrap();

        append(&repo, alice, 100000, TransactionKind::Income);
        append(&repo, bob.id, 5000, TransactionKind::Expense);

        assert_eq!(
            svc.current_balance(alice).unwrap(),
            Decimal::new(100000, 2)
        );
        assert_eq!(svc.current_balance(bob.id).unwrap(), Decimal::new(-5000, 2));
    }

    #[test]
    fn test_rederivation_matches_after_each_append() {
        let (repo, svc, account_id) = setup();
        let mut expected = Decimal::ZERO;
        for cents in [1u32, 2, 3, 5, 8].map(i64::from) {
            append(&repo, account_id, cents, TransactionKind::Income);
            expected += Decimal::new(cents, 2);
            assert_eq!(svc.current_balance(account_id).unwrap(), expected);
        }
    }
}
