//! Balance and aggregate derivation
//!
//! Everything here is a pure function of a transaction slice: no stored
//! state, recomputed on every call. The ledger records are the only source
//! of financial truth; a balance is never persisted independently.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Transaction, TransactionKind};

/// Income and expense totals for one calendar date.
///
/// A side with no entries is `None`, not zero: downstream charting must be
/// able to tell "no activity" from "activity summing to zero". The original
/// plotted a NaN sentinel for the missing side; an absent value says the
/// same thing without the numeric trap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyFlow {
    pub date: NaiveDate,
    pub income: Option<Decimal>,
    pub expense: Option<Decimal>,
}

/// Current balance: the signed fold of every record.
///
/// Exact decimal arithmetic throughout; no binary-float accumulation, so no
/// cent-level drift however many entries there are.
pub fn current_balance(transactions: &[Transaction]) -> Decimal {
    transactions.iter().map(|tx| tx.signed_amount()).sum()
}

/// Group records by date, ascending, with income and expense magnitudes
/// summed per day.
pub fn daily_flows(transactions: &[Transaction]) -> Vec<DailyFlow> {
    let mut by_date: BTreeMap<NaiveDate, (Option<Decimal>, Option<Decimal>)> = BTreeMap::new();

    for tx in transactions {
        let entry = by_date.entry(tx.date).or_insert((None, None));
        let slot = match tx.kind {
            TransactionKind::Income => &mut entry.0,
            TransactionKind::Expense => &mut entry.1,
        };
        *slot = Some(slot.unwrap_or(Decimal::ZERO) + tx.amount);
    }

    by_date
        .into_iter()
        .map(|(date, (income, expense))| DailyFlow {
            date,
            income,
            expense,
        })
        .collect()
}

/// Net total per category: income minus expense.
///
/// BTreeMap keeps the output order stable for summary displays.
pub fn net_by_category(transactions: &[Transaction]) -> BTreeMap<String, Decimal> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for tx in transactions {
        *totals.entry(tx.category.clone()).or_insert(Decimal::ZERO) += tx.signed_amount();
    }
    totals
}
