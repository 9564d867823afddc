//! Repository port - storage abstraction

use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, NewTransaction, Transaction};

/// Ledger storage abstraction
///
/// This trait defines all storage operations. Implementations (adapters)
/// provide the actual persistence logic. Every operation is a finite,
/// synchronous unit of work with a bounded-wait contract: an unavailable
/// store surfaces as `Error::Storage`, it never blocks indefinitely.
pub trait LedgerRepository: Send + Sync {
    // === Accounts ===

    /// Persist a new account. Fails with `DuplicateUsername` if the
    /// username is already taken (exact, case-sensitive match).
    fn add_account(&self, account: &Account) -> Result<()>;

    /// Look up an account by exact username
    fn get_account_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Look up an account by id
    fn get_account_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    // === Transactions ===

    /// Append a record to an account's ledger, assigning the next
    /// per-account sequence number atomically with the insert. Two
    /// concurrent appends must never collide on `seq` or drop a record.
    ///
    /// Fails with `UnknownAccount` if the account does not exist. The
    /// append is the only mutation the store supports.
    fn append_transaction(&self, draft: &NewTransaction) -> Result<Transaction>;

    /// All records for an account in insertion order (seq ascending).
    ///
    /// The returned vector is a fresh snapshot; mutating it cannot affect
    /// the store, and concurrent reads observe a consistent state.
    fn get_transactions(&self, account_id: Uuid) -> Result<Vec<Transaction>>;

    /// Number of records in an account's ledger
    fn get_transaction_count(&self, account_id: Uuid) -> Result<i64>;
}
