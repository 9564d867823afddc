//! Tally Core - ledger engine for personal finance tracking
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities and pure derivation (Account, Transaction, reports)
//! - **ports**: Trait definitions for external dependencies (LedgerRepository)
//! - **services**: Business logic orchestration (credentials, ledger, balance, sessions)
//! - **adapters**: Concrete implementations (DuckDB, in-memory)
//!
//! There is no UI, charting, or network surface here; a presentation layer
//! consumes this library through `LedgerContext`.

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use adapters::DuckDbRepository;
use config::Config;
use ports::LedgerRepository;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{Account, DailyFlow, Transaction, TransactionKind};
pub use services::{SessionToken, TransactionFilter};

/// Main context for Tally operations
///
/// The primary entry point for all business logic: holds the database
/// connection, configuration, and all services. Presentation layers call
/// the token-gated methods below; everything past `login` demands a valid
/// session token.
pub struct LedgerContext {
    pub config: Config,
    pub repository: Arc<DuckDbRepository>,
    pub credential_service: Arc<CredentialService>,
    pub ledger_service: LedgerService,
    pub balance_service: BalanceService,
    pub session_service: SessionService,
    pub logging_service: LoggingService,
}

impl LedgerContext {
    /// Create a new Tally context rooted at a data directory
    pub fn new(data_dir: &Path) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let repository = Arc::new(DuckDbRepository::new(&data_dir.join("tally.duckdb"))?);
        repository.ensure_schema()?;
        let repo: Arc<dyn LedgerRepository> = repository.clone();

        let credential_service = Arc::new(CredentialService::new(repo.clone(), &config.hashing)?);
        let ledger_service = LedgerService::new(repo.clone());
        let balance_service = BalanceService::new(repo);
        let session_service = SessionService::new(credential_service.clone());
        let logging_service = LoggingService::new(data_dir)?;

        logging_service.record_best_effort(&LogEvent::new("context_opened"));

        Ok(Self {
            config,
            repository,
            credential_service,
            ledger_service,
            balance_service,
            session_service,
            logging_service,
        })
    }

    // === UI boundary ===

    /// Register a new account.
    ///
    /// The returned copy carries no credential material; the hash lives
    /// only in the repository.
    pub fn register(&self, username: &str, password: &str) -> std::result::Result<Account, Error> {
        match self.credential_service.register(username, password) {
            Ok(mut account) => {
                account.password_hash = String::new();
                Ok(account)
            }
            Err(e) => {
                self.logging_service
                    .record_best_effort(&LogEvent::new("register_failed").with_error(&e));
                Err(e)
            }
        }
    }

    /// Authenticate and open a session
    pub fn login(&self, username: &str, password: &str) -> std::result::Result<SessionToken, Error> {
        let result = self.session_service.login(username, password);
        if let Err(e) = &result {
            self.logging_service
                .record_best_effort(&LogEvent::new("login_failed").with_error(e));
        }
        result
    }

    /// Close a session
    pub fn logout(&self, token: SessionToken) {
        self.session_service.logout(token);
    }

    /// Append a transaction under an authenticated session
    pub fn append(
        &self,
        token: SessionToken,
        date: NaiveDate,
        category: &str,
        amount: Decimal,
        kind: TransactionKind,
        description: &str,
    ) -> std::result::Result<Transaction, Error> {
        let account_id = self.authorized_account(token)?;
        self.ledger_service
            .append(account_id, date, category, amount, kind, description)
    }

    /// List transactions under an authenticated session
    pub fn list(
        &self,
        token: SessionToken,
        filter: Option<&TransactionFilter>,
    ) -> std::result::Result<Vec<Transaction>, Error> {
        let account_id = self.authorized_account(token)?;
        self.ledger_service.list(account_id, filter)
    }

    /// Derived balance for the session's account
    pub fn current_balance(&self, token: SessionToken) -> std::result::Result<Decimal, Error> {
        let account_id = self.authorized_account(token)?;
        self.balance_service.current_balance(account_id)
    }

    /// Per-date income/expense series for the session's account
    pub fn time_series(&self, token: SessionToken) -> std::result::Result<Vec<DailyFlow>, Error> {
        let account_id = self.authorized_account(token)?;
        self.balance_service.time_series(account_id)
    }

    /// Net-by-category mapping for the session's account
    pub fn by_category(
        &self,
        token: SessionToken,
    ) -> std::result::Result<BTreeMap<String, Decimal>, Error> {
        let account_id = self.authorized_account(token)?;
        self.balance_service.by_category(account_id)
    }

    /// Resolve the session's account, confirming it still exists. An
    /// account that authenticated but vanished from the store is an
    /// internal inconsistency worth a log entry, not a silent miss.
    fn authorized_account(&self, token: SessionToken) -> std::result::Result<uuid::Uuid, Error> {
        let result = self
            .session_service
            .verify_account(token, self.repository.as_ref());
        if let Err(e @ Error::UnknownAccount(_)) = &result {
            self.logging_service
                .record_best_effort(&LogEvent::new("session_account_missing").with_error(e));
        }
        result
    }
}
