//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod balance;
mod credentials;
mod ledger;
pub mod logging;
pub mod migration;
mod session;

pub use balance::BalanceService;
pub use credentials::CredentialService;
pub use ledger::{LedgerService, TransactionFilter};
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use session::{SessionService, SessionToken};
