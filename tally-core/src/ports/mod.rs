//! Ports - trait definitions for external dependencies

mod repository;

pub use repository::LedgerRepository;
