//! Account domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account: stable id, unique username, salted password hash.
///
/// There is deliberately no stored balance field. Balance is always derived
/// from the transaction ledger (see `domain::report`), so it can never go
/// stale against the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Unique, case-sensitive
    pub username: String,
    /// Argon2id hash in PHC string format. The per-account salt is embedded
    /// in the string; the plaintext is never stored anywhere.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with an already-computed password hash
    pub fn new(id: Uuid, username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username cannot be empty");
        }
        if self.password_hash.is_empty() {
            return Err("password hash cannot be empty");
        }
        Ok(())
    }
}
