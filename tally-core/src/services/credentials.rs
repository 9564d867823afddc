//! Credential service - registration and login verification
//!
//! Passwords are hashed with Argon2id into PHC strings, so every account
//! carries its own random salt and the plaintext never reaches storage.
//! Verification timing does not reveal whether a username exists: lookup
//! misses still pay for a full hash check against a fixed dummy hash, and
//! the match itself is the argon2 crate's constant-time comparison.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Version};
use rand::rngs::OsRng;
use uuid::Uuid;

use crate::config::HashingSettings;
use crate::domain::result::{Error, Result};
use crate::domain::Account;
use crate::ports::LedgerRepository;

/// Credential service for account registration and verification
pub struct CredentialService {
    repository: Arc<dyn LedgerRepository>,
    hasher: Argon2<'static>,
    /// Hash of a throwaway password, verified against when a username is
    /// not found so that misses and mismatches are timing-equivalent.
    dummy_hash: String,
}

impl CredentialService {
    pub fn new(repository: Arc<dyn LedgerRepository>, settings: &HashingSettings) -> Result<Self> {
        let params = argon2::Params::new(
            settings.memory_cost,
            settings.time_cost,
            settings.parallelism,
            None,
        )
        .map_err(|e| Error::Config(format!("invalid argon2 parameters: {}", e)))?;
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = hasher
            .hash_password(b"tally.dummy.verification.target", &salt)
            .map_err(|e| Error::Config(format!("argon2 self-check failed: {}", e)))?
            .to_string();

        Ok(Self {
            repository,
            hasher,
            dummy_hash,
        })
    }

    /// Register a new account.
    ///
    /// Rejects empty usernames and passwords with `Validation` and taken
    /// usernames (exact, case-sensitive) with `DuplicateUsername`. A failed
    /// registration leaves existing credentials untouched.
    pub fn register(&self, username: &str, password: &str) -> Result<Account> {
        if username.trim().is_empty() {
            return Err(Error::validation("username cannot be empty"));
        }
        if password.is_empty() {
            return Err(Error::validation("password cannot be empty"));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::storage(format!("password hashing failed: {}", e)))?
            .to_string();

        let account = Account::new(Uuid::new_v4(), username, hash);
        self.repository.add_account(&account)?;
        Ok(account)
    }

    /// Verify a login attempt.
    ///
    /// Returns the account on a correct password, `None` otherwise. An
    /// unknown username is not an error and is indistinguishable from a
    /// wrong password by result and by timing.
    pub fn verify(&self, username: &str, password: &str) -> Result<Option<Account>> {
        match self.repository.get_account_by_username(username)? {
            Some(account) => {
                let matches = PasswordHash::new(&account.password_hash)
                    .map(|parsed| {
                        self.hasher
                            .verify_password(password.as_bytes(), &parsed)
                            .is_ok()
                    })
                    .unwrap_or(false);
                Ok(matches.then_some(account))
            }
            None => {
                // Burn the same hashing cost a real mismatch would
                if let Ok(parsed) = PasswordHash::new(&self.dummy_hash) {
                    let _ = self.hasher.verify_password(password.as_bytes(), &parsed);
                }
                Ok(None)
            }
        }
    }
}
