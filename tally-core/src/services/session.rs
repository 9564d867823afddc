//! Session service - the authenticated-session boundary
//!
//! Holds the ephemeral token → account mapping. This replaces the ambient
//! "is logged in" flag the original UI kept: every ledger call from the
//! presentation layer carries an explicit token, so multiple sessions can
//! coexist and teardown is just removing the entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::ports::LedgerRepository;
use crate::services::CredentialService;

/// Opaque handle for an authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(Uuid);

impl SessionToken {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Session service binding authenticated accounts to tokens
pub struct SessionService {
    credentials: Arc<CredentialService>,
    /// token -> account id; entries live exactly from login to logout
    active: Mutex<HashMap<SessionToken, Uuid>>,
}

impl SessionService {
    pub fn new(credentials: Arc<CredentialService>) -> Self {
        Self {
            credentials,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Authenticate and open a session.
    ///
    /// Every failure collapses into `AuthenticationFailed`; whether the
    /// username or the password was wrong is never revealed. The Argon2
    /// check runs before the session lock is taken, so one login's hashing
    /// cost never serializes other sessions' ledger work.
    pub fn login(&self, username: &str, password: &str) -> Result<SessionToken> {
        let account = self
            .credentials
            .verify(username, password)?
            .ok_or(Error::AuthenticationFailed)?;

        let token = SessionToken::generate();
        self.active.lock().unwrap().insert(token, account.id);
        Ok(token)
    }

    /// Invalidate a session. Idempotent; unknown tokens are a no-op.
    pub fn logout(&self, token: SessionToken) {
        self.active.lock().unwrap().remove(&token);
    }

    /// Resolve a token to its account id. Every ledger operation coming
    /// from the UI boundary passes through this check first.
    pub fn current_account(&self, token: SessionToken) -> Result<Uuid> {
        self.active
            .lock()
            .unwrap()
            .get(&token)
            .copied()
            .ok_or(Error::NotAuthenticated)
    }

    /// Number of open sessions
    pub fn session_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    /// Check that a token's account still exists in the store. A missing
    /// account here is an internal consistency violation, surfaced as
    /// `UnknownAccount` rather than swallowed.
    pub fn verify_account(
        &self,
        token: SessionToken,
        repository: &dyn LedgerRepository,
    ) -> Result<Uuid> {
        let account_id = self.current_account(token)?;
        match repository.get_account_by_id(account_id)? {
            Some(account) => Ok(account.id),
            None => Err(Error::unknown_account(account_id.to_string())),
        }
    }
}
