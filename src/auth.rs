//! Plaintext credential store and session marker.
//!
//! Credentials are stored and compared as-is; registering the same email
//! twice simply adds a second record.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::route::Route;
use crate::storage::{self, KeyValueStore, SESSION_KEY, USERS_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

impl Credential {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

pub struct CredentialStore<S> {
    storage: S,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn users(&self) -> Result<Vec<Credential>> {
        Ok(storage::read_json(&self.storage, USERS_KEY)?.unwrap_or_default())
    }

    pub fn register(&self, record: Credential) -> Result<()> {
        let mut users = self.users()?;
        debug!(email = %record.email, existing = users.len(), "registering user");
        users.push(record);
        storage::write_json(&self.storage, USERS_KEY, &users)
    }

    /// Returns false unless a record matches both fields exactly.
    pub fn login(&self, email: &str, password: &str) -> Result<bool> {
        let users = self.users()?;
        match users
            .into_iter()
            .find(|u| u.email == email && u.password == password)
        {
            Some(user) => {
                storage::write_json(&self.storage, SESSION_KEY, &user)?;
                debug!(email, "logged in");
                Ok(true)
            }
            None => {
                warn!(email, "login rejected");
                Ok(false)
            }
        }
    }

    /// Clears the session; the caller should show the returned route.
    pub fn logout(&self) -> Result<Route> {
        self.storage.remove(SESSION_KEY)?;
        debug!("logged out");
        Ok(Route::Login)
    }

    pub fn is_logged_in(&self) -> Result<bool> {
        Ok(self.storage.get(SESSION_KEY)?.is_some())
    }

    pub fn current_user(&self) -> Result<Option<Credential>> {
        storage::read_json(&self.storage, SESSION_KEY)
    }

    /// Submit a login form: the dashboard on success, or the user-facing
    /// "Invalid credentials" error.
    pub fn submit_login(&self, email: &str, password: &str) -> Result<Route> {
        if self.login(email, password)? {
            Ok(Route::Dashboard)
        } else {
            Err(Error::InvalidCredentials)
        }
    }

    /// Where a request for the dashboard actually lands.
    pub fn guard_dashboard(&self) -> Result<Route> {
        if self.is_logged_in()? {
            Ok(Route::Dashboard)
        } else {
            Ok(Route::Login)
        }
    }
}
