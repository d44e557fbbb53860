//! Token and username persisted together as the session identity

use tracing::debug;

use crate::{keys, SessionResult, SessionStore};

/// The durable identity of a logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Login token
    pub token: String,
    /// Username the token belongs to
    pub username: String,
}

impl SessionIdentity {
    /// Creates an identity
    pub fn new(token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: username.into(),
        }
    }

    /// Writes both values to the store
    pub fn persist(&self, store: &dyn SessionStore) -> SessionResult<()> {
        store.set(keys::TOKEN, &self.token)?;
        store.set(keys::USERNAME, &self.username)?;
        debug!(username = %self.username, "Persisted session identity");
        Ok(())
    }

    /// Reads the raw persisted values; either may be missing
    pub fn load_parts(store: &dyn SessionStore) -> SessionResult<(Option<String>, Option<String>)> {
        Ok((store.get(keys::TOKEN)?, store.get(keys::USERNAME)?))
    }

    /// Reads the identity, if both values are present and non-empty
    pub fn restore(store: &dyn SessionStore) -> SessionResult<Option<Self>> {
        match Self::load_parts(store)? {
            (Some(token), Some(username)) if !token.is_empty() && !username.is_empty() => {
                Ok(Some(Self { token, username }))
            }
            _ => Ok(None),
        }
    }

    /// Removes every persisted session value
    pub fn forget(store: &dyn SessionStore) -> SessionResult<()> {
        store.clear()?;
        debug!("Cleared session identity");
        Ok(())
    }
}
