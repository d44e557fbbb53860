//! Durable session identity storage for snooze
//!
//! The news client persists exactly two values between runs: the login token
//! and the username it belongs to. This crate provides the key/value
//! [`SessionStore`] abstraction with file, OS keychain and in-memory backends,
//! plus [`SessionIdentity`] helpers that read and write the pair together.

mod error;
mod file;
mod identity;
mod keyring_store;

use std::collections::HashMap;

pub use error::*;
pub use file::*;
pub use identity::*;
pub use keyring_store::*;

/// Fixed key names for persisted session values
pub mod keys {
    /// Login token
    pub const TOKEN: &str = "token";

    /// Username the token was issued to
    pub const USERNAME: &str = "username";

    /// All known keys
    pub const ALL: &[&str] = &[TOKEN, USERNAME];
}

/// Service name for keychain storage
pub const KEYCHAIN_SERVICE: &str = "com.hackorsnooze.snooze";

/// Trait for durable session storage
pub trait SessionStore: Send + Sync {
    /// Gets a value
    fn get(&self, key: &str) -> SessionResult<Option<String>>;

    /// Sets a value
    fn set(&self, key: &str, value: &str) -> SessionResult<()>;

    /// Deletes a value. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> SessionResult<()>;

    /// Removes every persisted session value
    fn clear(&self) -> SessionResult<()> {
        for key in keys::ALL {
            self.delete(key)?;
        }
        Ok(())
    }

    /// Checks if a value exists
    fn exists(&self, key: &str) -> SessionResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// In-memory session store for testing
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: std::sync::RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    /// Creates an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-populated values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self {
            values: std::sync::RwLock::new(values),
        }
    }

    fn poisoned(e: impl std::fmt::Display) -> SessionError {
        SessionError::Other(format!("Lock poisoned: {}", e))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let values = self.values.read().map_err(Self::poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let mut values = self.values.write().map_err(Self::poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> SessionResult<()> {
        let mut values = self.values.write().map_err(Self::poisoned)?;
        values.remove(key);
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        let mut values = self.values.write().map_err(Self::poisoned)?;
        values.clear();
        Ok(())
    }
}
