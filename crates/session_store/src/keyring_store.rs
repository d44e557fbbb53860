//! OS keychain session store
//!
//! The whole session identity lives in a single keychain item, stored as a
//! JSON object. Logging out deletes that one item, so a half-cleared
//! identity (token without username or the reverse) cannot be left behind.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use keyring::Entry;
use tracing::debug;

use crate::{SessionError, SessionResult, SessionStore, KEYCHAIN_SERVICE};

/// Keychain account the session item is stored under
pub const SESSION_ACCOUNT: &str = "session";

type Values = BTreeMap<String, String>;

/// Session store backed by the OS keychain (macOS Keychain, Windows
/// Credential Manager, Linux kernel keyutils)
#[derive(Debug)]
pub struct KeyringSessionStore {
    service: String,
    lock: Mutex<()>,
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringSessionStore {
    /// Creates a store under the default service name
    pub fn new() -> Self {
        Self::with_service(KEYCHAIN_SERVICE)
    }

    /// Creates a store under a custom service name
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            lock: Mutex::new(()),
        }
    }

    fn session_entry(&self) -> SessionResult<Entry> {
        Entry::new(&self.service, SESSION_ACCOUNT).map_err(|e| {
            SessionError::Keychain(format!("Cannot open session item in {}: {e}", self.service))
        })
    }

    fn load(&self, entry: &Entry) -> SessionResult<Values> {
        match entry.get_password() {
            Ok(blob) => decode(&blob),
            Err(keyring::Error::NoEntry) => Ok(Values::new()),
            Err(e) => Err(SessionError::Keychain(e.to_string())),
        }
    }

    fn save(&self, entry: &Entry, values: &Values) -> SessionResult<()> {
        if values.is_empty() {
            return remove(entry);
        }
        let blob = serde_json::to_string(values)?;
        entry
            .set_password(&blob)
            .map_err(|e| SessionError::Keychain(e.to_string()))
    }
}

/// Parses the stored item; an empty item reads as no values.
fn decode(blob: &str) -> SessionResult<Values> {
    if blob.trim().is_empty() {
        return Ok(Values::new());
    }
    Ok(serde_json::from_str(blob)?)
}

fn remove(entry: &Entry) -> SessionResult<()> {
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(SessionError::Keychain(e.to_string())),
    }
}

impl SessionStore for KeyringSessionStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let entry = self.session_entry()?;
        Ok(self.load(&entry)?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        let _lock = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = self.session_entry()?;
        let mut values = self.load(&entry)?;
        values.insert(key.to_string(), value.to_string());
        self.save(&entry, &values)?;
        debug!(service = %self.service, key, "Stored session value in keychain");
        Ok(())
    }

    fn delete(&self, key: &str) -> SessionResult<()> {
        let _lock = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = self.session_entry()?;
        let mut values = self.load(&entry)?;
        if values.remove(key).is_some() {
            self.save(&entry, &values)?;
            debug!(service = %self.service, key, "Removed session value from keychain");
        }
        Ok(())
    }

    fn clear(&self) -> SessionResult<()> {
        let _lock = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        remove(&self.session_entry()?)?;
        debug!(service = %self.service, "Cleared keychain session");
        Ok(())
    }
}
