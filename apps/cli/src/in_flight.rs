//! Per-entity guard against duplicate concurrent mutations

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::{ControllerError, ControllerResult};

/// Set of entity keys with an operation currently in flight
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key` until the returned guard is dropped.
    ///
    /// Fails with [`ControllerError::Busy`] if the key is already claimed.
    pub fn claim(&self, key: impl Into<String>) -> ControllerResult<InFlightGuard> {
        let key = key.into();
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            debug!(key = %key, "Rejected duplicate in-flight operation");
            return Err(ControllerError::Busy(key));
        }

        Ok(InFlightGuard {
            keys: self.keys.clone(),
            key,
        })
    }
}

/// Releases its key on drop
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
