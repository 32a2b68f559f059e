// crates/snare-router/src/pins.rs
// ============================================================================
// Module: Snare Pin Store
// Description: In-memory TTL pin map with lazy read-time eviction.
// Purpose: Provide the default PinStore backing for the router.
// Dependencies: snare-core
// ============================================================================

//! ## Overview
//! The pin map is a single mapping from fingerprint to pin with read-heavy
//! load. Expiry is checked at read time under the same lock that removes the
//! entry, so a concurrent reader can never observe a stale `pinned_until`.
//! Invariants:
//! - At most one pin per fingerprint; later puts replace earlier ones.
//! - Reads never return an expired pin.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use snare_core::Fingerprint;
use snare_core::Pin;
use snare_core::PinStore;
use snare_core::PinStoreError;
use snare_core::SessionId;
use snare_core::Timestamp;

// ============================================================================
// SECTION: In-Memory Pin Store
// ============================================================================

/// In-memory pin store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPinStore {
    /// Pins keyed by fingerprint behind a mutex.
    pins: Arc<Mutex<BTreeMap<Fingerprint, Pin>>>,
}

impl InMemoryPinStore {
    /// Creates an empty pin store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored pins, expired entries included.
    ///
    /// # Errors
    ///
    /// Returns [`PinStoreError::Store`] when the store mutex is poisoned.
    pub fn raw_len(&self) -> Result<usize, PinStoreError> {
        Ok(self.lock()?.len())
    }

    /// Locks the pin map.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<Fingerprint, Pin>>, PinStoreError> {
        self.pins.lock().map_err(|_| PinStoreError::Store("pin store mutex poisoned".to_string()))
    }
}

impl PinStore for InMemoryPinStore {
    fn put(&self, pin: Pin) -> Result<(), PinStoreError> {
        self.lock()?.insert(pin.fingerprint.clone(), pin);
        Ok(())
    }

    fn get_live(
        &self,
        fingerprint: &Fingerprint,
        now: Timestamp,
    ) -> Result<Option<Pin>, PinStoreError> {
        let mut guard = self.lock()?;
        match guard.get(fingerprint) {
            Some(pin) if pin.is_live_at(now) => Ok(Some(pin.clone())),
            Some(_) => {
                // Expired: evict under the same lock (compare-and-delete).
                guard.remove(fingerprint);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn list_live(&self, now: Timestamp) -> Result<Vec<Pin>, PinStoreError> {
        let mut guard = self.lock()?;
        guard.retain(|_, pin| pin.is_live_at(now));
        Ok(guard.values().cloned().collect())
    }

    fn remove_session(&self, session_id: &SessionId) -> Result<usize, PinStoreError> {
        let mut guard = self.lock()?;
        let before = guard.len();
        guard.retain(|_, pin| pin.session_id != *session_id);
        Ok(before - guard.len())
    }
}
