//! Thread-safe handle to a [`DuckStore`] for multi-request servers.

use std::sync::{Arc, Mutex, MutexGuard};

use comparely_core::{Device, DeviceId, DeviceRepository};

use crate::{DuckStore, StoreError};

/// Cloneable, `Send + Sync` wrapper around a single DuckDB connection.
///
/// The lock is held only for the duration of one store call.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<DuckStore>>,
}

impl SharedStore {
    pub fn new(store: DuckStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Run `f` against the store while holding the lock.
    pub fn with<T>(
        &self,
        f: impl FnOnce(&DuckStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.lock()?;
        f(&guard)
    }

    fn lock(&self) -> Result<MutexGuard<'_, DuckStore>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl DeviceRepository for SharedStore {
    type Error = StoreError;

    fn get_device(&self, id: DeviceId) -> Result<Option<Device>, StoreError> {
        self.with(|store| store.get_device(id))
    }
}
