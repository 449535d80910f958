// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

//! Process-wide lifecycle manager for the three store handles.
//!
//! The registry is an explicit object injected into every consumer rather
//! than an ambient global, so a test can point an isolated registry at a
//! temporary directory. It is initialized exactly once: re-entry is a
//! programming error, not a retryable condition.

use std::path::Path;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::config::{CSR_DB_NAME, CSR_STATUS_DB_NAME, WALLET_DB_NAME};

use super::store::{KeyDatabase, StoreError, StoreResult};

struct Stores {
    primary: KeyDatabase,
    csr_requests: KeyDatabase,
    csr_status: KeyDatabase,
}

/// Owner of the three named store handles: primary secret store, CSR
/// request store, CSR status store. All other components borrow.
pub struct StoreRegistry {
    stores: OnceLock<Stores>,
    /// Serializes the open-and-set work of [`Self::initialize`] so a
    /// concurrent loser observes `AlreadyInitialized` instead of racing the
    /// winner on the database files.
    init_lock: Mutex<()>,
}

impl StoreRegistry {
    /// Create an uninitialized registry. Getters fail with
    /// [`StoreError::NotInitialized`] until [`Self::initialize`] runs.
    pub const fn new() -> Self {
        Self {
            stores: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Create the base data directory if absent and open the three store
    /// handles under it, each with create-if-missing semantics.
    ///
    /// Exactly one caller wins; every other call, concurrent or later,
    /// fails with [`StoreError::AlreadyInitialized`]. Any open failure is
    /// fatal to initialization; there is no rollback of earlier-opened
    /// handles.
    pub fn initialize(&self, base_dir: &Path) -> StoreResult<()> {
        let _guard = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.stores.get().is_some() {
            return Err(StoreError::AlreadyInitialized);
        }

        tracing::info!(base_dir = %base_dir.display(), "initializing wallet databases");

        std::fs::create_dir_all(base_dir).map_err(StoreError::CreateDataDir)?;

        let primary = KeyDatabase::open(&base_dir.join(WALLET_DB_NAME))?;
        let csr_requests = KeyDatabase::open(&base_dir.join(CSR_DB_NAME))?;
        let csr_status = KeyDatabase::open(&base_dir.join(CSR_STATUS_DB_NAME))?;

        self.stores
            .set(Stores {
                primary,
                csr_requests,
                csr_status,
            })
            .map_err(|_| StoreError::AlreadyInitialized)?;

        tracing::info!("successfully opened wallet databases");
        Ok(())
    }

    fn stores(&self) -> StoreResult<&Stores> {
        self.stores.get().ok_or(StoreError::NotInitialized)
    }

    /// The primary secret store (key material).
    pub fn primary(&self) -> StoreResult<&KeyDatabase> {
        Ok(&self.stores()?.primary)
    }

    /// The CSR request store (content hash → CSR payload).
    pub fn csr_requests(&self) -> StoreResult<&KeyDatabase> {
        Ok(&self.stores()?.csr_requests)
    }

    /// The CSR status store (content hash → disposition code).
    pub fn csr_status(&self) -> StoreResult<&KeyDatabase> {
        Ok(&self.stores()?.csr_status)
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn getters_fail_before_initialize() {
        let registry = StoreRegistry::new();
        assert!(matches!(
            registry.primary().unwrap_err(),
            StoreError::NotInitialized
        ));
        assert!(matches!(
            registry.csr_requests().unwrap_err(),
            StoreError::NotInitialized
        ));
        assert!(matches!(
            registry.csr_status().unwrap_err(),
            StoreError::NotInitialized
        ));
    }

    #[test]
    fn initialize_opens_three_stores_under_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("sgx_data");

        let registry = StoreRegistry::new();
        registry.initialize(&base).unwrap();

        assert!(base.join(WALLET_DB_NAME).exists());
        assert!(base.join(CSR_DB_NAME).exists());
        assert!(base.join(CSR_STATUS_DB_NAME).exists());

        registry.primary().unwrap().write("k", "v").unwrap();
        assert!(registry
            .csr_requests()
            .unwrap()
            .read("k")
            .unwrap()
            .is_none());
    }

    #[test]
    fn second_initialize_fails() {
        let dir = tempfile::tempdir().unwrap();
        let registry = StoreRegistry::new();
        registry.initialize(dir.path()).unwrap();

        let err = registry.initialize(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyInitialized));
        // The original handles stay usable
        registry.primary().unwrap().write("k", "v").unwrap();
    }

    #[test]
    fn concurrent_initialize_has_one_winner() {
        use std::sync::{Arc, Barrier};

        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(StoreRegistry::new());
        let barrier = Arc::new(Barrier::new(2));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let registry = Arc::clone(&registry);
            let barrier = Arc::clone(&barrier);
            let base = dir.path().to_path_buf();
            handles.push(std::thread::spawn(move || {
                barrier.wait();
                registry.initialize(&base)
            }));
        }

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect();

        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        for result in results {
            if let Err(err) = result {
                assert!(matches!(err, StoreError::AlreadyInitialized));
            }
        }
        registry.primary().unwrap().write("k", "v").unwrap();
    }

    #[test]
    fn handles_are_independent_stores() {
        let dir = tempfile::tempdir().unwrap();
        let registry = StoreRegistry::new();
        registry.initialize(dir.path()).unwrap();

        registry
            .primary()
            .unwrap()
            .write("h", "key material")
            .unwrap();
        registry
            .csr_requests()
            .unwrap()
            .write("h", "csr body")
            .unwrap();
        registry.csr_status().unwrap().write("h", "0").unwrap();

        assert_eq!(
            registry.primary().unwrap().read("h").unwrap().unwrap().value,
            "key material"
        );
        assert_eq!(
            registry
                .csr_requests()
                .unwrap()
                .read("h")
                .unwrap()
                .unwrap()
                .value,
            "csr body"
        );
        assert_eq!(
            registry
                .csr_status()
                .unwrap()
                .read("h")
                .unwrap()
                .unwrap()
                .value,
            "0"
        );
    }
}
