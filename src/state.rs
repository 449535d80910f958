// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

use std::sync::Arc;

use crate::storage::{CsrManager, StoreRegistry};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StoreRegistry>,
    pub csr: Arc<CsrManager>,
}

impl AppState {
    /// Build application state around an already-initialized registry.
    pub fn new(registry: Arc<StoreRegistry>) -> Self {
        let csr = Arc::new(CsrManager::new(Arc::clone(&registry)));
        Self { registry, csr }
    }

    /// State backed by an isolated registry under a temporary directory.
    #[cfg(test)]
    pub fn for_tests(base_dir: &std::path::Path) -> Self {
        let registry = Arc::new(StoreRegistry::new());
        registry.initialize(base_dir).expect("initialize registry");
        Self::new(registry)
    }
}
