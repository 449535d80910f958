// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

//! Certificate signing request lifecycle.
//!
//! A CSR is keyed by its content hash. It starts pending (present in the
//! request store, absent from the status store) and moves to approved or
//! rejected when a disposition code is written under the same hash.
//!
//! The underlying stores provide no cross-call atomicity, so the manager
//! holds one coarse non-reentrant mutex for the duration of each public
//! operation. That makes `list_unsigned` and `record_status` mutually
//! exclusive with each other — but not with raw store calls made outside
//! the manager.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::registry::StoreRegistry;
use super::store::StoreError;

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CsrError {
    #[error("no CSR request with hash {0}")]
    UnknownRequest(String),

    #[error("unrecognized CSR status code: {0}")]
    UnknownStatusCode(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CsrResult<T> = Result<T, CsrError>;

// =============================================================================
// Status Codes
// =============================================================================

/// Disposition of a signed-off CSR. A closed set: unrecognized wire codes
/// are rejected rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrStatus {
    Approved,
    Rejected,
}

impl CsrStatus {
    /// Integer code as stored in the status database and accepted on the
    /// wire.
    pub const fn code(self) -> i64 {
        match self {
            Self::Approved => 0,
            Self::Rejected => 2,
        }
    }
}

impl TryFrom<i64> for CsrStatus {
    type Error = CsrError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Approved),
            2 => Ok(Self::Rejected),
            other => Err(CsrError::UnknownStatusCode(other)),
        }
    }
}

// =============================================================================
// CsrManager
// =============================================================================

/// Business logic over the CSR request and status stores.
pub struct CsrManager {
    registry: Arc<StoreRegistry>,
    /// Coarse lock serializing every public operation of this manager.
    lock: Mutex<()>,
}

impl CsrManager {
    pub fn new(registry: Arc<StoreRegistry>) -> Self {
        Self {
            registry,
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new CSR under its content hash. Submitting the same hash
    /// twice fails with [`StoreError::DuplicateKey`].
    pub fn submit(&self, hash: &str, csr: &str) -> CsrResult<()> {
        let _guard = self.guard();
        self.registry.csr_requests()?.write_unique(hash, csr)?;
        tracing::info!(hash, "stored new CSR request");
        Ok(())
    }

    /// Hashes of every CSR that has no disposition yet.
    ///
    /// Held under the manager lock for the whole scan so the result is a
    /// consistent snapshot against concurrent [`Self::record_status`]
    /// calls. Order is the engine's key order; callers should treat the
    /// result as a set.
    pub fn list_unsigned(&self) -> CsrResult<Vec<String>> {
        let _guard = self.guard();

        let requests = self.registry.csr_requests()?;
        let status = self.registry.csr_status()?;

        let mut hashes = Vec::new();
        requests.visit_keys(|key| hashes.push(key.to_string()), u64::MAX)?;

        let mut unsigned = Vec::new();
        for hash in hashes {
            if status.read(&hash)?.is_none() {
                unsigned.push(hash);
            }
        }
        Ok(unsigned)
    }

    /// Write a disposition for `hash`, overwriting any previous one.
    ///
    /// Fails with [`CsrError::UnknownRequest`] if no CSR with this hash was
    /// ever submitted.
    pub fn record_status(&self, hash: &str, status: CsrStatus) -> CsrResult<()> {
        let _guard = self.guard();

        if self.registry.csr_requests()?.read(hash)?.is_none() {
            return Err(CsrError::UnknownRequest(hash.to_string()));
        }

        self.registry
            .csr_status()?
            .write(hash, &status.code().to_string())?;
        tracing::info!(hash, code = status.code(), "recorded CSR disposition");
        Ok(())
    }

    /// Current disposition of `hash`, or `None` while it is still pending.
    ///
    /// A stored code outside the closed status set is an error, not a
    /// silently accepted integer.
    pub fn status(&self, hash: &str) -> CsrResult<Option<CsrStatus>> {
        let _guard = self.guard();

        let Some(stored) = self.registry.csr_status()?.read(hash)? else {
            return Ok(None);
        };
        let code: i64 = stored.value.parse().map_err(|_| {
            StoreError::CorruptValue(format!("non-integer CSR status: {:?}", stored.value))
        })?;
        Ok(Some(CsrStatus::try_from(code)?))
    }
}

// =============================================================================
// Tests
// =============================================================================
