// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

//! # Versioned Key-Value Storage
//!
//! Persistent storage for secret key material and the CSR approval
//! workflow, backed by redb (pure Rust, ACID). All data lives under one
//! base directory which the Gramine manifest mounts as an encrypted
//! filesystem; this module uses normal file I/O and implements no crypto
//! of its own.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   WALLET_DB        # primary secret store: key name → key material
//!   CSR_DB           # CSR requests: content hash → CSR payload
//!   CSR_STATUS_DB    # CSR dispositions: content hash → status code
//! ```
//!
//! ## Value Format
//!
//! Every value written by this code is a JSON envelope carrying the
//! payload and a creation timestamp. Values written before the envelope
//! format was introduced are raw bytes; they remain readable but are never
//! produced again. See [`envelope`].

pub mod csr;
pub mod envelope;
pub mod registry;
pub mod store;

pub use csr::{CsrError, CsrManager, CsrResult, CsrStatus};
pub use envelope::StoredValue;
pub use registry::StoreRegistry;
pub use store::{KeyDatabase, StoreError, StoreResult};
