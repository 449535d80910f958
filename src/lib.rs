// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

//! Enclave Keystore - SGX Key-Management Service
//!
//! This crate persists secret key material and certificate signing
//! requests in an embedded ordered key-value engine, running inside an
//! Intel SGX enclave with Gramine.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `cache` - Bounded LRU cache for repeated expensive derivations
//! - `storage` - Versioned key-value stores and the CSR lifecycle

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
