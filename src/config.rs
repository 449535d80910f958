// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Base directory for the wallet databases | `sgx_data` under the working directory |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `1028` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;

/// Environment variable name for the base data directory path.
///
/// The data directory holds the three wallet databases and is mounted as
/// Gramine's encrypted filesystem in the manifest.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default data directory name, resolved relative to the process working
/// directory when `DATA_DIR` is not set.
pub const DEFAULT_DATA_DIR: &str = "sgx_data";

/// File name of the primary secret store under the data directory.
pub const WALLET_DB_NAME: &str = "WALLET_DB";

/// File name of the CSR request store under the data directory.
pub const CSR_DB_NAME: &str = "CSR_DB";

/// File name of the CSR status store under the data directory.
pub const CSR_STATUS_DB_NAME: &str = "CSR_STATUS_DB";

/// Resolve the base data directory from the environment, defaulting to
/// `sgx_data` under the current working directory.
pub fn data_dir() -> PathBuf {
    match env::var(DATA_DIR_ENV) {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => env::current_dir()
            .map(|cwd| cwd.join(DEFAULT_DATA_DIR))
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR)),
    }
}
