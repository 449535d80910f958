// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Enclave Keystore Contributors

//! Versioned key-value store backed by redb (pure Rust, ACID).
//!
//! One [`KeyDatabase`] wraps one embedded database file holding a single
//! `entries` table. Every value passes through the envelope codec: writes
//! always produce the current (timestamped) format, reads transparently
//! accept both the current and the legacy raw format.
//!
//! The store owns no policy about what keys mean. Individual engine calls
//! are serialized by redb itself, but **cross-call sequences are not
//! atomic** — `write_unique`'s check-then-write and `collect_all`'s
//! multi-key scan are only consistent against concurrent writers if the
//! caller holds its own lock (the CSR manager does exactly that).

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::envelope::{self, StoredValue};

/// Single table holding every entry of one store handle.
const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

/// Key namespace for temporary network encryption keys. The scoped delete
/// refuses to touch anything outside it.
pub const TEMP_NEK_PREFIX: &str = "tmp_NEK";

/// Key namespace for ephemeral DKG Diffie-Hellman keys.
pub const DKG_DH_KEY_PREFIX: &str = "DKG_DH_KEY_";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("corrupt stored value: {0}")]
    CorruptValue(String),

    #[error("data with this name already exists: {0}")]
    DuplicateKey(String),

    #[error("key does not belong to this namespace: {0}")]
    InvalidKey(String),

    #[error("store registry is already initialized")]
    AlreadyInitialized,

    #[error("store registry is not initialized")]
    NotInitialized,

    #[error("could not create data directory: {0}")]
    CreateDataDir(#[source] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// KeyDatabase
// =============================================================================

/// One opened embedded-engine instance bound to a filesystem path.
#[derive(Debug)]
pub struct KeyDatabase {
    db: Database,
}

impl KeyDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ENTRIES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Read and decode the value stored under `key`.
    ///
    /// A missing key is a normal outcome (`Ok(None)`), not an error. Both
    /// envelope-encoded and legacy raw values are returned; the caller can
    /// tell them apart by the presence of a timestamp.
    pub fn read(&self, key: &str) -> StoreResult<Option<StoredValue>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;
        match table.get(key)? {
            Some(raw) => Ok(Some(envelope::decode(raw.value())?)),
            None => Ok(None),
        }
    }

    /// Write `value` under `key`, unconditionally overwriting any prior
    /// value regardless of its encoding. Always writes the current format
    /// with the timestamp taken at call time.
    pub fn write(&self, key: &str, value: &str) -> StoreResult<()> {
        let encoded = envelope::encode(value, Utc::now().timestamp())?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES)?;
            table.insert(key, encoded.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Write `value` under `key` only if the key is not already present.
    ///
    /// The check and the write are separate engine calls; callers that need
    /// them to be atomic against concurrent writers of the same namespace
    /// must hold their own lock around this call.
    pub fn write_unique(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.read(key)?.is_some() {
            tracing::debug!(key, "key already exists");
            return Err(StoreError::DuplicateKey(key.to_string()));
        }
        self.write(key, value)
    }

    /// Remove `key`. Deleting an absent key succeeds (idempotent).
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Delete a temporary network encryption key.
    ///
    /// Fails with [`StoreError::InvalidKey`] unless the key carries the
    /// `tmp_NEK` prefix, so this narrow entry point cannot be used to
    /// delete out-of-namespace keys.
    pub fn delete_temp_nek(&self, key: &str) -> StoreResult<()> {
        if !key.starts_with(TEMP_NEK_PREFIX) {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        self.delete(key)
    }

    /// Delete an ephemeral DKG Diffie-Hellman key by its bare name. The
    /// namespace prefix is prepended here, never supplied by the caller.
    pub fn delete_dkg_dh_key(&self, key: &str) -> StoreResult<()> {
        let full_key = format!("{DKG_DH_KEY_PREFIX}{key}");
        self.delete(&full_key)
    }

    /// Visit up to `max_keys` keys in the engine's native ordering,
    /// returning the count actually visited.
    ///
    /// The visitor sees key identifiers only; values stay undecoded, which
    /// keeps enumeration cheap.
    pub fn visit_keys<F>(&self, mut visitor: F, max_keys: u64) -> StoreResult<u64>
    where
        F: FnMut(&str),
    {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;

        let mut visited = 0u64;
        for entry in table.iter()? {
            if visited == max_keys {
                break;
            }
            let entry = entry?;
            visitor(entry.0.value());
            visited += 1;
        }
        Ok(visited)
    }

    /// Full scan producing a human-readable listing of every key with its
    /// decoded value and, for current-format entries, a readable timestamp.
    ///
    /// Intended for operator diagnostics, not the hot path: unlike
    /// [`Self::visit_keys`] this decodes every value.
    pub fn collect_all(&self) -> StoreResult<(String, u64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;

        let mut dump = String::new();
        let mut counter = 0u64;
        for entry in table.iter()? {
            let entry = entry?;
            let key = entry.0.value().to_string();
            let stored = envelope::decode(entry.1.value())?;
            counter += 1;

            match stored.timestamp {
                Some(ts) => {
                    let human = DateTime::from_timestamp(ts, 0)
                        .map(|dt| dt.to_rfc2822())
                        .unwrap_or_else(|| ts.to_string());
                    dump.push_str(&format!(
                        "KEY: {key}, VALUE: {}, TIMESTAMP: {human}\n",
                        stored.value
                    ));
                }
                None => {
                    dump.push_str(&format!("KEY: {key}, VALUE: {}\n", stored.value));
                }
            }
        }

        Ok((dump, counter))
    }

    /// Scan all entries and return the key with the latest creation
    /// timestamp. Legacy entries carry no timestamp and never compete.
    ///
    /// Returns an empty key and zero timestamp when no current-format
    /// entries exist. Equal timestamps resolve to the last key seen in
    /// scan order.
    pub fn latest_created(&self) -> StoreResult<(String, i64)> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;

        let mut latest_key = String::new();
        let mut latest_timestamp = 0i64;
        for entry in table.iter()? {
            let entry = entry?;
            let stored = envelope::decode(entry.1.value())?;
            let Some(ts) = stored.timestamp else {
                continue;
            };
            if ts > 0 && ts >= latest_timestamp {
                latest_timestamp = ts;
                latest_key = entry.0.value().to_string();
            }
        }

        Ok((latest_key, latest_timestamp))
    }

    /// Write raw bytes without the envelope, to seed legacy-format entries.
    #[cfg(test)]
    pub(crate) fn write_raw(&self, key: &str, bytes: &[u8]) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(ENTRIES)?;
            table.insert(key, bytes)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
