//! Storage layer for casebook.
//!
//! Records are persisted through a small key-value [`Backend`]: one slot per
//! key, each holding a text value, plus a shared revision counter that views
//! over the same storage use to notice each other's writes.
//!
//! Two backends are provided:
//! - [`SqliteBackend`], a file-backed `SQLite` slot table
//! - [`MemoryBackend`], an in-process map whose clones share state
//!
//! Both enforce a byte quota the way browser storage does, counting the
//! length of every key and value.

mod memory;
pub mod migrations;
pub mod schema;
mod sqlite;

use std::fmt;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use crate::error::{Error, Result};

/// Default quota in bytes (the common browser local-storage limit).
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Key-value persistence used by the record store.
pub trait Backend: fmt::Debug + Send {
    /// Read a slot. Returns `None` when the slot is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a slot, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capacity`] when the write would push total usage past
    /// the quota, or another error if the medium rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a slot. Removing an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium rejects the change.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Approximate bytes in use: the sum of key and value lengths.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium cannot be read.
    fn usage_bytes(&self) -> Result<u64>;

    /// Current value of the shared change counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium cannot be read.
    fn revision(&self) -> Result<u64>;

    /// Advance the shared change counter and return the new value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage medium rejects the change.
    fn bump_revision(&mut self) -> Result<u64>;
}

/// Bytes a single slot occupies.
fn entry_bytes(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}

/// Reject a write whose resulting total usage would exceed `quota`.
///
/// `current_total` is the usage before the write and `previous` the size of
/// the entry being replaced (zero for a new key).
fn check_quota(
    current_total: u64,
    previous: u64,
    key: &str,
    value: &str,
    quota: u64,
) -> Result<()> {
    let needed = current_total.saturating_sub(previous) + entry_bytes(key, value);
    if needed > quota {
        return Err(Error::Capacity { needed, quota });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_bytes_counts_key_and_value() {
        assert_eq!(entry_bytes("abc", "12345"), 8);
        assert_eq!(entry_bytes("", ""), 0);
    }

    #[test]
    fn test_check_quota_allows_exact_fit() {
        assert!(check_quota(0, 0, "k", "vvvv", 5).is_ok());
    }

    #[test]
    fn test_check_quota_rejects_overflow() {
        let err = check_quota(0, 0, "k", "vvvvv", 5).unwrap_err();
        assert!(matches!(err, Error::Capacity { needed: 6, quota: 5 }));
    }

    #[test]
    fn test_check_quota_discounts_replaced_entry() {
        // 10 bytes in use, 8 of them belong to the slot being rewritten.
        assert!(check_quota(10, 8, "k", "vvvvvvv", 10).is_ok());
        assert!(check_quota(10, 8, "k", "vvvvvvvvv", 10).is_err());
    }
}
