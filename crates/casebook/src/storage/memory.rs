//! In-process slot storage.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{check_quota, entry_bytes, Backend, DEFAULT_QUOTA_BYTES};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct MemoryState {
    slots: BTreeMap<String, String>,
    revision: u64,
}

/// Map-backed storage.
///
/// Clones share the same slots and revision counter, so two record stores
/// built over clones of one `MemoryBackend` behave like two views over the
/// same persisted state.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
    quota_bytes: u64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty backend with the default quota.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }

    /// Replace the byte quota for this handle.
    #[must_use]
    pub fn with_quota(mut self, quota_bytes: u64) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::internal("memory backend lock poisoned"))
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let quota = self.quota_bytes;
        let mut state = self.lock()?;
        let total = state.slots.iter().map(|(k, v)| entry_bytes(k, v)).sum();
        let previous = state.slots.get(key).map_or(0, |v| entry_bytes(key, v));
        check_quota(total, previous, key, value, quota)?;
        state.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.lock()?.slots.remove(key);
        Ok(())
    }

    fn usage_bytes(&self) -> Result<u64> {
        Ok(self
            .lock()?
            .slots
            .iter()
            .map(|(k, v)| entry_bytes(k, v))
            .sum())
    }

    fn revision(&self) -> Result<u64> {
        Ok(self.lock()?.revision)
    }

    fn bump_revision(&mut self) -> Result<u64> {
        let mut state = self.lock()?;
        state.revision += 1;
        Ok(state.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let mut backend = MemoryBackend::new();
        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));
        backend.remove("k").unwrap();
        assert!(backend.get("k").unwrap().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let mut first = MemoryBackend::new();
        let second = first.clone();

        first.set("convicts", "[]").unwrap();
        first.bump_revision().unwrap();

        assert_eq!(second.get("convicts").unwrap().as_deref(), Some("[]"));
        assert_eq!(second.revision().unwrap(), 1);
    }

    #[test]
    fn test_quota_enforced() {
        let mut backend = MemoryBackend::new().with_quota(10);
        backend.set("k", "123456789").unwrap();
        let err = backend.set("j", "1").unwrap_err();
        assert!(err.is_capacity());
        assert_eq!(backend.usage_bytes().unwrap(), 10);
    }

    #[test]
    fn test_replacing_value_within_quota() {
        let mut backend = MemoryBackend::new().with_quota(10);
        backend.set("k", "123456789").unwrap();
        backend.set("k", "987654321").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("987654321"));
    }
}
