//! The record store.
//!
//! [`RecordStore`] owns the persisted record set. All records live as one
//! JSON array in a single backend slot; every operation reads a fresh
//! snapshot of that slot, and every mutation rewrites it and then signals
//! the store's [`ChangeNotifier`].
//!
//! Reads never fail. An absent, unreadable or malformed slot is treated as
//! an empty store and logged. Writes either succeed, retry once with a
//! reduced payload (the add path, on a quota failure), or return the error.

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{Config, DEFAULT_STORAGE_KEY};
use crate::error::{Error, Result};
use crate::notify::ChangeNotifier;
use crate::record::Record;
use crate::storage::Backend;

/// What the record slot held when it was last read.
#[derive(Debug)]
enum Slot {
    Absent,
    Corrupt(String),
    Records(Vec<Record>),
}

/// Troubleshooting snapshot of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreDiagnostics {
    /// Slot the records live in.
    pub storage_key: String,
    /// Number of readable records.
    pub record_count: usize,
    /// Approximate bytes used by the backend.
    pub storage_bytes: u64,
    /// Id of the first stored record.
    pub first_record_id: Option<String>,
    /// Name of the first stored record.
    pub first_record_name: Option<String>,
    /// Whether the slot exists but could not be parsed.
    pub corrupt: bool,
    /// Shared revision counter.
    pub revision: u64,
}

/// Persistent set of records over a key-value backend.
#[derive(Debug)]
pub struct RecordStore<B: Backend> {
    backend: B,
    key: String,
    notifier: ChangeNotifier,
}

impl<B: Backend> RecordStore<B> {
    /// Create a store over `backend` using the default slot.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    /// Create a store over `backend` using the given slot.
    #[must_use]
    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            notifier: ChangeNotifier::new(),
        }
    }

    /// Create a store with the slot and notification settings from `config`.
    #[must_use]
    pub fn from_config(backend: B, config: &Config) -> Self {
        Self {
            backend,
            key: config.storage.storage_key.clone(),
            notifier: ChangeNotifier::new().with_cross_view(config.notify.cross_view),
        }
    }

    /// Write an empty record array if the slot does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or written.
    pub fn init(&mut self) -> Result<()> {
        if self.backend.get(&self.key)?.is_none() {
            info!(key = %self.key, "Initializing empty record slot");
            self.backend.set(&self.key, "[]")?;
        }
        Ok(())
    }

    /// The slot records are stored under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The backing storage.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The change notifier, for registering listeners.
    pub fn notifier(&mut self) -> &mut ChangeNotifier {
        &mut self.notifier
    }

    fn read_slot(&self) -> Slot {
        let data = match self.backend.get(&self.key) {
            Ok(Some(data)) if !data.is_empty() => data,
            Ok(_) => return Slot::Absent,
            Err(e) => return Slot::Corrupt(format!("storage unreadable: {e}")),
        };
        match serde_json::from_str::<Vec<Record>>(&data) {
            Ok(records) => Slot::Records(records),
            Err(e) => Slot::Corrupt(e.to_string()),
        }
    }

    /// All records in storage order.
    ///
    /// Returns an empty list if the slot is absent, unreadable or malformed.
    #[must_use]
    pub fn get_all(&self) -> Vec<Record> {
        match self.read_slot() {
            Slot::Records(records) => records,
            Slot::Absent => {
                debug!(key = %self.key, "No record slot, treating store as empty");
                Vec::new()
            }
            Slot::Corrupt(reason) => {
                warn!(key = %self.key, %reason, "Record slot is malformed, treating store as empty");
                Vec::new()
            }
        }
    }

    /// The first record with the given id.
    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<Record> {
        self.get_all().into_iter().find(|r| r.id == id)
    }

    /// Number of records.
    #[must_use]
    pub fn count(&self) -> usize {
        self.get_all().len()
    }

    fn write(&mut self, records: &[Record]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.backend.set(&self.key, &json)
    }

    fn changed(&mut self) {
        self.notifier.notify(&mut self.backend);
    }

    /// Insert a record, or overwrite the record with the same id in place.
    ///
    /// If the backend rejects the write for lack of space and the record
    /// carries an image, the image is replaced with an empty payload and the
    /// write is retried once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `id`, `name`, `phone` or
    /// `caseDetails` is empty, [`Error::Capacity`] if the record does not fit
    /// even without its image, or a storage error.
    pub fn add(&mut self, record: Record) -> Result<()> {
        let missing = record.missing_required_fields();
        if !missing.is_empty() {
            error!(?missing, "Rejected record with missing required fields");
            return Err(Error::validation(missing));
        }

        let mut records = self.get_all();
        debug!(count = records.len(), "Current records in storage");

        let index = if let Some(i) = records.iter().position(|r| r.id == record.id) {
            debug!(id = %record.id, "Updating existing record");
            records[i] = record;
            i
        } else {
            debug!(id = %record.id, "Adding new record");
            records.push(record);
            records.len() - 1
        };

        match self.write(&records) {
            Ok(()) => {}
            Err(e) if e.is_capacity() && records[index].has_image() => {
                warn!(id = %records[index].id, error = %e, "Quota exceeded, retrying without image");
                records[index].image = Some(String::new());
                self.write(&records)?;
                info!(id = %records[index].id, "Saved record without image due to storage limits");
            }
            Err(e) => {
                error!(error = %e, "Failed to save record");
                return Err(e);
            }
        }

        info!(count = records.len(), "Saved record");
        self.changed();
        Ok(())
    }

    /// Replace the record with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a required field is empty,
    /// [`Error::NotFound`] if no record has this id (the store is left
    /// unchanged), or a storage error.
    pub fn update(&mut self, record: Record) -> Result<()> {
        let missing = record.missing_required_fields();
        if !missing.is_empty() {
            return Err(Error::validation(missing));
        }

        let mut records = self.get_all();
        let Some(slot) = records.iter_mut().find(|r| r.id == record.id) else {
            warn!(id = %record.id, "Update for unknown record");
            return Err(Error::not_found(record.id));
        };
        *slot = record;

        self.write(&records)?;
        info!("Updated record");
        self.changed();
        Ok(())
    }

    /// Remove the record with the given id.
    ///
    /// Returns whether a record was removed. An unknown id is not an error
    /// and leaves storage untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let mut records = self.get_all();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            debug!(id, "Delete for unknown record, nothing to do");
            return Ok(false);
        }

        self.write(&records)?;
        info!(id, "Deleted record");
        self.changed();
        Ok(true)
    }

    /// Overwrite the whole store with `records`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub fn replace_all(&mut self, records: &[Record]) -> Result<()> {
        self.write(records)?;
        info!(count = records.len(), "Replaced all records");
        self.changed();
        Ok(())
    }

    /// Remove every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub fn clear(&mut self) -> Result<()> {
        self.replace_all(&[])
    }

    /// Gather and log a troubleshooting snapshot.
    ///
    /// Backend failures are folded into the snapshot rather than returned.
    #[must_use]
    pub fn diagnostic_dump(&self) -> StoreDiagnostics {
        let (records, corrupt) = match self.read_slot() {
            Slot::Records(records) => (records, false),
            Slot::Absent => (Vec::new(), false),
            Slot::Corrupt(reason) => {
                warn!(%reason, "Record slot is malformed");
                (Vec::new(), true)
            }
        };
        let first = records.first();

        let diagnostics = StoreDiagnostics {
            storage_key: self.key.clone(),
            record_count: records.len(),
            storage_bytes: self.backend.usage_bytes().unwrap_or(0),
            first_record_id: first.map(|r| r.id.clone()),
            first_record_name: first.map(|r| r.name.clone()),
            corrupt,
            revision: self.backend.revision().unwrap_or(0),
        };

        info!(
            key = %diagnostics.storage_key,
            records = diagnostics.record_count,
            bytes = diagnostics.storage_bytes,
            first_id = diagnostics.first_record_id.as_deref().unwrap_or("-"),
            "Store diagnostics"
        );
        diagnostics
    }
}
