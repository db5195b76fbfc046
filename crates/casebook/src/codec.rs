//! Import and export of record documents.
//!
//! An export document is the record array as pretty-printed JSON, in store
//! order and without any envelope. Import accepts the same shape and is
//! all-or-nothing: one bad element rejects the whole document and leaves the
//! store untouched.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::Record;
use crate::storage::Backend;
use crate::store::RecordStore;

/// Serialize records as an export document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// File name for an export made on `date`: `convict-records-YYYY-MM-DD.json`.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("convict-records-{}.json", date.format("%Y-%m-%d"))
}

/// Parse and validate an import document.
///
/// # Errors
///
/// Returns [`Error::Format`] if the text is not JSON, is not an array, or
/// has an element that is not an object with non-empty `id`, `name`,
/// `phone` and `caseDetails` strings. The error names the first offending
/// index.
///
/// Fields outside the record model are accepted and dropped, so they do
/// not survive a later export. A `null` tag list reads as no tags.
pub fn import(document: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(document)
        .map_err(|e| Error::format(format!("not valid JSON: {e}")))?;

    let Value::Array(items) = value else {
        return Err(Error::format("expected an array of records"));
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if !has_required_fields(&item) {
            return Err(Error::format_at(index, "missing required fields"));
        }
        let record: Record = serde_json::from_value(item)
            .map_err(|e| Error::format_at(index, format!("malformed record: {e}")))?;
        records.push(record);
    }

    debug!(count = records.len(), "Parsed import document");
    Ok(records)
}

fn has_required_fields(item: &Value) -> bool {
    let Value::Object(fields) = item else {
        return false;
    };
    Record::REQUIRED_FIELDS.iter().all(|name| {
        fields
            .get(*name)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
    })
}

/// Validate `document` and, only if every element passes, replace the
/// store's contents with it.
///
/// Returns the number of imported records.
///
/// # Errors
///
/// Returns [`Error::Format`] for a rejected document (the store is left
/// unchanged) or a storage error from the write.
pub fn import_into<B: Backend>(store: &mut RecordStore<B>, document: &str) -> Result<usize> {
    let records = match import(document) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Rejected import document");
            return Err(e);
        }
    };
    store.replace_all(&records)?;
    info!(count = records.len(), "Imported records");
    Ok(records.len())
}

/// Read an import document from disk.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub async fn read_document(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    debug!(path = %path.display(), "Reading import document");
    Ok(tokio::fs::read_to_string(path).await?)
}

/// Write an export document for `records` into `dir`, named for `date`.
///
/// Creates `dir` if needed and returns the path written.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot
/// be written.
pub async fn write_export(
    dir: impl AsRef<Path>,
    records: &[Record],
    date: NaiveDate,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let path = dir.join(export_file_name(date));
    let document = export(records)?;
    tokio::fs::write(&path, document).await?;

    info!(path = %path.display(), count = records.len(), "Exported records");
    Ok(path)
}
