//! `casebook` - A local record manager for suspect case files
//!
//! This library provides the core of the record manager: a persistent record
//! store over a key-value backend, change notification across store handles,
//! the filter/search/sort pipeline, JSON import/export, form-side validation
//! and dashboard statistics.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod query;
pub mod record;
pub mod stats;
pub mod storage;
pub mod store;
pub mod validate;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use notify::{ChangeNotifier, ChangeOrigin, StoreChange, StoreWatcher, WatchHandle};
pub use query::{apply, CategoryFilter, Query, SortKey};
pub use record::{Category, Record, Tags};
pub use stats::{Statistics, TimeRange};
pub use storage::{Backend, MemoryBackend, SqliteBackend};
pub use store::{RecordStore, StoreDiagnostics};
pub use validate::RecordDraft;
