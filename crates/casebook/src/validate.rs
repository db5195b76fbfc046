//! Form-side validation of records.
//!
//! A [`RecordDraft`] is what an add or edit form holds: every record field
//! except the id. Submitting a draft checks it, trims its text fields and
//! turns it into a [`Record`] ready for the store.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::{Category, Record, Tags};

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+-]+$").expect("valid phone regex"));

/// Whether `phone` uses only digits, `+` and `-`.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Editable record contents, without an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    /// Full name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Free-text case details.
    pub case_details: String,
    /// Embedded photo as a data URI.
    pub image: Option<String>,
    /// Case category.
    pub category: Option<Category>,
    /// Tags in entry order.
    pub tags: Tags,
    /// Creation time in epoch milliseconds.
    pub created_at: Option<i64>,
}

impl RecordDraft {
    /// Create a draft with the required text fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        case_details: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            case_details: case_details.into(),
            ..Self::default()
        }
    }

    /// Seed an edit form from a stored record.
    #[must_use]
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            phone: record.phone.clone(),
            case_details: record.case_details.clone(),
            image: record.image.clone(),
            category: record.category.clone(),
            tags: record.tags.clone(),
            created_at: record.created_at,
        }
    }

    /// Add a tag from user input.
    ///
    /// Blank and duplicate tags are ignored; returns whether the tag was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        self.tags.add(tag)
    }

    /// Remove a tag; returns whether it was present.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Check the draft, collecting every violation.
    ///
    /// Whitespace-only text counts as missing. A phone that is present but
    /// uses characters other than digits, `+` and `-` is reported as
    /// `invalid phone`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming each offending field.
    pub fn validate(&self) -> Result<()> {
        let mut fields = Vec::new();

        if self.name.trim().is_empty() {
            fields.push("name");
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            fields.push("phone");
        } else if !is_valid_phone(phone) {
            fields.push("invalid phone");
        }

        if self.case_details.trim().is_empty() {
            fields.push("case details");
        }

        if fields.is_empty() {
            Ok(())
        } else {
            debug!(?fields, "Draft failed validation");
            Err(Error::validation(fields))
        }
    }

    /// Build the record for `id` as-is, with text fields trimmed.
    #[must_use]
    pub fn into_record(self, id: impl Into<String>) -> Record {
        Record {
            id: id.into(),
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            case_details: self.case_details.trim().to_string(),
            image: self.image,
            category: self.category,
            tags: self.tags,
            created_at: self.created_at,
        }
    }

    /// Validate a first submission and build the new record.
    ///
    /// `createdAt` is stamped with `now_millis` unless the draft already
    /// carries one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the draft is invalid.
    pub fn submit_new_at(mut self, id: impl Into<String>, now_millis: i64) -> Result<Record> {
        self.validate()?;
        if self.created_at.is_none() {
            self.created_at = Some(now_millis);
        }
        Ok(self.into_record(id))
    }

    /// Validate a first submission, stamping `createdAt` with the current
    /// time if unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the draft is invalid.
    pub fn submit_new(self, id: impl Into<String>) -> Result<Record> {
        self.submit_new_at(id, Utc::now().timestamp_millis())
    }

    /// Validate an edit of the record with `id`.
    ///
    /// `createdAt` is carried through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the draft is invalid.
    pub fn submit_edit(self, id: impl Into<String>) -> Result<Record> {
        self.validate()?;
        Ok(self.into_record(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(err: Error) -> Vec<String> {
        match err {
            Error::Validation { fields } => fields,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_valid_draft() {
        let draft = RecordDraft::new("Ada", "+1-555-0100", "forgery");
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_collects_every_missing_field() {
        let err = RecordDraft::new("", "", "").validate().unwrap_err();
        assert_eq!(err.to_string(), "Missing or invalid fields: name, phone, case details");
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let err = RecordDraft::new("  ", "555", "\n").validate().unwrap_err();
        assert_eq!(fields(err), ["name", "case details"]);
    }

    #[test]
    fn test_invalid_phone() {
        let err = RecordDraft::new("Ada", "555 0100", "x").validate().unwrap_err();
        assert_eq!(fields(err), ["invalid phone"]);

        let err = RecordDraft::new("", "call me", "").validate().unwrap_err();
        assert_eq!(fields(err), ["name", "invalid phone", "case details"]);
    }

    #[test]
    fn test_phone_pattern() {
        assert!(is_valid_phone("0123456789"));
        assert!(is_valid_phone("+44-20-7946"));
        assert!(!is_valid_phone("555.0100"));
        assert!(!is_valid_phone("(555)"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_submit_new_stamps_created_at() {
        let record = RecordDraft::new(" Ada ", "555", " forgery ")
            .submit_new_at("id-1", 1_000)
            .unwrap();

        assert_eq!(record.id, "id-1");
        assert_eq!(record.name, "Ada");
        assert_eq!(record.case_details, "forgery");
        assert_eq!(record.created_at, Some(1_000));
    }

    #[test]
    fn test_submit_new_keeps_existing_created_at() {
        let mut draft = RecordDraft::new("Ada", "555", "x");
        draft.created_at = Some(42);
        let record = draft.submit_new_at("1", 1_000).unwrap();
        assert_eq!(record.created_at, Some(42));
    }

    #[test]
    fn test_submit_new_uses_clock() {
        let before = Utc::now().timestamp_millis();
        let record = RecordDraft::new("Ada", "555", "x").submit_new("1").unwrap();
        assert!(record.created_at.unwrap() >= before);
    }

    #[test]
    fn test_submit_edit_leaves_created_at() {
        let stored = Record::new("1", "Ada", "555", "x").with_created_at(7);
        let mut draft = RecordDraft::from_record(&stored);
        draft.name = "Ada L.".to_string();

        let record = draft.submit_edit("1").unwrap();
        assert_eq!(record.created_at, Some(7));
        assert_eq!(record.name, "Ada L.");

        let legacy = Record::new("2", "Bob", "555", "x");
        let record = RecordDraft::from_record(&legacy).submit_edit("2").unwrap();
        assert_eq!(record.created_at, None);
    }

    #[test]
    fn test_invalid_draft_is_not_submitted() {
        let err = RecordDraft::new("Ada", "", "x").submit_new_at("1", 0).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_tag_entry() {
        let mut draft = RecordDraft::new("Ada", "555", "x");
        assert!(draft.add_tag("repeat"));
        assert!(!draft.add_tag(" repeat "));
        assert!(!draft.add_tag(""));
        assert!(draft.add_tag("armed"));
        assert!(draft.remove_tag("repeat"));

        let record = draft.submit_new_at("1", 0).unwrap();
        assert_eq!(record.tags.iter().collect::<Vec<_>>(), ["armed"]);
    }

    #[test]
    fn test_from_record_roundtrip() {
        let stored = Record::new("1", "Ada", "555", "x")
            .with_category(Category::Theft)
            .with_tags(["a"])
            .with_image("data:,x")
            .with_created_at(3);
        let record = RecordDraft::from_record(&stored).submit_edit("1").unwrap();
        assert_eq!(record, stored);
    }
}
