//! Filter, search and sort over an in-memory record list.
//!
//! [`apply`] is pure: it borrows the input, never touches storage and
//! always yields the same output for the same input.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::record::{Category, Record};

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Name, A to Z.
    #[default]
    NameAsc,
    /// Name, Z to A.
    NameDesc,
    /// Oldest first.
    DateAsc,
    /// Newest first.
    DateDesc,
}

impl SortKey {
    /// Identifier used in option lists and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameAsc => "nameAsc",
            Self::NameDesc => "nameDesc",
            Self::DateAsc => "dateAsc",
            Self::DateDesc => "dateDesc",
        }
    }

    fn compare(self, a: &Record, b: &Record) -> Ordering {
        match self {
            Self::NameAsc => compare_names(&a.name, &b.name),
            Self::NameDesc => compare_names(&b.name, &a.name),
            Self::DateAsc => a.created_at_or_epoch().cmp(&b.created_at_or_epoch()),
            Self::DateDesc => b.created_at_or_epoch().cmp(&a.created_at_or_epoch()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category restriction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Keep every record.
    #[default]
    All,
    /// Keep records whose category equals this one exactly.
    Only(Category),
}

impl CategoryFilter {
    /// Whether `record` passes the filter. Uncategorized records only pass
    /// [`CategoryFilter::All`].
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => record.category.as_ref() == Some(category),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(category) => write!(f, "{category}"),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = crate::record::UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

/// A full query: search text, sort key and category filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    /// Free-text search; blank matches everything.
    pub search: String,
    /// Ordering of the result.
    pub sort: SortKey,
    /// Category restriction.
    pub category: CategoryFilter,
}

impl Query {
    /// Create a query that returns every record sorted by name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search text.
    #[must_use]
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Set the sort key.
    #[must_use]
    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Set the category filter.
    #[must_use]
    pub fn category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    /// Run the query over `records`.
    #[must_use]
    pub fn run(&self, records: &[Record]) -> Vec<Record> {
        apply(records, &self.search, self.sort, &self.category)
    }
}

/// Compare two names the way the record list orders them.
///
/// Names are compared case-insensitively first; names that differ only in
/// case put the lowercase form first.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn matches_search(record: &Record, needle: &str) -> bool {
    record.name.to_lowercase().contains(needle)
        || record.phone.contains(needle)
        || record.case_details.to_lowercase().contains(needle)
}

/// Filter by category, then by search text, then sort.
///
/// The search text is trimmed and matched case-insensitively as a substring
/// of name, phone or case details. Records with equal sort keys keep their
/// input order.
#[must_use]
pub fn apply(
    records: &[Record],
    search: &str,
    sort: SortKey,
    category: &CategoryFilter,
) -> Vec<Record> {
    let needle = search.trim().to_lowercase();

    let mut result: Vec<Record> = records
        .iter()
        .filter(|r| category.matches(r))
        .filter(|r| needle.is_empty() || matches_search(r, &needle))
        .cloned()
        .collect();

    result.sort_by(|a, b| sort.compare(a, b));
    result
}
