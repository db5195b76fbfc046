//! Core record types for casebook.
//!
//! A [`Record`] is the only persisted entity: one suspect/case entry with
//! contact details, free-text case notes, an optional photo, a category and
//! a list of tags. Field names on the wire are camelCase so that documents
//! exported by earlier versions of the tool import unchanged.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Case category.
///
/// The fixed list is [`Category::ALL`]. Labels outside that list can still
/// appear in persisted or imported documents; they are carried verbatim as
/// [`Category::Unlisted`] so that reading a store never drops a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    /// Theft.
    Theft,
    /// Assault.
    Assault,
    /// Fraud.
    Fraud,
    /// Drug offense.
    DrugOffense,
    /// Homicide.
    Homicide,
    /// Anything else.
    Other,
    /// A label outside the fixed list.
    Unlisted(String),
}

impl Category {
    /// The fixed set of categories, in display order.
    pub const ALL: [Category; 6] = [
        Self::Theft,
        Self::Assault,
        Self::Fraud,
        Self::DrugOffense,
        Self::Homicide,
        Self::Other,
    ];

    /// The label stored on disk and shown to users.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Theft => "Theft",
            Self::Assault => "Assault",
            Self::Fraud => "Fraud",
            Self::DrugOffense => "Drug Offense",
            Self::Homicide => "Homicide",
            Self::Other => "Other",
            Self::Unlisted(label) => label,
        }
    }

    /// Whether this category is one of the fixed set.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        !matches!(self, Self::Unlisted(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Theft" => Self::Theft,
            "Assault" => Self::Assault,
            "Fraud" => Self::Fraud,
            "Drug Offense" => Self::DrugOffense,
            "Homicide" => Self::Homicide,
            "Other" => Self::Other,
            _ => Self::Unlisted(label),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Unlisted(label) => label,
            listed => listed.label().to_string(),
        }
    }
}

/// Error returned when parsing a label that is not in the fixed category list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown category '{}' (expected one of: {})",
            self.0,
            Category::ALL.map(|c| c.label().to_string()).join(", ")
        )
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Parse a user-supplied label. Only the fixed list is accepted; matching
    /// ignores ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Ordered tag list.
///
/// Tags are deduplicated when added through [`Tags::add`]. Documents read
/// from storage or import are taken as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<String>);

impl Tags {
    /// Create an empty tag list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag, trimming surrounding whitespace.
    ///
    /// Returns `false` (and leaves the list unchanged) when the trimmed tag
    /// is empty or already present.
    pub fn add(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    /// Remove a tag. Returns whether it was present.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    /// Whether the list contains the tag exactly.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Iterate tags in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = Self::new();
        for tag in iter {
            tags.add(tag.as_ref());
        }
        tags
    }
}

/// A single suspect/case record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier, supplied by the caller at creation.
    #[serde(default)]
    pub id: String,

    /// Full name.
    #[serde(default)]
    pub name: String,

    /// Phone number (digits, `+` and `-`).
    #[serde(default)]
    pub phone: String,

    /// Free-text case details.
    #[serde(default)]
    pub case_details: String,

    /// Embedded photo as a data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Case category; an empty label on disk means unset.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_label_as_none"
    )]
    pub category: Option<Category>,

    /// Tags in insertion order; `null` on disk reads as no tags.
    #[serde(default, deserialize_with = "null_as_empty_tags")]
    pub tags: Tags,

    /// Creation time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

fn empty_label_as_none<'de, D>(deserializer: D) -> Result<Option<Category>, D::Error>
where
    D: Deserializer<'de>,
{
    let label: Option<String> = Option::deserialize(deserializer)?;
    Ok(label
        .filter(|l| !l.trim().is_empty())
        .map(Category::from))
}

fn null_as_empty_tags<'de, D>(deserializer: D) -> Result<Tags, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Tags>::deserialize(deserializer)?.unwrap_or_default())
}

impl Record {
    /// Wire names of the fields every persisted record must carry.
    pub const REQUIRED_FIELDS: [&'static str; 4] = ["id", "name", "phone", "caseDetails"];

    /// Create a record with the required fields and nothing else.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        phone: impl Into<String>,
        case_details: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            case_details: case_details.into(),
            image: None,
            category: None,
            tags: Tags::new(),
            created_at: None,
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Set the image payload.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the creation timestamp (epoch milliseconds).
    #[must_use]
    pub fn with_created_at(mut self, millis: i64) -> Self {
        self.created_at = Some(millis);
        self
    }

    /// Wire names of required fields that are empty on this record.
    #[must_use]
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let values = [&self.id, &self.name, &self.phone, &self.case_details];
        Self::REQUIRED_FIELDS
            .into_iter()
            .zip(values)
            .filter(|(_, value)| value.is_empty())
            .map(|(field, _)| field)
            .collect()
    }

    /// Whether the record carries a non-empty image payload.
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.is_empty())
    }

    /// Creation time, with a missing value treated as the epoch.
    #[must_use]
    pub fn created_at_or_epoch(&self) -> i64 {
        self.created_at.unwrap_or(0)
    }
}
