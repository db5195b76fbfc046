//! Dashboard statistics over a record list.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::DateTime;
use serde::Serialize;

use crate::record::Record;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Number of entries kept in the top-tag list.
pub const TOP_TAGS: usize = 10;

/// Number of day buckets kept in the timeline.
pub const TIMELINE_DAYS: usize = 30;

/// Number of records in the recent-activity list.
pub const RECENT_RECORDS: usize = 5;

/// Label for records without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Window of creation times the statistics cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    /// Every record.
    #[default]
    All,
    /// Records created in the last 30 days.
    Month,
    /// Records created in the last 7 days.
    Week,
}

impl TimeRange {
    fn max_age_ms(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Month => Some(30 * DAY_MS),
            Self::Week => Some(7 * DAY_MS),
        }
    }

    /// Whether a record falls inside the window ending at `now_millis`.
    ///
    /// Records without a creation time count as created at the epoch.
    #[must_use]
    pub fn contains(self, record: &Record, now_millis: i64) -> bool {
        let age = now_millis.saturating_sub(record.created_at_or_epoch());
        self.max_age_ms().map_or(true, |max| age <= max)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Month => write!(f, "month"),
            Self::Week => write!(f, "week"),
        }
    }
}

/// A label with its number of occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    /// Category, tag or day label.
    pub name: String,
    /// Occurrences.
    pub count: usize,
}

impl Count {
    fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Aggregate figures for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    /// Window the figures cover.
    pub range: TimeRange,
    /// Records inside the window.
    pub total: usize,
    /// Records per category, most common first.
    pub categories: Vec<Count>,
    /// Number of distinct tags in use.
    pub distinct_tags: usize,
    /// Most used tags, most common first.
    pub top_tags: Vec<Count>,
    /// Records created per UTC day, oldest day first.
    pub timeline: Vec<Count>,
    /// Most recently created records.
    pub recent: Vec<Record>,
}

impl Statistics {
    /// Compute statistics for the records created inside `range` as of
    /// `now_millis`.
    #[must_use]
    pub fn compute(records: &[Record], range: TimeRange, now_millis: i64) -> Self {
        let selected: Vec<&Record> = records
            .iter()
            .filter(|r| range.contains(r, now_millis))
            .collect();

        let mut tags = tag_counts(&selected);
        let distinct_tags = tags.len();
        tags.truncate(TOP_TAGS);

        Self {
            range,
            total: selected.len(),
            categories: category_counts(&selected),
            distinct_tags,
            top_tags: tags,
            timeline: timeline(&selected),
            recent: recent(&selected),
        }
    }
}

fn category_counts(records: &[&Record]) -> Vec<Count> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        let label = record.category.as_ref().map_or(UNCATEGORIZED, |c| c.label());
        *counts.entry(label).or_default() += 1;
    }

    let mut result: Vec<Count> = counts
        .into_iter()
        .map(|(name, count)| Count::new(name, count))
        .collect();
    result.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    result
}

/// Tag counts, most common first; ties keep first-seen order.
fn tag_counts(records: &[&Record]) -> Vec<Count> {
    let mut result: Vec<Count> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for tag in records.iter().flat_map(|r| r.tags.iter()) {
        if let Some(&i) = index.get(tag) {
            result[i].count += 1;
        } else {
            index.insert(tag, result.len());
            result.push(Count::new(tag, 1));
        }
    }
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

fn timeline(records: &[&Record]) -> Vec<Count> {
    let mut days: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        let Some(millis) = record.created_at.filter(|&ms| ms != 0) else {
            continue;
        };
        let Some(time) = DateTime::from_timestamp_millis(millis) else {
            continue;
        };
        *days.entry(time.format("%Y-%m-%d").to_string()).or_default() += 1;
    }

    let skip = days.len().saturating_sub(TIMELINE_DAYS);
    days.into_iter()
        .skip(skip)
        .map(|(day, count)| Count::new(day, count))
        .collect()
}

fn recent(records: &[&Record]) -> Vec<Record> {
    let mut sorted: Vec<&Record> = records.to_vec();
    sorted.sort_by_key(|r| std::cmp::Reverse(r.created_at_or_epoch()));
    sorted.into_iter().take(RECENT_RECORDS).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Category;

    const NOW: i64 = 1_700_000_000_000;

    fn record(id: &str, created_at: i64) -> Record {
        Record::new(id, format!("Name {id}"), "555", "x").with_created_at(created_at)
    }

    #[test]
    fn test_time_range_filter() {
        let records = vec![
            record("today", NOW),
            record("10d", NOW - 10 * DAY_MS),
            record("40d", NOW - 40 * DAY_MS),
            Record::new("undated", "U", "1", "x"),
        ];

        assert_eq!(Statistics::compute(&records, TimeRange::All, NOW).total, 4);
        assert_eq!(Statistics::compute(&records, TimeRange::Month, NOW).total, 2);
        assert_eq!(Statistics::compute(&records, TimeRange::Week, NOW).total, 1);
    }

    #[test]
    fn test_week_boundary_is_inclusive() {
        let records = vec![record("edge", NOW - 7 * DAY_MS)];
        assert_eq!(Statistics::compute(&records, TimeRange::Week, NOW).total, 1);
    }

    #[test]
    fn test_category_distribution() {
        let records = vec![
            record("1", NOW).with_category(Category::Theft),
            record("2", NOW).with_category(Category::Theft),
            record("3", NOW).with_category(Category::Fraud),
            record("4", NOW),
        ];

        let stats = Statistics::compute(&records, TimeRange::All, NOW);
        assert_eq!(
            stats.categories,
            [
                Count::new("Theft", 2),
                Count::new("Fraud", 1),
                Count::new("Uncategorized", 1),
            ]
        );
    }

    #[test]
    fn test_top_tags_capped_at_ten() {
        let mut records = Vec::new();
        for i in 0..12 {
            let tags = [format!("tag{i}"), "common".to_string()];
            records.push(record(&i.to_string(), NOW).with_tags(tags));
        }

        let stats = Statistics::compute(&records, TimeRange::All, NOW);
        assert_eq!(stats.distinct_tags, 13);
        assert_eq!(stats.top_tags.len(), TOP_TAGS);
        assert_eq!(stats.top_tags[0], Count::new("common", 12));
        assert_eq!(stats.top_tags[1], Count::new("tag0", 1));
    }

    #[test]
    fn test_timeline_buckets_by_utc_day() {
        let day = 19_675 * DAY_MS; // 2023-11-14T00:00:00Z
        let records = vec![
            record("1", day + 1000),
            record("2", day + 5000),
            record("3", day - 1000),
            Record::new("4", "Undated", "1", "x"),
        ];

        let stats = Statistics::compute(&records, TimeRange::All, NOW);
        assert_eq!(
            stats.timeline,
            [Count::new("2023-11-13", 1), Count::new("2023-11-14", 2)]
        );
    }

    #[test]
    fn test_timeline_keeps_last_thirty_days() {
        let records: Vec<Record> = (0..40)
            .map(|i| record(&i.to_string(), i * DAY_MS + 1))
            .collect();

        let stats = Statistics::compute(&records, TimeRange::All, NOW);
        assert_eq!(stats.timeline.len(), TIMELINE_DAYS);
        assert_eq!(stats.timeline[0].name, "1970-01-11");
        assert_eq!(stats.timeline[29].name, "1970-02-09");
    }

    #[test]
    fn test_recent_records() {
        let records: Vec<Record> = (1..=7).map(|i| record(&i.to_string(), i * 100)).collect();

        let stats = Statistics::compute(&records, TimeRange::All, NOW);
        let ids: Vec<_> = stats.recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["7", "6", "5", "4", "3"]);
    }

    #[test]
    fn test_empty_input() {
        let stats = Statistics::compute(&[], TimeRange::Month, NOW);
        assert_eq!(stats.total, 0);
        assert!(stats.categories.is_empty());
        assert!(stats.top_tags.is_empty());
        assert!(stats.timeline.is_empty());
        assert!(stats.recent.is_empty());
    }

    #[test]
    fn test_time_range_display() {
        assert_eq!(TimeRange::Month.to_string(), "month");
        assert_eq!(TimeRange::Week.to_string(), "week");
    }

    #[test]
    fn test_extreme_created_at_does_not_overflow() {
        let records = vec![record("ancient", i64::MIN), record("future", i64::MAX)];

        let week = Statistics::compute(&records, TimeRange::Week, NOW);
        let ids: Vec<_> = week.recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["future"]);
        assert_eq!(Statistics::compute(&records, TimeRange::All, NOW).total, 2);
    }
}
