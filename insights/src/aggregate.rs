//! Taxonomy-complete aggregation
//!
//! [`aggregate`] counts the records matching a predicate into one bucket per
//! taxonomy entry of the requested [`Dimension`]. Buckets are emitted in
//! taxonomy order and zero-filled; records whose reference for the dimension
//! does not resolve are dropped and reported in [`Aggregation::unresolved`].
//! Records outside an event-month window are not part of the dimension at all
//! and are neither matched nor unresolved.

use crate::record::ViolationRecord;
use crate::scope::Predicate;
use crate::taxonomy::Taxonomy;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dimension {
    Category,
    /// Indicators of one sub-category. Only records filed under exactly this
    /// category and sub-category are counted.
    Indicator {
        category_id: String,
        sub_category_id: String,
    },
    Province,
    Status,
    /// Calendar months (1-12) in display order; the year is ignored
    EventMonth { months: Vec<u32> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketTally {
    pub id: String,
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Aggregation {
    pub tallies: Vec<BucketTally>,
    /// Records that satisfied the predicate (and any dimension pre-filter)
    pub matched: usize,
    /// Matched records dropped because their reference did not resolve
    pub unresolved: usize,
}

impl Aggregation {
    pub fn total(&self) -> u64 {
        self.tallies.iter().map(|t| t.count).sum()
    }
}

/// Short English month name for a 1-based month number
pub fn month_label(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_LABELS.get(i as usize))
        .copied()
        .unwrap_or("?")
}

/// The `n` calendar months ending with `now`'s month, oldest first.
/// Capped at 12 since buckets are keyed by month alone.
pub fn trailing_months(now: NaiveDate, n: usize) -> Vec<u32> {
    let current = now.month0() as i64;
    let n = n.min(MONTH_LABELS.len()) as i64;
    (0..n)
        .rev()
        .map(|back| ((current - back).rem_euclid(12) + 1) as u32)
        .collect()
}

/// Bucket keys (id, label) for a dimension, in taxonomy order
pub fn bucket_keys(dimension: &Dimension, taxonomy: &Taxonomy) -> Vec<(String, String)> {
    match dimension {
        Dimension::Category => taxonomy
            .categories
            .iter()
            .map(|c| (c.id.clone(), c.name.clone()))
            .collect(),
        Dimension::Indicator {
            category_id,
            sub_category_id,
        } => taxonomy
            .sub_category(category_id, sub_category_id)
            .map(|sub| {
                sub.indicators
                    .iter()
                    .map(|i| (i.id.clone(), i.name.clone()))
                    .collect()
            })
            .unwrap_or_default(),
        Dimension::Province => taxonomy
            .provinces
            .iter()
            .map(|p| (p.id.clone(), p.name.clone()))
            .collect(),
        Dimension::Status => taxonomy
            .statuses
            .iter()
            .map(|s| (s.id.clone(), s.label.clone()))
            .collect(),
        Dimension::EventMonth { months } => months
            .iter()
            .map(|m| (m.to_string(), month_label(*m).to_string()))
            .collect(),
    }
}

/// Count matching records per bucket of `dimension`
pub fn aggregate(
    records: &[ViolationRecord],
    predicate: &Predicate,
    dimension: &Dimension,
    taxonomy: &Taxonomy,
) -> Aggregation {
    let mut tallies: Vec<BucketTally> = bucket_keys(dimension, taxonomy)
        .into_iter()
        .map(|(id, label)| BucketTally {
            id,
            label,
            count: 0,
        })
        .collect();

    let mut matched = 0;
    let mut unresolved = 0;

    for record in records {
        if !in_dimension(record, dimension) || !predicate.matches(record, taxonomy) {
            continue;
        }
        matched += 1;

        let key = bucket_key(record, dimension);
        match key.and_then(|key| tallies.iter_mut().find(|t| t.id == key)) {
            Some(tally) => tally.count += 1,
            None => unresolved += 1,
        }
    }

    if unresolved > 0 {
        tracing::debug!(
            ?dimension,
            unresolved,
            matched,
            "Dropped records with unresolvable references"
        );
    }

    Aggregation {
        tallies,
        matched,
        unresolved,
    }
}

/// Dimension-level pre-filter applied on top of the scope predicate
fn in_dimension(record: &ViolationRecord, dimension: &Dimension) -> bool {
    match dimension {
        Dimension::Indicator {
            category_id,
            sub_category_id,
        } => {
            record.category_id == *category_id
                && record.sub_category_id.as_deref() == Some(sub_category_id.as_str())
        }
        Dimension::EventMonth { months } => months.contains(&record.event_month()),
        _ => true,
    }
}

fn bucket_key(record: &ViolationRecord, dimension: &Dimension) -> Option<String> {
    match dimension {
        Dimension::Category => Some(record.category_id.clone()),
        Dimension::Indicator { .. } => record.indicator_id.clone(),
        Dimension::Province => Some(record.province_id.clone()),
        Dimension::Status => Some(record.status_id.clone()),
        Dimension::EventMonth { .. } => Some(record.event_month().to_string()),
    }
}
