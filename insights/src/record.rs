//! Violation records and the record-source seam
//!
//! The core never creates, edits or deletes records. It reads an immutable
//! snapshot per run, fetched through [`RecordSource`].

use crate::errors::Result;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// One reported incident
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub id: String,
    /// Human-facing entry number, e.g. `VR-2024-00017`
    pub entry_number: String,
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub event_time: Option<NaiveTime>,
    pub event_year: i32,
    pub province_id: String,
    #[serde(default)]
    pub district_id: Option<String>,
    pub category_id: String,
    #[serde(default)]
    pub sub_category_id: Option<String>,
    #[serde(default)]
    pub indicator_id: Option<String>,
    pub status_id: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ViolationRecord {
    /// Month of the event date (1-12), independent of year
    pub fn event_month(&self) -> u32 {
        self.event_date.month()
    }

    /// Minimal record for unit tests; every reference is left for the caller to set.
    #[cfg(test)]
    pub(crate) fn sample(id: &str, event_date: NaiveDate) -> Self {
        let ts = DateTime::<Utc>::from_timestamp(0, 0).unwrap_or_default();
        Self {
            id: id.to_string(),
            entry_number: format!("VR-{}-{id}", event_date.year()),
            title: format!("Incident {id}"),
            event_date,
            event_time: None,
            event_year: event_date.year(),
            province_id: "punjab".to_string(),
            district_id: None,
            category_id: "physical_attacks".to_string(),
            sub_category_id: None,
            indicator_id: None,
            status_id: "reported".to_string(),
            description: String::new(),
            created_at: ts,
            updated_at: ts,
        }
    }
}

/// Editable part of a record: everything except identity and timestamps
///
/// Edits are full replacements, so the same draft type feeds both create and
/// replace in the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub title: String,
    pub event_date: NaiveDate,
    #[serde(default)]
    pub event_time: Option<NaiveTime>,
    pub province_id: String,
    #[serde(default)]
    pub district_id: Option<String>,
    pub category_id: String,
    #[serde(default)]
    pub sub_category_id: Option<String>,
    #[serde(default)]
    pub indicator_id: Option<String>,
    pub status_id: String,
    #[serde(default)]
    pub description: String,
}

impl RecordDraft {
    /// Materialize the draft with identity and timestamps
    pub fn into_record(
        self,
        id: String,
        entry_number: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> ViolationRecord {
        ViolationRecord {
            id,
            entry_number,
            event_year: self.event_date.year(),
            title: self.title,
            event_date: self.event_date,
            event_time: self.event_time,
            province_id: self.province_id,
            district_id: self.district_id,
            category_id: self.category_id,
            sub_category_id: self.sub_category_id,
            indicator_id: self.indicator_id,
            status_id: self.status_id,
            description: self.description,
            created_at,
            updated_at,
        }
    }
}

impl From<&ViolationRecord> for RecordDraft {
    fn from(record: &ViolationRecord) -> Self {
        Self {
            title: record.title.clone(),
            event_date: record.event_date,
            event_time: record.event_time,
            province_id: record.province_id.clone(),
            district_id: record.district_id.clone(),
            category_id: record.category_id.clone(),
            sub_category_id: record.sub_category_id.clone(),
            indicator_id: record.indicator_id.clone(),
            status_id: record.status_id.clone(),
            description: record.description.clone(),
        }
    }
}

/// Collaborator query: optional province plus an inclusive date range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQuery {
    pub province_id: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RecordQuery {
    pub fn matches(&self, record: &ViolationRecord) -> bool {
        if let Some(province) = &self.province_id
            && record.province_id != *province
        {
            return false;
        }
        if let Some(start) = self.start
            && record.event_date < start
        {
            return false;
        }
        if let Some(end) = self.end
            && record.event_date > end
        {
            return false;
        }
        true
    }
}

/// Source of the record snapshot handed to each pipeline run
pub trait RecordSource {
    /// All records matching `query`; the default query returns everything
    fn query(&self, query: &RecordQuery) -> Result<Vec<ViolationRecord>>;
}

impl RecordSource for [ViolationRecord] {
    fn query(&self, query: &RecordQuery) -> Result<Vec<ViolationRecord>> {
        Ok(self.iter().filter(|r| query.matches(r)).cloned().collect())
    }
}

impl RecordSource for Vec<ViolationRecord> {
    fn query(&self, query: &RecordQuery) -> Result<Vec<ViolationRecord>> {
        self.as_slice().query(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_draft_derives_event_year() {
        let record = ViolationRecord::sample("a", date(2023, 12, 31));
        let mut draft = RecordDraft::from(&record);
        draft.event_date = date(2025, 1, 2);

        let ts = record.created_at;
        let rebuilt = draft.into_record("b".into(), "VR-2025-00001".into(), ts, ts);
        assert_eq!(rebuilt.event_year, 2025);
        assert_eq!(rebuilt.event_month(), 1);
    }

    #[test]
    fn test_slice_source_applies_inclusive_range() {
        let mut records = vec![
            ViolationRecord::sample("a", date(2024, 1, 1)),
            ViolationRecord::sample("b", date(2024, 1, 31)),
            ViolationRecord::sample("c", date(2024, 2, 1)),
        ];
        records[2].province_id = "sindh".to_string();

        let query = RecordQuery {
            province_id: None,
            start: Some(date(2024, 1, 1)),
            end: Some(date(2024, 1, 31)),
        };
        let ids: Vec<_> = records
            .query(&query)
            .expect("query")
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        let sindh = RecordQuery {
            province_id: Some("sindh".to_string()),
            ..RecordQuery::default()
        };
        assert_eq!(records.query(&sindh).expect("query").len(), 1);
        assert_eq!(records.query(&RecordQuery::default()).expect("all").len(), 3);
    }
}
