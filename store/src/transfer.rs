//! JSON import and export
//!
//! Import accepts an array of rows whose taxonomy references may be given as
//! ids or display names (`"Punjab"`, `"punjab"`). Everything is resolved to
//! ids before validation. Exported records re-import cleanly: the `_id`
//! field names are accepted as aliases and extra fields are ignored.

use crate::db::{RecordStore, create_on};
use crate::errors::{Result, StoreError};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hrdash_insights::{RecordDraft, RecordQuery, Taxonomy, ViolationRecord};
use serde::Deserialize;
use std::io::{Read, Write};

#[derive(Debug, Clone, Deserialize)]
struct ImportRow {
    title: String,
    event_date: NaiveDate,
    #[serde(default)]
    event_time: Option<NaiveTime>,
    #[serde(alias = "province_id")]
    province: String,
    #[serde(default, alias = "district_id")]
    district: Option<String>,
    #[serde(alias = "category_id")]
    category: String,
    #[serde(default, alias = "sub_category_id")]
    sub_category: Option<String>,
    #[serde(default, alias = "indicator_id")]
    indicator: Option<String>,
    #[serde(alias = "status_id")]
    status: String,
    #[serde(default)]
    description: String,
}

impl ImportRow {
    /// Resolve names to ids; unresolvable values pass through so validation
    /// reports them against the right field
    fn into_draft(self, taxonomy: &Taxonomy) -> RecordDraft {
        let pick = |resolved: Option<&str>, raw: &str| {
            resolved.map(str::to_string).unwrap_or_else(|| raw.trim().to_string())
        };

        let province_id = pick(taxonomy.resolve_province(&self.province), &self.province);
        let category_id = pick(taxonomy.resolve_category(&self.category), &self.category);
        let district_id = self
            .district
            .filter(|d| !d.trim().is_empty())
            .map(|d| pick(taxonomy.resolve_district(&province_id, &d), &d));
        let sub_category_id = self
            .sub_category
            .filter(|s| !s.trim().is_empty())
            .map(|s| pick(taxonomy.resolve_sub_category(&category_id, &s), &s));
        let indicator_id = self.indicator.filter(|i| !i.trim().is_empty()).map(|i| {
            let resolved = sub_category_id
                .as_deref()
                .and_then(|sub| taxonomy.resolve_indicator(&category_id, sub, &i));
            pick(resolved, &i)
        });

        RecordDraft {
            title: self.title.trim().to_string(),
            event_date: self.event_date,
            event_time: self.event_time,
            status_id: pick(taxonomy.resolve_status(&self.status), &self.status),
            province_id,
            district_id,
            category_id,
            sub_category_id,
            indicator_id,
            description: self.description,
        }
    }
}

impl RecordStore {
    /// Import a JSON array of records in one transaction
    ///
    /// Any invalid row aborts the whole import; the error names the row.
    pub fn import_json<R: Read>(
        &self,
        reader: R,
        taxonomy: &Taxonomy,
        now: DateTime<Utc>,
    ) -> Result<Vec<ViolationRecord>> {
        let rows: Vec<ImportRow> = serde_json::from_reader(reader)
            .map_err(|e| StoreError::json("failed to parse import file", e))?;

        let tx = self
            .connection()
            .unchecked_transaction()
            .map_err(|e| StoreError::sqlite("failed to begin import", e))?;

        let mut created = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let draft = row.into_draft(taxonomy);
            let record = create_on(&tx, draft, taxonomy, now).map_err(|e| match e {
                StoreError::InvalidRecord { field, reason } => StoreError::InvalidRecord {
                    field: format!("[{index}].{field}"),
                    reason,
                },
                other => other,
            })?;
            created.push(record);
        }

        tx.commit()
            .map_err(|e| StoreError::sqlite("failed to commit import", e))?;

        tracing::info!(imported = created.len(), "Imported records");
        Ok(created)
    }

    /// Write every record as a pretty-printed JSON array and flush the
    /// writer; returns the count
    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let records = self.query(&RecordQuery::default())?;
        serde_json::to_writer_pretty(&mut writer, &records)
            .map_err(|e| StoreError::json("failed to write export", e))?;
        writer
            .flush()
            .map_err(|e| StoreError::io("failed to flush export", e))?;
        Ok(records.len())
    }
}
