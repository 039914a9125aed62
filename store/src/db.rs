//! SQLite record store
//!
//! Owns the `violation_records` table. Every write is validated against the
//! taxonomy first; the insights pipeline reads the table through
//! [`RecordSource`].

use crate::errors::{Result, StoreError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use hrdash_insights::{
    InsightsError, RecordDraft, RecordQuery, RecordSource, Taxonomy, ViolationRecord,
};
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use std::path::Path;

/// Embedded schema SQL
const SCHEMA_SQL: &str = include_str!("schema.sql");

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

const RECORD_COLUMNS: &str = "id, entry_number, title, event_date, event_time, event_year, \
     province_id, district_id, category_id, sub_category_id, indicator_id, status_id, \
     description, created_at, updated_at";

/// Record store wrapper
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open the store at `path`, creating the file and schema if needed
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::io(
                    format!("failed to create db directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| StoreError::sqlite(format!("failed to open db at {}", path.display()), e))?;

        Self::apply_schema(&conn)?;

        tracing::debug!(path = %path.display(), "Record store initialized");

        Ok(Self { conn })
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::sqlite("failed to open in-memory db", e))?;

        Self::apply_schema(&conn)?;

        Ok(Self { conn })
    }

    fn apply_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| StoreError::sqlite("failed to apply schema", e))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Validate and insert a new record
    ///
    /// Assigns a fresh id and the next `VR-<year>-<seq>` entry number for the
    /// year of `now`.
    pub fn create(
        &self,
        draft: RecordDraft,
        taxonomy: &Taxonomy,
        now: DateTime<Utc>,
    ) -> Result<ViolationRecord> {
        create_on(&self.conn, draft, taxonomy, now)
    }

    /// Replace every editable field of record `id`
    ///
    /// Id, entry number and `created_at` are preserved.
    pub fn replace(
        &self,
        id: &str,
        draft: RecordDraft,
        taxonomy: &Taxonomy,
        now: DateTime<Utc>,
    ) -> Result<ViolationRecord> {
        let existing = self.get(id)?.ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let record = draft.into_record(existing.id, existing.entry_number, existing.created_at, now);
        validate(&record, taxonomy)?;

        self.conn
            .execute(
                r#"
                UPDATE violation_records
                SET title = ?2, event_date = ?3, event_time = ?4, event_year = ?5,
                    province_id = ?6, district_id = ?7, category_id = ?8,
                    sub_category_id = ?9, indicator_id = ?10, status_id = ?11,
                    description = ?12, updated_at = ?13
                WHERE id = ?1
                "#,
                params![
                    record.id,
                    record.title,
                    format_date(record.event_date),
                    record.event_time.map(format_time),
                    record.event_year,
                    record.province_id,
                    record.district_id,
                    record.category_id,
                    record.sub_category_id,
                    record.indicator_id,
                    record.status_id,
                    record.description,
                    record.updated_at.to_rfc3339(),
                ],
            )
            .map_err(|e| StoreError::sqlite("failed to update record", e))?;

        tracing::debug!(id = %record.id, entry_number = %record.entry_number, "Replaced record");

        Ok(record)
    }

    /// Delete record `id`; returns whether a row was removed
    pub fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM violation_records WHERE id = ?1", params![id])
            .map_err(|e| StoreError::sqlite("failed to delete record", e))?;

        if removed > 0 {
            tracing::debug!(id, "Deleted record");
        }
        Ok(removed > 0)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn get(&self, id: &str) -> Result<Option<ViolationRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM violation_records WHERE id = ?1"),
                params![id],
                record_from_row,
            )
            .optional()
            .map_err(|e| StoreError::sqlite("failed to get record", e))
    }

    /// Look a record up by id or by entry number
    pub fn find(&self, key: &str) -> Result<Option<ViolationRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM violation_records \
                     WHERE id = ?1 OR entry_number = ?1 LIMIT 1"
                ),
                params![key.trim()],
                record_from_row,
            )
            .optional()
            .map_err(|e| StoreError::sqlite("failed to find record", e))
    }

    /// Records matching `query`, newest event first
    pub fn query(&self, query: &RecordQuery) -> Result<Vec<ViolationRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                r#"
                SELECT {RECORD_COLUMNS}
                FROM violation_records
                WHERE (?1 IS NULL OR province_id = ?1)
                  AND (?2 IS NULL OR event_date >= ?2)
                  AND (?3 IS NULL OR event_date <= ?3)
                ORDER BY event_date DESC, entry_number DESC
                "#
            ))
            .map_err(|e| StoreError::sqlite("failed to prepare query", e))?;

        let rows = stmt
            .query_map(
                params![
                    query.province_id,
                    query.start.map(format_date),
                    query.end.map(format_date),
                ],
                record_from_row,
            )
            .map_err(|e| StoreError::sqlite("failed to query records", e))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| StoreError::sqlite("failed to read record row", e))
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM violation_records", [], |row| row.get(0))
            .map_err(|e| StoreError::sqlite("failed to count records", e))?;
        Ok(count as usize)
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RecordSource for RecordStore {
    fn query(&self, query: &RecordQuery) -> hrdash_insights::Result<Vec<ViolationRecord>> {
        RecordStore::query(self, query).map_err(InsightsError::from)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared helpers (also used inside import transactions)
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn create_on(
    conn: &Connection,
    draft: RecordDraft,
    taxonomy: &Taxonomy,
    now: DateTime<Utc>,
) -> Result<ViolationRecord> {
    let entry_number = next_entry_number(conn, now.year())?;
    let id = uuid::Uuid::new_v4().to_string();
    let record = draft.into_record(id, entry_number, now, now);
    validate(&record, taxonomy)?;

    conn.execute(
        &format!(
            "INSERT INTO violation_records ({RECORD_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            record.id,
            record.entry_number,
            record.title,
            format_date(record.event_date),
            record.event_time.map(format_time),
            record.event_year,
            record.province_id,
            record.district_id,
            record.category_id,
            record.sub_category_id,
            record.indicator_id,
            record.status_id,
            record.description,
            record.created_at.to_rfc3339(),
            record.updated_at.to_rfc3339(),
        ],
    )
    .map_err(|e| {
        if is_entry_number_conflict(&e) {
            StoreError::DuplicateEntryNumber {
                entry_number: record.entry_number.clone(),
            }
        } else {
            StoreError::sqlite("failed to insert record", e)
        }
    })?;

    tracing::debug!(id = %record.id, entry_number = %record.entry_number, "Created record");

    Ok(record)
}

/// Reject blank titles and references the taxonomy does not know
fn validate(record: &ViolationRecord, taxonomy: &Taxonomy) -> Result<()> {
    if record.title.trim().is_empty() {
        return Err(StoreError::invalid("title", "must not be empty"));
    }

    match taxonomy.check_record(record).into_iter().next() {
        Some(issue) => Err(StoreError::invalid(issue.field, issue.to_string())),
        None => Ok(()),
    }
}

/// Next `VR-<year>-<seq:05>` for `year`; sequences restart each year
fn next_entry_number(conn: &Connection, year: i32) -> Result<String> {
    let prefix = format!("VR-{year}-");
    let last: Option<i64> = conn
        .query_row(
            r#"
            SELECT MAX(CAST(substr(entry_number, ?2) AS INTEGER))
            FROM violation_records
            WHERE entry_number LIKE ?1 || '%'
            "#,
            params![prefix, prefix.len() as i64 + 1],
            |row| row.get(0),
        )
        .map_err(|e| StoreError::sqlite("failed to read entry number sequence", e))?;

    Ok(format!("{prefix}{:05}", last.unwrap_or(0) + 1))
}

fn is_entry_number_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == ErrorCode::ConstraintViolation && msg.contains("entry_number")
    )
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ViolationRecord> {
    let date_at = |index: usize| -> rusqlite::Result<NaiveDate> {
        let raw: String = row.get(index)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| conversion_error(index, e))
    };
    let time_at = |index: usize| -> rusqlite::Result<Option<NaiveTime>> {
        row.get::<_, Option<String>>(index)?
            .map(|raw| {
                NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(|e| conversion_error(index, e))
            })
            .transpose()
    };
    let timestamp_at = |index: usize| -> rusqlite::Result<DateTime<Utc>> {
        let raw: String = row.get(index)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(index, e))
    };

    Ok(ViolationRecord {
        id: row.get(0)?,
        entry_number: row.get(1)?,
        title: row.get(2)?,
        event_date: date_at(3)?,
        event_time: time_at(4)?,
        event_year: row.get(5)?,
        province_id: row.get(6)?,
        district_id: row.get(7)?,
        category_id: row.get(8)?,
        sub_category_id: row.get(9)?,
        indicator_id: row.get(10)?,
        status_id: row.get(11)?,
        description: row.get(12)?,
        created_at: timestamp_at(13)?,
        updated_at: timestamp_at(14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).single().expect("now")
    }

    fn draft(title: &str) -> RecordDraft {
        RecordDraft {
            title: title.to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 2, 10).expect("date"),
            event_time: NaiveTime::from_hms_opt(14, 30, 0),
            province_id: "punjab".to_string(),
            district_id: Some("lahore".to_string()),
            category_id: "women_hrds".to_string(),
            sub_category_id: Some("gbv".to_string()),
            indicator_id: Some("rape".to_string()),
            status_id: "reported".to_string(),
            description: "details".to_string(),
        }
    }

    #[test]
    fn test_entry_numbers_are_sequential_per_year() {
        let store = RecordStore::open_in_memory().expect("store");
        let t = Taxonomy::builtin();

        let a = store.create(draft("a"), &t, now()).expect("a");
        let b = store.create(draft("b"), &t, now()).expect("b");
        let next_year = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).single().expect("ts");
        let c = store.create(draft("c"), &t, next_year).expect("c");

        assert_eq!(a.entry_number, "VR-2024-00001");
        assert_eq!(b.entry_number, "VR-2024-00002");
        assert_eq!(c.entry_number, "VR-2025-00001");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_round_trip_through_sqlite() {
        let store = RecordStore::open_in_memory().expect("store");
        let t = Taxonomy::builtin();

        let created = store.create(draft("a"), &t, now()).expect("create");
        let loaded = store.get(&created.id).expect("get").expect("present");
        assert_eq!(loaded, created);
        assert_eq!(loaded.event_year, 2024);
        assert_eq!(
            store.find("VR-2024-00001").expect("find").map(|r| r.id),
            Some(created.id)
        );
    }

    #[test]
    fn test_rejects_unknown_references() {
        let store = RecordStore::open_in_memory().expect("store");
        let t = Taxonomy::builtin();

        let mut bad = draft("a");
        bad.district_id = Some("karachi".to_string());
        let err = store.create(bad, &t, now()).expect_err("district outside province");
        assert!(matches!(err, StoreError::InvalidRecord { ref field, .. } if field == "district"));

        let err = store.create(draft("  "), &t, now()).expect_err("blank title");
        assert!(matches!(err, StoreError::InvalidRecord { ref field, .. } if field == "title"));

        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn test_replace_preserves_identity() {
        let store = RecordStore::open_in_memory().expect("store");
        let t = Taxonomy::builtin();
        let created = store.create(draft("a"), &t, now()).expect("create");

        let mut edit = draft("renamed");
        edit.status_id = "resolved".to_string();
        edit.event_date = NaiveDate::from_ymd_opt(2023, 11, 5).expect("date");
        let later = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).single().expect("ts");
        let replaced = store.replace(&created.id, edit, &t, later).expect("replace");

        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.entry_number, created.entry_number);
        assert_eq!(replaced.created_at, created.created_at);
        assert_eq!(replaced.updated_at, later);
        assert_eq!(replaced.event_year, 2023);
        assert_eq!(store.get(&created.id).expect("get"), Some(replaced));

        let missing = store.replace("nope", draft("x"), &t, later);
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_delete() {
        let store = RecordStore::open_in_memory().expect("store");
        let t = Taxonomy::builtin();
        let created = store.create(draft("a"), &t, now()).expect("create");

        assert!(store.delete(&created.id).expect("delete"));
        assert!(!store.delete(&created.id).expect("delete again"));
        assert_eq!(store.count().expect("count"), 0);
    }
}
