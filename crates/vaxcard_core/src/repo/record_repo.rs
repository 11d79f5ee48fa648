//! Dose history store.
//!
//! # Responsibility
//! - Persist and query dose records per person and per (person, vaccine).
//! - Enforce `(person, vaccine, dose)` uniqueness atomically at insert time.
//!
//! # Invariants
//! - Records are never updated; only inserted and deleted.
//! - Queries return records ordered by applied date, then creation time.

use crate::model::dose::DoseLabel;
use crate::model::person::PersonId;
use crate::model::record::{DoseRecord, RecordId};
use crate::model::vaccine::VaccineId;
use crate::repo::{parse_uuid, EntityKind, RepoError, RepoResult};
use chrono::{DateTime, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    person_id,
    vaccine_id,
    dose,
    applied_at,
    lot,
    location,
    created_at
FROM vaccinations";

const RECORD_ORDER_SQL: &str = "ORDER BY applied_at ASC, created_at ASC, id ASC";

const APPLIED_AT_FORMAT: &str = "%Y-%m-%d";

/// History access used by the sequencing validator and card projector.
pub trait HistoryStore {
    fn find_by_person_and_vaccine(
        &self,
        person_id: PersonId,
        vaccine_id: VaccineId,
    ) -> RepoResult<Vec<DoseRecord>>;
    fn find_by_person(&self, person_id: PersonId) -> RepoResult<Vec<DoseRecord>>;
    /// Inserts and returns the stored record.
    ///
    /// Returns `RepoError::ConstraintViolation` when the
    /// `(person, vaccine, dose)` slot is already taken.
    fn insert_record(&self, record: &DoseRecord) -> RepoResult<DoseRecord>;
}

pub trait DoseRecordRepository: HistoryStore {
    fn get_record(&self, id: RecordId) -> RepoResult<Option<DoseRecord>>;
    fn delete_record(&self, id: RecordId) -> RepoResult<()>;
}

#[derive(Clone, Copy)]
pub struct SqliteRecordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_records(&self, filter: &str, args: &[&dyn ToSql]) -> RepoResult<Vec<DoseRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL} WHERE {filter} {RECORD_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query(args)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }
}

impl HistoryStore for SqliteRecordRepository<'_> {
    fn find_by_person_and_vaccine(
        &self,
        person_id: PersonId,
        vaccine_id: VaccineId,
    ) -> RepoResult<Vec<DoseRecord>> {
        self.query_records(
            "person_id = ?1 AND vaccine_id = ?2",
            params![person_id.to_string(), vaccine_id.to_string()],
        )
    }

    fn find_by_person(&self, person_id: PersonId) -> RepoResult<Vec<DoseRecord>> {
        self.query_records("person_id = ?1", params![person_id.to_string()])
    }

    fn insert_record(&self, record: &DoseRecord) -> RepoResult<DoseRecord> {
        self.conn.execute(
            "INSERT INTO vaccinations (
                id,
                person_id,
                vaccine_id,
                dose,
                applied_at,
                lot,
                location,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                record.id.to_string(),
                record.person_id.to_string(),
                record.vaccine_id.to_string(),
                record.dose.as_code(),
                record.applied_at.format(APPLIED_AT_FORMAT).to_string(),
                record.lot.as_deref(),
                record.location.as_deref(),
                record.created_at.timestamp_millis(),
            ],
        )?;

        self.get_record(record.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("inserted record {} not found in read-back", record.id))
        })
    }
}

impl DoseRecordRepository for SqliteRecordRepository<'_> {
    fn get_record(&self, id: RecordId) -> RepoResult<Option<DoseRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} WHERE id = ?1;"))?;
        let record = stmt
            .query_row([id.to_string()], |row| Ok(parse_record_row(row)))
            .optional()?;
        record.transpose()
    }

    fn delete_record(&self, id: RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM vaccinations WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::DoseRecord,
                id,
            });
        }
        Ok(())
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<DoseRecord> {
    let dose_text: String = row.get("dose")?;
    let dose = DoseLabel::parse_code(&dose_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid dose `{dose_text}` in vaccinations.dose"))
    })?;

    let applied_text: String = row.get("applied_at")?;
    let applied_at = NaiveDate::parse_from_str(&applied_text, APPLIED_AT_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{applied_text}` in vaccinations.applied_at"
        ))
    })?;

    let created_ms: i64 = row.get("created_at")?;
    let created_at = DateTime::from_timestamp_millis(created_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{created_ms}` in vaccinations.created_at"
        ))
    })?;

    Ok(DoseRecord {
        id: parse_uuid(&row.get::<_, String>("id")?, "vaccinations.id")?,
        person_id: parse_uuid(&row.get::<_, String>("person_id")?, "vaccinations.person_id")?,
        vaccine_id: parse_uuid(&row.get::<_, String>("vaccine_id")?, "vaccinations.vaccine_id")?,
        dose,
        applied_at,
        lot: row.get("lot")?,
        location: row.get("location")?,
        created_at,
    })
}
