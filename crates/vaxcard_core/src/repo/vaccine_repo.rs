//! Vaccine catalog repository.
//!
//! # Invariants
//! - `code` is unique; duplicates surface as `ConstraintViolation`.
//! - `list_vaccines` is ordered by display name, then code.
//! - Deleting a vaccine cascades to its dose records.

use crate::model::vaccine::{AllowedDoses, Vaccine, VaccineId};
use crate::repo::{parse_uuid, EntityKind, RepoError, RepoResult};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension, Row};

const VACCINE_SELECT_SQL: &str = "SELECT id, name, code, allowed_doses FROM vaccines";

/// Read-only catalog access used by sequencing and card projection.
pub trait CatalogLookup {
    fn get_vaccine(&self, id: VaccineId) -> RepoResult<Option<Vaccine>>;
    fn list_vaccines(&self) -> RepoResult<Vec<Vaccine>>;
}

/// Catalog management on top of `CatalogLookup`.
pub trait VaccineRepository: CatalogLookup {
    fn create_vaccine(&self, vaccine: &Vaccine) -> RepoResult<VaccineId>;
    fn find_vaccine_by_code(&self, code: &str) -> RepoResult<Option<Vaccine>>;
    fn delete_vaccine(&self, id: VaccineId) -> RepoResult<()>;
}

#[derive(Clone, Copy)]
pub struct SqliteVaccineRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVaccineRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CatalogLookup for SqliteVaccineRepository<'_> {
    fn get_vaccine(&self, id: VaccineId) -> RepoResult<Option<Vaccine>> {
        self.conn
            .query_row(
                &format!("{VACCINE_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                read_vaccine_columns,
            )
            .optional()?
            .map(decode_vaccine)
            .transpose()
    }

    fn list_vaccines(&self) -> RepoResult<Vec<Vaccine>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VACCINE_SELECT_SQL} ORDER BY name ASC, code ASC;"))?;
        let rows = stmt.query_map([], read_vaccine_columns)?;

        let mut vaccines = Vec::new();
        for row in rows {
            vaccines.push(decode_vaccine(row?)?);
        }
        Ok(vaccines)
    }
}

impl VaccineRepository for SqliteVaccineRepository<'_> {
    fn create_vaccine(&self, vaccine: &Vaccine) -> RepoResult<VaccineId> {
        vaccine.validate()?;

        self.conn.execute(
            "INSERT INTO vaccines (id, name, code, allowed_doses) VALUES (?1, ?2, ?3, ?4);",
            params![
                vaccine.id.to_string(),
                vaccine.name.trim(),
                vaccine.code.as_str(),
                vaccine.allowed_doses.to_stored(),
            ],
        )?;

        Ok(vaccine.id)
    }

    fn find_vaccine_by_code(&self, code: &str) -> RepoResult<Option<Vaccine>> {
        self.conn
            .query_row(
                &format!("{VACCINE_SELECT_SQL} WHERE code = ?1;"),
                [code],
                read_vaccine_columns,
            )
            .optional()?
            .map(decode_vaccine)
            .transpose()
    }

    fn delete_vaccine(&self, id: VaccineId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM vaccines WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Vaccine,
                id,
            });
        }
        Ok(())
    }
}

type VaccineColumns = (String, String, String, String);

fn read_vaccine_columns(row: &Row<'_>) -> rusqlite::Result<VaccineColumns> {
    Ok((
        row.get("id")?,
        row.get("name")?,
        row.get("code")?,
        row.get("allowed_doses")?,
    ))
}

fn decode_vaccine((id, name, code, allowed_raw): VaccineColumns) -> RepoResult<Vaccine> {
    let id = parse_uuid(&id, "vaccines.id")?;
    let (allowed_doses, recovered) = AllowedDoses::decode_or_default(&allowed_raw);
    if recovered {
        warn!(
            "event=catalog_corrupt module=repo status=recovered vaccine_id={} fallback=default_order",
            id
        );
    }
    Ok(Vaccine {
        id,
        name,
        code,
        allowed_doses,
    })
}
