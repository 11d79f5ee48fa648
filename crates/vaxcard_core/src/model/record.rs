//! Dose record: one administered dose of one vaccine for one person.
//!
//! # Invariants
//! - Records are immutable after creation.
//! - `(person_id, vaccine_id, dose)` is unique across the store.

use crate::model::dose::DoseLabel;
use crate::model::person::PersonId;
use crate::model::vaccine::VaccineId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RecordId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseRecord {
    pub id: RecordId,
    pub person_id: PersonId,
    pub vaccine_id: VaccineId,
    pub dose: DoseLabel,
    pub applied_at: NaiveDate,
    pub lot: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DoseRecord {
    /// Creates a record with generated ID and creation timestamp.
    pub fn new(
        person_id: PersonId,
        vaccine_id: VaccineId,
        dose: DoseLabel,
        applied_at: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            person_id,
            vaccine_id,
            dose,
            applied_at,
            lot: None,
            location: None,
            created_at: Utc::now(),
        }
    }

    /// Returns whether this record occupies the `(person, vaccine, dose)` slot.
    pub fn occupies(&self, person_id: PersonId, vaccine_id: VaccineId, dose: DoseLabel) -> bool {
        self.person_id == person_id && self.vaccine_id == vaccine_id && self.dose == dose
    }
}
