//! Dose submission use-case.
//!
//! # Responsibility
//! - Resolve person and vaccine, run the sequencing validator against the
//!   current history, and persist accepted doses.
//! - Expose record lookup/delete for dose records.
//!
//! # Invariants
//! - No record is written unless `sequencing::validate_with_policy` accepts it.
//! - A store-level unique violation (race past the pre-check) is reported
//!   as `Rejection::DuplicateDose`.
//! - Callers own transaction scope around read-validate-insert.

use crate::model::dose::DoseLabel;
use crate::model::person::PersonId;
use crate::model::record::{DoseRecord, RecordId};
use crate::model::vaccine::VaccineId;
use crate::repo::person_repo::PersonLookup;
use crate::repo::record_repo::{DoseRecordRepository, HistoryStore};
use crate::repo::vaccine_repo::CatalogLookup;
use crate::repo::{EntityKind, RepoError};
use crate::sequencing::{validate_with_policy, DoseCandidate, Rejection, SequencePolicy};
use chrono::NaiveDate;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Incoming dose to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoseSubmission {
    pub person_id: PersonId,
    pub vaccine_id: VaccineId,
    pub dose: DoseLabel,
    pub applied_at: NaiveDate,
    pub lot: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug)]
pub enum SubmissionError {
    /// Referenced person, vaccine or record does not exist.
    NotFound { entity: EntityKind, id: Uuid },
    /// Validator refused the dose.
    Rejected(Rejection),
    Repo(RepoError),
}

impl SubmissionError {
    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Rejected(rejection) => rejection.error_code(),
            Self::Repo(_) => "storage_error",
        }
    }

    /// Suggested HTTP status for an outer transport layer.
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Rejected(Rejection::DoseNotAllowed { .. }) => 422,
            Self::Rejected(Rejection::SequenceViolation { .. })
            | Self::Rejected(Rejection::DuplicateDose { .. }) => 409,
            Self::Repo(RepoError::Validation(_)) => 422,
            Self::Repo(_) => 500,
        }
    }
}

impl Display for SubmissionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Rejected(rejection) => write!(f, "{rejection}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SubmissionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Rejected(rejection) => Some(rejection),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SubmissionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<Rejection> for SubmissionError {
    fn from(value: Rejection) -> Self {
        Self::Rejected(value)
    }
}

/// Dose submission service over injected catalog, people and history stores.
pub struct VaccinationService<C, P, H> {
    catalog: C,
    people: P,
    history: H,
    policy: SequencePolicy,
}

impl<C, P, H> VaccinationService<C, P, H>
where
    C: CatalogLookup,
    P: PersonLookup,
    H: HistoryStore,
{
    pub fn new(catalog: C, people: P, history: H) -> Self {
        Self {
            catalog,
            people,
            history,
            policy: SequencePolicy::default(),
        }
    }

    /// Overrides which ordering supplies sequence prerequisites.
    pub fn with_policy(mut self, policy: SequencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SequencePolicy {
        self.policy
    }

    /// Validates without persisting.
    pub fn check(
        &self,
        submission: &DoseSubmission,
        enforce_sequence: bool,
    ) -> Result<(), SubmissionError> {
        self.people
            .get_person(submission.person_id)?
            .ok_or(SubmissionError::NotFound {
                entity: EntityKind::Person,
                id: submission.person_id,
            })?;
        let vaccine = self
            .catalog
            .get_vaccine(submission.vaccine_id)?
            .ok_or(SubmissionError::NotFound {
                entity: EntityKind::Vaccine,
                id: submission.vaccine_id,
            })?;

        let history = self
            .history
            .find_by_person_and_vaccine(submission.person_id, submission.vaccine_id)?;
        let candidate = DoseCandidate {
            person_id: submission.person_id,
            vaccine_id: submission.vaccine_id,
            dose: submission.dose,
            enforce_sequence,
        };

        validate_with_policy(&candidate, &vaccine, &history, self.policy)?;
        Ok(())
    }

    /// Validates and records one dose.
    ///
    /// # Errors
    /// - `NotFound` when the person or vaccine is missing.
    /// - `Rejected` with the first failing gate.
    pub fn submit(
        &self,
        submission: &DoseSubmission,
        enforce_sequence: bool,
    ) -> Result<DoseRecord, SubmissionError> {
        if let Err(err) = self.check(submission, enforce_sequence) {
            warn!(
                "event=dose_submit module=service status=rejected dose={} enforce_sequence={} error_code={}",
                submission.dose,
                enforce_sequence,
                err.error_code()
            );
            return Err(err);
        }

        let mut record = DoseRecord::new(
            submission.person_id,
            submission.vaccine_id,
            submission.dose,
            submission.applied_at,
        );
        record.lot = normalize_optional(submission.lot.as_deref());
        record.location = normalize_optional(submission.location.as_deref());

        let stored = match self.history.insert_record(&record) {
            Ok(stored) => stored,
            Err(RepoError::ConstraintViolation(details)) => {
                warn!(
                    "event=dose_submit module=service status=conflict dose={} details={}",
                    submission.dose, details
                );
                return Err(SubmissionError::Rejected(Rejection::DuplicateDose {
                    dose: submission.dose,
                }));
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            "event=dose_submit module=service status=ok record_id={} dose={} enforce_sequence={}",
            stored.id, stored.dose, enforce_sequence
        );
        Ok(stored)
    }
}

impl<C, P, H> VaccinationService<C, P, H>
where
    C: CatalogLookup,
    P: PersonLookup,
    H: DoseRecordRepository,
{
    pub fn get_record(&self, id: RecordId) -> Result<DoseRecord, SubmissionError> {
        self.history
            .get_record(id)?
            .ok_or(SubmissionError::NotFound {
                entity: EntityKind::DoseRecord,
                id,
            })
    }

    pub fn delete_record(&self, id: RecordId) -> Result<(), SubmissionError> {
        self.history.delete_record(id)?;
        info!("event=dose_delete module=service status=ok record_id={id}");
        Ok(())
    }
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
