//! Dose sequencing validator.
//!
//! # Responsibility
//! - Decide whether a candidate dose is admissible for a person and vaccine.
//! - Stay a pure predicate: the caller supplies the vaccine and a history
//!   snapshot and persists on acceptance.
//!
//! # Invariants
//! - Gates run in fixed order: allowed-dose, sequence, uniqueness.
//!   The first failing gate decides the rejection.
//! - Same inputs always yield the same verdict.

use crate::model::dose::{DoseLabel, DOSE_ORDER};
use crate::model::person::PersonId;
use crate::model::record::DoseRecord;
use crate::model::vaccine::{Vaccine, VaccineId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which ordering supplies the prerequisites of a later dose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequencePolicy {
    /// Every label before the candidate in `DOSE_ORDER` is required, even
    /// labels the vaccine does not allow.
    #[default]
    GlobalOrder,
    /// Only labels before the candidate within the vaccine's allowed set
    /// are required.
    AllowedOrder,
}

impl SequencePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" | "global_order" => Some(Self::GlobalOrder),
            "allowed" | "allowed_order" => Some(Self::AllowedOrder),
            _ => None,
        }
    }

    fn prerequisites(self, vaccine: &Vaccine, dose: DoseLabel) -> Vec<DoseLabel> {
        match self {
            Self::GlobalOrder => dose.predecessors().to_vec(),
            Self::AllowedOrder => DOSE_ORDER
                .iter()
                .copied()
                .filter(|prior| *prior < dose && vaccine.allows(*prior))
                .collect(),
        }
    }
}

/// Dose submission under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoseCandidate {
    pub person_id: PersonId,
    pub vaccine_id: VaccineId,
    pub dose: DoseLabel,
    /// `false` skips the sequence gate entirely.
    pub enforce_sequence: bool,
}

/// Reason a candidate dose was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Dose label is outside the vaccine's allowed set.
    DoseNotAllowed {
        dose: DoseLabel,
        vaccine_name: String,
    },
    /// A required earlier dose is not on file.
    SequenceViolation {
        dose: DoseLabel,
        missing_prior_dose: DoseLabel,
    },
    /// The `(person, vaccine, dose)` slot is already taken.
    DuplicateDose { dose: DoseLabel },
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DoseNotAllowed { .. } => "dose_not_allowed",
            Self::SequenceViolation { .. } => "sequence_violation",
            Self::DuplicateDose { .. } => "duplicate_dose",
        }
    }
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DoseNotAllowed { dose, vaccine_name } => {
                write!(f, "dose {dose} is not allowed for vaccine {vaccine_name}")
            }
            Self::SequenceViolation {
                dose,
                missing_prior_dose,
            } => write!(
                f,
                "invalid order: {dose} requires {missing_prior_dose} to be recorded first"
            ),
            Self::DuplicateDose { dose } => {
                write!(f, "dose {dose} already recorded for this person and vaccine")
            }
        }
    }
}

impl Error for Rejection {}

/// Validates with the default `SequencePolicy::GlobalOrder`.
pub fn validate(
    candidate: &DoseCandidate,
    vaccine: &Vaccine,
    history: &[DoseRecord],
) -> Result<(), Rejection> {
    validate_with_policy(candidate, vaccine, history, SequencePolicy::GlobalOrder)
}

/// Runs all gates against a history snapshot.
///
/// `history` may contain unrelated records; only those matching the
/// candidate's person and vaccine are considered.
pub fn validate_with_policy(
    candidate: &DoseCandidate,
    vaccine: &Vaccine,
    history: &[DoseRecord],
    policy: SequencePolicy,
) -> Result<(), Rejection> {
    if !vaccine.allows(candidate.dose) {
        return Err(Rejection::DoseNotAllowed {
            dose: candidate.dose,
            vaccine_name: vaccine.name.clone(),
        });
    }

    let on_file = history
        .iter()
        .filter(|record| {
            record.person_id == candidate.person_id && record.vaccine_id == candidate.vaccine_id
        })
        .map(|record| record.dose)
        .collect::<HashSet<_>>();

    if candidate.enforce_sequence {
        if let Some(missing) = policy
            .prerequisites(vaccine, candidate.dose)
            .into_iter()
            .find(|prior| !on_file.contains(prior))
        {
            return Err(Rejection::SequenceViolation {
                dose: candidate.dose,
                missing_prior_dose: missing,
            });
        }
    }

    if on_file.contains(&candidate.dose) {
        return Err(Rejection::DuplicateDose {
            dose: candidate.dose,
        });
    }

    Ok(())
}
