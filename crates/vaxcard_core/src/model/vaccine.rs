//! Vaccine catalog entry.
//!
//! # Responsibility
//! - Define the vaccine record and its allowed dose subset.
//! - Decode stored allowed sets, recovering from corrupt values.
//!
//! # Invariants
//! - `AllowedDoses` is always a subset of `DOSE_ORDER`, kept in global order
//!   without duplicates.
//! - An unreadable stored allowed set decodes to the full default ordering.

use crate::model::dose::{DoseLabel, DOSE_ORDER};
use crate::model::ModelValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static VACCINE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid vaccine code regex"));

pub type VaccineId = Uuid;

/// Ordered subset of dose labels a vaccine protocol permits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<DoseLabel>", from = "Vec<DoseLabel>")]
pub struct AllowedDoses(Vec<DoseLabel>);

impl AllowedDoses {
    /// Every label in `DOSE_ORDER`.
    pub fn full() -> Self {
        Self(DOSE_ORDER.to_vec())
    }

    /// Builds a set from arbitrary input, sorting into global order and
    /// dropping duplicates.
    pub fn from_labels(labels: impl IntoIterator<Item = DoseLabel>) -> Self {
        let mut labels = labels.into_iter().collect::<Vec<_>>();
        labels.sort();
        labels.dedup();
        Self(labels)
    }

    pub fn contains(&self, dose: DoseLabel) -> bool {
        self.0.contains(&dose)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[DoseLabel] {
        &self.0
    }

    /// Serializes to the stored JSON array form, e.g. `["D1","D2"]`.
    pub fn to_stored(&self) -> String {
        let codes = self.0.iter().map(|dose| dose.as_code()).collect::<Vec<_>>();
        serde_json::to_string(&codes).unwrap_or_else(|_| "[]".to_string())
    }

    /// Decodes the stored JSON array form.
    ///
    /// Returns `None` when the value is not a JSON array of known dose codes.
    pub fn decode_stored(raw: &str) -> Option<Self> {
        let codes: Vec<String> = serde_json::from_str(raw).ok()?;
        let labels = codes
            .iter()
            .map(|code| DoseLabel::parse_code(code))
            .collect::<Option<Vec<_>>>()?;
        Some(Self::from_labels(labels))
    }

    /// Decodes the stored form, substituting the full ordering when corrupt.
    ///
    /// The boolean reports whether the fallback was used.
    pub fn decode_or_default(raw: &str) -> (Self, bool) {
        match Self::decode_stored(raw) {
            Some(allowed) => (allowed, false),
            None => (Self::full(), true),
        }
    }
}

impl Default for AllowedDoses {
    fn default() -> Self {
        Self::full()
    }
}

impl From<Vec<DoseLabel>> for AllowedDoses {
    fn from(value: Vec<DoseLabel>) -> Self {
        Self::from_labels(value)
    }
}

impl From<AllowedDoses> for Vec<DoseLabel> {
    fn from(value: AllowedDoses) -> Self {
        value.0
    }
}

/// Catalog entry for one vaccine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vaccine {
    pub id: VaccineId,
    /// Display name, used for matrix column ordering.
    pub name: String,
    /// Unique lowercase slug, e.g. `hepb`.
    pub code: String,
    pub allowed_doses: AllowedDoses,
}

impl Vaccine {
    /// Creates a vaccine with a generated ID.
    ///
    /// `allowed_doses = None` means the full default ordering.
    pub fn new(
        name: impl Into<String>,
        code: impl Into<String>,
        allowed_doses: Option<AllowedDoses>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: code.into(),
            allowed_doses: allowed_doses.unwrap_or_default(),
        }
    }

    pub fn allows(&self, dose: DoseLabel) -> bool {
        self.allowed_doses.contains(dose)
    }

    /// Validates fields before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::EmptyField("name"));
        }
        if !is_valid_code(&self.code) {
            return Err(ModelValidationError::InvalidCode(self.code.clone()));
        }
        Ok(())
    }
}

/// Returns whether `code` is a lowercase slug (`hepb`, `meningo-c`).
pub fn is_valid_code(code: &str) -> bool {
    VACCINE_CODE_RE.is_match(code)
}
