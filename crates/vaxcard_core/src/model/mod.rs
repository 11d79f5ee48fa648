//! Domain model for immunization records.
//!
//! # Responsibility
//! - Define canonical data structures used by sequencing and card projection.
//! - Keep closed vocabularies (dose labels, sex) as enums, never free strings.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID.
//! - `(person, vaccine, dose)` identifies at most one `DoseRecord`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dose;
pub mod person;
pub mod record;
pub mod vaccine;

/// Field-level validation failure raised before persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    /// A required text field is empty after trimming.
    EmptyField(&'static str),
    /// Vaccine code is not a lowercase slug.
    InvalidCode(String),
    /// Age outside the accepted range.
    AgeOutOfRange(i64),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` cannot be empty"),
            Self::InvalidCode(code) => write!(
                f,
                "invalid vaccine code `{code}`; expected lowercase slug such as `hepb`"
            ),
            Self::AgeOutOfRange(age) => write!(f, "age {age} is outside 0..=130"),
        }
    }
}

impl Error for ModelValidationError {}
