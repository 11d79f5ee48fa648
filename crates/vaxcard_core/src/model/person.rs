//! Person (vaccination card holder) model.

use crate::model::ModelValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type PersonId = Uuid;

pub const MAX_AGE: u8 = 130;

/// Closed sex vocabulary as stored (`M`, `F`, `O`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    M,
    F,
    /// Other or not informed.
    O,
}

impl Sex {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::M => "M",
            Self::F => "F",
            Self::O => "O",
        }
    }

    pub fn parse_code(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "M" => Some(Self::M),
            "F" => Some(Self::F),
            "O" => Some(Self::O),
            _ => None,
        }
    }
}

impl Display for Sex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_code(s).ok_or_else(|| format!("unknown sex `{s}`; expected M|F|O"))
    }
}

/// Individual whose doses are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    /// Unique external document/ID number.
    pub document: String,
    pub sex: Sex,
    /// Age in years, `0..=MAX_AGE`.
    pub age: u8,
}

impl Person {
    pub fn new(name: impl Into<String>, document: impl Into<String>, sex: Sex, age: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            document: document.into(),
            sex,
            age,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::EmptyField("name"));
        }
        if self.document.trim().is_empty() {
            return Err(ModelValidationError::EmptyField("document"));
        }
        if self.age > MAX_AGE {
            return Err(ModelValidationError::AgeOutOfRange(i64::from(self.age)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Person, Sex};
    use crate::model::ModelValidationError;

    #[test]
    fn validate_enforces_age_range_and_required_fields() {
        assert!(Person::new("Ana Paula", "123", Sex::F, 30).validate().is_ok());
        assert_eq!(
            Person::new("Ana Paula", "123", Sex::F, 131).validate(),
            Err(ModelValidationError::AgeOutOfRange(131))
        );
        assert_eq!(
            Person::new("Ana Paula", " ", Sex::F, 30).validate(),
            Err(ModelValidationError::EmptyField("document"))
        );
    }

    #[test]
    fn sex_parses_codes() {
        assert_eq!("f".parse::<Sex>(), Ok(Sex::F));
        assert!("x".parse::<Sex>().is_err());
    }
}
