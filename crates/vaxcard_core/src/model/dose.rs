//! Dose label vocabulary.
//!
//! # Responsibility
//! - Define the closed, globally ordered set of dose labels.
//! - Own the text form used by storage and command-line input.
//!
//! # Invariants
//! - `DOSE_ORDER` is the single source of truth for sequencing.
//! - The derived `Ord` matches `DOSE_ORDER` positions.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One position in the fixed immunization sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DoseLabel {
    /// First dose.
    D1,
    /// Second dose.
    D2,
    /// Third dose.
    D3,
    /// First booster.
    R1,
    /// Second booster.
    R2,
}

/// Global dose ordering. Not configurable per vaccine.
pub const DOSE_ORDER: [DoseLabel; 5] = [
    DoseLabel::D1,
    DoseLabel::D2,
    DoseLabel::D3,
    DoseLabel::R1,
    DoseLabel::R2,
];

impl DoseLabel {
    /// Zero-based position in `DOSE_ORDER`.
    pub fn order_index(self) -> usize {
        match self {
            Self::D1 => 0,
            Self::D2 => 1,
            Self::D3 => 2,
            Self::R1 => 3,
            Self::R2 => 4,
        }
    }

    /// Labels strictly before this one in the global order.
    pub fn predecessors(self) -> &'static [DoseLabel] {
        &DOSE_ORDER[..self.order_index()]
    }

    /// Stable short code (`D1`..`R2`) used for storage.
    pub fn as_code(self) -> &'static str {
        match self {
            Self::D1 => "D1",
            Self::D2 => "D2",
            Self::D3 => "D3",
            Self::R1 => "R1",
            Self::R2 => "R2",
        }
    }

    /// Human-readable description.
    pub fn describe(self) -> &'static str {
        match self {
            Self::D1 => "first dose",
            Self::D2 => "second dose",
            Self::D3 => "third dose",
            Self::R1 => "first booster",
            Self::R2 => "second booster",
        }
    }

    /// Parses a short code; case-insensitive and whitespace tolerant.
    pub fn parse_code(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "D1" => Some(Self::D1),
            "D2" => Some(Self::D2),
            "D3" => Some(Self::D3),
            "R1" => Some(Self::R1),
            "R2" => Some(Self::R2),
            _ => None,
        }
    }
}

impl Display for DoseLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_code())
    }
}

impl FromStr for DoseLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_code(s)
            .ok_or_else(|| format!("unknown dose label `{s}`; expected D1|D2|D3|R1|R2"))
    }
}

#[cfg(test)]
mod tests {
    use super::{DoseLabel, DOSE_ORDER};

    #[test]
    fn order_index_matches_global_order() {
        for (idx, dose) in DOSE_ORDER.iter().enumerate() {
            assert_eq!(dose.order_index(), idx);
        }
        assert!(DoseLabel::D3 < DoseLabel::R1);
    }

    #[test]
    fn predecessors_are_prefix_of_global_order() {
        assert!(DoseLabel::D1.predecessors().is_empty());
        assert_eq!(
            DoseLabel::R1.predecessors(),
            &[DoseLabel::D1, DoseLabel::D2, DoseLabel::D3]
        );
    }

    #[test]
    fn parse_code_accepts_loose_input() {
        assert_eq!(DoseLabel::parse_code(" r2 "), Some(DoseLabel::R2));
        assert_eq!(DoseLabel::parse_code("D4"), None);
        assert!("X1".parse::<DoseLabel>().is_err());
    }
}
