//! Vaccination card projections.
//!
//! # Responsibility
//! - Reshape one person's dose records into the list and matrix card views.
//! - Read only; never mutate records or catalog.
//!
//! # Invariants
//! - List view holds exactly the person's records, one block per vaccine
//!   with at least one record, entries ordered by applied date.
//! - Matrix view always has `DOSE_ORDER.len()` rows and one column per
//!   catalog vaccine ordered by display name.
//! - A matrix cell holds at most one record; uniqueness of
//!   `(person, vaccine, dose)` is guaranteed upstream and not re-checked.

use crate::model::dose::{DoseLabel, DOSE_ORDER};
use crate::model::person::Person;
use crate::model::record::{DoseRecord, RecordId};
use crate::model::vaccine::{Vaccine, VaccineId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Card output shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardFormat {
    #[default]
    List,
    Matrix,
}

impl Display for CardFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::List => f.write_str("list"),
            Self::Matrix => f.write_str("matrix"),
        }
    }
}

impl FromStr for CardFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(Self::List),
            "matrix" => Ok(Self::Matrix),
            other => Err(format!("unknown card format `{other}`; expected list|matrix")),
        }
    }
}

/// One dose line inside a list-view block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardEntry {
    pub record_id: RecordId,
    pub dose: DoseLabel,
    pub applied_at: NaiveDate,
    pub lot: Option<String>,
    pub location: Option<String>,
}

/// All of a person's doses for one vaccine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardVaccineBlock {
    pub vaccine_id: VaccineId,
    pub vaccine_name: String,
    pub entries: Vec<CardEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardList {
    pub person: Person,
    pub vaccines: Vec<CardVaccineBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixColumn {
    pub vaccine_id: VaccineId,
    pub vaccine_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixCell {
    pub record_id: RecordId,
    pub applied_at: NaiveDate,
    pub dose: DoseLabel,
}

/// Dose x vaccine grid, addressed as `grid[row][col]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardMatrix {
    pub rows: Vec<DoseLabel>,
    pub cols: Vec<MatrixColumn>,
    pub grid: Vec<Vec<Option<MatrixCell>>>,
}

impl CardMatrix {
    /// Looks up the cell for one dose label and vaccine.
    pub fn cell(&self, dose: DoseLabel, vaccine_id: VaccineId) -> Option<&MatrixCell> {
        let col = self
            .cols
            .iter()
            .position(|column| column.vaccine_id == vaccine_id)?;
        self.grid.get(dose.order_index())?.get(col)?.as_ref()
    }

    /// Number of populated cells.
    pub fn filled_cells(&self) -> usize {
        self.grid.iter().flatten().filter(|cell| cell.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum CardView {
    List(CardList),
    Matrix(CardMatrix),
}

/// Projects a person's records into the requested card view.
///
/// Records belonging to other people are ignored.
pub fn project(
    person: &Person,
    records: &[DoseRecord],
    catalog: &[Vaccine],
    format: CardFormat,
) -> CardView {
    match format {
        CardFormat::List => CardView::List(project_list(person, records, catalog)),
        CardFormat::Matrix => CardView::Matrix(project_matrix(person, records, catalog)),
    }
}

/// Groups records by vaccine in first-occurrence order over the
/// applied-date-sorted record stream.
pub fn project_list(person: &Person, records: &[DoseRecord], catalog: &[Vaccine]) -> CardList {
    let names = catalog
        .iter()
        .map(|vaccine| (vaccine.id, vaccine.name.as_str()))
        .collect::<HashMap<_, _>>();

    let mut ordered = records
        .iter()
        .filter(|record| record.person_id == person.id)
        .collect::<Vec<_>>();
    ordered.sort_by(|left, right| {
        left.applied_at
            .cmp(&right.applied_at)
            .then_with(|| left.created_at.cmp(&right.created_at))
            .then_with(|| left.id.cmp(&right.id))
    });

    let mut blocks: Vec<CardVaccineBlock> = Vec::new();
    let mut block_index: HashMap<VaccineId, usize> = HashMap::new();
    for record in ordered {
        let idx = *block_index.entry(record.vaccine_id).or_insert_with(|| {
            // Unknown vaccines keep their block, labelled by ID.
            let vaccine_name = names
                .get(&record.vaccine_id)
                .map(|name| (*name).to_string())
                .unwrap_or_else(|| record.vaccine_id.to_string());
            blocks.push(CardVaccineBlock {
                vaccine_id: record.vaccine_id,
                vaccine_name,
                entries: Vec::new(),
            });
            blocks.len() - 1
        });
        blocks[idx].entries.push(CardEntry {
            record_id: record.id,
            dose: record.dose,
            applied_at: record.applied_at,
            lot: record.lot.clone(),
            location: record.location.clone(),
        });
    }

    CardList {
        person: person.clone(),
        vaccines: blocks,
    }
}

/// Builds the full dose x vaccine grid for every catalog vaccine.
pub fn project_matrix(person: &Person, records: &[DoseRecord], catalog: &[Vaccine]) -> CardMatrix {
    let mut columns = catalog.iter().collect::<Vec<_>>();
    columns.sort_by(|left, right| {
        left.name
            .cmp(&right.name)
            .then_with(|| left.code.cmp(&right.code))
    });

    let by_slot = records
        .iter()
        .filter(|record| record.person_id == person.id)
        .map(|record| ((record.dose, record.vaccine_id), record))
        .collect::<HashMap<_, _>>();

    let grid = DOSE_ORDER
        .iter()
        .map(|dose| {
            columns
                .iter()
                .map(|vaccine| {
                    by_slot
                        .get(&(*dose, vaccine.id))
                        .map(|record| MatrixCell {
                            record_id: record.id,
                            applied_at: record.applied_at,
                            dose: record.dose,
                        })
                })
                .collect()
        })
        .collect();

    CardMatrix {
        rows: DOSE_ORDER.to_vec(),
        cols: columns
            .iter()
            .map(|vaccine| MatrixColumn {
                vaccine_id: vaccine.id,
                vaccine_name: vaccine.name.clone(),
            })
            .collect(),
        grid,
    }
}
