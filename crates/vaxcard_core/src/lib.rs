//! Core domain logic for vaxcard, an immunization record keeper.
//! This crate owns dose sequencing rules and the vaccination card views.

pub mod card;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sequencing;
pub mod service;

pub use card::{
    project, CardEntry, CardFormat, CardList, CardMatrix, CardVaccineBlock, CardView, MatrixCell,
    MatrixColumn,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::dose::{DoseLabel, DOSE_ORDER};
pub use model::person::{Person, PersonId, Sex};
pub use model::record::{DoseRecord, RecordId};
pub use model::vaccine::{AllowedDoses, Vaccine, VaccineId};
pub use model::ModelValidationError;
pub use repo::person_repo::{PersonLookup, PersonRepository, SqlitePersonRepository};
pub use repo::record_repo::{DoseRecordRepository, HistoryStore, SqliteRecordRepository};
pub use repo::vaccine_repo::{CatalogLookup, SqliteVaccineRepository, VaccineRepository};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use sequencing::{validate, validate_with_policy, DoseCandidate, Rejection, SequencePolicy};
pub use service::card_service::{CardError, CardService};
pub use service::catalog_service::{
    CatalogError, CatalogService, NewVaccine, SeedReport, DEFAULT_CATALOG,
};
pub use service::person_service::{NewPerson, PersonError, PersonService};
pub use service::vaccination_service::{DoseSubmission, SubmissionError, VaccinationService};

/// Health probe.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
