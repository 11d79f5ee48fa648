//! Vaccine catalog management.
//!
//! # Responsibility
//! - Create, list, fetch and delete vaccines.
//! - Seed the standard catalog idempotently.
//!
//! # Invariants
//! - Vaccine codes are unique; a taken code is `CatalogError::CodeConflict`.
//! - Omitted allowed doses mean the full default ordering.

use crate::model::dose::DoseLabel;
use crate::model::vaccine::{AllowedDoses, Vaccine, VaccineId};
use crate::model::ModelValidationError;
use crate::repo::vaccine_repo::VaccineRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Standard catalog as `(display name, code)`.
pub const DEFAULT_CATALOG: &[(&str, &str)] = &[
    ("BCG", "bcg"),
    ("HEPATITE B", "hepatite-b"),
    ("ANTI-PÓLIO (SABIN)", "anti-polio-sabin"),
    ("TETRA VALENTE", "tetra-valente"),
    ("TRÍPLICE BACTERIANA (DPT)", "triplice-bacteriana-dpt"),
    ("HAEMOPHILUS INFLUENZAE", "haemophilus-influenzae"),
    ("TRÍPLICE ACELULAR", "triplice-acelular"),
    ("PNEUMO 10 VALENTE", "pneumo-10-valente"),
    ("MENINGO C", "meningo-c"),
    ("ROTAVÍRUS", "rotavirus"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVaccine {
    pub name: String,
    pub code: String,
    /// `None` selects every dose label.
    pub allowed_doses: Option<Vec<DoseLabel>>,
}

/// Outcome of `CatalogService::seed_defaults`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub already_present: Vec<String>,
}

#[derive(Debug)]
pub enum CatalogError {
    Invalid(ModelValidationError),
    CodeConflict(String),
    VaccineNotFound(VaccineId),
    Repo(RepoError),
}

impl CatalogError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_vaccine",
            Self::CodeConflict(_) => "code_conflict",
            Self::VaccineNotFound(_) => "vaccine_not_found",
            Self::Repo(_) => "storage_error",
        }
    }

    pub fn status_hint(&self) -> u16 {
        match self {
            Self::Invalid(_) => 422,
            Self::CodeConflict(_) => 409,
            Self::VaccineNotFound(_) => 404,
            Self::Repo(_) => 500,
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::CodeConflict(code) => write!(f, "vaccine code already exists: `{code}`"),
            Self::VaccineNotFound(id) => write!(f, "vaccine not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Invalid(err),
            RepoError::NotFound { id, .. } => Self::VaccineNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct CatalogService<R: VaccineRepository> {
    repo: R,
}

impl<R: VaccineRepository> CatalogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a vaccine.
    ///
    /// An explicit empty `allowed_doses` is kept as-is; such a vaccine
    /// accepts no doses.
    pub fn create_vaccine(&self, request: &NewVaccine) -> Result<Vaccine, CatalogError> {
        let code = request.code.trim();
        if self.repo.find_vaccine_by_code(code)?.is_some() {
            return Err(CatalogError::CodeConflict(code.to_string()));
        }

        let allowed = request
            .allowed_doses
            .as_ref()
            .map(|labels| AllowedDoses::from_labels(labels.iter().copied()));
        let vaccine = Vaccine::new(request.name.trim(), code, allowed);

        match self.repo.create_vaccine(&vaccine) {
            Ok(_) => {}
            Err(RepoError::ConstraintViolation(_)) => {
                return Err(CatalogError::CodeConflict(code.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            "event=vaccine_create module=service status=ok vaccine_id={} code={}",
            vaccine.id, vaccine.code
        );
        Ok(vaccine)
    }

    pub fn get_vaccine(&self, id: VaccineId) -> Result<Vaccine, CatalogError> {
        self.repo
            .get_vaccine(id)?
            .ok_or(CatalogError::VaccineNotFound(id))
    }

    pub fn get_vaccine_by_code(&self, code: &str) -> Result<Option<Vaccine>, CatalogError> {
        Ok(self.repo.find_vaccine_by_code(code.trim())?)
    }

    pub fn list_vaccines(&self) -> Result<Vec<Vaccine>, CatalogError> {
        Ok(self.repo.list_vaccines()?)
    }

    /// Deletes a vaccine and all dose records referencing it.
    pub fn delete_vaccine(&self, id: VaccineId) -> Result<(), CatalogError> {
        self.repo.delete_vaccine(id)?;
        info!("event=vaccine_delete module=service status=ok vaccine_id={id}");
        Ok(())
    }

    /// Creates every `DEFAULT_CATALOG` entry whose code is not yet taken.
    pub fn seed_defaults(&self) -> Result<SeedReport, CatalogError> {
        let mut report = SeedReport::default();
        for (name, code) in DEFAULT_CATALOG {
            let request = NewVaccine {
                name: (*name).to_string(),
                code: (*code).to_string(),
                allowed_doses: None,
            };
            match self.create_vaccine(&request) {
                Ok(_) => report.created.push((*code).to_string()),
                Err(CatalogError::CodeConflict(_)) => {
                    report.already_present.push((*code).to_string())
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            "event=catalog_seed module=service status=ok created={} already_present={}",
            report.created.len(),
            report.already_present.len()
        );
        Ok(report)
    }
}
