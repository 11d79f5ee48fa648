//! People management.
//!
//! # Invariants
//! - `document` is unique; a taken document is `PersonError::DocumentConflict`.
//! - Deleting a person cascades to their dose records.

use crate::model::person::{Person, PersonId, Sex};
use crate::model::ModelValidationError;
use crate::repo::person_repo::PersonRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub document: String,
    pub sex: Sex,
    pub age: u8,
}

#[derive(Debug)]
pub enum PersonError {
    Invalid(ModelValidationError),
    DocumentConflict(String),
    PersonNotFound(PersonId),
    Repo(RepoError),
}

impl PersonError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "invalid_person",
            Self::DocumentConflict(_) => "document_conflict",
            Self::PersonNotFound(_) => "person_not_found",
            Self::Repo(_) => "storage_error",
        }
    }

    pub fn status_hint(&self) -> u16 {
        match self {
            Self::Invalid(_) => 422,
            Self::DocumentConflict(_) => 409,
            Self::PersonNotFound(_) => 404,
            Self::Repo(_) => 500,
        }
    }
}

impl Display for PersonError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::DocumentConflict(document) => {
                write!(f, "document already registered: `{document}`")
            }
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersonError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PersonError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Invalid(err),
            RepoError::NotFound { id, .. } => Self::PersonNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_person(&self, request: &NewPerson) -> Result<Person, PersonError> {
        let document = request.document.trim();
        if self.repo.find_person_by_document(document)?.is_some() {
            return Err(PersonError::DocumentConflict(document.to_string()));
        }

        let person = Person::new(request.name.trim(), document, request.sex, request.age);
        match self.repo.create_person(&person) {
            Ok(_) => {}
            Err(RepoError::ConstraintViolation(_)) => {
                return Err(PersonError::DocumentConflict(document.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            "event=person_create module=service status=ok person_id={}",
            person.id
        );
        Ok(person)
    }

    pub fn get_person(&self, id: PersonId) -> Result<Person, PersonError> {
        self.repo
            .get_person(id)?
            .ok_or(PersonError::PersonNotFound(id))
    }

    pub fn list_people(&self) -> Result<Vec<Person>, PersonError> {
        Ok(self.repo.list_people()?)
    }

    pub fn delete_person(&self, id: PersonId) -> Result<(), PersonError> {
        self.repo.delete_person(id)?;
        info!("event=person_delete module=service status=ok person_id={id}");
        Ok(())
    }
}
