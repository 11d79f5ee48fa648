//! Vaccination card use-case.
//!
//! Reads the person, their full history and the catalog, then delegates to
//! the pure projections in `crate::card`.

use crate::card::{project, CardFormat, CardView};
use crate::model::person::PersonId;
use crate::repo::person_repo::PersonLookup;
use crate::repo::record_repo::HistoryStore;
use crate::repo::vaccine_repo::CatalogLookup;
use crate::repo::RepoError;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CardError {
    PersonNotFound(PersonId),
    Repo(RepoError),
}

impl CardError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PersonNotFound(_) => "person_not_found",
            Self::Repo(_) => "storage_error",
        }
    }

    pub fn status_hint(&self) -> u16 {
        match self {
            Self::PersonNotFound(_) => 404,
            Self::Repo(_) => 500,
        }
    }
}

impl Display for CardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PersonNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for CardError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct CardService<C, P, H> {
    catalog: C,
    people: P,
    history: H,
}

impl<C, P, H> CardService<C, P, H>
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
        }
    }

    /// Builds the requested card view for one person.
    pub fn project(&self, person_id: PersonId, format: CardFormat) -> Result<CardView, CardError> {
        let person = self
            .people
            .get_person(person_id)?
            .ok_or(CardError::PersonNotFound(person_id))?;
        let records = self.history.find_by_person(person_id)?;
        let catalog = self.catalog.list_vaccines()?;

        debug!(
            "event=card_project module=service status=ok format={} records={} vaccines={}",
            format,
            records.len(),
            catalog.len()
        );
        Ok(project(&person, &records, &catalog, format))
    }
}
