//! Person repository.

use crate::model::person::{Person, PersonId, Sex};
use crate::repo::{parse_uuid, EntityKind, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PERSON_SELECT_SQL: &str = "SELECT id, name, document, sex, age FROM people";

/// Read-only person access used by card projection and submissions.
pub trait PersonLookup {
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
}

pub trait PersonRepository: PersonLookup {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId>;
    fn find_person_by_document(&self, document: &str) -> RepoResult<Option<Person>>;
    /// Lists people ordered by name, then document.
    fn list_people(&self) -> RepoResult<Vec<Person>>;
    /// Deletes a person and, by cascade, all of their dose records.
    fn delete_person(&self, id: PersonId) -> RepoResult<()>;
}

#[derive(Clone, Copy)]
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn query_one(&self, filter: &str, value: String) -> RepoResult<Option<Person>> {
        self.conn
            .query_row(
                &format!("{PERSON_SELECT_SQL} WHERE {filter} = ?1;"),
                [value],
                read_person_columns,
            )
            .optional()?
            .map(decode_person)
            .transpose()
    }
}

impl PersonLookup for SqlitePersonRepository<'_> {
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.query_one("id", id.to_string())
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &Person) -> RepoResult<PersonId> {
        person.validate()?;

        self.conn.execute(
            "INSERT INTO people (id, name, document, sex, age) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                person.id.to_string(),
                person.name.trim(),
                person.document.trim(),
                person.sex.as_code(),
                person.age,
            ],
        )?;

        Ok(person.id)
    }

    fn find_person_by_document(&self, document: &str) -> RepoResult<Option<Person>> {
        self.query_one("document", document.trim().to_string())
    }

    fn list_people(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} ORDER BY name ASC, document ASC;"))?;
        let rows = stmt.query_map([], read_person_columns)?;

        let mut people = Vec::new();
        for row in rows {
            people.push(decode_person(row?)?);
        }
        Ok(people)
    }

    fn delete_person(&self, id: PersonId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM people WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: EntityKind::Person,
                id,
            });
        }
        Ok(())
    }
}

type PersonColumns = (String, String, String, String, i64);

fn read_person_columns(row: &Row<'_>) -> rusqlite::Result<PersonColumns> {
    Ok((
        row.get("id")?,
        row.get("name")?,
        row.get("document")?,
        row.get("sex")?,
        row.get("age")?,
    ))
}

fn decode_person((id, name, document, sex, age): PersonColumns) -> RepoResult<Person> {
    let sex = Sex::parse_code(&sex)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid sex `{sex}` in people.sex")))?;
    let age = u8::try_from(age)
        .map_err(|_| RepoError::InvalidData(format!("invalid age `{age}` in people.age")))?;

    let person = Person {
        id: parse_uuid(&id, "people.id")?,
        name,
        document,
        sex,
        age,
    };
    person.validate()?;
    Ok(person)
}
