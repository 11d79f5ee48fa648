use chrono::NaiveDate;
use vaxcard_core::db::open_db_in_memory;
use vaxcard_core::{
    CatalogService, DoseLabel, DoseSubmission, HistoryStore, NewPerson, NewVaccine, PersonError,
    PersonService, Sex, SqlitePersonRepository, SqliteRecordRepository, SqliteVaccineRepository,
    VaccinationService,
};

fn ana() -> NewPerson {
    NewPerson {
        name: "Ana Paula".to_string(),
        document: "123".to_string(),
        sex: Sex::F,
        age: 34,
    }
}

#[test]
fn create_get_and_list_people() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));

    let created = service.create_person(&ana()).unwrap();
    assert_eq!(service.get_person(created.id).unwrap(), created);

    let bruno = NewPerson {
        name: "Bruno".to_string(),
        document: "456".to_string(),
        sex: Sex::M,
        age: 0,
    };
    service.create_person(&bruno).unwrap();

    let names = service
        .list_people()
        .unwrap()
        .into_iter()
        .map(|person| person.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Ana Paula", "Bruno"]);
}

#[test]
fn duplicate_document_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));

    service.create_person(&ana()).unwrap();
    let mut again = ana();
    again.name = "Someone Else".to_string();
    again.document = " 123 ".to_string();

    let err = service.create_person(&again).unwrap_err();
    assert!(matches!(err, PersonError::DocumentConflict(ref doc) if doc == "123"));
}

#[test]
fn age_above_limit_is_invalid() {
    let conn = open_db_in_memory().unwrap();
    let service = PersonService::new(SqlitePersonRepository::new(&conn));

    let mut old = ana();
    old.age = 131;
    let err = service.create_person(&old).unwrap_err();
    assert!(matches!(err, PersonError::Invalid(_)));
    assert_eq!(err.status_hint(), 422);
}

#[test]
fn deleting_person_cascades_to_dose_records() {
    let conn = open_db_in_memory().unwrap();
    let people = SqlitePersonRepository::new(&conn);
    let vaccines = SqliteVaccineRepository::new(&conn);
    let records = SqliteRecordRepository::new(&conn);

    let person = PersonService::new(people).create_person(&ana()).unwrap();
    let vaccine = CatalogService::new(vaccines)
        .create_vaccine(&NewVaccine {
            name: "BCG".to_string(),
            code: "bcg".to_string(),
            allowed_doses: None,
        })
        .unwrap();
    VaccinationService::new(vaccines, people, records)
        .submit(
            &DoseSubmission {
                person_id: person.id,
                vaccine_id: vaccine.id,
                dose: DoseLabel::D1,
                applied_at: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                lot: None,
                location: None,
            },
            true,
        )
        .unwrap();
    assert_eq!(records.find_by_person(person.id).unwrap().len(), 1);

    PersonService::new(people).delete_person(person.id).unwrap();
    assert!(records.find_by_person(person.id).unwrap().is_empty());
    assert!(matches!(
        PersonService::new(people).get_person(person.id),
        Err(PersonError::PersonNotFound(_))
    ));
}
