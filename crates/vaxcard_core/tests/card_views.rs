use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashSet;
use vaxcard_core::db::open_db_in_memory;
use vaxcard_core::{
    CardError, CardFormat, CardService, CardView, CatalogService, DoseLabel, DoseRecord,
    DoseSubmission, HistoryStore, NewPerson, NewVaccine, Person, PersonService, Sex,
    SqlitePersonRepository, SqliteRecordRepository, SqliteVaccineRepository, Vaccine,
    VaccinationService,
};

struct Fixture {
    ana: Person,
    bruno: Person,
    bcg: Vaccine,
    hepb: Vaccine,
    rota: Vaccine,
}

fn fixture(conn: &Connection) -> Fixture {
    let people = PersonService::new(SqlitePersonRepository::new(conn));
    let person = |name: &str, document: &str| {
        people
            .create_person(&NewPerson {
                name: name.to_string(),
                document: document.to_string(),
                sex: Sex::O,
                age: 20,
            })
            .unwrap()
    };
    let catalog = CatalogService::new(SqliteVaccineRepository::new(conn));
    let vaccine = |name: &str, code: &str| {
        catalog
            .create_vaccine(&NewVaccine {
                name: name.to_string(),
                code: code.to_string(),
                allowed_doses: None,
            })
            .unwrap()
    };

    Fixture {
        ana: person("Ana Paula", "123"),
        bruno: person("Bruno", "456"),
        rota: vaccine("ROTAVÍRUS", "rotavirus"),
        hepb: vaccine("HEPATITE B", "hepatite-b"),
        bcg: vaccine("BCG", "bcg"),
    }
}

fn record(
    conn: &Connection,
    person: &Person,
    vaccine: &Vaccine,
    dose: DoseLabel,
    (month, day): (u32, u32),
) -> DoseRecord {
    VaccinationService::new(
        SqliteVaccineRepository::new(conn),
        SqlitePersonRepository::new(conn),
        SqliteRecordRepository::new(conn),
    )
    .submit(
        &DoseSubmission {
            person_id: person.id,
            vaccine_id: vaccine.id,
            dose,
            applied_at: NaiveDate::from_ymd_opt(2025, month, day).unwrap(),
            lot: Some("L1".to_string()),
            location: Some("UBS Centro".to_string()),
        },
        false,
    )
    .unwrap()
}

fn cards(
    conn: &Connection,
) -> CardService<SqliteVaccineRepository<'_>, SqlitePersonRepository<'_>, SqliteRecordRepository<'_>>
{
    CardService::new(
        SqliteVaccineRepository::new(conn),
        SqlitePersonRepository::new(conn),
        SqliteRecordRepository::new(conn),
    )
}

#[test]
fn list_view_covers_exactly_the_person_records() {
    let conn = open_db_in_memory().unwrap();
    let fx = fixture(&conn);
    record(&conn, &fx.ana, &fx.hepb, DoseLabel::D2, (3, 1));
    record(&conn, &fx.ana, &fx.bcg, DoseLabel::D1, (2, 1));
    record(&conn, &fx.ana, &fx.hepb, DoseLabel::D1, (1, 1));
    record(&conn, &fx.bruno, &fx.rota, DoseLabel::D1, (1, 1));

    let CardView::List(card) = cards(&conn).project(fx.ana.id, CardFormat::List).unwrap() else {
        panic!("expected list view");
    };
    assert_eq!(card.person, fx.ana);

    let block_ids = card
        .vaccines
        .iter()
        .map(|block| block.vaccine_id)
        .collect::<Vec<_>>();
    assert_eq!(block_ids, vec![fx.hepb.id, fx.bcg.id]);
    assert_eq!(card.vaccines[0].vaccine_name, "HEPATITE B");

    let hepb_doses = card.vaccines[0]
        .entries
        .iter()
        .map(|entry| entry.dose)
        .collect::<Vec<_>>();
    assert_eq!(hepb_doses, vec![DoseLabel::D1, DoseLabel::D2]);
    assert_eq!(card.vaccines[0].entries[0].lot.as_deref(), Some("L1"));

    let listed = card
        .vaccines
        .iter()
        .flat_map(|block| block.entries.iter().map(|entry| entry.record_id))
        .collect::<HashSet<_>>();
    let stored = SqliteRecordRepository::new(&conn)
        .find_by_person(fx.ana.id)
        .unwrap()
        .into_iter()
        .map(|record| record.id)
        .collect::<HashSet<_>>();
    assert_eq!(listed, stored);
}

#[test]
fn matrix_view_spans_every_dose_and_catalog_vaccine() {
    let conn = open_db_in_memory().unwrap();
    let fx = fixture(&conn);
    let hepb_d1 = record(&conn, &fx.ana, &fx.hepb, DoseLabel::D1, (1, 1));
    let bcg_r2 = record(&conn, &fx.ana, &fx.bcg, DoseLabel::R2, (2, 1));
    record(&conn, &fx.bruno, &fx.rota, DoseLabel::D1, (1, 1));

    let CardView::Matrix(matrix) = cards(&conn).project(fx.ana.id, CardFormat::Matrix).unwrap()
    else {
        panic!("expected matrix view");
    };

    assert_eq!(matrix.rows.len(), 5);
    let col_names = matrix
        .cols
        .iter()
        .map(|col| col.vaccine_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(col_names, vec!["BCG", "HEPATITE B", "ROTAVÍRUS"]);
    assert!(matrix.grid.iter().all(|row| row.len() == 3));

    assert_eq!(
        matrix.cell(DoseLabel::D1, fx.hepb.id).map(|c| c.record_id),
        Some(hepb_d1.id)
    );
    assert_eq!(
        matrix.cell(DoseLabel::R2, fx.bcg.id).map(|c| c.record_id),
        Some(bcg_r2.id)
    );
    assert!(matrix.cell(DoseLabel::D1, fx.rota.id).is_none());
    assert_eq!(matrix.filled_cells(), 2);
}

#[test]
fn card_for_unknown_person_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    fixture(&conn);

    let missing = uuid::Uuid::new_v4();
    let err = cards(&conn).project(missing, CardFormat::List).unwrap_err();
    assert!(matches!(err, CardError::PersonNotFound(id) if id == missing));
    assert_eq!(err.status_hint(), 404);
}

#[test]
fn card_view_serializes_with_format_tag() {
    let conn = open_db_in_memory().unwrap();
    let fx = fixture(&conn);
    record(&conn, &fx.ana, &fx.bcg, DoseLabel::D1, (1, 10));

    let view = cards(&conn).project(fx.ana.id, CardFormat::Matrix).unwrap();
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["format"], "matrix");
    assert_eq!(json["rows"][0], "D1");
    assert_eq!(json["grid"][0][0]["applied_at"], "2025-01-10");
}
