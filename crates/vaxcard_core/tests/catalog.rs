use rusqlite::params;
use vaxcard_core::db::open_db_in_memory;
use vaxcard_core::{
    CatalogError, CatalogLookup, CatalogService, DoseLabel, NewVaccine, SqliteVaccineRepository,
    DEFAULT_CATALOG, DOSE_ORDER,
};

fn new_vaccine(name: &str, code: &str, allowed: Option<Vec<DoseLabel>>) -> NewVaccine {
    NewVaccine {
        name: name.to_string(),
        code: code.to_string(),
        allowed_doses: allowed,
    }
}

#[test]
fn create_defaults_to_full_dose_order_and_reads_back() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteVaccineRepository::new(&conn));

    let created = service
        .create_vaccine(&new_vaccine("Hepatite B", "hepb", None))
        .unwrap();
    assert_eq!(created.allowed_doses.as_slice(), &DOSE_ORDER);

    let loaded = service.get_vaccine(created.id).unwrap();
    assert_eq!(loaded, created);
    assert_eq!(
        service.get_vaccine_by_code("hepb").unwrap().map(|v| v.id),
        Some(created.id)
    );
}

#[test]
fn explicit_allowed_set_is_normalized_to_global_order() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteVaccineRepository::new(&conn));

    let created = service
        .create_vaccine(&new_vaccine(
            "Hepatite B",
            "hepb",
            Some(vec![DoseLabel::R1, DoseLabel::D1, DoseLabel::D2, DoseLabel::D3]),
        ))
        .unwrap();
    let loaded = service.get_vaccine(created.id).unwrap();
    assert_eq!(
        loaded.allowed_doses.as_slice(),
        &[DoseLabel::D1, DoseLabel::D2, DoseLabel::D3, DoseLabel::R1]
    );
}

#[test]
fn duplicate_code_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteVaccineRepository::new(&conn));

    service
        .create_vaccine(&new_vaccine("Hepatite B", "hepb", None))
        .unwrap();
    let err = service
        .create_vaccine(&new_vaccine("Hep B again", "hepb", None))
        .unwrap_err();
    assert!(matches!(err, CatalogError::CodeConflict(ref code) if code == "hepb"));
    assert_eq!(err.status_hint(), 409);
}

#[test]
fn invalid_code_is_rejected_before_insert() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteVaccineRepository::new(&conn));

    let err = service
        .create_vaccine(&new_vaccine("Hepatite B", "Hep B", None))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Invalid(_)));
    assert!(service.list_vaccines().unwrap().is_empty());
}

#[test]
fn list_is_sorted_by_name() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteVaccineRepository::new(&conn));

    for (name, code) in [("Rotavirus", "rota"), ("BCG", "bcg"), ("Hepatite B", "hepb")] {
        service.create_vaccine(&new_vaccine(name, code, None)).unwrap();
    }

    let names = service
        .list_vaccines()
        .unwrap()
        .into_iter()
        .map(|vaccine| vaccine.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["BCG", "Hepatite B", "Rotavirus"]);
}

#[test]
fn corrupt_allowed_set_falls_back_to_default_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteVaccineRepository::new(&conn);
    let service = CatalogService::new(repo);

    let created = service
        .create_vaccine(&new_vaccine("BCG", "bcg", Some(vec![DoseLabel::D1])))
        .unwrap();
    conn.execute(
        "UPDATE vaccines SET allowed_doses = ?1 WHERE id = ?2;",
        params!["{broken", created.id.to_string()],
    )
    .unwrap();

    let loaded = repo.get_vaccine(created.id).unwrap().unwrap();
    assert_eq!(loaded.allowed_doses.as_slice(), &DOSE_ORDER);
}

#[test]
fn seed_defaults_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteVaccineRepository::new(&conn));
    service
        .create_vaccine(&new_vaccine("BCG", "bcg", None))
        .unwrap();

    let first = service.seed_defaults().unwrap();
    assert_eq!(first.created.len(), DEFAULT_CATALOG.len() - 1);
    assert_eq!(first.already_present, vec!["bcg".to_string()]);

    let second = service.seed_defaults().unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.already_present.len(), DEFAULT_CATALOG.len());
    assert_eq!(service.list_vaccines().unwrap().len(), DEFAULT_CATALOG.len());
}

#[test]
fn delete_missing_vaccine_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = CatalogService::new(SqliteVaccineRepository::new(&conn));

    let missing = uuid::Uuid::new_v4();
    assert!(matches!(
        service.delete_vaccine(missing),
        Err(CatalogError::VaccineNotFound(id)) if id == missing
    ));
}
