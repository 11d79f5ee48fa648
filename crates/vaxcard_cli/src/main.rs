//! `vaxcard` command-line entry point.
//!
//! # Responsibility
//! - Wire configuration, logging and the SQLite store to core services.
//! - Print results as JSON for scripting.

mod config;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use config::CliConfig;
use log::warn;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;
use vaxcard_core::db::migrations::schema_version;
use vaxcard_core::db::open_db;
use vaxcard_core::{
    init_logging, CardFormat, CardService, CatalogService, DoseLabel, DoseSubmission, NewPerson,
    NewVaccine, PersonService, SequencePolicy, Sex, SqlitePersonRepository, SqliteRecordRepository,
    SqliteVaccineRepository, VaccinationService,
};

#[derive(Parser, Debug)]
#[command(name = "vaxcard", about = "Keep vaccination cards from the command line", version)]
struct Cli {
    /// SQLite database file (overrides VAXCARD_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Prerequisite ordering: `global` or `allowed` (overrides VAXCARD_SEQUENCE_POLICY)
    #[arg(long, global = true)]
    policy: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core health, version and schema version
    Ping,
    /// Create the standard vaccine catalog, skipping existing codes
    Seed,
    /// List the vaccine catalog
    Vaccines,
    /// Register a vaccine
    AddVaccine {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        /// Comma-separated dose labels, e.g. `D1,D2,D3,R1`; defaults to all
        #[arg(long, value_delimiter = ',')]
        allowed: Option<Vec<DoseLabel>>,
    },
    /// Delete a vaccine and every dose recorded for it
    DeleteVaccine { id: Uuid },
    /// Register a person
    AddPerson {
        #[arg(long)]
        name: String,
        #[arg(long)]
        document: String,
        #[arg(long)]
        sex: Sex,
        #[arg(long)]
        age: u8,
    },
    /// List registered people
    People,
    /// Delete a person and their whole history
    DeletePerson { id: Uuid },
    /// Record an administered dose
    RecordDose {
        #[arg(long)]
        person: Uuid,
        #[arg(long)]
        vaccine: Uuid,
        #[arg(long)]
        dose: DoseLabel,
        /// Date applied, `YYYY-MM-DD`
        #[arg(long)]
        applied_at: NaiveDate,
        #[arg(long)]
        lot: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Accept the dose even if earlier doses are missing
        #[arg(long)]
        skip_sequence: bool,
    },
    /// Show one dose record
    GetDose { id: Uuid },
    /// Delete one dose record
    DeleteDose { id: Uuid },
    /// Render a person's vaccination card
    Card {
        person: Uuid,
        #[arg(long, default_value_t = CardFormat::List)]
        format: CardFormat,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = CliConfig::load()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(policy) = cli.policy.as_deref() {
        config.sequence_policy = SequencePolicy::parse(policy)
            .ok_or_else(|| format!("unknown policy `{policy}`; expected global|allowed"))?;
    }
    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let conn = open_db(&config.db_path)?;
    let vaccines = SqliteVaccineRepository::new(&conn);
    let people = SqlitePersonRepository::new(&conn);
    let records = SqliteRecordRepository::new(&conn);
    let catalog = CatalogService::new(vaccines);
    let registry = PersonService::new(people);
    let vaccinations =
        VaccinationService::new(vaccines, people, records).with_policy(config.sequence_policy);

    let output = match cli.command {
        Command::Ping => json!({
            "ping": vaxcard_core::ping(),
            "version": vaxcard_core::core_version(),
            "schema_version": schema_version(&conn)?,
        }),
        Command::Seed => {
            let report = catalog.seed_defaults()?;
            json!({ "created": report.created, "already_present": report.already_present })
        }
        Command::Vaccines => serde_json::to_value(catalog.list_vaccines()?)?,
        Command::AddVaccine {
            name,
            code,
            allowed,
        } => serde_json::to_value(catalog.create_vaccine(&NewVaccine {
            name,
            code,
            allowed_doses: allowed,
        })?)?,
        Command::DeleteVaccine { id } => {
            catalog.delete_vaccine(id)?;
            json!({ "deleted": id })
        }
        Command::AddPerson {
            name,
            document,
            sex,
            age,
        } => serde_json::to_value(registry.create_person(&NewPerson {
            name,
            document,
            sex,
            age,
        })?)?,
        Command::People => serde_json::to_value(registry.list_people()?)?,
        Command::DeletePerson { id } => {
            registry.delete_person(id)?;
            json!({ "deleted": id })
        }
        Command::RecordDose {
            person,
            vaccine,
            dose,
            applied_at,
            lot,
            location,
            skip_sequence,
        } => {
            let submission = DoseSubmission {
                person_id: person,
                vaccine_id: vaccine,
                dose,
                applied_at,
                lot,
                location,
            };
            let enforce_sequence = config.enforce_sequence && !skip_sequence;
            match vaccinations.submit(&submission, enforce_sequence) {
                Ok(record) => serde_json::to_value(record)?,
                Err(err) => {
                    warn!(
                        "event=cli_record_dose module=cli status=error error_code={}",
                        err.error_code()
                    );
                    return Err(format!(
                        "{err} (code={}, status={})",
                        err.error_code(),
                        err.status_hint()
                    )
                    .into());
                }
            }
        }
        Command::GetDose { id } => serde_json::to_value(vaccinations.get_record(id)?)?,
        Command::DeleteDose { id } => {
            vaccinations.delete_record(id)?;
            json!({ "deleted": id })
        }
        Command::Card { person, format } => {
            let cards = CardService::new(vaccines, people, records);
            serde_json::to_value(cards.project(person, format)?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use vaxcard_core::{CardFormat, DoseLabel};

    #[test]
    fn parses_record_dose_arguments() {
        let person = uuid::Uuid::new_v4();
        let vaccine = uuid::Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "vaxcard",
            "record-dose",
            "--person",
            &person.to_string(),
            "--vaccine",
            &vaccine.to_string(),
            "--dose",
            "d2",
            "--applied-at",
            "2025-02-10",
            "--skip-sequence",
        ])
        .unwrap();

        match cli.command {
            Command::RecordDose {
                dose,
                skip_sequence,
                ..
            } => {
                assert_eq!(dose, DoseLabel::D2);
                assert!(skip_sequence);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_allowed_dose_list_and_card_format() {
        let cli = Cli::try_parse_from([
            "vaxcard",
            "add-vaccine",
            "--name",
            "Hepatite B",
            "--code",
            "hepb",
            "--allowed",
            "D1,D2,D3,R1",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::AddVaccine { allowed: Some(ref labels), .. } if labels.len() == 4
        ));

        let person = uuid::Uuid::new_v4().to_string();
        let cli =
            Cli::try_parse_from(["vaxcard", "card", person.as_str(), "--format", "matrix"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Card {
                format: CardFormat::Matrix,
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_dose_label() {
        let parsed = Cli::try_parse_from([
            "vaxcard", "add-vaccine", "--name", "X", "--code", "x", "--allowed", "D9",
        ]);
        assert!(parsed.is_err());
    }
}
