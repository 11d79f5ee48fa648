//! Environment-driven CLI configuration.
//!
//! Values come from the process environment (after loading `.env` when
//! present); command-line flags override them in `main`.

use std::env;
use std::fmt;
use std::path::PathBuf;
use vaxcard_core::{default_log_level, SequencePolicy};

const DEFAULT_DB_PATH: &str = "./vaccines.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling logs; logging stays off when unset.
    pub log_dir: Option<String>,
    pub enforce_sequence: bool,
    pub sequence_policy: SequencePolicy,
}

impl CliConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let enforce_sequence = match non_empty("VAXCARD_ENFORCE_SEQUENCE") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidBool {
                key: "VAXCARD_ENFORCE_SEQUENCE",
                value,
            })?,
            None => true,
        };

        let sequence_policy = match non_empty("VAXCARD_SEQUENCE_POLICY") {
            Some(value) => {
                SequencePolicy::parse(&value).ok_or(ConfigError::InvalidPolicy(value))?
            }
            None => SequencePolicy::default(),
        };

        Ok(Self {
            db_path: non_empty("VAXCARD_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            log_level: non_empty("VAXCARD_LOG_LEVEL")
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: non_empty("VAXCARD_LOG_DIR"),
            enforce_sequence,
            sequence_policy,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidBool { key: &'static str, value: String },
    InvalidPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidBool { key, value } => {
                write!(f, "{key} must be a boolean, got `{value}`")
            }
            ConfigError::InvalidPolicy(value) => write!(
                f,
                "VAXCARD_SEQUENCE_POLICY must be `global` or `allowed`, got `{value}`"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
