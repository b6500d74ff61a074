//! Runtime configuration from `NEPHROLENS_*` environment variables.
//!
//! Every setting has a default; an unparseable value falls back to its
//! default and is recorded in [`AppConfig::warnings`]. Configuration is read
//! before the subscriber exists, so `main` logs those at `warn` once
//! tracing is up.

use std::path::PathBuf;

use crate::domain::MdrdCoefficients;

pub const DB_PATH_VAR: &str = "NEPHROLENS_DB_PATH";
pub const LOG_MODE_VAR: &str = "NEPHROLENS_LOG_MODE";
pub const LOG_FILE_VAR: &str = "NEPHROLENS_LOG_FILE";
pub const MDRD_CONVENTION_VAR: &str = "NEPHROLENS_MDRD_CONVENTION";
pub const RECENT_LIMIT_VAR: &str = "NEPHROLENS_RECENT_LIMIT";

const DEFAULT_DB_PATH: &str = "nephrolens.db";
const DEFAULT_LOG_FILE: &str = "nephrolens.log";
const DEFAULT_RECENT_LIMIT: usize = 10;

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    /// File when stdout is a terminal (the TUI owns it), stdout otherwise.
    #[default]
    Auto,
    File,
    Stdout,
}

impl LogMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "file" => Some(Self::File),
            "stdout" => Some(Self::Stdout),
            _ => None,
        }
    }

    /// Resolve `Auto` against whether stdout is interactive.
    #[must_use]
    pub fn use_file(self, interactive: bool) -> bool {
        match self {
            Self::File => true,
            Self::Stdout => false,
            Self::Auto => interactive,
        }
    }
}

fn parse_convention(raw: &str) -> Option<MdrdCoefficients> {
    match raw.trim().to_lowercase().as_str() {
        "original" | "186" => Some(MdrdCoefficients::ORIGINAL),
        "idms" | "175" => Some(MdrdCoefficients::IDMS),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
    pub coefficients: MdrdCoefficients,
    /// Calculations shown on the dashboard and used for the stage summary
    pub recent_limit: usize,
    /// Rejected settings, one message each
    pub warnings: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_mode: LogMode::Auto,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            coefficients: MdrdCoefficients::default(),
            recent_limit: DEFAULT_RECENT_LIMIT,
            warnings: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns the raw value of a
    /// variable if it is set.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut warnings = Vec::new();

        let log_mode = match get(LOG_MODE_VAR) {
            None => defaults.log_mode,
            Some(raw) => LogMode::parse(&raw).unwrap_or_else(|| {
                warnings.push(format!("Ignoring {LOG_MODE_VAR}={raw:?}, expected auto|file|stdout"));
                defaults.log_mode
            }),
        };

        let coefficients = match get(MDRD_CONVENTION_VAR) {
            None => defaults.coefficients,
            Some(raw) => parse_convention(&raw).unwrap_or_else(|| {
                warnings.push(format!(
                    "Ignoring {MDRD_CONVENTION_VAR}={raw:?}, expected original|186|idms|175"
                ));
                defaults.coefficients
            }),
        };

        let recent_limit = match get(RECENT_LIMIT_VAR) {
            None => defaults.recent_limit,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warnings.push(format!(
                        "Ignoring {RECENT_LIMIT_VAR}={raw:?}, expected a positive integer"
                    ));
                    defaults.recent_limit
                }
            },
        };

        Self {
            db_path: get(DB_PATH_VAR).map_or(defaults.db_path, PathBuf::from),
            log_mode,
            log_file: get(LOG_FILE_VAR).map_or(defaults.log_file, PathBuf::from),
            coefficients,
            recent_limit,
            warnings,
        }
    }
}
