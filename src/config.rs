//! Environment configuration for the report binaries
//!
//! Values come from the process environment (after `dotenv` has loaded any
//! `.env` file). Unset variables fall back to defaults; set but unparsable
//! ones are rejected.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendType {
    Jsonl,
    Sqlite,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

pub const DEFAULT_DB_PATH: &str = "data/benchflow.db";
pub const DEFAULT_REPORT_OUTPUT_PATH: &str = "reports/windows.jsonl";

/// Settings for the `window_report` and `result_summary` binaries
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub db_path: PathBuf,
    pub window_size_ms: i64,
    pub report_period_ms: i64,
    pub start_time_ms: i64,
    pub chart_only: bool,
    pub backend: BackendType,
    pub output_path: PathBuf,
    pub timeout: Option<Duration>,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(parse_backend_from_args(), |key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(backend: BackendType, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = PathBuf::from(
            lookup("BENCHFLOW_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
        );

        // The SQLite backend writes its windows next to the results by default
        let output_path = match lookup("REPORT_OUTPUT_PATH") {
            Some(path) => PathBuf::from(path),
            None => match backend {
                BackendType::Jsonl => PathBuf::from(DEFAULT_REPORT_OUTPUT_PATH),
                BackendType::Sqlite => db_path.clone(),
            },
        };

        let timeout = parse_var::<u64, _>(&lookup, "REPORT_TIMEOUT_SECS")?.map(Duration::from_secs);

        Ok(Self {
            window_size_ms: parse_var(&lookup, "WINDOW_SIZE_MS")?.unwrap_or(60_000),
            report_period_ms: parse_var(&lookup, "REPORT_PERIOD_MS")?.unwrap_or(10_000),
            start_time_ms: parse_var(&lookup, "REPORT_START_TIME_MS")?.unwrap_or(0),
            chart_only: parse_bool(&lookup, "CHART_ONLY")?.unwrap_or(true),
            db_path,
            backend,
            output_path,
            timeout,
        })
    }
}

/// Settings for the `seed_results` binary
#[derive(Debug, Clone, PartialEq)]
pub struct SeedConfig {
    pub db_path: PathBuf,
    pub event_count: u64,
    pub interval_ms: i64,
    pub event_names: Vec<String>,
}

impl SeedConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = PathBuf::from(
            lookup("BENCHFLOW_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
        );

        let interval_ms: i64 = parse_var(&lookup, "SEED_INTERVAL_MS")?.unwrap_or(10);
        if interval_ms < 0 {
            return Err(ConfigError::InvalidValue(format!(
                "SEED_INTERVAL_MS must not be negative, got {}",
                interval_ms
            )));
        }

        let event_names: Vec<String> = lookup("SEED_EVENT_NAMES")
            .unwrap_or_else(|| "login,search,logout".to_string())
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if event_names.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SEED_EVENT_NAMES must name at least one event".to_string(),
            ));
        }

        Ok(Self {
            db_path,
            event_count: parse_var(&lookup, "SEED_EVENT_COUNT")?.unwrap_or(1000),
            interval_ms,
            event_names,
        })
    }
}

pub fn parse_backend_from_args() -> BackendType {
    let args: Vec<String> = env::args().collect();
    backend_from_args(&args)
}

fn backend_from_args(args: &[String]) -> BackendType {
    if let Some(idx) = args.iter().position(|x| x == "--backend") {
        match args.get(idx + 1).map(|s| s.as_str()) {
            Some("sqlite") => return BackendType::Sqlite,
            Some("jsonl") => return BackendType::Jsonl,
            Some(other) => log::warn!("Unknown backend '{}', defaulting to jsonl", other),
            None => {}
        }
    }

    BackendType::Jsonl // Default to JSONL
}

/// Value following `flag` on the command line, if any
pub fn arg_value(flag: &str) -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|x| x == flag)
        .and_then(|idx| args.get(idx + 1).cloned())
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::InvalidValue(format!("{} must be a number, got '{}'", key, raw))
        }),
    }
}

fn parse_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue(format!(
                "{} must be true or false, got '{}'",
                key, raw
            ))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_report_config() {
        let config = ReportConfig::from_lookup(BackendType::Jsonl, vars(&[])).unwrap();

        assert_eq!(config.db_path, PathBuf::from("data/benchflow.db"));
        assert_eq!(config.window_size_ms, 60_000);
        assert_eq!(config.report_period_ms, 10_000);
        assert_eq!(config.start_time_ms, 0);
        assert!(config.chart_only);
        assert_eq!(config.output_path, PathBuf::from("reports/windows.jsonl"));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_custom_report_config() {
        let config = ReportConfig::from_lookup(
            BackendType::Sqlite,
            vars(&[
                ("BENCHFLOW_DB_PATH", "/tmp/results.db"),
                ("WINDOW_SIZE_MS", "300000"),
                ("REPORT_PERIOD_MS", "60000"),
                ("REPORT_START_TIME_MS", "1500"),
                ("CHART_ONLY", "false"),
                ("REPORT_TIMEOUT_SECS", "30"),
            ]),
        )
        .unwrap();

        assert_eq!(config.window_size_ms, 300_000);
        assert_eq!(config.report_period_ms, 60_000);
        assert_eq!(config.start_time_ms, 1500);
        assert!(!config.chart_only);
        assert_eq!(config.output_path, PathBuf::from("/tmp/results.db"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = ReportConfig::from_lookup(BackendType::Jsonl, vars(&[("WINDOW_SIZE_MS", "ten")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));

        let err = ReportConfig::from_lookup(BackendType::Jsonl, vars(&[("CHART_ONLY", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_seed_config() {
        let config = SeedConfig::from_lookup(vars(&[])).unwrap();
        assert_eq!(config.event_count, 1000);
        assert_eq!(config.interval_ms, 10);
        assert_eq!(config.event_names, vec!["login", "search", "logout"]);

        let config = SeedConfig::from_lookup(vars(&[("SEED_EVENT_NAMES", " upload , ,download")]))
            .unwrap();
        assert_eq!(config.event_names, vec!["upload", "download"]);

        assert!(SeedConfig::from_lookup(vars(&[("SEED_EVENT_NAMES", ",")])).is_err());
        assert!(SeedConfig::from_lookup(vars(&[("SEED_INTERVAL_MS", "-5")])).is_err());
    }

    #[test]
    fn test_backend_from_args() {
        let args = |s: &[&str]| s.iter().map(|a| a.to_string()).collect::<Vec<_>>();
        assert_eq!(backend_from_args(&args(&["bin"])), BackendType::Jsonl);
        assert_eq!(backend_from_args(&args(&["bin", "--backend", "sqlite"])), BackendType::Sqlite);
        assert_eq!(backend_from_args(&args(&["bin", "--backend", "jsonl"])), BackendType::Jsonl);
        assert_eq!(backend_from_args(&args(&["bin", "--backend"])), BackendType::Jsonl);
    }
}
