//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{AppConfig, LogLevel};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming the TOML config file.
pub const ENV_CONFIG: &str = "NETPANEL_CONFIG";
/// Environment override for `log.level`.
pub const ENV_LOG_LEVEL: &str = "NETPANEL_LOG_LEVEL";
/// Environment override for `database.folder`.
pub const ENV_DB_FOLDER: &str = "NETPANEL_DB_FOLDER";
/// Environment override for `log.debug`.
pub const ENV_DEBUG: &str = "NETPANEL_DEBUG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load the process configuration: optional file, then environment overrides.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    let config = match std::env::var_os(ENV_CONFIG) {
        Some(path) => read_config(Path::new(&path))?,
        None => AppConfig::default(),
    };
    resolve(config, |key| std::env::var(key).ok())
}

/// Apply overrides from `lookup` and validate the result.
pub fn resolve<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();

    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        match LogLevel::parse(&level) {
            Some(level) => config.log.level = level,
            None => errors.push(ValidationError::UnknownLogLevel(level)),
        }
    }
    if let Some(folder) = lookup(ENV_DB_FOLDER) {
        config.database.folder = PathBuf::from(folder);
    }
    if let Some(debug) = lookup(ENV_DEBUG) {
        config.log.debug = matches!(debug.trim(), "1" | "true" | "yes");
    }

    if let Err(more) = validate_config(&config) {
        errors.extend(more);
    }
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors));
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = resolve(
            AppConfig::default(),
            env(&[(ENV_LOG_LEVEL, "debug"), (ENV_DB_FOLDER, "/tmp/panel"), (ENV_DEBUG, "true")]),
        )
        .unwrap();
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.database.folder, PathBuf::from("/tmp/panel"));
        assert!(config.log.debug);
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let err = resolve(AppConfig::default(), env(&[(ENV_LOG_LEVEL, "chatty")])).unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::UnknownLogLevel("chatty".into())]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[log]\nlevel = \"warn\"\n\n[lifecycle]\nstart_timeout_secs = 5\n"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.log.level, LogLevel::Warn);
        assert_eq!(config.lifecycle.start_timeout_secs, 5);
        assert_eq!(config.lifecycle.stop_timeout_secs, 30);
    }

    #[test]
    fn test_unknown_level_in_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[log]\nlevel = \"loud\"").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }
}
