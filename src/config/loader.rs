//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::SiteConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable selecting the listening port.
pub const PORT_VAR: &str = "PORT";

/// Environment variable pointing at an optional TOML config file.
pub const CONFIG_PATH_VAR: &str = "ZR_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid PORT value {0:?}")]
    Port(String),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: SiteConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the runtime configuration from the process environment.
///
/// `ZR_CONFIG` names an optional file; without it the defaults apply.
/// `PORT` always wins over the file.
pub fn load_from_env() -> Result<SiteConfig, ConfigError> {
    let file = std::env::var_os(CONFIG_PATH_VAR);
    let port = std::env::var(PORT_VAR).ok();
    resolve(file.as_deref().map(Path::new), port.as_deref())
}

/// Environment-free core of [`load_from_env`].
pub fn resolve(file: Option<&Path>, port: Option<&str>) -> Result<SiteConfig, ConfigError> {
    let mut config = match file {
        Some(path) => load_config(path)?,
        None => SiteConfig::default(),
    };

    if let Some(port) = port {
        config.listener.port = parse_port(port)?;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(SiteConfig::default().listener.port);
    }
    trimmed
        .parse::<u16>()
        .map_err(|_| ConfigError::Port(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_without_file_or_port() {
        let config = resolve(None, None).unwrap();
        assert_eq!(config.listener.port, 3000);
    }

    #[test]
    fn port_overrides_default() {
        let config = resolve(None, Some("8081")).unwrap();
        assert_eq!(config.listener.port, 8081);
    }

    #[test]
    fn empty_port_falls_back_to_default() {
        let config = resolve(None, Some("")).unwrap();
        assert_eq!(config.listener.port, 3000);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = resolve(None, Some("eighty")).unwrap_err();
        assert!(matches!(err, ConfigError::Port(ref v) if v == "eighty"));

        let err = resolve(None, Some("70000")).unwrap_err();
        assert!(matches!(err, ConfigError::Port(_)));
    }

    #[test]
    fn port_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listener]\nport = 9000\nhost = \"127.0.0.1\"").unwrap();

        let config = resolve(Some(file.path()), Some("9100")).unwrap();
        assert_eq!(config.listener.port, 9100);
        assert_eq!(config.listener.host, "127.0.0.1");
    }

    #[test]
    fn invalid_file_reports_every_problem() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[rate_limit.global]\nwindow_secs = 0\nmax_requests = 0\nmessage = \"x\"\n\n[timeouts]\nrequest_secs = 0"
        )
        .unwrap();

        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
