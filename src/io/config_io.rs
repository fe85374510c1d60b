use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "TASKWISE_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("{path} already exists (use --force to overwrite)")]
    AlreadyExists { path: PathBuf },
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

pub const CONFIG_TEMPLATE: &str = r##"# taskwise configuration

[retention]
# Completed tasks older than this are removed when the task list is opened
days = 7

[ai]
# Any OpenAI-compatible chat completions endpoint
base_url = "https://api.openai.com"
model = "gpt-4o-mini"
# Environment variable holding the API key
api_key_env = "OPENAI_API_KEY"
timeout_secs = 60

[ai.retry]
# Task generation retries when the model service is unavailable (HTTP 503)
max_attempts = 3
base_delay_ms = 1000
"##;

/// Resolve the data directory: explicit flag, then `$TASKWISE_DIR`,
/// then `$XDG_DATA_HOME/taskwise`, then `~/.local/share/taskwise`.
pub fn resolve_data_dir(explicit: Option<&str>) -> PathBuf {
    if let Some(dir) = explicit {
        return PathBuf::from(dir);
    }
    if let Ok(dir) = std::env::var(DATA_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }
    let data_home = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".local").join("share"));
    data_home.join("taskwise")
}

/// Get the user's home directory
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read config.toml from the data directory. A missing file yields defaults.
pub fn read_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_path(data_dir);
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })
}

/// Write the commented default config. Refuses to overwrite unless `force`.
pub fn write_default_config(data_dir: &Path, force: bool) -> Result<PathBuf, ConfigError> {
    let path = config_path(data_dir);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists { path });
    }
    fs::create_dir_all(data_dir)?;
    fs::write(&path, CONFIG_TEMPLATE)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_default() {
        let dir = TempDir::new().unwrap();
        let config = read_config(dir.path()).unwrap();
        assert_eq!(config.retention.days, 7);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_default_config(dir.path(), false).unwrap();
        assert!(path.exists());
        let config = read_config(dir.path()).unwrap();
        assert_eq!(config.ai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.ai.retry.max_attempts, 3);
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        write_default_config(dir.path(), false).unwrap();
        assert!(matches!(
            write_default_config(dir.path(), false),
            Err(ConfigError::AlreadyExists { .. })
        ));
        assert!(write_default_config(dir.path(), true).is_ok());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[retention\ndays = ").unwrap();
        assert!(matches!(
            read_config(dir.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        assert_eq!(resolve_data_dir(Some("/tmp/tw")), PathBuf::from("/tmp/tw"));
    }
}
