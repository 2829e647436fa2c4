use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_VAR: &str = "HOSTINV_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse TOML in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Deadline for each probe
    pub probe_timeout: Duration,
    /// Processes kept in a snapshot, 0 keeps all
    pub process_limit: usize,
    pub sys_path: PathBuf,
    pub log_level: String,
    /// Pretty-print the JSON snapshot
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(10_000),
            process_limit: 50,
            sys_path: PathBuf::from("/sys"),
            log_level: "info".to_string(),
            pretty: true,
        }
    }
}

/// Keys accepted in the config file, all optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    probe_timeout_ms: Option<u64>,
    process_limit: Option<usize>,
    sys_path: Option<PathBuf>,
    log_level: Option<String>,
    pretty: Option<bool>,
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Defaults, then the file named by `HOSTINV_CONFIG`, then `HOSTINV_*` variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup(CONFIG_PATH_VAR) {
            config.apply_file(Self::read_file(&path)?);
        }

        if let Some(ms) = lookup("HOSTINV_PROBE_TIMEOUT_MS").and_then(|s| s.parse().ok()) {
            config.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(limit) = lookup("HOSTINV_PROCESS_LIMIT").and_then(|s| s.parse().ok()) {
            config.process_limit = limit;
        }
        if let Some(path) = lookup("HOSTINV_SYS_PATH") {
            config.sys_path = PathBuf::from(path);
        }
        if let Some(level) = lookup("HOSTINV_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(pretty) = lookup("HOSTINV_PRETTY").as_deref().and_then(parse_flag) {
            config.pretty = pretty;
        }

        config.validate()?;
        Ok(config)
    }

    fn read_file(path: impl AsRef<Path>) -> Result<FileConfig, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(ms) = file.probe_timeout_ms {
            self.probe_timeout = Duration::from_millis(ms);
        }
        if let Some(limit) = file.process_limit {
            self.process_limit = limit;
        }
        if let Some(path) = file.sys_path {
            self.sys_path = path;
        }
        if let Some(level) = file.log_level {
            self.log_level = level;
        }
        if let Some(pretty) = file.pretty {
            self.pretty = pretty;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "probe_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Validation(
                "log_level must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("hostinv-{}-{}.toml", name, std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert_eq!(config.process_limit, 50);
        assert!(config.pretty);
    }

    #[test]
    fn test_env_overrides_file() {
        let path = temp_file(
            "layered",
            "probe_timeout_ms = 2500\nprocess_limit = 0\nlog_level = \"debug\"\npretty = false\n",
        );
        let config = Config::from_lookup(lookup(&[
            (CONFIG_PATH_VAR, path.to_str().unwrap()),
            ("HOSTINV_PROCESS_LIMIT", "15"),
            ("HOSTINV_SYS_PATH", "/host/sys"),
        ]))
        .unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.probe_timeout, Duration::from_millis(2500));
        assert_eq!(config.process_limit, 15);
        assert_eq!(config.sys_path, PathBuf::from("/host/sys"));
        assert_eq!(config.log_level, "debug");
        assert!(!config.pretty);
    }

    #[test]
    fn test_invalid_env_values_are_ignored() {
        let config = Config::from_lookup(lookup(&[
            ("HOSTINV_PROBE_TIMEOUT_MS", "soon"),
            ("HOSTINV_PRETTY", "maybe"),
        ]))
        .unwrap();
        assert_eq!(config.probe_timeout, Duration::from_secs(10));
        assert!(config.pretty);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = Config::from_lookup(lookup(&[("HOSTINV_PROBE_TIMEOUT_MS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_bad_file() {
        let missing = Config::from_lookup(lookup(&[(CONFIG_PATH_VAR, "/nonexistent/hostinv.toml")]))
            .unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));

        let path = temp_file("unknown-key", "poll_interval = 5\n");
        let unknown = Config::from_lookup(lookup(&[(CONFIG_PATH_VAR, path.to_str().unwrap())]))
            .unwrap_err();
        fs::remove_file(&path).unwrap();
        assert!(matches!(unknown, ConfigError::Parse { .. }));
    }
}
