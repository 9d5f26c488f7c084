use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use catalog::ResolverPolicy;
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;

const DEFAULT_DB_PATH: &str = "mp3.redb";
const DEFAULT_LOG_PATH: &str = "mp3base.log";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub version: u32,
    pub db_path: String,
    pub log_path: String,
    pub resolver: ResolverPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            db_path: DEFAULT_DB_PATH.to_string(),
            log_path: DEFAULT_LOG_PATH.to_string(),
            resolver: ResolverPolicy::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("MP3BASE_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("mp3base.yaml"))
            .unwrap_or_else(|| PathBuf::from("mp3base.yaml")),
        Err(_) => PathBuf::from("mp3base.yaml"),
    }
}

pub fn load_config(path: &Path) -> Result<IngestConfig, ConfigError> {
    if !path.exists() {
        return Ok(IngestConfig::default());
    }
    let contents = fs::read_to_string(path)?;
    let mut config: IngestConfig = serde_yaml::from_str(&contents)?;
    if config.version < CONFIG_VERSION {
        config.version = CONFIG_VERSION;
    }
    if config.db_path.trim().is_empty() {
        config.db_path = DEFAULT_DB_PATH.to_string();
    }
    if config.log_path.trim().is_empty() {
        config.log_path = DEFAULT_LOG_PATH.to_string();
    }
    if !(0.0..=1.0).contains(&config.resolver.similarity_threshold) {
        config.resolver.similarity_threshold = ResolverPolicy::default().similarity_threshold;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.db_path, "mp3.redb");
        assert_eq!(config.log_path, "mp3base.log");
        assert_eq!(config.resolver.max_suggestions, 5);
        assert!(config.resolver.confirm_unmatched);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mp3base.yaml");
        fs::write(
            &path,
            "db_path: \"\"\nresolver:\n  confirm_unmatched: false\n  similarity_threshold: 3.0\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.db_path, "mp3.redb");
        assert!(!config.resolver.confirm_unmatched);
        assert_eq!(config.resolver.similarity_threshold, 0.8);
        assert_eq!(config.resolver.placeholder_names.len(), 5);
    }

    #[test]
    fn broken_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mp3base.yaml");
        fs::write(&path, "resolver: [unclosed\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Yaml(_))));
    }
}
