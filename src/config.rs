/// Limits and logging settings shared by every process using the file subsystem

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Descriptor slots per process, standard input and output included.
pub const DEFAULT_MAX_FDS: usize = 16;
/// Longest file name a syscall argument can carry.
pub const DEFAULT_MAX_NAME_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    pub max_fds: usize,
    pub max_name_len: usize,
    pub log_path: PathBuf,
    pub log_level: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        FsConfig {
            max_fds: DEFAULT_MAX_FDS,
            max_name_len: DEFAULT_MAX_NAME_LEN,
            log_path: PathBuf::from("userfs.log"),
            log_level: "info".to_string(),
        }
    }
}

impl FsConfig {
    pub fn new(max_fds: usize, max_name_len: usize) -> Self {
        FsConfig {
            max_fds,
            max_name_len,
            ..FsConfig::default()
        }
    }

    /// Reads a JSON config file. Fields left out keep their default value.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: FsConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // slots 0 and 1 are reserved, at least one must be left for user files
        if self.max_fds < 3 {
            anyhow::bail!("max_fds must be at least 3, got {}", self.max_fds);
        }
        if self.max_name_len == 0 {
            anyhow::bail!("max_name_len must be positive");
        }
        Ok(())
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

lazy_static! {
    pub static ref GLOBAL_FS_CONFIG: Mutex<FsConfig> = Mutex::new(FsConfig::default());
}

/// Snapshot of the process-wide config.
pub fn current_config() -> FsConfig {
    GLOBAL_FS_CONFIG
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Replaces the process-wide config after validating it.
pub fn install_config(config: FsConfig) -> Result<()> {
    config.validate()?;
    *GLOBAL_FS_CONFIG
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("userfs-config-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_defaults() {
        let config = FsConfig::default();
        assert_eq!(config.max_fds, 16);
        assert_eq!(config.max_name_len, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let path = temp_path("partial.json");
        fs::write(&path, r#"{ "max_fds": 8, "log_level": "debug" }"#).unwrap();
        let config = FsConfig::from_json_file(&path).unwrap();
        assert_eq!(config.max_fds, 8);
        assert_eq!(config.max_name_len, DEFAULT_MAX_NAME_LEN);
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_rejects_too_few_slots() {
        let path = temp_path("small.json");
        fs::write(&path, r#"{ "max_fds": 2 }"#).unwrap();
        assert!(FsConfig::from_json_file(&path).is_err());
        fs::remove_file(&path).unwrap();
        assert!(FsConfig::new(16, 0).validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(FsConfig::from_json_file(temp_path("missing.json")).is_err());
    }
}
