use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::AmrError;
use crate::release::{DEFAULT_BASE_URL, Release};

pub const DEFAULT_CONFIG_FILE: &str = "patric-amr.json";
pub const DEFAULT_THROTTLE_MS: u64 = 2000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub throttle_ms: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub release: Release,
    pub data_dir: Utf8PathBuf,
    pub throttle: Duration,
    pub timeout: Duration,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path`, or `patric-amr.json` in the current directory when no
    /// path is given. Only an explicitly named file is required to exist.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, AmrError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| AmrError::ConfigRead(config_path.display().to_string()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| AmrError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, AmrError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let release = Release::new(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let data_dir = match config.data_dir {
            Some(dir) => Utf8PathBuf::from(dir),
            None => default_data_dir()?,
        };
        if config.timeout_secs == Some(0) {
            return Err(AmrError::ConfigParse(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            schema_version,
            release,
            data_dir,
            throttle: Duration::from_millis(config.throttle_ms.unwrap_or(DEFAULT_THROTTLE_MS)),
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

pub fn default_data_dir() -> Result<Utf8PathBuf, AmrError> {
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("patric-amr")).ok()
        })
        .ok_or_else(|| AmrError::Filesystem("unable to resolve data directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_config() {
        let config = Config {
            data_dir: Some("/tmp/patric".to_string()),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.release.base_url().as_str(), DEFAULT_BASE_URL);
        assert_eq!(resolved.data_dir, Utf8PathBuf::from("/tmp/patric"));
        assert_eq!(resolved.throttle, Duration::from_millis(DEFAULT_THROTTLE_MS));
    }
}
