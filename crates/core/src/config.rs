use crate::config_error::CaskConfigError;
use serde::{Deserialize, Serialize};
use starbase_utils::toml;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const CONFIG_NAME: &str = "config.toml";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Seconds allowed for an entire download.
    pub timeout: u64,
    /// Seconds allowed to establish a connection.
    pub connect_timeout: u64,
    /// Retries for transient network failures.
    pub retries: u8,
    /// Initial backoff in milliseconds, doubled on every retry.
    pub backoff: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 600,
            connect_timeout: 30,
            retries: 2,
            backoff: 500,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstallConfig {
    /// Seconds allowed to unpack and place a bundle.
    pub timeout: u64,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self { timeout: 300 }
    }
}

impl InstallConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LockConfig {
    /// Seconds to wait for another install of the same cask to finish.
    pub wait: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { wait: 300 }
    }
}

/// Settings loaded from `~/.cask/config.toml`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CaskConfig {
    pub app_dir: Option<PathBuf>,
    pub fetch: FetchConfig,
    pub install: InstallConfig,
    pub lock: LockConfig,
}

impl CaskConfig {
    pub fn load_from<P: AsRef<Path>>(dir: P) -> Result<Self, CaskConfigError> {
        let path = dir.as_ref().join(CONFIG_NAME);

        if !path.exists() {
            return Ok(Self::default());
        }

        debug!(file = ?path, "Loading {}", CONFIG_NAME);

        let config: CaskConfig = toml::read_file(&path)?;

        if let Some(app_dir) = &config.app_dir
            && app_dir.is_relative()
        {
            return Err(CaskConfigError::RelativeAppDir {
                path: app_dir.to_owned(),
            });
        }

        Ok(config)
    }
}
