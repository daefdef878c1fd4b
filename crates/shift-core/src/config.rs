//! controlshift.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::shift::ShiftSchedule;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_SUMMARIZER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub schedule: ShiftSchedule,
    #[serde(default)]
    pub controllers: ControllersConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Where the shift database lives. Without a path the dashboard runs
/// offline: nothing is stored and no feed ever fires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllersConfig {
    /// Quiet period after the last keystroke before controller names are written.
    pub debounce_ms: u64,
}

impl Default for ControllersConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: DEFAULT_SUMMARIZER_TIMEOUT_SECS,
        }
    }
}

impl ShiftConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: ShiftConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.schedule.validate()?;
        if let Some(endpoint) = &self.summarizer.endpoint {
            url::Url::parse(endpoint)
                .map_err(|e| anyhow::anyhow!("invalid summarizer endpoint {endpoint:?}: {e}"))?;
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Scaffold a config that stores data under `data_dir`.
    pub fn scaffold(data_dir: &Path) -> Self {
        ShiftConfig {
            store: StoreConfig {
                path: Some(data_dir.join("controlshift.redb")),
            },
            ..Default::default()
        }
    }
}
