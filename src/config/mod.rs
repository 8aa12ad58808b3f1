use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERIAL_DEVICE: &str = "/dev/ttyUSB0";
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 10;

/// Persistent daemon settings, stored as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Port name of the IR decoder, matched exactly against enumeration.
    pub serial_device: String,
    /// Scheduler period in milliseconds.
    pub tick_interval_ms: u64,
    pub debug: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            serial_device: DEFAULT_SERIAL_DEVICE.to_string(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            debug: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl DaemonConfig {
    /// Load from `path`. A missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        log::info!("configuration saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.serial_device.trim().is_empty() {
            return Err(ConfigError::Invalid("serial_device must not be empty".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".to_string()));
        }
        Ok(())
    }
}
