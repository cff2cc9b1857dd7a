//! Runner configuration file
//!
//! ```json
//! {
//!   "control": { "filter": { "alpha": 0.3 } },
//!   "link": { "port": "/dev/ttyUSB0", "inter_byte_delay_us": 200 },
//!   "table": { "width": 640, "height": 480 }
//! }
//! ```
//!
//! Every section is optional.

use std::path::Path;

use puck_core::error::{CoreError, Result};
use puck_core::{ControlConfig, Table};
use serde::{Deserialize, Serialize};

/// Serial link options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub port: String,
    pub baud_rate: u32,
    /// Read/write timeout
    pub timeout_ms: u64,
    /// Wait after opening; the controller resets when the port opens
    pub settle_ms: u64,
    /// Pause between bytes for receivers with a tiny input buffer (0 = off)
    pub inter_byte_delay_us: u64,
    /// Minimum spacing of reopen attempts after a failure
    pub reconnect_interval_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            timeout_ms: 100,
            settle_ms: 2000,
            inter_byte_delay_us: 0,
            reconnect_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub link: LinkConfig,
    /// Table bounds; normally supplied by the calibration file instead
    #[serde(default)]
    pub table: Option<Table>,
}

impl RunnerConfig {
    /// Control preset from `PUCK_PROFILE`, default link, no table
    pub fn from_env_or_default() -> Self {
        Self {
            control: ControlConfig::from_env_or_default(),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&text)?;
        cfg.validate()?;
        log::debug!("Loaded runner config from {:?}", path);
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        self.control.validate()?;
        if let Some(table) = &self.table {
            table.validate()?;
        }
        if self.link.baud_rate == 0 {
            return Err(CoreError::InvalidConfig("link.baud_rate must be positive".into()));
        }
        if self.link.timeout_ms == 0 {
            return Err(CoreError::InvalidConfig("link.timeout_ms must be positive".into()));
        }
        Ok(())
    }
}
