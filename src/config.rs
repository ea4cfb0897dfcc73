use crate::error::{ControllerError, Result};
use crate::global_variables::{
    CONFIG_ENV_VAR, GREEN_DURATION, MAX_PHASE_DURATION, YELLOW_DURATION,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Phase timings used by the controller.
///
/// Missing fields in a config file fall back to the protocol constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub green_secs: u64,
    pub yellow_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            green_secs: GREEN_DURATION.as_secs(),
            yellow_secs: YELLOW_DURATION.as_secs(),
        }
    }
}

impl ControllerConfig {
    // Reads and validates a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: ControllerConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        log::info!(
            "Loaded config from {}: green = {}s, yellow = {}s",
            path.as_ref().display(),
            config.green_secs,
            config.yellow_secs
        );
        Ok(config)
    }

    // Uses the file named by TLC_CONFIG if set, otherwise the defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    // Bounded so cycle deadlines can never overflow an Instant.
    pub fn validate(&self) -> Result<()> {
        let max_secs = MAX_PHASE_DURATION.as_secs();
        for (field, secs) in [("green_secs", self.green_secs), ("yellow_secs", self.yellow_secs)] {
            if secs == 0 {
                return Err(ControllerError::InvalidDuration { field });
            }
            if secs > max_secs {
                return Err(ControllerError::DurationTooLong { field, max_secs });
            }
        }
        Ok(())
    }

    pub fn green(&self) -> Duration {
        Duration::from_secs(self.green_secs)
    }

    pub fn yellow(&self) -> Duration {
        Duration::from_secs(self.yellow_secs)
    }

    /// Delay from a green expiry until the next cycle step: the outgoing
    /// yellow plus the incoming green.
    pub fn continuation(&self) -> Duration {
        self.yellow() + self.green()
    }
}
