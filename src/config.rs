//! Exit game configuration

use crate::constants::*;
use crate::error::{ExitGameError, Result};
use serde::{Deserialize, Serialize};

/// Tunable protocol parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExitGameConfig {
    /// Seconds a pending exit stays open to challenges.
    pub dispute_period: u64,
    /// Block number spacing between operator-submitted child blocks.
    /// Deposit blocks take the numbers in between.
    pub child_block_interval: u64,
}

impl Default for ExitGameConfig {
    fn default() -> Self {
        Self {
            dispute_period: DISPUTE_PERIOD,
            child_block_interval: CHILD_BLOCK_INTERVAL,
        }
    }
}

impl ExitGameConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ExitGameError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ExitGameError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.dispute_period == 0 {
            return Err(ExitGameError::Serialization(
                "dispute_period must be non-zero".to_string(),
            ));
        }
        // An interval of 1 leaves no room for deposit blocks
        if self.child_block_interval < 2 || self.child_block_interval > MAX_BLOCK_NUMBER {
            return Err(ExitGameError::Serialization(format!(
                "child_block_interval {} out of range",
                self.child_block_interval
            )));
        }
        Ok(())
    }
}
