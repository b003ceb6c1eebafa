//! Engine configuration.

use crate::error::ConfigError;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Settings a [`crate::PoolManager`] is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Account allowed to replace the protocol fee controller and collect
    /// protocol fees.
    pub owner: Address,
    /// Account of the protocol fee controller, also allowed to collect.
    #[serde(default)]
    pub protocol_fee_controller: Option<Address>,
}

impl ManagerConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            protocol_fee_controller: None,
        }
    }

    pub fn with_protocol_fee_controller(mut self, controller: Address) -> Self {
        self.protocol_fee_controller = Some(controller);
        self
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner == Address::ZERO {
            return Err(ConfigError::ZeroOwner);
        }
        Ok(())
    }
}
