//! Service configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

use crate::domain::{Wipe, DEFAULT_POOL_CAPACITY, MAX_POOL_CAPACITY};

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {variable}: {value:?}")]
    InvalidValue {
        /// Variable name.
        variable: &'static str,
        /// Raw value.
        value: String,
    },

    /// Pool capacity outside `1..=MAX_POOL_CAPACITY`.
    #[error("Pool capacity {capacity} out of range (1..={max})")]
    CapacityOutOfRange {
        /// Requested capacity.
        capacity: usize,
        /// Largest supported capacity.
        max: usize,
    },
}

/// When released slots are zeroized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WipePolicy {
    /// Only a failed setup zeroizes; other releases leave the payload for
    /// the next setup to overwrite.
    #[default]
    OnFailedSetup,
    /// Every release zeroizes.
    Always,
}

impl WipePolicy {
    /// Wipe applied on update failure, finish and abort.
    pub fn terminal_wipe(self) -> Wipe {
        match self {
            WipePolicy::OnFailedSetup => Wipe::Skip,
            WipePolicy::Always => Wipe::Zeroize,
        }
    }
}

/// Configuration of one service instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Number of operations that can be live at once.
    pub pool_capacity: usize,

    /// Release wipe policy.
    pub wipe_policy: WipePolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            wipe_policy: WipePolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SP_POOL_CAPACITY`: live operation limit (default: 8, max: 64)
    /// - `SP_WIPE_ALWAYS`: zeroize on every release (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("SP_POOL_CAPACITY") {
            config.pool_capacity = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                variable: "SP_POOL_CAPACITY",
                value: value.clone(),
            })?;
        }

        if let Some(value) = lookup("SP_WIPE_ALWAYS") {
            let always = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        variable: "SP_WIPE_ALWAYS",
                        value,
                    })
                }
            };
            if always {
                config.wipe_policy = WipePolicy::Always;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration can build a service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_capacity == 0 || self.pool_capacity > MAX_POOL_CAPACITY {
            return Err(ConfigError::CapacityOutOfRange {
                capacity: self.pool_capacity,
                max: MAX_POOL_CAPACITY,
            });
        }
        Ok(())
    }
}
