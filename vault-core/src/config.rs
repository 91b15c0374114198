//! Configuration for the vault

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity the vault registers with the upstream access controller
    pub vault_address: String,

    /// Initial operator identity
    pub operator: String,

    /// Maximum days until expiration the gateway accepts for an option series
    pub expiration_horizon_days: i64,

    /// Epoch lock parameters; `None` disables time-windowed locking
    pub epoch_lock: Option<EpochLockConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vault_address: "vault".to_string(),
            operator: "operator".to_string(),
            expiration_horizon_days: 30,
            epoch_lock: None,
        }
    }
}

/// Epoch lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochLockConfig {
    /// Fixed cycle origin
    pub start_time: DateTime<Utc>,

    /// Locked portion of each cycle (seconds)
    pub lock_period_secs: u64,

    /// Unlocked portion of each cycle (seconds)
    pub unlock_period_secs: u64,
}

impl Config {
    /// Load from TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(addr) = std::env::var("VAULT_ADDRESS") {
            config.vault_address = addr;
        }

        if let Ok(operator) = std::env::var("VAULT_OPERATOR") {
            config.operator = operator;
        }

        if let Ok(days) = std::env::var("VAULT_EXPIRATION_HORIZON_DAYS") {
            config.expiration_horizon_days = days
                .parse()
                .map_err(|e| crate::Error::Config(format!("bad horizon: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.operator.is_empty() {
            return Err(crate::Error::Config("operator must be set".to_string()));
        }
        if self.expiration_horizon_days <= 0 {
            return Err(crate::Error::Config(
                "expiration horizon must be positive".to_string(),
            ));
        }
        if let Some(epoch) = &self.epoch_lock {
            if epoch.lock_period_secs == 0 || epoch.unlock_period_secs == 0 {
                return Err(crate::Error::Config(
                    "epoch lock periods must be nonzero".to_string(),
                ));
            }
            // Periods feed signed chrono durations; values past i64::MAX
            // would truncate.
            if i64::try_from(epoch.lock_period_secs).is_err()
                || i64::try_from(epoch.unlock_period_secs).is_err()
            {
                return Err(crate::Error::Config(
                    "epoch lock periods exceed the representable range".to_string(),
                ));
            }
        }
        Ok(())
    }
}
