//! SDK configuration
//!
//! Loaded from TOML, every field optional, then overridden from the
//! environment:
//!
//! - `R2S_RPC_URL` - node endpoint
//! - `R2S_TOKEN_ADDRESS` - MockUSDT address
//! - `R2S_CAMPAIGN_ADDRESS` - R2SCampaign address

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{address, Address};
use alloy::transports::http::reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_RPC_URL: &str = "R2S_RPC_URL";
pub const ENV_TOKEN_ADDRESS: &str = "R2S_TOKEN_ADDRESS";
pub const ENV_CAMPAIGN_ADDRESS: &str = "R2S_CAMPAIGN_ADDRESS";

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Cannot parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Deployed contract addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub token: Address,
    pub campaign: Address,
}

impl ContractAddresses {
    /// First two deployments of the default account on a fresh local
    /// Hardhat or Anvil node.
    pub const fn local() -> Self {
        Self {
            token: address!("5FbDB2315678afecb367f032d93F642f64180aa3"),
            campaign: address!("9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0"),
        }
    }
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self::local()
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    pub rpc_url: String,

    pub contracts: ContractAddresses,

    /// Gas limit for every transaction
    pub gas_limit: u64,

    /// Fixed gas price in wei; the node's suggestion when unset
    pub gas_price: Option<u64>,

    /// Blocks on top of the including block, counting it, before a
    /// transaction is reported confirmed
    pub confirmations: u64,

    pub receipt_timeout_secs: u64,

    pub poll_interval_ms: u64,

    /// Extra attempts for a read that failed on the transport
    pub read_retries: u32,

    pub retry_backoff_ms: u64,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contracts: ContractAddresses::local(),
            gas_limit: 3_000_000,
            gas_price: None,
            confirmations: 1,
            receipt_timeout_secs: 120,
            poll_interval_ms: 500,
            read_retries: 2,
            retry_backoff_ms: 250,
        }
    }
}

impl SdkConfig {
    /// Defaults pointed at `rpc_url`
    pub fn with_endpoint(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read a TOML file, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        tracing::info!("Loaded SDK configuration from {}", path.display());
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            tracing::info!("Environment override: rpc_url = {}", url);
            self.rpc_url = url;
        }
        if let Some(value) = lookup(ENV_TOKEN_ADDRESS) {
            self.contracts.token = parse_address(ENV_TOKEN_ADDRESS, &value)?;
            tracing::info!("Environment override: token = {}", self.contracts.token);
        }
        if let Some(value) = lookup(ENV_CAMPAIGN_ADDRESS) {
            self.contracts.campaign = parse_address(ENV_CAMPAIGN_ADDRESS, &value)?;
            tracing::info!("Environment override: campaign = {}", self.contracts.campaign);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.rpc_url).map_err(|e| ConfigError::InvalidValue {
            key: "rpc_url".to_string(),
            reason: e.to_string(),
        })?;

        if self.contracts.token == self.contracts.campaign {
            return Err(invalid("contracts", "token and campaign share an address"));
        }
        if self.gas_limit == 0 {
            return Err(invalid("gas_limit", "must be positive"));
        }
        if self.confirmations == 0 {
            return Err(invalid("confirmations", "must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(invalid("poll_interval_ms", "must be positive"));
        }
        if self.receipt_timeout_secs == 0 {
            return Err(invalid("receipt_timeout_secs", "must be positive"));
        }
        Ok(())
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address, ConfigError> {
    Address::from_str(value.trim()).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
