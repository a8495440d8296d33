use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{crypto::Address, time::TimestampSeconds};

// ===== Token metadata limits =====

// Maximum token name length (bytes)
pub const MAX_NAME_LENGTH: usize = 32;
// Maximum token symbol length (bytes)
pub const MAX_SYMBOL_LENGTH: usize = 8;
// Maximum decimals for the sale token
pub const MAX_DECIMALS: u8 = 18;

// ===== Reference deployment =====
// Parameters the reference deployment ships with

pub const DEFAULT_TOTAL_SUPPLY: u64 = 10_000_000_000;
pub const DEFAULT_TOKEN_NAME: &str = "MyAwesomeToken";
pub const DEFAULT_TOKEN_SYMBOL: &str = "MAT";
pub const DEFAULT_TOKEN_DECIMALS: u8 = 2;
// Value units per indivisible token unit
pub const DEFAULT_UNIT_PRICE: u64 = 10;
pub const DEFAULT_SALE_CAP: u64 = 1_000_000_000;
pub const DEFAULT_MIN_RAISE: u64 = 1_000_000_000_000_000_000;
pub const DEFAULT_SALE_DURATION: TimestampSeconds = 1000;

// Label hashed with the deployer to derive the controller address
pub const SALE_CONTROLLER_LABEL: &[u8] = b"ico-sale-controller";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ledger construction parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenConfig {
    pub total_supply: u64,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.is_empty() {
            return Err("name cannot be empty");
        }
        if self.name.len() > MAX_NAME_LENGTH {
            return Err("name too long");
        }
        if self.symbol.is_empty() {
            return Err("symbol cannot be empty");
        }
        if self.symbol.len() > MAX_SYMBOL_LENGTH {
            return Err("symbol too long");
        }
        if !self.symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err("symbol must be ascii alphanumeric");
        }
        if self.decimals > MAX_DECIMALS {
            return Err("decimals too high");
        }
        Ok(())
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            total_supply: DEFAULT_TOTAL_SUPPLY,
            name: DEFAULT_TOKEN_NAME.to_string(),
            symbol: DEFAULT_TOKEN_SYMBOL.to_string(),
            decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

/// Immutable sale parameters fixed at controller construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaleParams {
    /// Sole account allowed to abort the sale
    pub emergency_authority: Address,
    /// Value units per indivisible token unit
    pub unit_price: u64,
    /// Maximum token units sellable
    pub sale_cap: u64,
    /// Minimum total value for the sale to succeed
    pub min_raise: u64,
    pub start_time: TimestampSeconds,
    pub end_time: TimestampSeconds,
}

impl SaleParams {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.unit_price == 0 {
            return Err("unit price must be positive");
        }
        if self.sale_cap == 0 {
            return Err("sale cap must be positive");
        }
        if self.start_time >= self.end_time {
            return Err("start time must be before end time");
        }
        Ok(())
    }
}

/// Everything the deployment routine needs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    /// Account creating the ledger; becomes sale owner and first beneficiary
    pub deployer: Address,
    pub token: TokenConfig,
    pub sale: SaleParams,
}

impl DeployConfig {
    /// Reference deployment opening at `start_time` for the default duration.
    pub fn reference(
        deployer: Address,
        emergency_authority: Address,
        start_time: TimestampSeconds,
    ) -> Self {
        Self {
            deployer,
            token: TokenConfig::default(),
            sale: SaleParams {
                emergency_authority,
                unit_price: DEFAULT_UNIT_PRICE,
                sale_cap: DEFAULT_SALE_CAP,
                min_raise: DEFAULT_MIN_RAISE,
                start_time,
                end_time: start_time.saturating_add(DEFAULT_SALE_DURATION),
            },
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_config_limits() {
        let mut token = TokenConfig::default();
        assert!(token.validate().is_ok());

        token.symbol = "TOOLONGSYM".to_string();
        assert_eq!(token.validate(), Err("symbol too long"));

        token.symbol = "M-T".to_string();
        assert!(token.validate().is_err());

        token.symbol = "MAT".to_string();
        token.decimals = 19;
        assert_eq!(token.validate(), Err("decimals too high"));

        token.decimals = 2;
        token.name = String::new();
        assert_eq!(token.validate(), Err("name cannot be empty"));
    }

    #[test]
    fn sale_params_window_must_be_ordered() {
        let mut config = DeployConfig::reference(Address::new([1; 32]), Address::new([2; 32]), 50);
        assert!(config.sale.validate().is_ok());
        assert_eq!(config.sale.end_time, 50 + DEFAULT_SALE_DURATION);

        config.sale.end_time = config.sale.start_time;
        assert!(config.sale.validate().is_err());

        config.sale.end_time = 100;
        config.sale.unit_price = 0;
        assert_eq!(config.sale.validate(), Err("unit price must be positive"));
    }

    #[test]
    fn deploy_config_json_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let config = DeployConfig::reference(Address::new([1; 32]), Address::new([2; 32]), 1_000);
        let json = serde_json::to_string(&config)?;
        assert!(json.contains("\"unitPrice\":10"));
        assert!(json.contains("\"emergencyAuthority\""));

        let decoded = DeployConfig::from_json_str(&json)?;
        assert_eq!(config, decoded);
        Ok(())
    }
}
