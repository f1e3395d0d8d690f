// Copyright (c) 2024 Botho Foundation

//! Token configuration.
//!
//! A [`TokenConfig`] describes everything the engine needs at construction:
//! metadata, the owner, the three payout holders, both tax schedules and the
//! liquify / volume thresholds. It is usually loaded from TOML:
//!
//! ```toml
//! name = "Galaxy Fox"
//! symbol = "GFOX"
//! decimals = 18
//! initial_supply = 5000000000
//! owner = "0x5b38da6a701c568545dcfcb03fcb875f56beddc4"
//! mini_before_liquify = 500000
//! max_daily_volume = 0
//!
//! [holders]
//! liquidity = "0x..."
//! marketing = "0x..."
//! ecosystem = "0x..."
//!
//! [buy_tax]
//! liquidity = 1000
//! marketing = 500
//! ecosystem = 500
//!
//! [sell_tax]
//! liquidity = 1000
//! marketing = 500
//! ecosystem = 500
//! ```
//!
//! Supply and thresholds are given in whole tokens and scaled by `decimals`.

use crate::{Address, Amount, TokenError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Denominator for basis-point rates (10000 = 100%).
pub const TAX_DENOMINATOR: u32 = 10_000;

/// Ceiling on the sum of a tax schedule's three components (20%).
pub const MAX_TAX_BPS: u32 = 2_000;

/// Fee split for one trade direction, in basis points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    pub liquidity: u32,
    pub marketing: u32,
    pub ecosystem: u32,
}

impl TaxRate {
    pub const fn new(liquidity: u32, marketing: u32, ecosystem: u32) -> Self {
        Self {
            liquidity,
            marketing,
            ecosystem,
        }
    }

    /// Sum of the three components, saturating so oversized inputs still
    /// fail validation instead of wrapping.
    pub fn total_bps(&self) -> u32 {
        self.liquidity
            .saturating_add(self.marketing)
            .saturating_add(self.ecosystem)
    }

    /// Reject schedules above [`MAX_TAX_BPS`].
    pub fn validate(&self) -> Result<(), TokenError> {
        let total_bps = self.total_bps();
        if total_bps > MAX_TAX_BPS {
            return Err(TokenError::TaxTooHigh {
                total_bps,
                max_bps: MAX_TAX_BPS,
            });
        }
        Ok(())
    }
}

/// The three accounts that receive converted fee proceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holders {
    /// Receives pool shares minted by swap-and-liquify
    pub liquidity: Address,
    /// Receives the marketing share of converted base currency
    pub marketing: Address,
    /// Receives the ecosystem share of converted base currency
    pub ecosystem: Address,
}

impl Holders {
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.liquidity.is_zero() || self.marketing.is_zero() || self.ecosystem.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        Ok(())
    }
}

/// Construction-time configuration for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Initial supply in whole tokens, minted to `owner`
    #[serde(default = "default_initial_supply")]
    pub initial_supply: u64,

    /// Account allowed to call the configuration setters
    pub owner: Address,

    pub holders: Holders,

    #[serde(default = "default_tax")]
    pub buy_tax: TaxRate,

    #[serde(default = "default_tax")]
    pub sell_tax: TaxRate,

    /// Retained-fee threshold (whole tokens) that arms swap-and-liquify
    #[serde(default = "default_mini_before_liquify")]
    pub mini_before_liquify: u64,

    /// Per-account daily cap in whole tokens; 0 disables the limiter
    #[serde(default)]
    pub max_daily_volume: u64,
}

fn default_name() -> String {
    "Galaxy Fox".to_string()
}

fn default_symbol() -> String {
    "GFOX".to_string()
}

fn default_decimals() -> u8 {
    18
}

fn default_initial_supply() -> u64 {
    5_000_000_000
}

fn default_tax() -> TaxRate {
    TaxRate::new(1_000, 500, 500)
}

fn default_mini_before_liquify() -> u64 {
    500_000 // 0.01% of the default supply
}

/// Errors loading a [`TokenConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(#[from] TokenError),
}

impl TokenConfig {
    /// Default configuration with the given owner and holders.
    pub fn new(owner: Address, holders: Holders) -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            initial_supply: default_initial_supply(),
            owner,
            holders,
            buy_tax: default_tax(),
            sell_tax: default_tax(),
            mini_before_liquify: default_mini_before_liquify(),
            max_daily_volume: 0,
        }
    }

    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine enforces on every later mutation.
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.owner.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.holders.validate()?;
        self.buy_tax.validate()?;
        self.sell_tax.validate()?;
        self.to_base_units(self.initial_supply)?;
        Ok(())
    }

    /// One whole token in base units.
    pub fn unit(&self) -> Result<Amount, TokenError> {
        10u128
            .checked_pow(u32::from(self.decimals))
            .ok_or(TokenError::Overflow)
    }

    /// Scale a whole-token amount by `decimals`.
    pub fn to_base_units(&self, tokens: u64) -> Result<Amount, TokenError> {
        Amount::from(tokens)
            .checked_mul(self.unit()?)
            .ok_or(TokenError::Overflow)
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new(
            Address::derive("owner"),
            Holders {
                liquidity: Address::derive("liquidity"),
                marketing: Address::derive("marketing"),
                ecosystem: Address::derive("ecosystem"),
            },
        )
    }
}
