// Copyright (c) 2024 Botho Foundation

//! Scenario files.
//!
//! A scenario seeds the pool and lists steps to replay:
//!
//! ```toml
//! start_time = 1700000000
//!
//! [pool]
//! tokens = 100000
//! base = 100
//!
//! [[step]]
//! action = "enable_tax"
//!
//! [[step]]
//! action = "buy"
//! account = "alice"
//! base = 1
//! ```
//!
//! Accounts are labels. `owner` resolves to the configured owner and every
//! other label to a derived address. Token amounts are whole tokens and
//! base amounts whole base units.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Liquidity the owner deposits before the first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSeed {
    pub tokens: u64,
    pub base: u64,
}

impl Default for PoolSeed {
    fn default() -> Self {
        Self {
            tokens: 100_000,
            base: 100,
        }
    }
}

/// One scenario action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Transfer {
        from: String,
        to: String,
        amount: u64,
    },
    Buy {
        account: String,
        base: u64,
    },
    Sell {
        account: String,
        amount: u64,
    },
    Burn {
        account: String,
        amount: u64,
    },
    /// Move the clock forward
    Advance {
        seconds: u64,
    },
    EnableTax,
    SetBuyTax {
        liquidity: u32,
        marketing: u32,
        ecosystem: u32,
    },
    SetSellTax {
        liquidity: u32,
        marketing: u32,
        ecosystem: u32,
    },
    SetMiniBeforeLiquify {
        amount: u64,
    },
    SetMaxDailyVolume {
        amount: u64,
    },
    ExcludeFromFee {
        account: String,
        #[serde(default = "default_true")]
        excluded: bool,
    },
}

fn default_true() -> bool {
    true
}

fn default_start_time() -> u64 {
    1_700_000_000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Unix seconds at the first step
    #[serde(default = "default_start_time")]
    pub start_time: u64,

    #[serde(default)]
    pub pool: PoolSeed,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Transfer { from, to, amount } => write!(f, "{from} transfers {amount} to {to}"),
            Step::Buy { account, base } => write!(f, "{account} buys with {base} base"),
            Step::Sell { account, amount } => write!(f, "{account} sells {amount}"),
            Step::Burn { account, amount } => write!(f, "{account} burns {amount}"),
            Step::Advance { seconds } => write!(f, "advance {seconds}s"),
            Step::EnableTax => write!(f, "enable tax"),
            Step::SetBuyTax {
                liquidity,
                marketing,
                ecosystem,
            } => write!(f, "buy tax {liquidity}/{marketing}/{ecosystem}"),
            Step::SetSellTax {
                liquidity,
                marketing,
                ecosystem,
            } => write!(f, "sell tax {liquidity}/{marketing}/{ecosystem}"),
            Step::SetMiniBeforeLiquify { amount } => write!(f, "liquify threshold {amount}"),
            Step::SetMaxDailyVolume { amount } => write!(f, "max daily volume {amount}"),
            Step::ExcludeFromFee { account, excluded } => {
                write!(f, "exclude {account} from fee: {excluded}")
            }
        }
    }
}
