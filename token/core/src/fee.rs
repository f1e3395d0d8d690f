// Copyright (c) 2024 Botho Foundation

//! Transfer fee engine.
//!
//! Fees apply only to trades against a recognized pool. Buys use the buy
//! schedule and sells the sell schedule; wallet-to-wallet transfers are
//! never taxed. All division rounds down, so the trader is favored by at
//! most one base unit.

use crate::config::{TaxRate, TAX_DENOMINATOR};
use crate::{Amount, TokenError};
use std::fmt;

/// Trade direction of a transfer relative to the recognized pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Tokens leave a pool
    Buy,
    /// Tokens enter a pool
    Sell,
    /// Neither side is a pool
    Plain,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Sell => write!(f, "sell"),
            Direction::Plain => write!(f, "plain"),
        }
    }
}

/// Fee owed on a single transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeeQuote {
    /// Tokens retained by the contract
    pub fee: Amount,
    /// Portion of `fee` earmarked for pool pairing
    pub liquidity_share: Amount,
}

impl FeeQuote {
    pub const ZERO: FeeQuote = FeeQuote {
        fee: 0,
        liquidity_share: 0,
    };
}

/// `amount * bps / 10000`, rounding down.
pub fn apply_bps(amount: Amount, bps: u32) -> Result<Amount, TokenError> {
    amount
        .checked_mul(Amount::from(bps))
        .map(|scaled| scaled / Amount::from(TAX_DENOMINATOR))
        .ok_or(TokenError::Overflow)
}

/// Buy and sell schedules plus the one-way enable latch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeSchedule {
    buy: TaxRate,
    sell: TaxRate,
    enabled: bool,
}

impl FeeSchedule {
    /// New schedule, initially disabled.
    pub fn new(buy: TaxRate, sell: TaxRate) -> Result<Self, TokenError> {
        buy.validate()?;
        sell.validate()?;
        Ok(Self {
            buy,
            sell,
            enabled: false,
        })
    }

    pub fn buy(&self) -> TaxRate {
        self.buy
    }

    pub fn sell(&self) -> TaxRate {
        self.sell
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_buy(&mut self, rate: TaxRate) -> Result<(), TokenError> {
        rate.validate()?;
        self.buy = rate;
        Ok(())
    }

    pub fn set_sell(&mut self, rate: TaxRate) -> Result<(), TokenError> {
        rate.validate()?;
        self.sell = rate;
        Ok(())
    }

    /// Request a latch state. Enabling is one-shot: once on, any further
    /// request fails with `AlreadySet`. Disabling before that is a no-op.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), TokenError> {
        if self.enabled {
            return Err(TokenError::AlreadySet);
        }
        self.enabled = enabled;
        Ok(())
    }

    /// Schedule applying to `direction`, if any.
    pub fn rate_for(&self, direction: Direction) -> Option<TaxRate> {
        match direction {
            Direction::Buy => Some(self.buy),
            Direction::Sell => Some(self.sell),
            Direction::Plain => None,
        }
    }

    /// Fee for moving `amount` in `direction`. `exempt` is true when either
    /// party is excluded from fees.
    pub fn quote(
        &self,
        direction: Direction,
        amount: Amount,
        exempt: bool,
    ) -> Result<FeeQuote, TokenError> {
        if exempt || !self.enabled {
            return Ok(FeeQuote::ZERO);
        }
        let Some(rate) = self.rate_for(direction) else {
            return Ok(FeeQuote::ZERO);
        };

        let total_bps = rate.total_bps();
        let fee = apply_bps(amount, total_bps)?;
        let liquidity_share = if total_bps == 0 {
            0
        } else {
            fee.checked_mul(Amount::from(rate.liquidity))
                .ok_or(TokenError::Overflow)?
                / Amount::from(total_bps)
        };

        Ok(FeeQuote {
            fee,
            liquidity_share,
        })
    }
}
