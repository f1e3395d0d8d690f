// Copyright (c) 2024 Botho Foundation

//! Swap-and-liquify state and arithmetic.
//!
//! Fees collected on taxed trades accumulate in the token contract's own
//! balance. Once that balance reaches the threshold, the next sell converts
//! it:
//!
//! 1. The balance is split by the sell-tax weights. Half of the liquidity
//!    portion is kept as raw tokens; everything else is sold for base
//!    currency.
//! 2. The base currency bought for the other liquidity half is paired with
//!    the kept tokens and deposited into the pool for the liquidity holder.
//! 3. Whatever base currency remains goes to the marketing and ecosystem
//!    holders by weight.
//!
//! The per-unit rounding of the split is approximate: every division rounds
//! down and the ecosystem holder absorbs the dust.
//!
//! The conversion itself is driven by [`crate::Token`]; this module holds
//! the guard state machine and the pure split functions.

use crate::config::TaxRate;
use crate::{Amount, TokenError};
use std::fmt;

/// Re-entrancy guard for the conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SwapState {
    #[default]
    Idle,
    Swapping,
}

impl fmt::Display for SwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapState::Idle => write!(f, "idle"),
            SwapState::Swapping => write!(f, "swapping"),
        }
    }
}

/// Threshold, reserve bookkeeping and guard state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiquifyState {
    min_tokens_before_liquify: Amount,
    liquidity_reserves: Amount,
    state: SwapState,
}

impl LiquifyState {
    pub fn new(min_tokens_before_liquify: Amount) -> Self {
        Self {
            min_tokens_before_liquify,
            liquidity_reserves: 0,
            state: SwapState::Idle,
        }
    }

    pub fn min_tokens_before_liquify(&self) -> Amount {
        self.min_tokens_before_liquify
    }

    pub fn set_min_tokens_before_liquify(&mut self, amount: Amount) {
        self.min_tokens_before_liquify = amount;
    }

    /// Liquidity share of fees collected since the last conversion.
    pub fn liquidity_reserves(&self) -> Amount {
        self.liquidity_reserves
    }

    pub fn state(&self) -> SwapState {
        self.state
    }

    pub fn is_swapping(&self) -> bool {
        self.state == SwapState::Swapping
    }

    /// Whether `retained` would arm a conversion, ignoring the guard.
    pub fn threshold_reached(&self, retained: Amount) -> bool {
        retained > 0 && retained >= self.min_tokens_before_liquify
    }

    /// Whether a sell should convert `retained` now.
    pub fn should_trigger(&self, retained: Amount) -> bool {
        self.state == SwapState::Idle && self.threshold_reached(retained)
    }

    pub(crate) fn record_fee(&mut self, liquidity_share: Amount) {
        self.liquidity_reserves = self.liquidity_reserves.saturating_add(liquidity_share);
    }

    pub(crate) fn clear_reserves(&mut self) {
        self.liquidity_reserves = 0;
    }

    pub(crate) fn enter(&mut self) {
        self.state = SwapState::Swapping;
    }

    pub(crate) fn exit(&mut self) {
        self.state = SwapState::Idle;
    }
}

/// `value * numerator / denominator`, rounding down.
fn mul_div(value: Amount, numerator: Amount, denominator: Amount) -> Result<Amount, TokenError> {
    value
        .checked_mul(numerator)
        .map(|scaled| scaled / denominator)
        .ok_or(TokenError::Overflow)
}

/// How a retained balance is divided before selling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquifyPlan {
    pub rate: TaxRate,
    /// Liquidity portion of the balance
    pub liquidity_tokens: Amount,
    /// Raw tokens kept for the pool deposit
    pub keep: Amount,
    /// Tokens sold for base currency
    pub to_swap: Amount,
}

impl LiquifyPlan {
    /// Plan the conversion of `balance` under `rate`. `None` when the
    /// weights sum to zero.
    pub fn new(balance: Amount, rate: TaxRate) -> Result<Option<Self>, TokenError> {
        let total = Amount::from(rate.total_bps());
        if total == 0 {
            return Ok(None);
        }

        let liquidity_tokens = mul_div(balance, Amount::from(rate.liquidity), total)?;
        let half = liquidity_tokens / 2;
        let keep = liquidity_tokens - half;

        Ok(Some(Self {
            rate,
            liquidity_tokens,
            keep,
            to_swap: balance - keep,
        }))
    }

    /// Divide the base currency bought with `to_swap`.
    ///
    /// The liquidity half carries weight `liquidity`, marketing and ecosystem
    /// carry twice their rate since they were sold in full.
    pub fn split_base(&self, received: Amount) -> Result<BaseSplit, TokenError> {
        let liquidity = Amount::from(self.rate.liquidity);
        let marketing = 2 * Amount::from(self.rate.marketing);
        let ecosystem = 2 * Amount::from(self.rate.ecosystem);
        let denominator = liquidity + marketing + ecosystem;

        let for_liquidity = mul_div(received, liquidity, denominator)?;
        let for_marketing = mul_div(received, marketing, denominator)?;
        Ok(BaseSplit {
            liquidity: for_liquidity,
            marketing: for_marketing,
            ecosystem: received - for_liquidity - for_marketing,
        })
    }

    /// Divide base currency left after the pool deposit between marketing
    /// and ecosystem. The ecosystem holder takes the remainder.
    pub fn split_payout(&self, remaining: Amount) -> Result<(Amount, Amount), TokenError> {
        let marketing = Amount::from(self.rate.marketing);
        let denominator = marketing + Amount::from(self.rate.ecosystem);
        if denominator == 0 {
            return Ok((0, remaining));
        }
        let for_marketing = mul_div(remaining, marketing, denominator)?;
        Ok((for_marketing, remaining - for_marketing))
    }
}

/// Base currency earmarked per destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseSplit {
    pub liquidity: Amount,
    pub marketing: Amount,
    pub ecosystem: Amount,
}

/// What a completed conversion moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiquifyReport {
    pub tokens_swapped: Amount,
    pub base_received: Amount,
    pub tokens_added: Amount,
    pub base_added: Amount,
    /// Pool shares minted to the liquidity holder
    pub liquidity_minted: Amount,
    pub marketing_base: Amount,
    pub ecosystem_base: Amount,
}

/// Result of the conversion check attached to every transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiquifyOutcome {
    /// Not a sell, or threshold not reached
    NotDue,
    /// Threshold reached but a conversion was already running
    Bypassed,
    /// Sell-tax weights sum to zero
    Skipped,
    Completed(LiquifyReport),
    /// The exchange rejected a step; unconverted tokens stay queued
    Failed(String),
}

impl LiquifyOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, LiquifyOutcome::Completed(_))
    }
}
