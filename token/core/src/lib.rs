// Copyright (c) 2024 Botho Foundation

//! Settlement engine for the GFOX fee-on-transfer token.
//!
//! This crate provides:
//!
//! - A balance ledger with allowances and burning
//! - Buy and sell fees charged on trades against recognized pools
//! - A per-account daily volume cap
//! - Swap-and-liquify: conversion of retained fees into pool liquidity and
//!   payouts through an injected exchange
//! - Owner-gated configuration
//!
//! The exchange and the wrapped base currency are collaborators behind the
//! [`Amm`] and [`BaseCurrency`] traits.

pub mod address;
pub mod admin;
pub mod amm;
pub mod config;
pub mod error;
pub mod fee;
pub mod ledger;
pub mod liquify;
pub mod registry;
pub mod token;
pub mod volume;

#[cfg(test)]
mod stubs;

/// Token amount in base units.
pub type Amount = u128;

pub use address::{Address, AddressParseError};
pub use amm::{Amm, BaseCurrency, CallContext, LiquidityAdded, SwapEnv, TokenPort};
pub use config::{ConfigError, Holders, TaxRate, TokenConfig, MAX_TAX_BPS, TAX_DENOMINATOR};
pub use error::{AmmError, InitError, TokenError};
pub use fee::{Direction, FeeQuote, FeeSchedule};
pub use ledger::{Ledger, TransferReceipt};
pub use liquify::{LiquifyOutcome, LiquifyPlan, LiquifyReport, SwapState};
pub use token::Token;
pub use volume::{effective_cumulative, VolumeWindow, SECONDS_PER_DAY};
