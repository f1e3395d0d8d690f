// Copyright (c) 2024 Botho Foundation

//! Error types for the settlement engine and its collaborators.

use crate::{Address, Amount};
use thiserror::Error;

/// Failures raised by ledger operations and owner-gated setters.
///
/// Every variant aborts the operation before any state is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("caller {caller} is not the owner")]
    Unauthorized { caller: Address },

    #[error("zero address")]
    ZeroAddress,

    #[error("tax too high: {total_bps} bps exceeds the {max_bps} bps ceiling")]
    TaxTooHigh { total_bps: u32, max_bps: u32 },

    #[error("already set")]
    AlreadySet,

    #[error("insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },

    #[error("insufficient allowance: have {available}, need {requested}")]
    InsufficientAllowance { available: Amount, requested: Amount },

    #[error("invalid sender: {0}")]
    InvalidSender(Address),

    #[error("max daily volume exceeded for {account}: {attempted} > {limit}")]
    MaxDailyVolumeExceeded {
        account: Address,
        attempted: Amount,
        limit: Amount,
    },

    #[error("arithmetic overflow")]
    Overflow,
}

/// Failures reported by the AMM collaborator.
///
/// Implementations must leave no partial effects behind when they return one
/// of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error("no pair for {token_a} / {token_b}")]
    PairNotFound { token_a: Address, token_b: Address },

    #[error("pair already exists: {0}")]
    PairExists(Address),

    #[error("invalid swap path")]
    InvalidPath,

    #[error("deadline {deadline} passed at {now}")]
    Expired { deadline: u64, now: u64 },

    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    #[error("insufficient output amount: {amount_out} < {amount_out_min}")]
    InsufficientOutputAmount {
        amount_out: Amount,
        amount_out_min: Amount,
    },

    #[error("insufficient base currency for {owner}: have {available}, need {requested}")]
    InsufficientBase {
        owner: Address,
        available: Amount,
        requested: Amount,
    },

    #[error("token transfer failed: {0}")]
    Token(#[from] TokenError),
}

/// Failures while constructing a [`crate::Token`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("invalid token configuration: {0}")]
    Token(#[from] TokenError),

    #[error("pair setup failed: {0}")]
    Exchange(#[from] AmmError),
}
