// Copyright (c) 2024 Botho Foundation

//! Test doubles for the GFOX token.
//!
//! Provides an in-memory constant-product exchange, a wrapped base currency
//! and router helpers, plus a fixture that deploys a token with a seeded
//! pool.

pub mod amm;
pub mod base;
pub mod math;
pub mod router;

pub use amm::{InMemoryAmm, Pool};
pub use base::WrappedBase;
pub use router::{SwapOutcome, TestToken};

use gfox_token::{Address, Amount, CallContext, Holders, Token, TokenConfig};

/// One whole token at 18 decimals.
pub const UNIT: Amount = 1_000_000_000_000_000_000;

/// A fixed block time used by fixtures.
pub const GENESIS: u64 = 1_700_000_000;

/// Deterministic test account.
pub fn account(label: &str) -> Address {
    Address::derive(label)
}

/// Named accounts used across fixtures.
#[derive(Debug, Clone, Copy)]
pub struct Accounts {
    pub owner: Address,
    pub liquidity: Address,
    pub marketing: Address,
    pub ecosystem: Address,
    pub token: Address,
}

impl Default for Accounts {
    fn default() -> Self {
        Self {
            owner: account("owner"),
            liquidity: account("auto-lp"),
            marketing: account("marketing"),
            ecosystem: account("ecosystem"),
            token: account("gfox"),
        }
    }
}

impl Accounts {
    pub fn config(&self) -> TokenConfig {
        TokenConfig::new(
            self.owner,
            Holders {
                liquidity: self.liquidity,
                marketing: self.marketing,
                ecosystem: self.ecosystem,
            },
        )
    }
}

/// Deploy a token with the default configuration. No liquidity yet.
pub fn deploy(accounts: &Accounts) -> TestToken {
    deploy_with(accounts, &accounts.config())
}

/// Deploy a token with `config`.
///
/// # Panics
///
/// If the configuration is invalid.
pub fn deploy_with(accounts: &Accounts, config: &TokenConfig) -> TestToken {
    Token::new(
        config,
        accounts.token,
        InMemoryAmm::default(),
        WrappedBase::default(),
    )
    .expect("deploy token")
}

/// Deploy and seed the pool from the owner with `tokens` whole tokens
/// against `base` whole units of base currency.
pub fn deploy_with_liquidity(accounts: &Accounts, tokens: Amount, base: Amount) -> TestToken {
    let mut token = deploy(accounts);
    seed_liquidity(&mut token, accounts.owner, tokens * UNIT, base * UNIT);
    token
}

/// Add liquidity from `provider`, funding its base balance first.
///
/// # Panics
///
/// If the deposit is rejected.
pub fn seed_liquidity(token: &mut TestToken, provider: Address, tokens: Amount, base: Amount) {
    let ctx = CallContext::new(provider, GENESIS);
    token.base_mut().deposit(provider, base);
    let router = token.router();
    token.approve(&ctx, router, tokens).expect("approve router");
    router::add_liquidity(token, &ctx, tokens, base, provider, GENESIS).expect("add liquidity");
}
