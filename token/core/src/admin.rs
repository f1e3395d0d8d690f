// Copyright (c) 2024 Botho Foundation

//! Owner-gated configuration.
//!
//! Every setter checks the caller against the current owner before doing
//! anything else, and validates its input before mutating, so a rejected
//! call leaves the token unchanged.

use crate::amm::CallContext;
use crate::config::TaxRate;
use crate::token::Token;
use crate::{Address, Amount, TokenError};
use tracing::info;

impl<A, B> Token<A, B> {
    pub fn set_sell_tax(&mut self, ctx: &CallContext, rate: TaxRate) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.fees.set_sell(rate)?;
        info!(
            liquidity = rate.liquidity,
            marketing = rate.marketing,
            ecosystem = rate.ecosystem,
            "sell tax updated"
        );
        Ok(())
    }

    pub fn set_buy_tax(&mut self, ctx: &CallContext, rate: TaxRate) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.fees.set_buy(rate)?;
        info!(
            liquidity = rate.liquidity,
            marketing = rate.marketing,
            ecosystem = rate.ecosystem,
            "buy tax updated"
        );
        Ok(())
    }

    /// Turn taxes on. Can only succeed once.
    pub fn set_tax_enabled(&mut self, ctx: &CallContext, enabled: bool) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.fees.set_enabled(enabled)?;
        info!(enabled, "tax switch updated");
        Ok(())
    }

    pub fn set_excluded_from_fee(
        &mut self,
        ctx: &CallContext,
        account: Address,
        excluded: bool,
    ) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.registry.set_excluded_from_fee(account, excluded);
        info!(account = %account, excluded, "fee exclusion updated");
        Ok(())
    }

    /// Mark or unmark a pool used for trade direction.
    pub fn set_pair(
        &mut self,
        ctx: &CallContext,
        pair: Address,
        is_pair: bool,
    ) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.registry.set_pair(pair, is_pair)?;
        info!(pair = %pair, is_pair, "pair updated");
        Ok(())
    }

    pub fn set_marketing_holder(
        &mut self,
        ctx: &CallContext,
        holder: Address,
    ) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.registry.set_marketing_holder(holder)?;
        info!(holder = %holder, "marketing holder updated");
        Ok(())
    }

    pub fn set_liquidity_holder(
        &mut self,
        ctx: &CallContext,
        holder: Address,
    ) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.registry.set_liquidity_holder(holder)?;
        info!(holder = %holder, "liquidity holder updated");
        Ok(())
    }

    pub fn set_ecosystem_holder(
        &mut self,
        ctx: &CallContext,
        holder: Address,
    ) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.registry.set_ecosystem_holder(holder)?;
        info!(holder = %holder, "ecosystem holder updated");
        Ok(())
    }

    /// Retained-fee threshold in base units. Zero converts on every taxed
    /// sell once any fee is held.
    pub fn set_mini_before_liquify(
        &mut self,
        ctx: &CallContext,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.liquify.set_min_tokens_before_liquify(amount);
        info!(amount, "liquify threshold updated");
        Ok(())
    }

    /// Per-account daily cap in base units. Zero disables it.
    pub fn set_max_daily_volume(
        &mut self,
        ctx: &CallContext,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.volume.set_max_daily_volume(amount);
        info!(amount, "max daily volume updated");
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        new_owner: Address,
    ) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        if new_owner.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.ledger.registry.set_owner(new_owner);
        info!(previous = %ctx.caller, owner = %new_owner, "ownership transferred");
        Ok(())
    }

    /// Give up ownership. No setter can succeed afterwards.
    pub fn renounce_ownership(&mut self, ctx: &CallContext) -> Result<(), TokenError> {
        self.ledger.registry.ensure_owner(&ctx.caller)?;
        self.ledger.registry.set_owner(Address::ZERO);
        info!(previous = %ctx.caller, "ownership renounced");
        Ok(())
    }
}
