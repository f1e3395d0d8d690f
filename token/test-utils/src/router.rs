// Copyright (c) 2024 Botho Foundation

//! User-facing router calls against a deployed token.
//!
//! These mirror the "supporting fee-on-transfer tokens" router entry points:
//! outputs are computed from what actually reached the pool.

use crate::amm::{ensure_deadline, InMemoryAmm};
use crate::base::WrappedBase;
use gfox_token::{
    Address, Amm, AmmError, Amount, BaseCurrency, CallContext, LiquidityAdded, Token,
    TransferReceipt,
};

/// Token deployed against the in-memory exchange.
pub type TestToken = Token<InMemoryAmm, WrappedBase>;

/// Result of a routed swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Output paid to the recipient
    pub amount_out: Amount,
    /// Receipt of the token leg
    pub receipt: TransferReceipt,
}

fn pool_reserves(token: &TestToken) -> Result<(Amount, Amount), AmmError> {
    token.amm().reserves_for(&token.pair(), &token.address())
}

fn sync(token: &mut TestToken) {
    let pair = token.pair();
    let address = token.address();
    let token_balance = token.balance_of(&pair);
    let base_balance = token.base().balance_of(&pair);
    token.amm_mut().sync(&pair, &address, token_balance, base_balance);
}

/// Buy tokens with `amount_in` base from `ctx.caller`. Tokens go to
/// `recipient` after buy tax.
pub fn swap_exact_base_for_tokens(
    token: &mut TestToken,
    ctx: &CallContext,
    amount_in: Amount,
    amount_out_min: Amount,
    recipient: Address,
    deadline: u64,
) -> Result<SwapOutcome, AmmError> {
    ensure_deadline(deadline, ctx.timestamp)?;
    let pair = token.pair();
    let (reserve_token, reserve_base) = pool_reserves(token)?;
    if reserve_token == 0 || reserve_base == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }
    let out = crate::math::amount_out(amount_in, reserve_base, reserve_token);
    if out < amount_out_min {
        return Err(AmmError::InsufficientOutputAmount {
            amount_out: out,
            amount_out_min,
        });
    }
    let available = token.base().balance_of(&ctx.caller);
    if amount_in > available {
        return Err(AmmError::InsufficientBase {
            owner: ctx.caller,
            available,
            requested: amount_in,
        });
    }

    // Token leg first: it is the only step that can still fail.
    let receipt = token.transfer(&CallContext::new(pair, ctx.timestamp), recipient, out)?;
    token.base_mut().transfer(ctx.caller, pair, amount_in)?;
    sync(token);

    Ok(SwapOutcome {
        amount_out: receipt.received,
        receipt,
    })
}

/// Sell `amount_in` tokens from `ctx.caller` for base paid to `recipient`.
/// The caller must have approved the router.
pub fn swap_exact_tokens_for_base(
    token: &mut TestToken,
    ctx: &CallContext,
    amount_in: Amount,
    amount_out_min: Amount,
    recipient: Address,
    deadline: u64,
) -> Result<SwapOutcome, AmmError> {
    ensure_deadline(deadline, ctx.timestamp)?;
    let pair = token.pair();
    let (reserve_token, reserve_base) = pool_reserves(token)?;
    if reserve_token == 0 || reserve_base == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }
    let quoted = crate::math::amount_out(amount_in, reserve_token, reserve_base);
    if quoted < amount_out_min {
        return Err(AmmError::InsufficientOutputAmount {
            amount_out: quoted,
            amount_out_min,
        });
    }

    let router = CallContext::new(token.router(), ctx.timestamp);
    let receipt = token.transfer_from(&router, ctx.caller, pair, amount_in)?;

    // A fee conversion may have moved the pool while the transfer settled.
    let (reserve_token, reserve_base) = pool_reserves(token)?;
    let actual_in = token.balance_of(&pair).saturating_sub(reserve_token);
    let out = crate::math::amount_out(actual_in, reserve_token, reserve_base);
    token.base_mut().transfer(pair, recipient, out)?;
    sync(token);

    Ok(SwapOutcome {
        amount_out: out,
        receipt,
    })
}

/// Deposit tokens and base from `ctx.caller` into the token's pool. The
/// caller must have approved the router for `token_amount`.
pub fn add_liquidity(
    token: &mut TestToken,
    ctx: &CallContext,
    token_amount: Amount,
    base_amount: Amount,
    recipient: Address,
    deadline: u64,
) -> Result<LiquidityAdded, AmmError> {
    token.with_exchange(ctx, |amm, env| {
        amm.add_liquidity(env, token_amount, base_amount, 0, 0, recipient, deadline)
    })
}
