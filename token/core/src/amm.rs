// Copyright (c) 2024 Botho Foundation

//! Interfaces to the external exchange.
//!
//! The token never prices anything itself. It hands the exchange a
//! [`SwapEnv`] holding a narrow [`TokenPort`] onto the ledger and the
//! [`BaseCurrency`] ledger, and the exchange moves funds through those.
//! Implementations must validate everything before moving funds: an `Err`
//! return means nothing changed.

use crate::{Address, Amount, AmmError, TokenError};

/// Caller identity and block time for a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    /// Unix seconds
    pub timestamp: u64,
}

impl CallContext {
    pub const fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

/// The part of the token ledger an exchange may use while the token is
/// converting fees.
///
/// Transfers made through the port are fully validated and taxed like any
/// other transfer, but can never start a second conversion.
pub trait TokenPort {
    fn token_address(&self) -> Address;

    fn balance_of(&self, owner: &Address) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `from` to `to` on behalf of `ctx.caller`, consuming
    /// allowance. Returns the amount credited to `to` after fees.
    fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Amount, TokenError>;
}

/// Wrapped native currency used as the pool's counter-asset.
pub trait BaseCurrency {
    fn address(&self) -> Address;

    fn balance_of(&self, owner: &Address) -> Amount;

    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), AmmError>;
}

/// Handles passed to the exchange for one call.
pub struct SwapEnv<'a> {
    pub token: &'a mut dyn TokenPort,
    pub base: &'a mut dyn BaseCurrency,
    /// Account whose funds are being spent
    pub caller: Address,
    pub timestamp: u64,
}

/// Amounts actually deposited by [`Amm::add_liquidity`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiquidityAdded {
    pub token_amount: Amount,
    pub base_amount: Amount,
    /// Pool shares minted to the recipient
    pub liquidity: Amount,
}

/// Router and factory of a constant-function market maker.
pub trait Amm {
    /// Account the token approves before handing funds to the exchange.
    fn router_address(&self) -> Address;

    fn get_pair_address(&self, token_a: &Address, token_b: &Address) -> Option<Address>;

    fn create_pair(&mut self, token_a: Address, token_b: Address) -> Result<Address, AmmError>;

    /// Reserves of `pair`, ordered by token address.
    fn get_reserves(&self, pair: &Address) -> Result<(Amount, Amount), AmmError>;

    /// Sell `amount_in` tokens from `env.caller` along `path` (token, base)
    /// and pay the base currency to `recipient`. Returns the base paid out.
    #[allow(clippy::too_many_arguments)]
    fn swap_exact_tokens_for_base(
        &mut self,
        env: SwapEnv<'_>,
        amount_in: Amount,
        amount_out_min: Amount,
        path: &[Address],
        recipient: Address,
        deadline: u64,
    ) -> Result<Amount, AmmError>;

    /// Deposit tokens and base currency from `env.caller` into the token's
    /// pool, minting shares to `recipient`.
    #[allow(clippy::too_many_arguments)]
    fn add_liquidity(
        &mut self,
        env: SwapEnv<'_>,
        token_amount: Amount,
        base_amount: Amount,
        token_min: Amount,
        base_min: Amount,
        recipient: Address,
        deadline: u64,
    ) -> Result<LiquidityAdded, AmmError>;
}
