// Copyright (c) 2024 Botho Foundation

//! Hand-written exchange and base-currency doubles for unit tests.
//!
//! The stub exchange prices everything 1:1 and can be told to fail or to
//! call back into the token mid-swap.

use crate::amm::{Amm, BaseCurrency, CallContext, LiquidityAdded, SwapEnv};
use crate::{Address, AmmError, Amount, Token, TokenConfig, TokenError};
use std::collections::HashMap;

pub const UNIT: Amount = 1_000_000_000_000_000_000;
pub const NOW: u64 = 1_700_000_000;

pub type StubToken = Token<StubAmm, StubBase>;

pub fn addr(label: &str) -> Address {
    Address::derive(label)
}

pub fn deploy(amm: StubAmm) -> StubToken {
    Token::new(&TokenConfig::default(), addr("token"), amm, StubBase::default()).unwrap()
}

pub struct StubBase {
    pub balances: HashMap<Address, Amount>,
}

impl Default for StubBase {
    fn default() -> Self {
        let mut balances = HashMap::new();
        balances.insert(addr("stub-pair"), 1_000_000 * UNIT);
        Self { balances }
    }
}

impl BaseCurrency for StubBase {
    fn address(&self) -> Address {
        addr("stub-base")
    }

    fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: Address, to: Address, amount: Amount) -> Result<(), AmmError> {
        let available = self.balance_of(&from);
        if amount > available {
            return Err(AmmError::InsufficientBase {
                owner: from,
                available,
                requested: amount,
            });
        }
        self.balances.insert(from, available - amount);
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }
}

pub struct StubAmm {
    pub pair: Option<Address>,
    pub pairs_created: u32,
    pub fail_swap: bool,
    pub fail_add: bool,
    /// Sell this account's whole balance from inside every swap
    pub reenter_from: Option<Address>,
    pub nested: Option<Result<Amount, TokenError>>,
    pub swaps: u32,
    pub lp: HashMap<Address, Amount>,
}

impl Default for StubAmm {
    fn default() -> Self {
        Self {
            pair: None,
            pairs_created: 0,
            fail_swap: false,
            fail_add: false,
            reenter_from: None,
            nested: None,
            swaps: 0,
            lp: HashMap::new(),
        }
    }
}

impl StubAmm {
    pub fn lp_balance(&self, owner: &Address) -> Amount {
        self.lp.get(owner).copied().unwrap_or(0)
    }

    fn pair_or_err(&self, token: Address, base: Address) -> Result<Address, AmmError> {
        self.pair.ok_or(AmmError::PairNotFound {
            token_a: token,
            token_b: base,
        })
    }
}

impl Amm for StubAmm {
    fn router_address(&self) -> Address {
        addr("stub-router")
    }

    fn get_pair_address(&self, _token_a: &Address, _token_b: &Address) -> Option<Address> {
        self.pair
    }

    fn create_pair(&mut self, _token_a: Address, _token_b: Address) -> Result<Address, AmmError> {
        if let Some(pair) = self.pair {
            return Err(AmmError::PairExists(pair));
        }
        let pair = addr("stub-pair");
        self.pair = Some(pair);
        self.pairs_created += 1;
        Ok(pair)
    }

    fn get_reserves(&self, _pair: &Address) -> Result<(Amount, Amount), AmmError> {
        Ok((0, 0))
    }

    fn swap_exact_tokens_for_base(
        &mut self,
        env: SwapEnv<'_>,
        amount_in: Amount,
        _amount_out_min: Amount,
        path: &[Address],
        recipient: Address,
        deadline: u64,
    ) -> Result<Amount, AmmError> {
        if self.fail_swap {
            return Err(AmmError::InsufficientLiquidity);
        }
        if path.len() != 2 || path[0] != env.token.token_address() {
            return Err(AmmError::InvalidPath);
        }
        if deadline < env.timestamp {
            return Err(AmmError::Expired {
                deadline,
                now: env.timestamp,
            });
        }
        let pair = self.pair_or_err(path[0], path[1])?;
        if env.base.balance_of(&pair) < amount_in {
            return Err(AmmError::InsufficientLiquidity);
        }

        let router = CallContext::new(self.router_address(), env.timestamp);
        let received = env.token.transfer_from(&router, env.caller, pair, amount_in)?;

        if let Some(victim) = self.reenter_from {
            let amount = env.token.balance_of(&victim);
            self.nested = Some(env.token.transfer_from(&router, victim, pair, amount));
        }

        env.base.transfer(pair, recipient, received)?;
        self.swaps += 1;
        Ok(received)
    }

    fn add_liquidity(
        &mut self,
        env: SwapEnv<'_>,
        token_amount: Amount,
        base_amount: Amount,
        _token_min: Amount,
        _base_min: Amount,
        recipient: Address,
        _deadline: u64,
    ) -> Result<LiquidityAdded, AmmError> {
        if self.fail_add {
            return Err(AmmError::InsufficientLiquidity);
        }
        let pair = self.pair_or_err(env.token.token_address(), env.base.address())?;
        let available = env.base.balance_of(&env.caller);
        if available < base_amount {
            return Err(AmmError::InsufficientBase {
                owner: env.caller,
                available,
                requested: base_amount,
            });
        }

        let router = CallContext::new(self.router_address(), env.timestamp);
        let token_in = env.token.transfer_from(&router, env.caller, pair, token_amount)?;
        env.base.transfer(env.caller, pair, base_amount)?;

        let liquidity = token_in.min(base_amount);
        *self.lp.entry(recipient).or_insert(0) += liquidity;
        Ok(LiquidityAdded {
            token_amount: token_in,
            base_amount,
            liquidity,
        })
    }
}
