// Copyright (c) 2024 Botho Foundation

//! In-memory constant-product exchange.
//!
//! Pools hold their funds on the real ledgers: the token side on the token
//! ledger (through the [`gfox_token::TokenPort`]) and the base side on the base
//! currency. Reserves are cached here and re-synced after every operation.
//! Inputs are measured as balance deltas, so taxed transfers into a pool
//! price correctly.

use crate::math::{amount_out, mul_div, sqrt_product};
use gfox_token::{Address, Amm, AmmError, Amount, CallContext, LiquidityAdded, SwapEnv};
use std::collections::HashMap;

/// One token/base pool.
#[derive(Debug, Clone, Default)]
pub struct Pool {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: Amount,
    pub reserve1: Amount,
    pub total_supply: Amount,
    shares: HashMap<Address, Amount>,
}

impl Pool {
    fn new(token_a: Address, token_b: Address) -> Self {
        let (token0, token1) = sort(token_a, token_b);
        Self {
            token0,
            token1,
            ..Self::default()
        }
    }

    /// Reserves as `(reserve of token, reserve of the other side)`.
    pub fn reserves_for(&self, token: &Address) -> (Amount, Amount) {
        if *token == self.token0 {
            (self.reserve0, self.reserve1)
        } else {
            (self.reserve1, self.reserve0)
        }
    }

    fn set_reserves_for(&mut self, token: &Address, reserve: Amount, other: Amount) {
        if *token == self.token0 {
            self.reserve0 = reserve;
            self.reserve1 = other;
        } else {
            self.reserve0 = other;
            self.reserve1 = reserve;
        }
    }

    pub fn shares_of(&self, owner: &Address) -> Amount {
        self.shares.get(owner).copied().unwrap_or(0)
    }
}

fn sort(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Factory and router over in-memory pools.
#[derive(Debug, Clone)]
pub struct InMemoryAmm {
    router: Address,
    pairs: HashMap<(Address, Address), Address>,
    pools: HashMap<Address, Pool>,
}

impl Default for InMemoryAmm {
    fn default() -> Self {
        Self::new(Address::derive("router"))
    }
}

impl InMemoryAmm {
    pub fn new(router: Address) -> Self {
        Self {
            router,
            pairs: HashMap::new(),
            pools: HashMap::new(),
        }
    }

    pub fn pool(&self, pair: &Address) -> Option<&Pool> {
        self.pools.get(pair)
    }

    /// `(token reserve, base reserve)` for the pool of `token`.
    pub fn reserves_for(&self, pair: &Address, token: &Address) -> Result<(Amount, Amount), AmmError> {
        self.pools
            .get(pair)
            .map(|pool| pool.reserves_for(token))
            .ok_or(AmmError::InsufficientLiquidity)
    }

    pub fn lp_balance(&self, pair: &Address, owner: &Address) -> Amount {
        self.pools
            .get(pair)
            .map(|pool| pool.shares_of(owner))
            .unwrap_or(0)
    }

    /// Base paid for selling `amount_in` tokens at current reserves.
    pub fn quote_tokens_for_base(
        &self,
        pair: &Address,
        token: &Address,
        amount_in: Amount,
    ) -> Result<Amount, AmmError> {
        let (reserve_token, reserve_base) = self.reserves_for(pair, token)?;
        Ok(amount_out(amount_in, reserve_token, reserve_base))
    }

    /// Tokens paid for `amount_in` base at current reserves, before tax.
    pub fn quote_base_for_tokens(
        &self,
        pair: &Address,
        token: &Address,
        amount_in: Amount,
    ) -> Result<Amount, AmmError> {
        let (reserve_token, reserve_base) = self.reserves_for(pair, token)?;
        Ok(amount_out(amount_in, reserve_base, reserve_token))
    }

    /// Reset cached reserves to the pool's actual balances.
    pub fn sync(&mut self, pair: &Address, token: &Address, token_balance: Amount, base_balance: Amount) {
        if let Some(pool) = self.pools.get_mut(pair) {
            pool.set_reserves_for(token, token_balance, base_balance);
        }
    }

    fn sync_env(&mut self, pair: &Address, env: &SwapEnv<'_>) {
        let token = env.token.token_address();
        let token_balance = env.token.balance_of(pair);
        let base_balance = env.base.balance_of(pair);
        self.sync(pair, &token, token_balance, base_balance);
    }

    fn token_pair(&self, env: &SwapEnv<'_>) -> Result<Address, AmmError> {
        let token = env.token.token_address();
        let base = env.base.address();
        self.get_pair_address(&token, &base)
            .ok_or(AmmError::PairNotFound {
                token_a: token,
                token_b: base,
            })
    }
}

pub(crate) fn ensure_deadline(deadline: u64, now: u64) -> Result<(), AmmError> {
    if deadline < now {
        return Err(AmmError::Expired { deadline, now });
    }
    Ok(())
}

impl Amm for InMemoryAmm {
    fn router_address(&self) -> Address {
        self.router
    }

    fn get_pair_address(&self, token_a: &Address, token_b: &Address) -> Option<Address> {
        self.pairs.get(&sort(*token_a, *token_b)).copied()
    }

    fn create_pair(&mut self, token_a: Address, token_b: Address) -> Result<Address, AmmError> {
        if token_a == token_b || token_a.is_zero() || token_b.is_zero() {
            return Err(AmmError::InvalidPath);
        }
        let key = sort(token_a, token_b);
        if let Some(pair) = self.pairs.get(&key) {
            return Err(AmmError::PairExists(*pair));
        }
        let pair = Address::derive(&format!("pair:{}:{}", key.0, key.1));
        self.pairs.insert(key, pair);
        self.pools.insert(pair, Pool::new(token_a, token_b));
        Ok(pair)
    }

    fn get_reserves(&self, pair: &Address) -> Result<(Amount, Amount), AmmError> {
        self.pools
            .get(pair)
            .map(|pool| (pool.reserve0, pool.reserve1))
            .ok_or(AmmError::InsufficientLiquidity)
    }

    fn swap_exact_tokens_for_base(
        &mut self,
        env: SwapEnv<'_>,
        amount_in: Amount,
        amount_out_min: Amount,
        path: &[Address],
        recipient: Address,
        deadline: u64,
    ) -> Result<Amount, AmmError> {
        ensure_deadline(deadline, env.timestamp)?;
        let token = env.token.token_address();
        if path != [token, env.base.address()] {
            return Err(AmmError::InvalidPath);
        }
        let pair = self.token_pair(&env)?;
        let (reserve_token, reserve_base) = self.reserves_for(&pair, &token)?;
        if reserve_token == 0 || reserve_base == 0 {
            return Err(AmmError::InsufficientLiquidity);
        }
        let quoted = amount_out(amount_in, reserve_token, reserve_base);
        if quoted < amount_out_min {
            return Err(AmmError::InsufficientOutputAmount {
                amount_out: quoted,
                amount_out_min,
            });
        }

        let router = CallContext::new(self.router, env.timestamp);
        env.token.transfer_from(&router, env.caller, pair, amount_in)?;

        let actual_in = env.token.balance_of(&pair).saturating_sub(reserve_token);
        let out = amount_out(actual_in, reserve_token, reserve_base);
        env.base.transfer(pair, recipient, out)?;
        self.sync_env(&pair, &env);
        Ok(out)
    }

    fn add_liquidity(
        &mut self,
        env: SwapEnv<'_>,
        token_amount: Amount,
        base_amount: Amount,
        token_min: Amount,
        base_min: Amount,
        recipient: Address,
        deadline: u64,
    ) -> Result<LiquidityAdded, AmmError> {
        ensure_deadline(deadline, env.timestamp)?;
        let token = env.token.token_address();
        let pair = self.token_pair(&env)?;
        let (reserve_token, reserve_base) = self.reserves_for(&pair, &token)?;

        let (token_in, base_in) = if reserve_token == 0 && reserve_base == 0 {
            (token_amount, base_amount)
        } else {
            let base_optimal = mul_div(token_amount, reserve_base, reserve_token)
                .ok_or(AmmError::InsufficientLiquidity)?;
            if base_optimal <= base_amount {
                if base_optimal < base_min {
                    return Err(AmmError::InsufficientOutputAmount {
                        amount_out: base_optimal,
                        amount_out_min: base_min,
                    });
                }
                (token_amount, base_optimal)
            } else {
                let token_optimal = mul_div(base_amount, reserve_token, reserve_base)
                    .ok_or(AmmError::InsufficientLiquidity)?;
                if token_optimal < token_min {
                    return Err(AmmError::InsufficientOutputAmount {
                        amount_out: token_optimal,
                        amount_out_min: token_min,
                    });
                }
                (token_optimal, base_amount)
            }
        };

        let available = env.base.balance_of(&env.caller);
        if base_in > available {
            return Err(AmmError::InsufficientBase {
                owner: env.caller,
                available,
                requested: base_in,
            });
        }

        let router = CallContext::new(self.router, env.timestamp);
        env.token.transfer_from(&router, env.caller, pair, token_in)?;
        let actual_token = env.token.balance_of(&pair).saturating_sub(reserve_token);
        env.base.transfer(env.caller, pair, base_in)?;

        let pool = self
            .pools
            .get_mut(&pair)
            .ok_or(AmmError::InsufficientLiquidity)?;
        let liquidity = if pool.total_supply == 0 {
            sqrt_product(actual_token, base_in)
        } else {
            let by_token = mul_div(actual_token, pool.total_supply, reserve_token).unwrap_or(0);
            let by_base = mul_div(base_in, pool.total_supply, reserve_base).unwrap_or(0);
            by_token.min(by_base)
        };
        pool.total_supply += liquidity;
        *pool.shares.entry(recipient).or_insert(0) += liquidity;
        self.sync_env(&pair, &env);

        Ok(LiquidityAdded {
            token_amount: actual_token,
            base_amount: base_in,
            liquidity,
        })
    }
}
