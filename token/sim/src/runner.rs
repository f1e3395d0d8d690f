// Copyright (c) 2024 Botho Foundation

//! Replays a scenario against a token on the in-memory exchange.

use crate::scenario::{Scenario, Step};
use anyhow::{Context, Result};
use gfox_token::{
    Address, Amount, CallContext, LiquifyOutcome, TaxRate, Token, TokenConfig, TransferReceipt,
};
use gfox_token_test_utils::{router, InMemoryAmm, TestToken, WrappedBase};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// What happened at one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Settled(TransferReceipt),
    Traded {
        receipt: TransferReceipt,
        amount_out: Amount,
    },
    Done,
    Rejected(String),
}

impl StepResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, StepResult::Rejected(_))
    }

    fn receipt(&self) -> Option<&TransferReceipt> {
        match self {
            StepResult::Settled(receipt) | StepResult::Traded { receipt, .. } => Some(receipt),
            _ => None,
        }
    }

    pub fn liquify(&self) -> Option<&LiquifyOutcome> {
        self.receipt().map(|r| &r.liquify)
    }
}

/// A token, a clock and the account labels used by the scenario.
pub struct Simulation {
    token: TestToken,
    config: TokenConfig,
    now: u64,
    labels: BTreeMap<String, Address>,
    unit: Amount,
}

impl Simulation {
    /// Deploy the token and seed the pool from the owner.
    pub fn new(config: TokenConfig, scenario: &Scenario) -> Result<Self> {
        let token_address = Address::derive("gfox");
        let token = Token::new(
            &config,
            token_address,
            InMemoryAmm::default(),
            WrappedBase::default(),
        )
        .context("failed to deploy token")?;
        let unit = config.unit()?;

        let mut labels = BTreeMap::new();
        labels.insert("owner".to_string(), config.owner);
        labels.insert("liquidity-holder".to_string(), config.holders.liquidity);
        labels.insert("marketing-holder".to_string(), config.holders.marketing);
        labels.insert("ecosystem-holder".to_string(), config.holders.ecosystem);
        labels.insert("token".to_string(), token_address);
        labels.insert("pair".to_string(), token.pair());

        let mut sim = Self {
            token,
            config,
            now: scenario.start_time,
            labels,
            unit,
        };
        sim.seed_pool(scenario)?;
        Ok(sim)
    }

    fn seed_pool(&mut self, scenario: &Scenario) -> Result<()> {
        let tokens = Amount::from(scenario.pool.tokens) * self.unit;
        let base = Amount::from(scenario.pool.base) * self.unit;
        if tokens == 0 || base == 0 {
            return Ok(());
        }
        let owner = self.ctx(self.config.owner);
        self.token.base_mut().deposit(owner.caller, base);
        let spender = self.token.router();
        self.token.approve(&owner, spender, tokens)?;
        router::add_liquidity(&mut self.token, &owner, tokens, base, owner.caller, self.now)
            .context("failed to seed pool")?;
        info!(tokens = scenario.pool.tokens, base = scenario.pool.base, "seeded pool");
        Ok(())
    }

    pub fn token(&self) -> &TestToken {
        &self.token
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Labels seen so far, in name order.
    pub fn labels(&self) -> impl Iterator<Item = (&String, &Address)> {
        self.labels.iter()
    }

    fn account(&mut self, label: &str) -> Address {
        *self
            .labels
            .entry(label.to_string())
            .or_insert_with(|| Address::derive(label))
    }

    fn ctx(&self, caller: Address) -> CallContext {
        CallContext::new(caller, self.now)
    }

    fn tokens(&self, whole: u64) -> Amount {
        Amount::from(whole) * self.unit
    }

    /// Run every step, collecting results. Rejections do not stop the run.
    pub fn run(&mut self, steps: &[Step]) -> Vec<StepResult> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let result = self.apply(step);
                match &result {
                    StepResult::Rejected(reason) => {
                        warn!(step = index, %step, reason = %reason, "step rejected")
                    }
                    _ => debug!(step = index, %step, "step applied"),
                }
                result
            })
            .collect()
    }

    /// Apply a single step.
    pub fn apply(&mut self, step: &Step) -> StepResult {
        match self.try_apply(step) {
            Ok(result) => result,
            Err(e) => StepResult::Rejected(format!("{e:#}")),
        }
    }

    fn try_apply(&mut self, step: &Step) -> Result<StepResult> {
        let owner = self.ctx(self.config.owner);
        let deadline = self.now;
        Ok(match step {
            Step::Transfer { from, to, amount } => {
                let caller = self.account(from);
                let ctx = self.ctx(caller);
                let to = self.account(to);
                let amount = self.tokens(*amount);
                StepResult::Settled(self.token.transfer(&ctx, to, amount)?)
            }
            Step::Buy { account, base } => {
                let caller = self.account(account);
                let ctx = self.ctx(caller);
                let base = self.tokens(*base);
                self.token.base_mut().deposit(ctx.caller, base);
                let outcome = router::swap_exact_base_for_tokens(
                    &mut self.token,
                    &ctx,
                    base,
                    0,
                    ctx.caller,
                    deadline,
                )?;
                StepResult::Traded {
                    receipt: outcome.receipt,
                    amount_out: outcome.amount_out,
                }
            }
            Step::Sell { account, amount } => {
                let caller = self.account(account);
                let ctx = self.ctx(caller);
                let amount = self.tokens(*amount);
                let spender = self.token.router();
                self.token.approve(&ctx, spender, amount)?;
                let outcome = router::swap_exact_tokens_for_base(
                    &mut self.token,
                    &ctx,
                    amount,
                    0,
                    ctx.caller,
                    deadline,
                )?;
                StepResult::Traded {
                    receipt: outcome.receipt,
                    amount_out: outcome.amount_out,
                }
            }
            Step::Burn { account, amount } => {
                let caller = self.account(account);
                let ctx = self.ctx(caller);
                self.token.burn(&ctx, self.tokens(*amount))?;
                StepResult::Done
            }
            Step::Advance { seconds } => {
                self.now = self.now.saturating_add(*seconds);
                StepResult::Done
            }
            Step::EnableTax => {
                self.token.set_tax_enabled(&owner, true)?;
                StepResult::Done
            }
            Step::SetBuyTax {
                liquidity,
                marketing,
                ecosystem,
            } => {
                self.token
                    .set_buy_tax(&owner, TaxRate::new(*liquidity, *marketing, *ecosystem))?;
                StepResult::Done
            }
            Step::SetSellTax {
                liquidity,
                marketing,
                ecosystem,
            } => {
                self.token
                    .set_sell_tax(&owner, TaxRate::new(*liquidity, *marketing, *ecosystem))?;
                StepResult::Done
            }
            Step::SetMiniBeforeLiquify { amount } => {
                self.token
                    .set_mini_before_liquify(&owner, self.tokens(*amount))?;
                StepResult::Done
            }
            Step::SetMaxDailyVolume { amount } => {
                self.token
                    .set_max_daily_volume(&owner, self.tokens(*amount))?;
                StepResult::Done
            }
            Step::ExcludeFromFee { account, excluded } => {
                let account = self.account(account);
                self.token
                    .set_excluded_from_fee(&owner, account, *excluded)?;
                StepResult::Done
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfox_token::BaseCurrency;

    fn scenario(text: &str) -> Scenario {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_seeds_pool() {
        let scenario = scenario("");
        let sim = Simulation::new(TokenConfig::default(), &scenario).unwrap();
        let token = sim.token();
        let unit = TokenConfig::default().unit().unwrap();
        assert_eq!(token.balance_of(&token.pair()), 100_000 * unit);
        assert_eq!(token.base().balance_of(&token.pair()), 100 * unit);
    }

    #[test]
    fn test_trading_and_rejections() {
        let scenario = scenario(
            r#"
            [[step]]
            action = "enable_tax"

            [[step]]
            action = "buy"
            account = "alice"
            base = 1

            [[step]]
            action = "set_mini_before_liquify"
            amount = 0

            [[step]]
            action = "transfer"
            from = "owner"
            to = "alice"
            amount = 100

            [[step]]
            action = "sell"
            account = "alice"
            amount = 100

            [[step]]
            action = "enable_tax"

            [[step]]
            action = "burn"
            account = "bob"
            amount = 1
            "#,
        );
        let mut sim = Simulation::new(TokenConfig::default(), &scenario).unwrap();
        let results = sim.run(&scenario.steps);

        assert_eq!(results.len(), 7);
        assert!(matches!(&results[1], StepResult::Traded { receipt, .. } if receipt.fee > 0));
        assert!(matches!(results[4].liquify(), Some(LiquifyOutcome::Completed(_))));
        assert!(results[5].is_rejected());
        assert!(results[6].is_rejected());

        let token = sim.token();
        let sum: Amount = token.balances().map(|(_, b)| *b).sum();
        assert_eq!(sum, token.total_supply());
    }

    #[test]
    fn test_bundled_files_replay() {
        let config = TokenConfig::from_toml_str(include_str!("../scenarios/token.toml")).unwrap();
        let scenario = scenario(include_str!("../scenarios/trading.toml"));
        let mut sim = Simulation::new(config, &scenario).unwrap();
        let results = sim.run(&scenario.steps);

        let rejected: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_rejected())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(rejected, vec![7]);
        assert!(results
            .iter()
            .any(|r| matches!(r.liquify(), Some(LiquifyOutcome::Completed(_)))));
    }

    #[test]
    fn test_volume_resets_after_advance() {
        let scenario = scenario(
            r#"
            [[step]]
            action = "set_max_daily_volume"
            amount = 10

            [[step]]
            action = "transfer"
            from = "owner"
            to = "alice"
            amount = 100

            [[step]]
            action = "transfer"
            from = "alice"
            to = "bob"
            amount = 10

            [[step]]
            action = "transfer"
            from = "alice"
            to = "bob"
            amount = 1

            [[step]]
            action = "advance"
            seconds = 86400

            [[step]]
            action = "transfer"
            from = "alice"
            to = "bob"
            amount = 1
            "#,
        );
        let mut sim = Simulation::new(TokenConfig::default(), &scenario).unwrap();
        let results = sim.run(&scenario.steps);
        let rejected: Vec<bool> = results.iter().map(StepResult::is_rejected).collect();
        assert_eq!(rejected, vec![false, false, false, true, false, false]);
        assert_eq!(sim.now(), scenario.start_time + 86_400);
    }
}
