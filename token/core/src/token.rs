// Copyright (c) 2024 Botho Foundation

//! The token: ledger plus the exchange it converts fees through.

use crate::amm::{Amm, BaseCurrency, CallContext, LiquidityAdded, SwapEnv};
use crate::config::{Holders, TaxRate, TokenConfig};
use crate::fee::FeeSchedule;
use crate::ledger::{receipt, Ledger, Metadata, TransferReceipt};
use crate::liquify::{LiquifyOutcome, LiquifyPlan, LiquifyReport, LiquifyState, SwapState};
use crate::registry::Registry;
use crate::volume::VolumeLimiter;
use crate::{Address, AmmError, Amount, InitError, TokenError};
use tracing::{debug, info, warn};

/// A fee-on-transfer token bound to an exchange and a base currency.
///
/// All mutation goes through `&mut self`, so a token value is the single
/// writer of its ledger. The exchange only sees the ledger through a
/// [`crate::TokenPort`] while a fee conversion runs.
pub struct Token<A, B> {
    pub(crate) ledger: Ledger,
    amm: A,
    base: B,
    pair: Address,
}

impl<A: Amm, B: BaseCurrency> Token<A, B> {
    /// Deploy a token at `address`.
    ///
    /// Mints the whole supply to the owner, excludes the owner and the token
    /// itself from fees, and registers the token/base pool (creating it if
    /// the exchange has none). Taxes start disabled.
    pub fn new(config: &TokenConfig, address: Address, mut amm: A, base: B) -> Result<Self, InitError> {
        config.validate()?;
        if address.is_zero() {
            return Err(TokenError::ZeroAddress.into());
        }
        let initial_supply = config.to_base_units(config.initial_supply)?;

        let mut registry = Registry::new(config.owner, config.holders)?;
        registry.set_excluded_from_fee(config.owner, true);
        registry.set_excluded_from_fee(address, true);

        let base_address = base.address();
        let pair = match amm.get_pair_address(&address, &base_address) {
            Some(pair) => pair,
            None => amm.create_pair(address, base_address)?,
        };
        registry.set_pair(pair, true)?;

        let ledger = Ledger::new(
            address,
            Metadata {
                name: config.name.clone(),
                symbol: config.symbol.clone(),
                decimals: config.decimals,
            },
            initial_supply,
            registry,
            FeeSchedule::new(config.buy_tax, config.sell_tax)?,
            VolumeLimiter::new(config.to_base_units(config.max_daily_volume)?),
            LiquifyState::new(config.to_base_units(config.mini_before_liquify)?),
        );

        info!(
            token = %address,
            owner = %config.owner,
            pair = %pair,
            supply = initial_supply,
            "token deployed"
        );

        Ok(Self {
            ledger,
            amm,
            base,
            pair,
        })
    }

    /// Move `amount` from the caller to `to`.
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, TokenError> {
        self.execute(None, ctx.caller, to, amount, ctx.timestamp)
    }

    /// Move `amount` from `from` to `to` using the caller's allowance.
    ///
    /// The allowance is checked up front and consumed only once the
    /// transfer can no longer fail.
    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<TransferReceipt, TokenError> {
        self.ledger.check_allowance(&from, &ctx.caller, amount)?;
        self.execute(Some(ctx.caller), from, to, amount, ctx.timestamp)
    }

    pub fn approve(
        &mut self,
        ctx: &CallContext,
        spender: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.approve(ctx.caller, spender, amount)
    }

    /// Destroy `amount` of the caller's tokens.
    pub fn burn(&mut self, ctx: &CallContext, amount: Amount) -> Result<(), TokenError> {
        self.ledger.burn(ctx.caller, amount)
    }

    /// Destroy `amount` of `account`'s tokens using the caller's allowance.
    pub fn burn_from(
        &mut self,
        ctx: &CallContext,
        account: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.ledger.check_allowance(&account, &ctx.caller, amount)?;
        self.ledger.burn(account, amount)?;
        self.ledger.spend_allowance(account, ctx.caller, amount);
        Ok(())
    }

    /// Native value sent straight to the token is always refused.
    pub fn receive_value(&mut self, ctx: &CallContext, _amount: Amount) -> Result<(), TokenError> {
        Err(TokenError::InvalidSender(ctx.caller))
    }

    /// Settle a transfer, converting retained fees first when it is due.
    ///
    /// Every check runs before the sender is debited, and the conversion
    /// runs only after, so a transfer that starts a conversion always
    /// completes.
    fn execute(
        &mut self,
        spender: Option<Address>,
        from: Address,
        to: Address,
        amount: Amount,
        now: u64,
    ) -> Result<TransferReceipt, TokenError> {
        let settlement = self.ledger.prepare(from, to, amount, now)?;
        let due = self.ledger.liquify_due(&settlement);
        self.ledger.escrow(&settlement)?;
        if let Some(spender) = spender {
            self.ledger.spend_allowance(from, spender, amount);
        }

        let liquify = if due {
            self.swap_and_liquify(now)
        } else {
            LiquifyOutcome::NotDue
        };
        let received = self.ledger.release(&settlement);
        Ok(receipt(&settlement, received, liquify))
    }

    /// Run `f` with the conversion guard held. The guard is released on
    /// every return path.
    fn guarded<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.ledger.liquify.enter();
        let result = f(self);
        self.ledger.liquify.exit();
        result
    }

    /// Convert the token's retained fees. Never fails the caller.
    fn swap_and_liquify(&mut self, now: u64) -> LiquifyOutcome {
        let retained = self.ledger.balance_of(&self.ledger.address());
        let plan = match LiquifyPlan::new(retained, self.ledger.fees.sell()) {
            Ok(Some(plan)) => plan,
            Ok(None) => {
                debug!(retained, "sell tax weights are zero, conversion skipped");
                return LiquifyOutcome::Skipped;
            }
            Err(e) => return LiquifyOutcome::Failed(e.to_string()),
        };

        match self.guarded(|token| token.convert(&plan, now)) {
            Ok(report) => {
                self.ledger.liquify.clear_reserves();
                info!(
                    swapped = report.tokens_swapped,
                    base_received = report.base_received,
                    tokens_added = report.tokens_added,
                    liquidity = report.liquidity_minted,
                    "converted retained fees"
                );
                LiquifyOutcome::Completed(report)
            }
            Err(e) => {
                warn!(error = %e, retained, "fee conversion failed, tokens stay queued");
                LiquifyOutcome::Failed(e.to_string())
            }
        }
    }

    fn convert(&mut self, plan: &LiquifyPlan, now: u64) -> Result<LiquifyReport, AmmError> {
        let contract = self.ledger.address();
        let router = self.amm.router_address();
        let holders = *self.ledger.registry.holders();
        let path = [contract, self.base.address()];

        let base_before = self.base.balance_of(&contract);
        self.ledger.approve(contract, router, plan.to_swap)?;
        self.amm.swap_exact_tokens_for_base(
            SwapEnv {
                token: &mut self.ledger,
                base: &mut self.base,
                caller: contract,
                timestamp: now,
            },
            plan.to_swap,
            0,
            &path,
            contract,
            now,
        )?;
        let base_received = self.base.balance_of(&contract).saturating_sub(base_before);
        let split = plan.split_base(base_received)?;

        let mut added = LiquidityAdded::default();
        if plan.keep > 0 && split.liquidity > 0 {
            self.ledger.approve(contract, router, plan.keep)?;
            added = self.amm.add_liquidity(
                SwapEnv {
                    token: &mut self.ledger,
                    base: &mut self.base,
                    caller: contract,
                    timestamp: now,
                },
                plan.keep,
                split.liquidity,
                0,
                0,
                holders.liquidity,
                now,
            )?;
        }

        // Includes base left behind by an earlier conversion whose
        // liquidity add failed.
        let remaining = self.base.balance_of(&contract);
        let (marketing_base, ecosystem_base) = plan.split_payout(remaining)?;
        if marketing_base > 0 {
            self.base.transfer(contract, holders.marketing, marketing_base)?;
        }
        if ecosystem_base > 0 {
            self.base.transfer(contract, holders.ecosystem, ecosystem_base)?;
        }

        Ok(LiquifyReport {
            tokens_swapped: plan.to_swap,
            base_received,
            tokens_added: added.token_amount,
            base_added: added.base_amount,
            liquidity_minted: added.liquidity,
            marketing_base,
            ecosystem_base,
        })
    }

    /// Run `f` against the exchange with `ctx.caller` as the spending
    /// account. Transfers made this way never start a fee conversion.
    pub fn with_exchange<R>(
        &mut self,
        ctx: &CallContext,
        f: impl FnOnce(&mut A, SwapEnv<'_>) -> R,
    ) -> R {
        let env = SwapEnv {
            token: &mut self.ledger,
            base: &mut self.base,
            caller: ctx.caller,
            timestamp: ctx.timestamp,
        };
        f(&mut self.amm, env)
    }
}

impl<A, B> Token<A, B> {
    pub fn address(&self) -> Address {
        self.ledger.address()
    }

    pub fn name(&self) -> &str {
        &self.ledger.metadata().name
    }

    pub fn symbol(&self) -> &str {
        &self.ledger.metadata().symbol
    }

    pub fn decimals(&self) -> u8 {
        self.ledger.metadata().decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    pub fn balance_of(&self, owner: &Address) -> Amount {
        self.ledger.balance_of(owner)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.ledger.allowance(owner, spender)
    }

    /// All accounts holding a non-zero balance.
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.ledger.balances()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn owner(&self) -> Address {
        self.ledger.registry().owner()
    }

    pub fn is_pair(&self, account: &Address) -> bool {
        self.ledger.registry().is_pair(account)
    }

    pub fn is_excluded_from_fee(&self, account: &Address) -> bool {
        self.ledger.registry().is_excluded_from_fee(account)
    }

    pub fn holders(&self) -> &Holders {
        self.ledger.registry().holders()
    }

    /// The token/base pool registered at deployment.
    pub fn pair(&self) -> Address {
        self.pair
    }

    pub fn buy_tax(&self) -> TaxRate {
        self.ledger.fees().buy()
    }

    pub fn sell_tax(&self) -> TaxRate {
        self.ledger.fees().sell()
    }

    pub fn tax_enabled(&self) -> bool {
        self.ledger.fees().is_enabled()
    }

    pub fn liquidity_reserves(&self) -> Amount {
        self.ledger.liquify().liquidity_reserves()
    }

    pub fn min_tokens_before_liquify(&self) -> Amount {
        self.ledger.liquify().min_tokens_before_liquify()
    }

    pub fn swap_state(&self) -> SwapState {
        self.ledger.liquify().state()
    }

    pub fn max_daily_volume(&self) -> Amount {
        self.ledger.volume().max_daily_volume()
    }

    /// Volume `account` has used on the day containing `now`.
    pub fn daily_volume(&self, account: &Address, now: u64) -> Amount {
        self.ledger.volume().daily_volume(account, now)
    }

    pub fn amm(&self) -> &A {
        &self.amm
    }

    pub fn amm_mut(&mut self) -> &mut A {
        &mut self.amm
    }

    pub fn base(&self) -> &B {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut B {
        &mut self.base
    }
}

impl<A: Amm, B> Token<A, B> {
    pub fn router(&self) -> Address {
        self.amm.router_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stubs::{addr, deploy, StubAmm, StubToken, NOW, UNIT};

    fn ctx(label: &str) -> CallContext {
        CallContext::new(addr(label), NOW)
    }

    /// Deploy, enable taxes and fund `alice` with `tokens` whole tokens.
    fn taxed_with_alice(amm: StubAmm, tokens: Amount) -> StubToken {
        let mut token = deploy(amm);
        token.set_tax_enabled(&ctx("owner"), true).unwrap();
        token
            .transfer(&ctx("owner"), addr("alice"), tokens * UNIT)
            .unwrap();
        token
    }

    #[test]
    fn test_deploy_defaults() {
        let token = deploy(StubAmm::default());
        let owner = addr("owner");
        assert_eq!(token.balance_of(&owner), token.total_supply());
        assert_eq!(token.total_supply(), 5_000_000_000 * UNIT);
        assert_eq!(token.name(), "Galaxy Fox");
        assert_eq!(token.symbol(), "GFOX");
        assert_eq!(token.decimals(), 18);
        assert!(token.is_excluded_from_fee(&owner));
        assert!(token.is_excluded_from_fee(&token.address()));
        assert!(token.is_pair(&token.pair()));
        assert_eq!(token.pair(), addr("stub-pair"));
        assert_eq!(token.router(), addr("stub-router"));
        assert!(!token.tax_enabled());
        assert_eq!(token.swap_state(), SwapState::Idle);
    }

    #[test]
    fn test_deploy_reuses_existing_pair() {
        let existing = addr("existing-pair");
        let amm = StubAmm {
            pair: Some(existing),
            ..StubAmm::default()
        };
        let token = deploy(amm);
        assert_eq!(token.pair(), existing);
        assert_eq!(token.amm().pairs_created, 0);
    }

    #[test]
    fn test_deploy_rejects_zero_token_address() {
        let config = TokenConfig::default();
        let result = Token::new(
            &config,
            Address::ZERO,
            StubAmm::default(),
            crate::stubs::StubBase::default(),
        );
        assert!(matches!(result, Err(InitError::Token(TokenError::ZeroAddress))));
    }

    #[test]
    fn test_receive_value_rejected() {
        let mut token = deploy(StubAmm::default());
        assert_eq!(
            token.receive_value(&ctx("alice"), UNIT),
            Err(TokenError::InvalidSender(addr("alice")))
        );
    }

    #[test]
    fn test_token_account_cannot_send() {
        let mut token = deploy(StubAmm::default());
        let contract = CallContext::new(token.address(), NOW);
        assert_eq!(
            token.transfer(&contract, addr("alice"), 0),
            Err(TokenError::InvalidSender(token.address()))
        );
    }

    #[test]
    fn test_sell_converts_retained_fees() {
        let mut token = taxed_with_alice(StubAmm::default(), 2_000);
        token.set_mini_before_liquify(&ctx("owner"), 100 * UNIT).unwrap();
        let pair = token.pair();

        let first = token.transfer(&ctx("alice"), pair, 1_000 * UNIT).unwrap();
        assert_eq!(first.fee, 200 * UNIT);
        assert_eq!(first.received, 800 * UNIT);
        assert_eq!(first.liquify, LiquifyOutcome::NotDue);
        assert_eq!(token.liquidity_reserves(), 100 * UNIT);

        let second = token.transfer(&ctx("alice"), pair, 1_000 * UNIT).unwrap();
        let LiquifyOutcome::Completed(report) = second.liquify else {
            panic!("expected a conversion, got {:?}", second.liquify);
        };
        // 200 retained: 100 liquidity, 50 kept, 150 sold at 1:1
        assert_eq!(report.tokens_swapped, 150 * UNIT);
        assert_eq!(report.base_received, 150 * UNIT);
        assert_eq!(report.tokens_added, 50 * UNIT);
        assert_eq!(report.base_added, 50 * UNIT);
        assert_eq!(report.marketing_base, 50 * UNIT);
        assert_eq!(report.ecosystem_base, 50 * UNIT);

        let holders = *token.holders();
        assert_eq!(token.base().balance_of(&holders.marketing), 50 * UNIT);
        assert_eq!(token.base().balance_of(&holders.ecosystem), 50 * UNIT);
        assert_eq!(token.amm().lp_balance(&holders.liquidity), 50 * UNIT);

        // only the new fee remains queued
        assert_eq!(token.balance_of(&token.address()), 200 * UNIT);
        assert_eq!(token.liquidity_reserves(), 100 * UNIT);
        assert_eq!(token.balance_of(&pair), 1_600 * UNIT + 200 * UNIT);
        assert_eq!(token.swap_state(), SwapState::Idle);
        assert_eq!(token.allowance(&token.address(), &token.router()), 0);
    }

    #[test]
    fn test_buy_does_not_convert() {
        let mut token = taxed_with_alice(StubAmm::default(), 0);
        let pair = token.pair();
        token.set_mini_before_liquify(&ctx("owner"), 0).unwrap();
        token.transfer(&ctx("owner"), pair, 10_000 * UNIT).unwrap();

        let pool = CallContext::new(pair, NOW);
        let first = token.transfer(&pool, addr("bob"), 1_000 * UNIT).unwrap();
        let second = token.transfer(&pool, addr("bob"), 1_000 * UNIT).unwrap();
        assert_eq!(first.received, 800 * UNIT);
        assert_eq!(second.liquify, LiquifyOutcome::NotDue);
        assert_eq!(token.balance_of(&token.address()), 400 * UNIT);
        assert_eq!(token.amm().swaps, 0);
    }

    #[test]
    fn test_failed_conversion_keeps_tokens_queued() {
        let amm = StubAmm {
            fail_swap: true,
            ..StubAmm::default()
        };
        let mut token = taxed_with_alice(amm, 2_000);
        token.set_mini_before_liquify(&ctx("owner"), 0).unwrap();
        let pair = token.pair();

        token.transfer(&ctx("alice"), pair, 1_000 * UNIT).unwrap();
        let receipt = token.transfer(&ctx("alice"), pair, 500 * UNIT).unwrap();
        assert!(matches!(receipt.liquify, LiquifyOutcome::Failed(_)));
        assert_eq!(receipt.received, 400 * UNIT);
        assert_eq!(token.balance_of(&token.address()), 300 * UNIT);
        assert_eq!(token.swap_state(), SwapState::Idle);
        assert_eq!(token.liquidity_reserves(), 150 * UNIT);

        token.amm_mut().fail_swap = false;
        let receipt = token.transfer(&ctx("alice"), pair, 500 * UNIT).unwrap();
        assert!(receipt.liquify.is_completed());
        assert_eq!(token.balance_of(&token.address()), 100 * UNIT);
    }

    #[test]
    fn test_failed_liquidity_add_reports_failure() {
        let amm = StubAmm {
            fail_add: true,
            ..StubAmm::default()
        };
        let mut token = taxed_with_alice(amm, 3_000);
        token.set_mini_before_liquify(&ctx("owner"), 0).unwrap();
        let pair = token.pair();
        let contract = token.address();

        token.transfer(&ctx("alice"), pair, 1_000 * UNIT).unwrap();
        let receipt = token.transfer(&ctx("alice"), pair, 1_000 * UNIT).unwrap();
        assert!(matches!(receipt.liquify, LiquifyOutcome::Failed(_)));
        assert_eq!(token.swap_state(), SwapState::Idle);
        // the kept liquidity half stays queued next to the new fee
        assert_eq!(token.balance_of(&contract), 250 * UNIT);
        assert_eq!(token.base().balance_of(&contract), 150 * UNIT);

        // the next conversion forwards the stranded base as well
        token.amm_mut().fail_add = false;
        let receipt = token.transfer(&ctx("alice"), pair, 1_000 * UNIT).unwrap();
        let LiquifyOutcome::Completed(report) = receipt.liquify else {
            panic!("expected a conversion, got {:?}", receipt.liquify);
        };
        assert_eq!(token.base().balance_of(&contract), 0);
        assert_eq!(
            report.marketing_base + report.ecosystem_base,
            150 * UNIT + report.base_received - report.base_added
        );
        let holders = *token.holders();
        let paid = token.base().balance_of(&holders.marketing)
            + token.base().balance_of(&holders.ecosystem);
        assert_eq!(paid, report.marketing_base + report.ecosystem_base);
    }

    #[test]
    fn test_reentrant_sell_of_seller_cannot_break_transfer() {
        let mut token = taxed_with_alice(StubAmm::default(), 1_000);
        let owner = ctx("owner");
        let alice = addr("alice");
        let pair = token.pair();
        let contract = token.address();
        let router = token.router();
        token.set_max_daily_volume(&owner, 10_000 * UNIT).unwrap();
        token.transfer(&owner, addr("bob"), 1_000 * UNIT).unwrap();
        token.transfer(&ctx("bob"), pair, 1_000 * UNIT).unwrap();
        assert_eq!(token.balance_of(&contract), 200 * UNIT);

        token.set_mini_before_liquify(&owner, 0).unwrap();
        token.amm_mut().reenter_from = Some(alice);
        token.approve(&ctx("alice"), router, 1_000 * UNIT).unwrap();
        let supply = token.total_supply();

        // the exchange sells alice's remaining balance from inside the
        // conversion while her own sell through the router is in flight
        let receipt = token
            .transfer_from(&CallContext::new(router, NOW), alice, pair, 500 * UNIT)
            .unwrap();
        assert!(receipt.liquify.is_completed());
        assert_eq!(receipt.received, 400 * UNIT);
        assert_eq!(token.amm().nested, Some(Ok(400 * UNIT)));

        assert_eq!(token.balance_of(&alice), 0);
        assert_eq!(token.allowance(&alice, &router), 0);
        // 800 + 150 swapped + 400 nested + 50 added + 400 outer
        assert_eq!(token.balance_of(&pair), 1_800 * UNIT);
        // 200 - 150 - 50 + 100 nested fee + 100 outer fee
        assert_eq!(token.balance_of(&contract), 200 * UNIT);
        let sum: Amount = token.balances().map(|(_, b)| *b).sum();
        assert_eq!(sum, supply);
        // both sells count against the cap
        assert_eq!(token.daily_volume(&alice, NOW), 1_000 * UNIT);
        assert_eq!(token.swap_state(), SwapState::Idle);

        // a transfer that fails its checks changes nothing
        token.transfer(&owner, alice, 100 * UNIT).unwrap();
        let swaps = token.amm().swaps;
        let before: Vec<Amount> = [alice, pair, contract]
            .iter()
            .map(|a| token.balance_of(a))
            .collect();
        assert!(matches!(
            token.transfer(&ctx("alice"), pair, 200 * UNIT),
            Err(TokenError::InsufficientBalance { .. })
        ));
        let after: Vec<Amount> = [alice, pair, contract]
            .iter()
            .map(|a| token.balance_of(a))
            .collect();
        assert_eq!(before, after);
        assert_eq!(token.amm().swaps, swaps);
        assert_eq!(token.daily_volume(&alice, NOW), 1_000 * UNIT);
    }

    #[test]
    fn test_reentrant_exchange_cannot_nest() {
        let amm = StubAmm {
            reenter_from: Some(addr("mallory")),
            ..StubAmm::default()
        };
        let mut token = taxed_with_alice(amm, 2_000);
        token.set_mini_before_liquify(&ctx("owner"), 0).unwrap();
        token
            .transfer(&ctx("owner"), addr("mallory"), 100 * UNIT)
            .unwrap();
        let router = token.router();
        token.approve(&ctx("mallory"), router, 100 * UNIT).unwrap();
        let pair = token.pair();

        token.transfer(&ctx("alice"), pair, 1_000 * UNIT).unwrap();
        let receipt = token.transfer(&ctx("alice"), pair, 1_000 * UNIT).unwrap();
        assert!(receipt.liquify.is_completed());
        assert_eq!(token.amm().swaps, 1);

        // the nested sell settled with tax but did not convert again
        assert_eq!(token.amm().nested, Some(Ok(80 * UNIT)));
        assert_eq!(token.balance_of(&addr("mallory")), 0);
        assert_eq!(token.swap_state(), SwapState::Idle);
    }

    #[test]
    fn test_zero_sell_weights_skip_conversion() {
        let mut token = taxed_with_alice(StubAmm::default(), 0);
        let pair = token.pair();
        token.set_mini_before_liquify(&ctx("owner"), 0).unwrap();
        token.transfer(&ctx("owner"), pair, 10_000 * UNIT).unwrap();
        token
            .transfer(&CallContext::new(pair, NOW), addr("alice"), 1_000 * UNIT)
            .unwrap();

        token
            .set_sell_tax(&ctx("owner"), TaxRate::new(0, 0, 0))
            .unwrap();
        let receipt = token.transfer(&ctx("alice"), pair, 800 * UNIT).unwrap();
        assert_eq!(receipt.liquify, LiquifyOutcome::Skipped);
        assert_eq!(receipt.fee, 0);
        assert_eq!(receipt.received, 800 * UNIT);
        assert_eq!(token.balance_of(&token.address()), 200 * UNIT);
    }

    #[test]
    fn test_transfer_from_consumes_allowance_on_success_only() {
        let mut token = taxed_with_alice(StubAmm::default(), 100);
        token.approve(&ctx("alice"), addr("bob"), 150 * UNIT).unwrap();

        let err = token
            .transfer_from(&ctx("bob"), addr("alice"), addr("carol"), 120 * UNIT)
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
        assert_eq!(token.allowance(&addr("alice"), &addr("bob")), 150 * UNIT);

        token
            .transfer_from(&ctx("bob"), addr("alice"), addr("carol"), 60 * UNIT)
            .unwrap();
        assert_eq!(token.allowance(&addr("alice"), &addr("bob")), 90 * UNIT);
        assert_eq!(token.balance_of(&addr("carol")), 60 * UNIT);

        assert_eq!(
            token.transfer_from(&ctx("carol"), addr("alice"), addr("carol"), 1),
            Err(TokenError::InsufficientAllowance {
                available: 0,
                requested: 1
            })
        );
    }

    #[test]
    fn test_burn_and_burn_from() {
        let mut token = taxed_with_alice(StubAmm::default(), 100);
        let supply = token.total_supply();

        token.burn(&ctx("alice"), 40 * UNIT).unwrap();
        assert_eq!(token.total_supply(), supply - 40 * UNIT);
        assert_eq!(token.balance_of(&addr("alice")), 60 * UNIT);

        assert!(matches!(
            token.burn_from(&ctx("bob"), addr("alice"), UNIT),
            Err(TokenError::InsufficientAllowance { .. })
        ));
        token.approve(&ctx("alice"), addr("bob"), 10 * UNIT).unwrap();
        token.burn_from(&ctx("bob"), addr("alice"), 10 * UNIT).unwrap();
        assert_eq!(token.allowance(&addr("alice"), &addr("bob")), 0);
        assert_eq!(token.total_supply(), supply - 50 * UNIT);

        assert!(matches!(
            token.burn(&ctx("alice"), 51 * UNIT),
            Err(TokenError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_with_exchange_never_converts() {
        let mut token = taxed_with_alice(StubAmm::default(), 1_000);
        token.set_mini_before_liquify(&ctx("owner"), 0).unwrap();
        let pair = token.pair();
        token.transfer(&ctx("alice"), pair, 500 * UNIT).unwrap();
        let router = token.router();
        token.approve(&ctx("alice"), router, 500 * UNIT).unwrap();

        let received = token
            .with_exchange(&ctx("alice"), |amm, env| {
                let ctx = CallContext::new(amm.router_address(), env.timestamp);
                env.token.transfer_from(&ctx, env.caller, pair, 500 * UNIT)
            })
            .unwrap();
        assert_eq!(received, 400 * UNIT);
        assert_eq!(token.amm().swaps, 0);
        assert_eq!(token.balance_of(&token.address()), 200 * UNIT);
    }
}
