// Copyright (c) 2024 Botho Foundation

//! Balance ledger and transfer settlement.
//!
//! A transfer is settled in three steps. [`Ledger::prepare`] runs every
//! check (addresses, balance, fee, daily volume) without touching state and
//! returns a [`Settlement`]. [`Ledger::escrow`] debits the sender and
//! charges the daily cap. [`Ledger::release`] pays the recipient and the
//! fee and cannot fail. The token runs the fee conversion between escrow and
//! release, so the exchange can never spend the sender's tokens out from
//! under a transfer, and a failed check leaves nothing behind.

use crate::amm::{CallContext, TokenPort};
use crate::fee::{Direction, FeeQuote, FeeSchedule};
use crate::liquify::{LiquifyOutcome, LiquifyState};
use crate::registry::Registry;
use crate::volume::{VolumeLimiter, VolumeWindow};
use crate::{Address, Amount, TokenError};
use std::collections::HashMap;
use tracing::debug;

/// Summary of a settled transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub direction: Direction,
    /// Debited from the sender
    pub sent: Amount,
    /// Credited to the recipient
    pub received: Amount,
    /// Retained by the token contract
    pub fee: Amount,
    pub liquidity_share: Amount,
    pub liquify: LiquifyOutcome,
}

/// A validated transfer waiting to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
    pub direction: Direction,
    pub quote: FeeQuote,
    /// Account charged against the daily cap and its updated window
    pub volume: Option<(Address, VolumeWindow)>,
    pub now: u64,
}

/// Token metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Balances, allowances and the settlement rules that govern them.
#[derive(Debug, Clone)]
pub struct Ledger {
    address: Address,
    metadata: Metadata,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
    pub(crate) registry: Registry,
    pub(crate) fees: FeeSchedule,
    pub(crate) volume: VolumeLimiter,
    pub(crate) liquify: LiquifyState,
}

impl Ledger {
    /// Create a ledger with `initial_supply` minted to the registry owner.
    pub(crate) fn new(
        address: Address,
        metadata: Metadata,
        initial_supply: Amount,
        registry: Registry,
        fees: FeeSchedule,
        volume: VolumeLimiter,
        liquify: LiquifyState,
    ) -> Self {
        let mut balances = HashMap::new();
        if initial_supply > 0 {
            balances.insert(registry.owner(), initial_supply);
        }
        Self {
            address,
            metadata,
            balances,
            allowances: HashMap::new(),
            total_supply: initial_supply,
            registry,
            fees,
            volume,
            liquify,
        }
    }

    /// The token contract's own account, where fees accumulate.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// All accounts holding a non-zero balance.
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter().filter(|(_, balance)| **balance > 0)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub fn volume(&self) -> &VolumeLimiter {
        &self.volume
    }

    pub fn liquify(&self) -> &LiquifyState {
        &self.liquify
    }

    /// Validate a transfer and compute its effects without applying them.
    pub fn prepare(
        &self,
        from: Address,
        to: Address,
        amount: Amount,
        now: u64,
    ) -> Result<Settlement, TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if from.is_zero() {
            return Err(TokenError::InvalidSender(from));
        }
        if from == self.address && !self.liquify.is_swapping() {
            return Err(TokenError::InvalidSender(from));
        }

        let available = self.balance_of(&from);
        if amount > available {
            return Err(TokenError::InsufficientBalance {
                available,
                requested: amount,
            });
        }

        let direction = self.registry.classify(&from, &to);
        let exempt = self.registry.fee_exempt(&from, &to);
        let quote = self.fees.quote(direction, amount, exempt)?;

        let volume = match self.volume_account(direction, &from, &to) {
            Some(account) => Some((account, self.volume.check(&account, amount, now)?)),
            None => None,
        };

        Ok(Settlement {
            from,
            to,
            amount,
            direction,
            quote,
            volume,
            now,
        })
    }

    /// Account charged against the daily cap, if the cap applies.
    ///
    /// Buys are charged to the recipient since the sender is the pool.
    fn volume_account(&self, direction: Direction, from: &Address, to: &Address) -> Option<Address> {
        if !self.volume.is_enabled() {
            return None;
        }
        let account = match direction {
            Direction::Buy => *to,
            Direction::Sell | Direction::Plain => *from,
        };
        if self.registry.is_owner(&account) || account == self.address {
            return None;
        }
        Some(account)
    }

    /// Whether settling this transfer should run a fee conversion first.
    pub fn liquify_due(&self, settlement: &Settlement) -> bool {
        settlement.direction == Direction::Sell
            && self.liquify.should_trigger(self.balance_of(&self.address))
    }

    /// Apply a prepared settlement in one step.
    pub fn commit(&mut self, settlement: &Settlement) -> Result<Amount, TokenError> {
        self.escrow(settlement)?;
        Ok(self.release(settlement))
    }

    /// Debit the sender and charge the daily cap.
    ///
    /// The balance and the volume window are checked again against current
    /// state, so nothing that ran after [`prepare`](Self::prepare) can be
    /// overdrawn or overwritten. Once this returns `Ok` the transfer can no
    /// longer fail: [`release`](Self::release) completes it.
    pub fn escrow(&mut self, settlement: &Settlement) -> Result<(), TokenError> {
        let Settlement { from, amount, .. } = *settlement;
        let available = self.balance_of(&from);
        if amount > available {
            return Err(TokenError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        let window = match settlement.volume {
            Some((account, _)) => {
                let window = self.volume.check(&account, amount, settlement.now)?;
                Some((account, window))
            }
            None => None,
        };

        self.debit(from, amount);
        if let Some((account, window)) = window {
            self.volume.commit(account, window);
        }
        Ok(())
    }

    /// Credit the recipient and the retained fee of an escrowed settlement.
    /// Returns the amount received.
    pub fn release(&mut self, settlement: &Settlement) -> Amount {
        let Settlement {
            from,
            to,
            amount,
            quote,
            ..
        } = *settlement;
        let received = amount - quote.fee;

        self.credit(to, received);
        if quote.fee > 0 {
            self.credit(self.address, quote.fee);
            self.liquify.record_fee(quote.liquidity_share);
        }

        debug!(
            from = %from,
            to = %to,
            amount,
            fee = quote.fee,
            direction = %settlement.direction,
            "settled transfer"
        );
        received
    }

    /// Settle a transfer without ever starting a conversion.
    ///
    /// Used for nested transfers from the exchange while a conversion runs,
    /// and for any transfer that is not due for one.
    pub(crate) fn settle(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
        now: u64,
    ) -> Result<TransferReceipt, TokenError> {
        let settlement = self.prepare(from, to, amount, now)?;
        let liquify = if settlement.direction == Direction::Sell
            && self.liquify.is_swapping()
            && self.liquify.threshold_reached(self.balance_of(&self.address))
        {
            LiquifyOutcome::Bypassed
        } else {
            LiquifyOutcome::NotDue
        };
        let received = self.commit(&settlement)?;
        Ok(receipt(&settlement, received, liquify))
    }

    /// Fail unless `spender` may move `amount` of `owner`'s tokens.
    pub(crate) fn check_allowance(
        &self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let available = self.allowance(owner, spender);
        if amount > available {
            return Err(TokenError::InsufficientAllowance {
                available,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Consume allowance after a successful transfer. `Amount::MAX` is
    /// unlimited and never decremented.
    pub(crate) fn spend_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        if let Some(current) = self.allowances.get_mut(&(owner, spender)) {
            if *current != Amount::MAX {
                *current = current.saturating_sub(amount);
            }
        }
    }

    pub(crate) fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        if owner.is_zero() || spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
        Ok(())
    }

    /// Destroy `amount` of `account`'s tokens.
    pub(crate) fn burn(&mut self, account: Address, amount: Amount) -> Result<(), TokenError> {
        if account.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let available = self.balance_of(&account);
        if amount > available {
            return Err(TokenError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        self.debit(account, amount);
        self.total_supply -= amount;
        debug!(account = %account, amount, "burned");
        Ok(())
    }

    /// Callers must have checked the balance.
    fn debit(&mut self, account: Address, amount: Amount) {
        if let Some(balance) = self.balances.get_mut(&account) {
            *balance -= amount;
            if *balance == 0 {
                self.balances.remove(&account);
            }
        }
    }

    /// Only credits what was debited, so balances keep summing to total
    /// supply and cannot overflow.
    fn credit(&mut self, account: Address, amount: Amount) {
        if amount == 0 {
            return;
        }
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }
}

pub(crate) fn receipt(
    settlement: &Settlement,
    received: Amount,
    liquify: LiquifyOutcome,
) -> TransferReceipt {
    TransferReceipt {
        direction: settlement.direction,
        sent: settlement.amount,
        received,
        fee: settlement.quote.fee,
        liquidity_share: settlement.quote.liquidity_share,
        liquify,
    }
}

impl TokenPort for Ledger {
    fn token_address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, owner: &Address) -> Amount {
        Ledger::balance_of(self, owner)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        Ledger::allowance(self, owner, spender)
    }

    fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Amount, TokenError> {
        self.check_allowance(&from, &ctx.caller, amount)?;
        let receipt = self.settle(from, to, amount, ctx.timestamp)?;
        self.spend_allowance(from, ctx.caller, amount);
        Ok(receipt.received)
    }
}
