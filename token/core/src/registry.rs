// Copyright (c) 2024 Botho Foundation

//! Ownership, recognized pools, fee exclusions and payout holders.

use crate::config::Holders;
use crate::fee::Direction;
use crate::{Address, TokenError};
use std::collections::HashSet;

/// Access-control and address bookkeeping for the token.
#[derive(Debug, Clone)]
pub struct Registry {
    owner: Address,
    pairs: HashSet<Address>,
    excluded: HashSet<Address>,
    holders: Holders,
}

impl Registry {
    pub fn new(owner: Address, holders: Holders) -> Result<Self, TokenError> {
        if owner.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        holders.validate()?;
        Ok(Self {
            owner,
            pairs: HashSet::new(),
            excluded: HashSet::new(),
            holders,
        })
    }

    /// Current owner. [`Address::ZERO`] once ownership is renounced.
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, account: &Address) -> bool {
        !self.owner.is_zero() && self.owner == *account
    }

    /// Fail with `Unauthorized` unless `caller` is the owner.
    pub fn ensure_owner(&self, caller: &Address) -> Result<(), TokenError> {
        if !self.is_owner(caller) {
            return Err(TokenError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    pub fn set_owner(&mut self, owner: Address) {
        self.owner = owner;
    }

    pub fn is_pair(&self, account: &Address) -> bool {
        self.pairs.contains(account)
    }

    pub fn set_pair(&mut self, pair: Address, is_pair: bool) -> Result<(), TokenError> {
        if pair.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if is_pair {
            self.pairs.insert(pair);
        } else {
            self.pairs.remove(&pair);
        }
        Ok(())
    }

    pub fn is_excluded_from_fee(&self, account: &Address) -> bool {
        self.excluded.contains(account)
    }

    pub fn set_excluded_from_fee(&mut self, account: Address, excluded: bool) {
        if excluded {
            self.excluded.insert(account);
        } else {
            self.excluded.remove(&account);
        }
    }

    pub fn holders(&self) -> &Holders {
        &self.holders
    }

    pub fn set_liquidity_holder(&mut self, holder: Address) -> Result<(), TokenError> {
        self.holders.liquidity = non_zero(holder)?;
        Ok(())
    }

    pub fn set_marketing_holder(&mut self, holder: Address) -> Result<(), TokenError> {
        self.holders.marketing = non_zero(holder)?;
        Ok(())
    }

    pub fn set_ecosystem_holder(&mut self, holder: Address) -> Result<(), TokenError> {
        self.holders.ecosystem = non_zero(holder)?;
        Ok(())
    }

    /// Classify a transfer. Pool-to-pool counts as a buy.
    pub fn classify(&self, from: &Address, to: &Address) -> Direction {
        if self.is_pair(from) {
            Direction::Buy
        } else if self.is_pair(to) {
            Direction::Sell
        } else {
            Direction::Plain
        }
    }

    /// Whether either party is exempt from fees.
    pub fn fee_exempt(&self, from: &Address, to: &Address) -> bool {
        self.is_excluded_from_fee(from) || self.is_excluded_from_fee(to)
    }
}

fn non_zero(address: Address) -> Result<Address, TokenError> {
    if address.is_zero() {
        return Err(TokenError::ZeroAddress);
    }
    Ok(address)
}
