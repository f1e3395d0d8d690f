// Copyright (c) 2024 Botho Foundation

//! Wrapped base currency backed by a map.

use gfox_token::{Address, AmmError, Amount, BaseCurrency};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct WrappedBase {
    address: Address,
    balances: HashMap<Address, Amount>,
}

impl WrappedBase {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balances: HashMap::new(),
        }
    }

    /// Wrap native value into `owner`'s balance.
    pub fn deposit(&mut self, owner: Address, amount: Amount) {
        *self.balances.entry(owner).or_insert(0) += amount;
    }

    pub fn total_supply(&self) -> Amount {
        self.balances.values().sum()
    }
}

impl Default for WrappedBase {
    fn default() -> Self {
        Self::new(Address::derive("wrapped-base"))
    }
}

impl BaseCurrency for WrappedBase {
    fn address(&self) -> Address {
        self.address
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
