//! Share ledger
//!
//! Pure bookkeeping: per-account share balances and the total issued supply.
//! Accounts are created implicitly on first credit and never destroyed.
//!
//! # Invariant
//!
//! Σ(account balances) == total issued shares, after every operation.

use crate::types::{Address, Amount};
use crate::{Error, Result};
use std::collections::HashMap;

/// Per-account share balances plus total issued shares
#[derive(Debug, Clone, Default)]
pub struct ShareLedger {
    balances: HashMap<Address, Amount>,
    total_shares: Amount,
}

impl ShareLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Share balance of an account (zero for unknown accounts)
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Total issued shares
    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    /// Whether crediting `amount` to `account` would overflow
    pub fn can_credit(&self, account: &Address, amount: Amount) -> bool {
        self.total_shares.checked_add(amount).is_some()
            && self.balance_of(account).checked_add(amount).is_some()
    }

    /// Credit shares to an account, minting them into the total supply
    pub fn credit(&mut self, account: &Address, amount: Amount) -> Result<()> {
        let new_total = self
            .total_shares
            .checked_add(amount)
            .ok_or(Error::Overflow("total shares"))?;
        let balance = self.balances.entry(account.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(Error::Overflow("share balance"))?;
        self.total_shares = new_total;
        Ok(())
    }

    /// Burn shares from an account, removing them from the total supply
    pub fn burn(&mut self, account: &Address, amount: Amount) -> Result<()> {
        let balance = self.balance_of(account);
        let new_balance = balance.checked_sub(amount).ok_or(Error::InsufficientShares {
            owner: account.clone(),
            balance,
            claimed: amount,
        })?;
        // total >= balance by the conservation invariant
        self.total_shares -= amount;
        self.balances.insert(account.clone(), new_balance);
        Ok(())
    }

    /// Check the conservation invariant: Σ(balances) == total shares
    pub fn check_conservation(&self) -> bool {
        let mut sum: Amount = 0;
        for balance in self.balances.values() {
            sum = match sum.checked_add(*balance) {
                Some(s) => s,
                None => return false,
            };
        }
        sum == self.total_shares
    }

    /// Number of accounts ever credited
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }
}
