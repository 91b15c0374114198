//! In-memory collateral custodian

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use vault_core::{Address, Amount, CollabResult, CollateralStore};

/// Collateral ledger held entirely in memory
///
/// Transfers move balances between holder accounts and the vault's custody
/// account. `fail_next_transfer` arms a one-shot failure so callers can
/// exercise rollback paths.
pub struct InMemoryCollateral {
    vault: Address,
    balances: RwLock<HashMap<Address, Amount>>,
    fail_next: AtomicBool,
}

impl InMemoryCollateral {
    /// Create a custodian whose vault custody account is `vault`
    pub fn new(vault: impl Into<String>) -> Self {
        Self {
            vault: Address::new(vault),
            balances: RwLock::new(HashMap::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Credit `amount` to `holder` out of thin air
    pub fn fund(&self, holder: &Address, amount: Amount) {
        *self.balances.write().entry(holder.clone()).or_insert(0) += amount;
    }

    /// Arm a one-shot failure on the next transfer in either direction
    pub fn fail_next_transfer(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn take_armed_failure(&self) -> bool {
        self.fail_next.swap(false, Ordering::SeqCst)
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> CollabResult<()> {
        if self.take_armed_failure() {
            return Err("injected transfer failure".to_string());
        }

        let mut balances = self.balances.write();
        let from_balance = balances.get(from).copied().unwrap_or(0);
        if from_balance < amount {
            return Err(format!(
                "insufficient collateral: {} holds {}, needs {}",
                from, from_balance, amount
            ));
        }

        balances.insert(from.clone(), from_balance - amount);
        *balances.entry(to.clone()).or_insert(0) += amount;
        tracing::debug!(from = %from, to = %to, amount = %amount, "collateral moved");
        Ok(())
    }
}

impl CollateralStore for InMemoryCollateral {
    fn transfer_in(&self, from: &Address, amount: Amount) -> CollabResult<()> {
        let vault = self.vault.clone();
        self.transfer(from, &vault, amount)
    }

    fn transfer_out(&self, to: &Address, amount: Amount) -> CollabResult<()> {
        let vault = self.vault.clone();
        self.transfer(&vault, to, amount)
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.read().get(holder).copied().unwrap_or(0)
    }
}
