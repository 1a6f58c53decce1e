//! Account storage for the custody plane.
//!
//! The store is the single home of live [`Account`] state. Mutable access
//! stays inside this crate: every balance change goes through the
//! [`Ledger`](crate::Ledger) facade so the mutation and its journal entry
//! land together or not at all.

use std::collections::HashMap;

use rackup_types::{Account, AccountId, EngineError, Result};
use rust_decimal::Decimal;

/// Keyed store of player accounts.
pub struct AccountStore {
    accounts: HashMap<AccountId, Account>,
}

impl AccountStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Open a new account at the given starting balance.
    pub fn open(&mut self, display_name: impl Into<String>, starting_balance: Decimal) -> AccountId {
        let account = Account::new(display_name, starting_balance);
        let id = account.id;
        self.accounts.insert(id, account);
        id
    }

    /// Re-insert a previously persisted account (snapshot reload).
    pub fn restore(&mut self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    #[must_use]
    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.get(&id)
    }

    /// # Errors
    /// Returns `AccountNotFound` for an unknown id.
    pub fn require(&self, id: AccountId) -> Result<&Account> {
        self.accounts.get(&id).ok_or(EngineError::AccountNotFound(id))
    }

    /// Mutable lookup, crate-private so callers outside the custody plane
    /// cannot bypass the journal.
    pub(crate) fn require_mut(&mut self, id: AccountId) -> Result<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or(EngineError::AccountNotFound(id))
    }

    #[must_use]
    pub fn exists(&self, id: AccountId) -> bool {
        self.accounts.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Sum of every live balance — the spendable supply across the system.
    #[must_use]
    pub fn total_balance(&self) -> Decimal {
        self.accounts.values().map(|a| a.balance).sum()
    }

    /// Iterate accounts in arbitrary order (snapshots, audits).
    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}
