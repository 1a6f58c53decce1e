//! Player account state.
//!
//! An account's `balance` is mutated only by the Ledger; queue, room, and
//! settlement logic never touch it directly.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::AccountId;

/// A player account with a spendable, non-negative balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub display_name: String,
    /// Current spendable balance.
    pub balance: Decimal,
    /// Balance at account creation — the replay base for conservation checks.
    pub creation_balance: Decimal,
    /// Set by the abandonment handler when this account walked out of a
    /// live match. Cleared manually by the external review workflow.
    #[serde(default)]
    pub flagged_for_review: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    #[must_use]
    pub fn new(display_name: impl Into<String>, starting_balance: Decimal) -> Self {
        Self {
            id: AccountId::new(),
            display_name: display_name.into(),
            balance: starting_balance,
            creation_balance: starting_balance,
            flagged_for_review: false,
            created_at: Utc::now(),
        }
    }

    /// `true` if the balance covers `amount`.
    #[must_use]
    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}
