//! Hold book — the table of escrow reservations.
//!
//! The book owns every [`Hold`] record and its state transitions. It never
//! touches balances itself; the [`Ledger`](crate::Ledger) facade pairs each
//! transition with the matching balance mutation and journal append.

use std::collections::HashMap;

use chrono::Utc;
use rackup_types::{AccountId, EngineError, Hold, HoldId, HoldState, Result, RoomId};
use rust_decimal::Decimal;

/// Tracks the escrow-hold lifecycle: opening, consumption, refund.
pub struct HoldBook {
    holds: HashMap<HoldId, Hold>,
}

impl HoldBook {
    /// Create a new empty book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            holds: HashMap::new(),
        }
    }

    /// Record a fresh ACTIVE hold. The caller has already moved the funds.
    pub fn open(&mut self, account: AccountId, amount: Decimal) -> HoldId {
        let id = HoldId::new();
        let hold = Hold {
            id,
            account,
            amount,
            state: HoldState::Active,
            room: None,
            created_at: Utc::now(),
        };
        self.holds.insert(id, hold);
        id
    }

    /// Re-insert a persisted hold under its original id, preserving state.
    pub fn restore(&mut self, hold: Hold) {
        self.holds.insert(hold.id, hold);
    }

    /// Look up a hold by ID.
    #[must_use]
    pub fn get(&self, id: HoldId) -> Option<&Hold> {
        self.holds.get(&id)
    }

    /// # Errors
    /// Returns `HoldNotFound` for an unknown id.
    pub fn require(&self, id: HoldId) -> Result<&Hold> {
        self.holds.get(&id).ok_or(EngineError::HoldNotFound(id))
    }

    /// Transition ACTIVE → CONSUMED, stamping the resolving room.
    /// Returns the owning account and held amount.
    ///
    /// # Errors
    /// `HoldNotFound`, or `HoldNotActive` if already consumed/refunded.
    pub fn mark_consumed(&mut self, id: HoldId, room: RoomId) -> Result<(AccountId, Decimal)> {
        let hold = self.holds.get_mut(&id).ok_or(EngineError::HoldNotFound(id))?;
        hold.mark_consumed(room)?;
        Ok((hold.account, hold.amount))
    }

    /// Transition ACTIVE → REFUNDED. Returns the owning account and the
    /// amount the caller must now re-credit.
    ///
    /// # Errors
    /// `HoldNotFound`, or `HoldNotActive` if already consumed/refunded —
    /// the double-refund guard.
    pub fn mark_refunded(&mut self, id: HoldId) -> Result<(AccountId, Decimal)> {
        let hold = self.holds.get_mut(&id).ok_or(EngineError::HoldNotFound(id))?;
        hold.mark_refunded()?;
        Ok((hold.account, hold.amount))
    }

    /// Check if a hold is currently active.
    #[must_use]
    pub fn is_active(&self, id: HoldId) -> bool {
        self.holds.get(&id).is_some_and(Hold::is_active)
    }

    /// Number of holds tracked.
    #[must_use]
    pub fn count(&self) -> usize {
        self.holds.len()
    }

    /// Number of ACTIVE holds.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.holds.values().filter(|h| h.is_active()).count()
    }

    /// Sum of all ACTIVE hold amounts — the escrowed supply.
    #[must_use]
    pub fn total_escrowed(&self) -> Decimal {
        self.holds
            .values()
            .filter(|h| h.is_active())
            .map(|h| h.amount)
            .sum()
    }

    /// Iterate every hold, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Hold> {
        self.holds.values()
    }
}

impl Default for HoldBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_active_hold() {
        let mut book = HoldBook::new();
        let account = AccountId::new();
        let id = book.open(account, Decimal::new(500, 2));

        assert!(book.is_active(id));
        assert_eq!(book.count(), 1);
        assert_eq!(book.active_count(), 1);
        let hold = book.get(id).unwrap();
        assert_eq!(hold.account, account);
        assert_eq!(hold.room, None);
    }

    #[test]
    fn consume_stamps_room_and_returns_owner() {
        let mut book = HoldBook::new();
        let account = AccountId::new();
        let id = book.open(account, Decimal::new(500, 2));
        let room = RoomId::new();

        let (owner, amount) = book.mark_consumed(id, room).unwrap();
        assert_eq!(owner, account);
        assert_eq!(amount, Decimal::new(500, 2));
        assert_eq!(book.get(id).unwrap().room, Some(room));
        assert_eq!(book.active_count(), 0);
    }

    #[test]
    fn double_refund_fails() {
        let mut book = HoldBook::new();
        let id = book.open(AccountId::new(), Decimal::ONE);

        book.mark_refunded(id).unwrap();
        let err = book.mark_refunded(id).unwrap_err();
        assert!(matches!(err, EngineError::HoldNotActive { .. }));
    }

    #[test]
    fn consumed_cannot_be_refunded() {
        let mut book = HoldBook::new();
        let id = book.open(AccountId::new(), Decimal::ONE);

        book.mark_consumed(id, RoomId::new()).unwrap();
        let err = book.mark_refunded(id).unwrap_err();
        assert!(matches!(
            err,
            EngineError::HoldNotActive {
                state: HoldState::Consumed,
                ..
            }
        ));
    }

    #[test]
    fn nonexistent_hold_errors() {
        let mut book = HoldBook::new();
        let err = book.mark_refunded(HoldId::new()).unwrap_err();
        assert!(matches!(err, EngineError::HoldNotFound(_)));
    }

    #[test]
    fn total_escrowed_counts_only_active() {
        let mut book = HoldBook::new();
        let a = book.open(AccountId::new(), Decimal::new(500, 2));
        book.open(AccountId::new(), Decimal::new(300, 2));

        assert_eq!(book.total_escrowed(), Decimal::new(800, 2));
        book.mark_refunded(a).unwrap();
        assert_eq!(book.total_escrowed(), Decimal::new(300, 2));
    }
}
