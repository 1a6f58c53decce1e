//! # Hold — the escrow reservation primitive
//!
//! A `Hold` is minted atomically when a stake leaves a spendable balance.
//! It is the handle the queue, rooms, and settlement pass around instead of
//! touching balances directly.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  settlement    ┌──────────┐
//!   │ ACTIVE ├───────────────▶│ CONSUMED │
//!   └───┬────┘                └──────────┘
//!       │ dequeue/abandon
//!       ▼
//!   ┌──────────┐
//!   │ REFUNDED │
//!   └──────────┘
//! ```
//!
//! ## Safety Properties
//!
//! - **Atomic minting**: a hold exists only if the balance decrement and the
//!   `Hold` journal entry both landed
//! - **Single-use**: ACTIVE → CONSUMED is irreversible, prevents double-payout
//! - **Refund-once**: ACTIVE → REFUNDED is irreversible, prevents double-refund

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, HoldId, RoomId};

/// The lifecycle state of a Hold.
///
/// Transitions are **monotonic** (never go backwards):
/// - `Active → Consumed` (a settled or forfeited match took the stake)
/// - `Active → Refunded` (unmatched dequeue or voided match returned it)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HoldState {
    /// Stake is escrowed. This hold can back a queue entry or a room seat.
    Active,
    /// A match resolution took the stake. Funds moved via a payout or
    /// stayed with the house. **Irreversible.**
    Consumed,
    /// The stake went back to the account. **Irreversible.**
    Refunded,
}

impl HoldState {
    /// Can this hold transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Consumed | Self::Refunded)
        )
    }
}

impl std::fmt::Display for HoldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Consumed => write!(f, "CONSUMED"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// A Hold: proof that a stake is escrowed for a specific account.
///
/// Queue entries and room seats reference a `HoldId`. The Ledger mints
/// holds; settlement and the abandonment handler retire them. The queue
/// and registry **never** see balances — only hold references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    /// Globally unique hold identifier.
    pub id: HoldId,
    /// The account whose balance was reduced.
    pub account: AccountId,
    /// Amount escrowed.
    pub amount: Decimal,
    /// Current lifecycle state.
    pub state: HoldState,
    /// The room that resolved this hold, set at consumption time.
    pub room: Option<RoomId>,
    /// When the hold was minted.
    pub created_at: DateTime<Utc>,
}

impl Hold {
    /// Returns `true` if this hold still escrows a live stake.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == HoldState::Active
    }

    /// Attempt to transition to CONSUMED, stamping the resolving room.
    ///
    /// # Errors
    /// Returns [`EngineError::HoldNotActive`](crate::EngineError::HoldNotActive)
    /// if the hold was already consumed or refunded.
    pub fn mark_consumed(&mut self, room: RoomId) -> crate::Result<()> {
        if !self.state.can_transition_to(HoldState::Consumed) {
            return Err(crate::EngineError::HoldNotActive {
                hold: self.id,
                state: self.state,
            });
        }
        self.state = HoldState::Consumed;
        self.room = Some(room);
        Ok(())
    }

    /// Attempt to transition to REFUNDED.
    ///
    /// # Errors
    /// Returns [`EngineError::HoldNotActive`](crate::EngineError::HoldNotActive)
    /// if the hold was already consumed or refunded.
    pub fn mark_refunded(&mut self) -> crate::Result<()> {
        if !self.state.can_transition_to(HoldState::Refunded) {
            return Err(crate::EngineError::HoldNotActive {
                hold: self.id,
                state: self.state,
            });
        }
        self.state = HoldState::Refunded;
        Ok(())
    }
}

/// Dummy Hold for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Hold {
    /// Create a dummy active hold for unit tests.
    pub fn dummy(account: AccountId, amount: Decimal) -> Self {
        Self {
            id: HoldId::new(),
            account,
            amount,
            state: HoldState::Active,
            room: None,
            created_at: Utc::now(),
        }
    }
}
