//! Queue entry — a waiting participant's escrowed stake.
//!
//! A `QueueEntry` exists only between `hold` and either `matched` or
//! `refunded`; exactly one per waiting participant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, ConnId, HoldId};

/// One waiting participant in the matchmaking queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    /// The connection that issued the join; disconnect dequeues by this.
    pub conn: ConnId,
    pub account: AccountId,
    pub display_name: String,
    pub stake: Decimal,
    /// The hold escrowing this stake, refunded if the entry is dequeued.
    pub hold: HoldId,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueEntry {
    #[must_use]
    pub fn new(
        conn: ConnId,
        account: AccountId,
        display_name: impl Into<String>,
        stake: Decimal,
        hold: HoldId,
    ) -> Self {
        Self {
            conn,
            account,
            display_name: display_name.into(),
            stake,
            hold,
            enqueued_at: Utc::now(),
        }
    }
}

/// Dummy entries for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl QueueEntry {
    /// Fresh entry with its own connection, account, and hold ids.
    pub fn dummy(stake: Decimal) -> Self {
        Self::new(
            ConnId::new(),
            AccountId::new(),
            "player",
            stake,
            HoldId::new(),
        )
    }
}
