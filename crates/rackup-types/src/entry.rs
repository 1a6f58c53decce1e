//! Ledger entry types — the immutable records of the append-only journal.
//!
//! A [`LedgerEntry`] is never edited or deleted after the append. Replaying
//! an account's entries in log order from its creation balance must always
//! reproduce its live balance; that replay is the audit path for every
//! balance in the system.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, EntryId, RoomId};

/// The five balance-affecting event kinds.
///
/// Serialized lowercase — the persisted journal format is consumed by the
/// external account/profile query interface and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Stake escrowed out of the spendable balance.
    Hold,
    /// Escrowed stake returned (unmatched dequeue, voided match).
    Refund,
    /// Externally sourced increase (deposit approval and the like).
    Credit,
    /// Externally sourced decrease (withdrawal approval and the like).
    Debit,
    /// Match winnings credited by settlement.
    Payout,
}

impl EntryKind {
    /// `true` if this kind increases the balance.
    #[must_use]
    pub fn is_inflow(&self) -> bool {
        matches!(self, Self::Refund | Self::Credit | Self::Payout)
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hold => write!(f, "HOLD"),
            Self::Refund => write!(f, "REFUND"),
            Self::Credit => write!(f, "CREDIT"),
            Self::Debit => write!(f, "DEBIT"),
            Self::Payout => write!(f, "PAYOUT"),
        }
    }
}

/// One immutable journal record.
///
/// `amount` is always the positive magnitude; the sign of the balance
/// effect is implied by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Globally unique, append-ordered identifier.
    pub id: EntryId,
    pub kind: EntryKind,
    pub account: AccountId,
    pub amount: Decimal,
    /// Free-form annotation ("game win", "deposit approved", ...).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    /// The room this entry resolves, for match-related kinds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub room: Option<RoomId>,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    #[must_use]
    pub fn new(
        kind: EntryKind,
        account: AccountId,
        amount: Decimal,
        note: Option<String>,
        room: Option<RoomId>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            kind,
            account,
            amount,
            note,
            room,
            timestamp: Utc::now(),
        }
    }

    /// The signed balance effect of replaying this entry.
    #[must_use]
    pub fn signed_effect(&self) -> Decimal {
        if self.kind.is_inflow() {
            self.amount
        } else {
            -self.amount
        }
    }
}

impl std::fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.kind, self.account, self.signed_effect())?;
        if let Some(room) = self.room {
            write!(f, " ({room})")?;
        }
        Ok(())
    }
}
