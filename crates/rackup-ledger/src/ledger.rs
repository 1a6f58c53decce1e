//! Ledger facade — the single mutation path for all money movement.
//!
//! Composes the account store, hold book, journal, and stake policy.
//! All mutations are atomic: every check runs before the first write, so
//! either the full operation lands (balance change, hold transition, and
//! journal entry together) or nothing does.
//!
//! ```text
//!             hold                    consume(room)
//!   balance ────────► Active hold ───────────────► Consumed (stake kept
//!      ▲                  │                          by the pot; winner's
//!      │     refund       │                          Payout is the record)
//!      └──────────────────┘
//! ```

use rackup_types::{
    Account, AccountId, EngineConfig, EngineError, EntryKind, Hold, HoldId, LedgerEntry, Result,
    RoomId, money,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountStore, HoldBook, Journal, StakePolicy};

/// The source of truth for balances, escrow holds, and the audit journal.
///
/// Nothing outside this facade mutates an account: enqueue escrows through
/// [`Ledger::hold`], settlement pays through [`Ledger::credit`], dequeue and
/// abandonment return stakes through [`Ledger::refund`].
pub struct Ledger {
    accounts: AccountStore,
    holds: HoldBook,
    journal: Journal,
    policy: StakePolicy,
}

/// Point-in-time account and hold state, for the snapshot file. The entry
/// log is persisted separately, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub accounts: Vec<Account>,
    pub holds: Vec<Hold>,
}

impl Ledger {
    /// Create an empty ledger with limits from configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_policy(StakePolicy::from_config(config))
    }

    /// Create an empty ledger with an explicit stake policy.
    #[must_use]
    pub fn with_policy(policy: StakePolicy) -> Self {
        Self {
            accounts: AccountStore::new(),
            holds: HoldBook::new(),
            journal: Journal::new(),
            policy,
        }
    }

    /// Rebuild a ledger from a snapshot plus the persisted entry log.
    #[must_use]
    pub fn restore(
        config: &EngineConfig,
        snapshot: LedgerSnapshot,
        entries: Vec<LedgerEntry>,
    ) -> Self {
        let mut ledger = Self::new(config);
        for account in snapshot.accounts {
            ledger.accounts.restore(account);
        }
        for hold in snapshot.holds {
            ledger.holds.restore(hold);
        }
        ledger.journal = Journal::restore(entries);
        ledger
    }

    // --- accounts ---------------------------------------------------------

    /// Open an account. The starting balance is recorded as the creation
    /// balance so the journal replay has a fixed origin.
    pub fn open_account(
        &mut self,
        display_name: impl Into<String>,
        starting_balance: Decimal,
    ) -> AccountId {
        self.accounts.open(display_name, starting_balance)
    }

    /// # Errors
    /// `AccountNotFound`.
    pub fn account(&self, id: AccountId) -> Result<&Account> {
        self.accounts.require(id)
    }

    /// Spendable balance (escrowed funds excluded).
    ///
    /// # Errors
    /// `AccountNotFound`.
    pub fn balance(&self, id: AccountId) -> Result<Decimal> {
        Ok(self.accounts.require(id)?.balance)
    }

    /// Mark an account for manual review (abandonment forfeits land here).
    ///
    /// # Errors
    /// `AccountNotFound`.
    pub fn flag_for_review(&mut self, id: AccountId) -> Result<()> {
        self.accounts.require_mut(id)?.flagged_for_review = true;
        Ok(())
    }

    // --- escrow -----------------------------------------------------------

    /// Escrow `amount` out of the spendable balance into a fresh hold.
    ///
    /// # Errors
    /// `NonPositiveAmount`, `AccountNotFound`, or `InsufficientBalance`.
    /// On any error nothing has moved.
    pub fn hold(&mut self, account: AccountId, amount: Decimal) -> Result<HoldId> {
        money::ensure_positive(amount)?;
        let amount = money::normalize(amount);

        let entry = self.accounts.require_mut(account)?;
        if !entry.can_cover(amount) {
            return Err(EngineError::InsufficientBalance {
                needed: amount,
                available: entry.balance,
            });
        }

        entry.balance -= amount;
        let hold = self.holds.open(account, amount);
        self.journal
            .append(LedgerEntry::new(EntryKind::Hold, account, amount, None, None));
        Ok(hold)
    }

    /// Return an active hold's funds to its owner.
    ///
    /// # Errors
    /// `HoldNotFound`, or `HoldNotActive` for a hold already consumed or
    /// refunded — the guard that makes double refunds impossible.
    pub fn refund(&mut self, hold: HoldId) -> Result<Decimal> {
        // Checks first: hold exists and is active, owner exists. Only then
        // mutate, so a failure leaves every table untouched.
        let record = self.holds.require(hold)?;
        if !record.is_active() {
            return Err(EngineError::HoldNotActive {
                hold,
                state: record.state,
            });
        }
        self.accounts.require(record.account)?;

        let (account, amount) = self.holds.mark_refunded(hold)?;
        self.accounts.require_mut(account)?.balance += amount;
        self.journal.append(LedgerEntry::new(
            EntryKind::Refund,
            account,
            amount,
            Some("stake refund".into()),
            None,
        ));
        Ok(amount)
    }

    /// Consume an active hold into a room's pot.
    ///
    /// Writes no journal entry: the stake left the balance at hold time and
    /// the winner's `Payout` entry is the financial record of the outcome.
    ///
    /// # Errors
    /// `HoldNotFound`, or `HoldNotActive` for terminal holds.
    pub fn consume(&mut self, hold: HoldId, room: RoomId) -> Result<()> {
        self.holds.mark_consumed(hold, room)?;
        Ok(())
    }

    // --- direct movements ---------------------------------------------------

    /// Increase a balance and journal the reason. `kind` must be an inflow
    /// kind (`Credit` for external top-ups, `Payout` for settlement).
    ///
    /// # Errors
    /// `NonPositiveAmount`, `AccountNotFound`, or `Internal` for a
    /// non-inflow kind.
    pub fn credit(
        &mut self,
        account: AccountId,
        amount: Decimal,
        kind: EntryKind,
        note: impl Into<String>,
        room: Option<RoomId>,
    ) -> Result<()> {
        money::ensure_positive(amount)?;
        if !kind.is_inflow() {
            return Err(EngineError::Internal(format!(
                "credit called with outflow kind {kind}"
            )));
        }
        let amount = money::normalize(amount);

        self.accounts.require_mut(account)?.balance += amount;
        self.journal
            .append(LedgerEntry::new(kind, account, amount, Some(note.into()), room));
        Ok(())
    }

    /// Decrease a balance and journal the reason.
    ///
    /// # Errors
    /// `NonPositiveAmount`, `AccountNotFound`, or `InsufficientBalance`.
    pub fn debit(
        &mut self,
        account: AccountId,
        amount: Decimal,
        note: impl Into<String>,
    ) -> Result<()> {
        money::ensure_positive(amount)?;
        let amount = money::normalize(amount);

        let entry = self.accounts.require_mut(account)?;
        if !entry.can_cover(amount) {
            return Err(EngineError::InsufficientBalance {
                needed: amount,
                available: entry.balance,
            });
        }

        entry.balance -= amount;
        self.journal.append(LedgerEntry::new(
            EntryKind::Debit,
            account,
            amount,
            Some(note.into()),
            None,
        ));
        Ok(())
    }

    // --- queries ------------------------------------------------------------

    /// The stake gate joins validate against before escrowing.
    #[must_use]
    pub fn policy(&self) -> &StakePolicy {
        &self.policy
    }

    #[must_use]
    pub fn hold_record(&self, id: HoldId) -> Option<&Hold> {
        self.holds.get(id)
    }

    /// Full journal in append order.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        self.journal.entries()
    }

    /// One account's journal slice in append order.
    #[must_use]
    pub fn entries_for(&self, account: AccountId) -> Vec<&LedgerEntry> {
        self.journal.entries_for(account)
    }

    /// Replay the journal for one account and compare with the live balance.
    ///
    /// # Errors
    /// `AccountNotFound`.
    pub fn verify_conservation(&self, account: AccountId) -> Result<bool> {
        let record = self.accounts.require(account)?;
        let replayed = self
            .journal
            .replay_balance(account, record.creation_balance);
        Ok(replayed == record.balance)
    }

    /// Conservation check across every account.
    #[must_use]
    pub fn all_conserved(&self) -> bool {
        self.accounts
            .iter()
            .all(|a| self.verify_conservation(a.id).unwrap_or(false))
    }

    /// SHA-256 checkpoint over the journal.
    #[must_use]
    pub fn journal_digest(&self) -> [u8; 32] {
        self.journal.digest()
    }

    /// Spendable balances plus escrowed holds — the system's total value.
    /// Constant across match/refund lifecycles; moves only on external
    /// credit/debit and on forfeits (consumed holds with no payout).
    #[must_use]
    pub fn total_value(&self) -> Decimal {
        self.accounts.total_balance() + self.holds.total_escrowed()
    }

    #[must_use]
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Clone out the current account and hold state for persistence.
    #[must_use]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self.accounts.iter().cloned().collect(),
            holds: self.holds.iter().cloned().collect(),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
