//! The append-only journal — the audit trail behind every balance.
//!
//! Entries are only ever appended, never edited or removed. Replaying an
//! account's entries from its creation balance must reproduce its live
//! balance exactly; [`Journal::replay_balance`] is that replay and the
//! conservation check calls it after every mutating operation in tests.

use std::collections::HashMap;

use rackup_types::{AccountId, LedgerEntry};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Append-only log of [`LedgerEntry`] records with a per-account index.
pub struct Journal {
    entries: Vec<LedgerEntry>,
    by_account: HashMap<AccountId, Vec<usize>>,
}

impl Journal {
    /// Create a new empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            by_account: HashMap::new(),
        }
    }

    /// Rebuild a journal from persisted entries, preserving log order.
    #[must_use]
    pub fn restore(entries: Vec<LedgerEntry>) -> Self {
        let mut journal = Self::new();
        for entry in entries {
            journal.append(entry);
        }
        journal
    }

    /// Append one immutable entry.
    pub fn append(&mut self, entry: LedgerEntry) {
        let index = self.entries.len();
        self.by_account.entry(entry.account).or_default().push(index);
        self.entries.push(entry);
    }

    /// All entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// One account's entries in append order.
    #[must_use]
    pub fn entries_for(&self, account: AccountId) -> Vec<&LedgerEntry> {
        self.by_account
            .get(&account)
            .map(|indexes| indexes.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Replay an account's entries from its creation balance.
    ///
    /// The result must equal the account's live balance at all times —
    /// that equality is the core invariant of the whole system.
    #[must_use]
    pub fn replay_balance(&self, account: AccountId, creation_balance: Decimal) -> Decimal {
        self.entries_for(account)
            .iter()
            .fold(creation_balance, |acc, entry| acc + entry.signed_effect())
    }

    /// SHA-256 checkpoint over the full entry sequence.
    ///
    /// The same entries in the same order always produce the same digest;
    /// any reordering, edit, or removal changes it.
    #[must_use]
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"rackup:journal:v1:");
        hasher.update((self.entries.len() as u64).to_le_bytes());

        for entry in &self.entries {
            hasher.update(entry.id.0.as_bytes());
            hasher.update(entry.account.0.as_bytes());
            hasher.update(entry.kind.to_string().as_bytes());
            hasher.update(entry.amount.to_string().as_bytes());
            if let Some(room) = entry.room {
                hasher.update(room.0.as_bytes());
            }
            hasher.update(entry.timestamp.timestamp_millis().to_le_bytes());
        }

        let result = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&result);
        digest
    }

    /// Hex rendering of [`Journal::digest`] for logs.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new()
    }
}
