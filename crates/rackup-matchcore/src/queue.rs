//! The matchmaking queue and its pairing scan.
//!
//! A plain ordered list of waiting entries, each backed by an already-open
//! escrow hold. Pairing is a left-to-right nested scan for the first two
//! distinct-account entries with equal stakes: stable, but deliberately not
//! strict FIFO — an early entry at one stake never blocks a later pair at
//! another stake, and within a stake the earliest compatible pair wins.
//!
//! ```text
//! push(e) ──► [ e0 e1 e2 ... ]  ──scan──► (i, j)  ──take_pair──► room seats
//!                   ▲                                │ (j-entry seats first
//!                   └── remove_by_conn / _by_account ┘  and opens the game)
//! ```

use rackup_types::{AccountId, ConnId, EngineError, QueueEntry, Result};

/// Ordered list of participants waiting for an equal-stake opponent.
#[derive(Debug, Default)]
pub struct MatchQueue {
    entries: Vec<QueueEntry>,
}

impl MatchQueue {
    /// Create a new empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    // =================================================================
    // Enqueue
    // =================================================================

    /// Append a waiting entry. The caller has already escrowed the stake.
    ///
    /// # Errors
    /// `AlreadyQueued` if the account already has a waiting entry — one
    /// stake, one seat.
    pub fn push(&mut self, entry: QueueEntry) -> Result<()> {
        if self.entries.iter().any(|e| e.account == entry.account) {
            return Err(EngineError::AlreadyQueued(entry.account));
        }
        self.entries.push(entry);
        Ok(())
    }

    // =================================================================
    // Pairing
    // =================================================================

    /// Scan for the first matchable pair, left to right.
    ///
    /// Outer index `i` walks from the front, inner `j > i` finds the first
    /// later entry with the same stake and a different account. Returns
    /// `(i, j)` with `i < j`, or `None` if nobody matches.
    #[must_use]
    pub fn find_pair(&self) -> Option<(usize, usize)> {
        for i in 0..self.entries.len() {
            for j in (i + 1)..self.entries.len() {
                let (a, b) = (&self.entries[i], &self.entries[j]);
                if a.account != b.account && a.stake == b.stake {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// Remove a scanned pair from the queue, atomically.
    ///
    /// Removes `j` first so `i` keeps its index, and returns
    /// `(later, earlier)`: the later entry takes seat 0 and the opening
    /// turn. Both entries are out of the queue before any room exists, so
    /// neither can match twice.
    ///
    /// # Errors
    /// `QueuePairGone` if the indexes no longer name a valid equal-stake,
    /// distinct-account pair (the queue changed since the scan).
    pub fn take_pair(&mut self, i: usize, j: usize) -> Result<(QueueEntry, QueueEntry)> {
        if i >= j || j >= self.entries.len() {
            return Err(EngineError::QueuePairGone {
                reason: format!("indexes ({i}, {j}) out of range, len {}", self.entries.len()),
            });
        }
        let (a, b) = (&self.entries[i], &self.entries[j]);
        if a.stake != b.stake {
            return Err(EngineError::QueuePairGone {
                reason: format!("stakes diverged: {} vs {}", a.stake, b.stake),
            });
        }
        if a.account == b.account {
            return Err(EngineError::QueuePairGone {
                reason: format!("both seats owned by {}", a.account),
            });
        }

        let later = self.entries.remove(j);
        let earlier = self.entries.remove(i);
        Ok((later, earlier))
    }

    /// Scan and extract in one step. `None` means nobody matches yet.
    pub fn pop_pair(&mut self) -> Option<(QueueEntry, QueueEntry)> {
        let (i, j) = self.find_pair()?;
        // Indexes come straight from the scan; take_pair cannot reject them.
        self.take_pair(i, j).ok()
    }

    // =================================================================
    // Dequeue
    // =================================================================

    /// Remove the entry owned by a departing connection.
    ///
    /// `None` is a legitimate outcome: a match already claimed the entry
    /// and its hold now belongs to a room.
    pub fn remove_by_conn(&mut self, conn: ConnId) -> Option<QueueEntry> {
        let index = self.entries.iter().position(|e| e.conn == conn)?;
        Some(self.entries.remove(index))
    }

    /// Remove an account's waiting entry, if any.
    pub fn remove_by_account(&mut self, account: AccountId) -> Option<QueueEntry> {
        let index = self.entries.iter().position(|e| e.account == account)?;
        Some(self.entries.remove(index))
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn contains_account(&self, account: AccountId) -> bool {
        self.entries.iter().any(|e| e.account == account)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Waiting entries in queue order.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn stake(n: i64) -> Decimal {
        Decimal::new(n * 100, 2)
    }

    #[test]
    fn push_rejects_duplicate_account() {
        let mut queue = MatchQueue::new();
        let entry = QueueEntry::dummy(stake(5));
        let account = entry.account;
        queue.push(entry).unwrap();

        let mut again = QueueEntry::dummy(stake(7));
        again.account = account;
        let err = queue.push(again).unwrap_err();
        assert!(matches!(err, EngineError::AlreadyQueued(a) if a == account));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn no_pair_among_unequal_stakes() {
        let mut queue = MatchQueue::new();
        queue.push(QueueEntry::dummy(stake(5))).unwrap();
        queue.push(QueueEntry::dummy(stake(10))).unwrap();
        assert_eq!(queue.find_pair(), None);
        assert!(queue.pop_pair().is_none());
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn equal_stakes_pair_up() {
        let mut queue = MatchQueue::new();
        let first = QueueEntry::dummy(stake(5));
        let second = QueueEntry::dummy(stake(5));
        let (first_acct, second_acct) = (first.account, second.account);
        queue.push(first).unwrap();
        queue.push(second).unwrap();

        assert_eq!(queue.find_pair(), Some((0, 1)));
        let (later, earlier) = queue.pop_pair().unwrap();
        // The later entry comes first: it takes seat 0 and opens.
        assert_eq!(later.account, second_acct);
        assert_eq!(earlier.account, first_acct);
        assert!(queue.is_empty());
    }

    #[test]
    fn scan_skips_blocked_head() {
        // 10 / 5 / 5: the head waits on, the two fives pair.
        let mut queue = MatchQueue::new();
        let head = QueueEntry::dummy(stake(10));
        let head_acct = head.account;
        queue.push(head).unwrap();
        queue.push(QueueEntry::dummy(stake(5))).unwrap();
        queue.push(QueueEntry::dummy(stake(5))).unwrap();

        assert_eq!(queue.find_pair(), Some((1, 2)));
        let pair = queue.pop_pair().unwrap();
        assert_eq!(pair.0.stake, stake(5));
        assert_eq!(pair.1.stake, stake(5));
        assert_eq!(queue.len(), 1);
        assert!(queue.contains_account(head_acct));
    }

    #[test]
    fn earliest_compatible_pair_wins() {
        // 5 / 10 / 5 / 10: (0, 2) pairs before (1, 3).
        let mut queue = MatchQueue::new();
        let a = QueueEntry::dummy(stake(5));
        let b = QueueEntry::dummy(stake(10));
        let c = QueueEntry::dummy(stake(5));
        let (a_acct, c_acct) = (a.account, c.account);
        queue.push(a).unwrap();
        queue.push(b).unwrap();
        queue.push(c).unwrap();
        queue.push(QueueEntry::dummy(stake(10))).unwrap();

        assert_eq!(queue.find_pair(), Some((0, 2)));
        let (later, earlier) = queue.pop_pair().unwrap();
        assert_eq!(later.account, c_acct);
        assert_eq!(earlier.account, a_acct);
    }

    #[test]
    fn take_pair_rejects_stale_indexes() {
        let mut queue = MatchQueue::new();
        queue.push(QueueEntry::dummy(stake(5))).unwrap();

        let err = queue.take_pair(0, 5).unwrap_err();
        assert!(matches!(err, EngineError::QueuePairGone { .. }));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn take_pair_rejects_diverged_stakes() {
        let mut queue = MatchQueue::new();
        queue.push(QueueEntry::dummy(stake(5))).unwrap();
        queue.push(QueueEntry::dummy(stake(10))).unwrap();

        let err = queue.take_pair(0, 1).unwrap_err();
        assert!(matches!(err, EngineError::QueuePairGone { .. }));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn remove_by_conn_takes_the_entry_out() {
        let mut queue = MatchQueue::new();
        let entry = QueueEntry::dummy(stake(5));
        let conn = entry.conn;
        queue.push(entry).unwrap();

        let removed = queue.remove_by_conn(conn).unwrap();
        assert_eq!(removed.conn, conn);
        assert!(queue.is_empty());
        // Second removal: the entry is gone, not an error.
        assert!(queue.remove_by_conn(conn).is_none());
    }

    #[test]
    fn remove_by_account_mirrors_conn_removal() {
        let mut queue = MatchQueue::new();
        let entry = QueueEntry::dummy(stake(5));
        let account = entry.account;
        queue.push(entry).unwrap();

        assert!(queue.remove_by_account(account).is_some());
        assert!(queue.remove_by_account(account).is_none());
    }

    #[test]
    fn removed_entry_cannot_match() {
        let mut queue = MatchQueue::new();
        let leaver = QueueEntry::dummy(stake(5));
        let leaver_conn = leaver.conn;
        queue.push(leaver).unwrap();
        queue.push(QueueEntry::dummy(stake(5))).unwrap();

        queue.remove_by_conn(leaver_conn).unwrap();
        assert_eq!(queue.find_pair(), None);
    }
}
