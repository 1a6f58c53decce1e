//! # rackup-ledger
//!
//! **Custody Plane**: account balances, escrow holds, and the append-only
//! audit journal behind every wagered match.
//!
//! ## Architecture
//!
//! 1. **AccountStore**: account records and spendable balances
//! 2. **HoldBook**: escrow reservations with the Active → Consumed/Refunded
//!    state machine
//! 3. **Journal**: append-only entry log, per-account replay, audit digest
//! 4. **StakePolicy**: hard gate — validates stakes before funds move
//! 5. **Ledger**: the facade composing all four; the only mutation path
//!
//! ## Money Flow
//!
//! ```text
//! join → StakePolicy.validate() → Ledger.hold() → [match] → Ledger.consume()
//!                                      │                         + credit(winner)
//!                                      └─ [dequeue/void] → Ledger.refund()
//! ```
//!
//! Every balance is replayable: creation balance plus the account's journal
//! entries always equals the live balance.

pub mod accounts;
pub mod holds;
pub mod journal;
pub mod ledger;
pub mod policy;

pub use accounts::AccountStore;
pub use holds::HoldBook;
pub use journal::Journal;
pub use ledger::{Ledger, LedgerSnapshot};
pub use policy::StakePolicy;
