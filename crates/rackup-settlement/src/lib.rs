//! # rackup-settlement
//!
//! **Finality Plane**: terminal resolution of wagered rooms.
//!
//! ## Architecture
//!
//! A room leaves play through exactly one of two doors:
//! 1. **Settlement** (`settle`): a reported game end — consume both player
//!    holds, credit the winner with the whole pot, retire the room as
//!    `Settled`.
//! 2. **Abandonment** (`abandon`): an expired disconnect grace period —
//!    refund every remaining player, forfeit the leaver's hold, flag the
//!    leaver, retire the room as `Abandoned`.
//!
//! Both doors are idempotent: a room that already went through either one
//! rejects re-entry at the registry, and the resolvers report that as a
//! clean no-op (`Ok(None)`), never as a second payout or refund.

pub mod abandon;
pub mod settle;

pub use abandon::{AbandonOutcome, resolve_abandonment};
pub use settle::{SettlementOutcome, player_holds, settle_game_end};
