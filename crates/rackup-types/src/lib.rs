//! # rackup-types
//!
//! Shared types, errors, and configuration for the **Rackup**
//! escrow/matchmaking/settlement engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`EntryId`], [`HoldId`], [`RoomId`], [`ConnId`]
//! - **Account model**: [`Account`]
//! - **Journal model**: [`LedgerEntry`], [`EntryKind`]
//! - **Hold model**: [`Hold`], [`HoldState`]
//! - **Room model**: [`Room`], [`RoomState`], [`Participant`], [`PlayerSeat`]
//! - **Queue model**: [`QueueEntry`]
//! - **Wire contract**: [`ClientMessage`], [`ServerMessage`], [`PlayerInfo`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`EngineError`] with `RK_ERR_` prefix codes
//! - **Money helpers**: positivity and precision guards
//! - **Constants**: system-wide defaults

pub mod account;
pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod hold;
pub mod ids;
pub mod money;
pub mod queue_entry;
pub mod room;
pub mod wire;

// Re-export all primary types at crate root for ergonomic imports:
//   use rackup_types::{Account, Hold, Room, ClientMessage, ...};

pub use account::*;
pub use config::*;
pub use entry::*;
pub use error::*;
pub use hold::*;
pub use ids::*;
pub use queue_entry::*;
pub use room::*;
pub use wire::*;

// Constants and money helpers are accessed via their modules
// (`rackup_types::constants::FOO`, `rackup_types::money::ensure_positive`)
// to avoid name collisions.
