//! # rackup-matchcore
//!
//! **Pure matchmaking core for Rackup.**
//!
//! Matchcore is the pairing plane -- it decides who plays whom and tracks
//! the rooms they play in. It has:
//!
//! - **Zero money movement**: holds are opened and resolved by the ledger,
//!   never here
//! - **Deterministic pairing**: a left-to-right scan, first equal-stake
//!   pair wins
//! - **Single-writer rooms**: every state change goes through the registry,
//!   so terminal rooms reject re-entry in exactly one place

pub mod queue;
pub mod registry;

pub use queue::MatchQueue;
pub use registry::{RoomRegistry, SeatAssignment};
