//! # rackup-engine
//!
//! **Session Plane**: the single-writer engine behind one coarse mutex.
//!
//! ## Architecture
//!
//! ```text
//!                    ┌────────────────────────────────────────┐
//!   conn ──frame──▶  │ EngineHandle (Arc<Mutex<Engine>>)      │
//!   conn ──frame──▶  │   dispatch ─▶ ledger / queue / registry│
//!   sweeper ─tick─▶  │   tick     ─▶ abandonment handler      │
//!                    └───────────────┬────────────────────────┘
//!                                    │ UnboundedSender per conn
//!                                    ▼
//!                            transport writers
//! ```
//!
//! The engine (`engine`) owns every plane and mutates them only under
//! the session mutex (`session`). Timers are data swept by `tick`, not
//! tasks, so every flow — join, match, relay, settle, abandon — is
//! deterministic and drivable from tests without a runtime. The store
//! (`store`) persists the journal as an append-only JSON-lines log and
//! the current state as a snapshot file.

pub mod engine;
pub mod session;
pub mod store;

pub use engine::{Engine, PendingAbandon};
pub use session::{EngineHandle, init_tracing, spawn_abandon_sweeper};
pub use store::{EngineSnapshot, Store};
