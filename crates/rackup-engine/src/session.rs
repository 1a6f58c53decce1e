//! Session layer — the coarse mutex around the engine.
//!
//! Every transport worker holds a clone of [`EngineHandle`] and takes
//! the one lock per inbound message, disconnect, or sweep. The single
//! mutex is the whole concurrency story: the planes underneath are
//! plain `&mut self` code, and correctness never depends on lock
//! ordering because there is only one lock.
//!
//! Outbound flow stays non-blocking: each connection gets an unbounded
//! channel at [`EngineHandle::attach`], the transport drains the
//! receiver half, and the engine drops messages for closed channels.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use rackup_types::{AccountId, ClientMessage, ConnId, Result, ServerMessage};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

use crate::engine::Engine;
use crate::store::EngineSnapshot;

/// Cloneable, thread-safe handle to one engine.
#[derive(Clone)]
pub struct EngineHandle {
    inner: Arc<Mutex<Engine>>,
}

impl EngineHandle {
    #[must_use]
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run one closure under the engine lock. Operations check before
    /// they mutate, so a poisoned lock still guards consistent state and
    /// is recovered rather than propagated.
    pub fn with<T>(&self, f: impl FnOnce(&mut Engine) -> T) -> T {
        let mut engine = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut engine)
    }

    /// Attach a connection and hand back the receiver the transport
    /// drains into its socket.
    pub fn attach(&self, conn: ConnId) -> UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.with(|engine| engine.attach(conn, tx));
        rx
    }

    /// Bind a connection to an account (reconnects re-enter live rooms).
    ///
    /// # Errors
    /// `AccountNotFound`.
    pub fn identify(&self, conn: ConnId, account: AccountId) -> Result<()> {
        self.with(|engine| engine.identify(conn, account))
    }

    /// Route one parsed inbound message.
    ///
    /// # Errors
    /// Settlement validation errors; join failures answer on the wire
    /// instead of erroring.
    pub fn dispatch(&self, conn: ConnId, msg: ClientMessage) -> Result<()> {
        self.with(|engine| engine.dispatch(conn, msg))
    }

    /// Parse a raw wire frame and route it.
    ///
    /// # Errors
    /// `Serialization` for frames that do not parse as a client message,
    /// then as [`EngineHandle::dispatch`].
    pub fn dispatch_raw(&self, conn: ConnId, frame: &str) -> Result<()> {
        let msg: ClientMessage = serde_json::from_str(frame)?;
        self.dispatch(conn, msg)
    }

    /// Tear down a connection; queued stakes refund immediately, a live
    /// seat arms the grace timer.
    pub fn disconnect(&self, conn: ConnId) {
        self.with(|engine| engine.disconnect(conn, Instant::now()));
    }

    /// Sweep expired grace timers as of `now`.
    pub fn tick(&self, now: Instant) {
        self.with(|engine| engine.tick(now));
    }

    /// Current persistable state.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        self.with(|engine| engine.snapshot())
    }
}

/// Spawn the abandonment sweeper on the current runtime. It takes the
/// engine lock once per interval, which is also what bounds how late a
/// grace deadline can fire.
pub fn spawn_abandon_sweeper(handle: EngineHandle) -> JoinHandle<()> {
    let period = handle.with(|engine| engine.config().sweep_interval());
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        loop {
            interval.tick().await;
            debug!("abandon sweep");
            handle.tick(Instant::now());
        }
    })
}

/// Install the process-wide tracing subscriber, honouring `RUST_LOG`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
