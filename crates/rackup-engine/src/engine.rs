//! Engine — the single-writer aggregate behind the session mutex.
//!
//! One `Engine` owns all three planes and serializes every mutation:
//!
//! ```text
//!   transport ──▶ dispatch(conn, ClientMessage) ──▶ ledger / queue / registry
//!        ▲                                                   │
//!        └──────── UnboundedSender<ServerMessage> ◀──────────┘
//! ```
//!
//! The engine itself is synchronous. The session layer wraps it in
//! `Arc<Mutex<..>>` and holds the lock for exactly one inbound message,
//! one disconnect, or one sweep at a time. Timers are plain data
//! ([`PendingAbandon`]) swept by [`Engine::tick`], so nothing here
//! depends on a runtime and tests can drive time explicitly.

use std::collections::HashMap;
use std::time::Instant;

use rackup_ledger::Ledger;
use rackup_matchcore::{MatchQueue, RoomRegistry, SeatAssignment};
use rackup_settlement::{resolve_abandonment, settle_game_end};
use rackup_types::{
    AccountId, ClientMessage, ConnId, EngineConfig, EngineError, EntryKind, Participant,
    PlayerInfo, PlayerSeat, QueueEntry, Result, RoomId, ServerMessage,
};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::store::EngineSnapshot;

/// An armed disconnect timer. The room voids once `deadline` passes,
/// unless the leaver identifies again or settlement lands first.
#[derive(Debug, Clone, Copy)]
pub struct PendingAbandon {
    pub leaver: AccountId,
    pub deadline: Instant,
}

/// The escrow/matchmaking/settlement engine, one instance per process.
pub struct Engine {
    config: EngineConfig,
    ledger: Ledger,
    queue: MatchQueue,
    registry: RoomRegistry,
    /// Outbound channel per attached connection.
    conns: HashMap<ConnId, UnboundedSender<ServerMessage>>,
    /// Which account each connection last acted as.
    conn_accounts: HashMap<ConnId, AccountId>,
    /// Grace timers keyed by room; at most one per room. If both seats
    /// disconnect, the first leaver keeps the timer and the forfeit.
    pending_abandons: HashMap<RoomId, PendingAbandon>,
}

impl Engine {
    /// # Errors
    /// [`EngineError::Configuration`] if the config fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ledger: Ledger::new(&config),
            queue: MatchQueue::new(),
            registry: RoomRegistry::new(),
            conns: HashMap::new(),
            conn_accounts: HashMap::new(),
            pending_abandons: HashMap::new(),
            config,
        })
    }

    /// Rebuild an engine from a persisted snapshot plus the journal log.
    /// Connections, queue entries, and grace timers are ephemeral and
    /// start empty.
    ///
    /// # Errors
    /// [`EngineError::Configuration`] if the config fails validation.
    pub fn restore(config: EngineConfig, snapshot: EngineSnapshot) -> Result<Self> {
        config.validate()?;
        let ledger = Ledger::restore(&config, snapshot.ledger, snapshot.journal);
        let mut registry = RoomRegistry::new();
        for room in snapshot.rooms {
            registry.restore(room);
        }
        Ok(Self {
            ledger,
            queue: MatchQueue::new(),
            registry,
            conns: HashMap::new(),
            conn_accounts: HashMap::new(),
            pending_abandons: HashMap::new(),
            config,
        })
    }

    // === Connections ========================================================

    /// Register a connection's outbound channel. Every reply and broadcast
    /// for `conn` goes through `sender`; a full or closed channel drops the
    /// message rather than blocking the engine.
    pub fn attach(&mut self, conn: ConnId, sender: UnboundedSender<ServerMessage>) {
        self.conns.insert(conn, sender);
        debug!(conn = %conn.short(), "connection attached");
    }

    /// Bind `conn` to an account. A reconnecting player re-enters their
    /// live room and disarms their own grace timer.
    ///
    /// # Errors
    /// [`EngineError::AccountNotFound`].
    pub fn identify(&mut self, conn: ConnId, account: AccountId) -> Result<()> {
        self.ledger.account(account)?;
        self.conn_accounts.insert(conn, account);

        let live_room = self.registry.room_of_account(account).map(|room| room.id);
        if let Some(room_id) = live_room {
            self.registry.associate(conn, room_id);
            if self
                .pending_abandons
                .get(&room_id)
                .is_some_and(|pending| pending.leaver == account)
            {
                self.pending_abandons.remove(&room_id);
                info!(room = %room_id.short(), account = %account, "reconnected inside grace window");
            }
        }
        Ok(())
    }

    /// Tear down a connection.
    ///
    /// 1. Forget the outbound channel and account binding
    /// 2. A waiting queue entry is removed and its stake refunded
    /// 3. A seat in a live room arms the grace timer; the room itself
    ///    stays untouched until [`Engine::tick`] finds the deadline passed
    pub fn disconnect(&mut self, conn: ConnId, now: Instant) {
        self.conns.remove(&conn);
        let account = self.conn_accounts.remove(&conn);

        if let Some(entry) = self.queue.remove_by_conn(conn) {
            match self.ledger.refund(entry.hold) {
                Ok(amount) => {
                    info!(account = %entry.account, %amount, "queued stake refunded on disconnect");
                }
                Err(err) => {
                    error!(code = err.code(), "dequeue refund failed: {err}");
                }
            }
        }

        let Some(room_id) = self.registry.room_for_conn(conn) else {
            return;
        };
        self.registry.dissociate(conn);

        let seated = account.filter(|leaver| {
            self.registry
                .get(room_id)
                .is_some_and(|room| !room.is_terminal() && room.seat_of(*leaver).is_some())
        });
        if let Some(leaver) = seated {
            let deadline = now + self.config.grace_period();
            self.pending_abandons
                .entry(room_id)
                .or_insert(PendingAbandon { leaver, deadline });
            info!(room = %room_id.short(), account = %leaver, "grace timer armed");
        }
    }

    // === Inbound messages ===================================================

    /// Route one inbound message. Join rejections answer the sender with
    /// `joinError` instead of surfacing; everything else propagates for
    /// the session layer to log.
    ///
    /// # Errors
    /// Settlement validation errors from `gameEnd`; joins never error.
    pub fn dispatch(&mut self, conn: ConnId, msg: ClientMessage) -> Result<()> {
        match msg {
            ClientMessage::JoinQueue { account_id, stake } => {
                if let Err(err) = self.join_queue(conn, account_id, stake) {
                    self.reject_join(conn, &err);
                }
                Ok(())
            }
            ClientMessage::JoinBot { account_id, stake } => {
                if let Err(err) = self.join_bot(conn, account_id, stake) {
                    self.reject_join(conn, &err);
                }
                Ok(())
            }
            ClientMessage::GameShot {
                room_id,
                power,
                angle,
            } => {
                self.relay_shot(conn, room_id, power, angle);
                Ok(())
            }
            ClientMessage::BallUpdate { room_id, state } => {
                self.relay_ball(conn, room_id, state);
                Ok(())
            }
            ClientMessage::GameEnd {
                room_id,
                winner_account_id,
            } => self.game_end(room_id, winner_account_id),
        }
    }

    /// Escrow `stake` and enqueue `account`, then try to pair.
    ///
    /// 1. Gate: attached connection, known account, not already queued
    /// 2. Validate the stake against policy, escrow it
    /// 3. Enqueue; reply `queued`
    /// 4. Scan for an equal-stake opponent and open the room
    ///
    /// The duplicate-queue check runs before the hold so a rejected join
    /// leaves no escrow behind.
    pub fn join_queue(&mut self, conn: ConnId, account: AccountId, stake: Decimal) -> Result<()> {
        self.require_attached(conn)?;
        let display_name = self.ledger.account(account)?.display_name.clone();
        if self.queue.contains_account(account) {
            return Err(EngineError::AlreadyQueued(account));
        }

        let stake = self.ledger.policy().validate(stake)?;
        let hold = self.ledger.hold(account, stake)?;

        let entry = QueueEntry::new(conn, account, display_name, stake, hold);
        if let Err(err) = self.queue.push(entry) {
            self.ledger.refund(hold)?;
            return Err(err);
        }
        self.conn_accounts.insert(conn, account);
        info!(account = %account, %stake, waiting = self.queue.len(), "queued");
        self.send(conn, ServerMessage::Queued { stake });

        self.try_match()
    }

    /// Escrow `stake` and open a bot room immediately. The human takes
    /// seat 0 and the opening turn; the bot seat escrows nothing.
    pub fn join_bot(&mut self, conn: ConnId, account: AccountId, stake: Decimal) -> Result<()> {
        self.require_attached(conn)?;
        let display_name = self.ledger.account(account)?.display_name.clone();

        let stake = self.ledger.policy().validate(stake)?;
        let hold = self.ledger.hold(account, stake)?;

        let seats: Vec<SeatAssignment> = vec![
            (
                Participant::Player(PlayerSeat {
                    account,
                    display_name,
                    hold,
                }),
                Some(conn),
            ),
            (Participant::Bot, None),
        ];
        let room_id = match self.registry.create_room(seats, stake, true) {
            Ok(room_id) => room_id,
            Err(err) => {
                self.ledger.refund(hold)?;
                return Err(err);
            }
        };
        self.conn_accounts.insert(conn, account);
        info!(room = %room_id.short(), account = %account, %stake, "bot match opened");

        self.announce_room(room_id)
    }

    /// Report a game end. Duplicate and late reports are no-ops; a first
    /// report pays the winner, broadcasts the settlement, and frees the
    /// room's connection routing.
    ///
    /// # Errors
    /// [`EngineError::WinnerNotInRoom`] or [`EngineError::InvalidMessage`]
    /// for claims that do not match the seats. Nothing mutates on error.
    pub fn game_end(&mut self, room_id: RoomId, winner: Option<AccountId>) -> Result<()> {
        let Some(outcome) =
            settle_game_end(&mut self.ledger, &mut self.registry, room_id, winner)?
        else {
            debug!(room = %room_id.short(), "game-end report for a finished room ignored");
            return Ok(());
        };

        // Settlement beats the grace timer.
        self.pending_abandons.remove(&room_id);

        info!(
            room = %room_id.short(),
            winner = ?outcome.winner,
            payout = %outcome.payout,
            "room settled"
        );
        self.broadcast(
            room_id,
            &ServerMessage::GameSettlement {
                room_id,
                winner: outcome.winner,
            },
        );
        self.registry.release_conns(room_id);
        Ok(())
    }

    // === Timers =============================================================

    /// Sweep expired grace timers. Each one resolves through the
    /// abandonment handler; timers that lost their race (settlement
    /// landed, room gone) dissolve silently. Resolution errors are logged
    /// and dropped so one bad room cannot stall the sweeper.
    pub fn tick(&mut self, now: Instant) {
        let due: Vec<(RoomId, AccountId)> = self
            .pending_abandons
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(room_id, pending)| (*room_id, pending.leaver))
            .collect();

        for (room_id, leaver) in due {
            self.pending_abandons.remove(&room_id);
            match resolve_abandonment(&mut self.ledger, &mut self.registry, room_id, leaver) {
                Ok(Some(outcome)) => {
                    warn!(
                        room = %room_id.short(),
                        account = %leaver,
                        forfeited = %outcome.forfeited,
                        "room abandoned"
                    );
                    self.broadcast(
                        room_id,
                        &ServerMessage::RoomAbandoned {
                            room_id,
                            refunded: true,
                        },
                    );
                    self.registry.release_conns(room_id);
                }
                Ok(None) => {}
                Err(err) => {
                    error!(room = %room_id.short(), code = err.code(), "abandonment failed: {err}");
                }
            }
        }
    }

    // === Accounts ===========================================================

    /// Open an account at the configured starting balance.
    pub fn open_account(&mut self, display_name: impl Into<String>) -> AccountId {
        self.ledger
            .open_account(display_name, self.config.starting_balance)
    }

    /// External top-up landing on the ledger as a `credit` entry.
    ///
    /// # Errors
    /// `NonPositiveAmount` or `AccountNotFound`.
    pub fn deposit(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        self.ledger
            .credit(account, amount, EntryKind::Credit, "deposit", None)
    }

    /// External withdrawal landing on the ledger as a `debit` entry.
    ///
    /// # Errors
    /// `NonPositiveAmount`, `AccountNotFound`, or `InsufficientBalance`.
    pub fn withdraw(&mut self, account: AccountId, amount: Decimal) -> Result<()> {
        self.ledger.debit(account, amount, "withdraw")
    }

    // === Matching ===========================================================

    /// Drain every compatible pair out of the queue into a room. Between
    /// joins the queue holds no compatible pair, so at most one forms per
    /// call; the loop also self-heals if that ever stops being true.
    fn try_match(&mut self) -> Result<()> {
        while let Some((later, earlier)) = self.queue.pop_pair() {
            let stake = later.stake;
            let holds = (later.hold, earlier.hold);
            let seats: Vec<SeatAssignment> = vec![
                (
                    Participant::Player(PlayerSeat {
                        account: later.account,
                        display_name: later.display_name,
                        hold: later.hold,
                    }),
                    Some(later.conn),
                ),
                (
                    Participant::Player(PlayerSeat {
                        account: earlier.account,
                        display_name: earlier.display_name,
                        hold: earlier.hold,
                    }),
                    Some(earlier.conn),
                ),
            ];
            let room_id = match self.registry.create_room(seats, stake, false) {
                Ok(room_id) => room_id,
                Err(err) => {
                    // Both entries already left the queue: hand the stakes back.
                    self.ledger.refund(holds.0)?;
                    self.ledger.refund(holds.1)?;
                    return Err(err);
                }
            };
            info!(room = %room_id.short(), %stake, "match formed");
            self.announce_room(room_id)?;
        }
        Ok(())
    }

    /// Send `matchFound` to every seated connection, each with its own
    /// seat index. Seat 0 takes the opening turn.
    fn announce_room(&self, room_id: RoomId) -> Result<()> {
        let room = self.registry.lookup(room_id)?;
        let players: Vec<PlayerInfo> = room.participants.iter().map(PlayerInfo::from).collect();

        for conn in self.registry.conns_for(room_id) {
            let seat = self
                .conn_accounts
                .get(&conn)
                .and_then(|account| room.seat_of(*account));
            let Some(seat) = seat else { continue };
            self.send(
                conn,
                ServerMessage::MatchFound {
                    room_id,
                    players: players.clone(),
                    stake: room.stake,
                    your_turn: seat == 0,
                    player_index: seat,
                },
            );
        }
        Ok(())
    }

    // === Gameplay relay =====================================================

    /// Forward a shot to every other seat in the room. No validation, no
    /// financial effect; stale or unknown rooms drop the message.
    fn relay_shot(&self, conn: ConnId, room_id: RoomId, power: f64, angle: f64) {
        for peer in self.registry.conns_for(room_id) {
            if peer != conn {
                self.send(peer, ServerMessage::OpponentShot { power, angle });
            }
        }
    }

    /// Forward table state verbatim. The payload is opaque to the engine.
    fn relay_ball(&self, conn: ConnId, room_id: RoomId, state: Map<String, Value>) {
        for peer in self.registry.conns_for(room_id) {
            if peer != conn {
                self.send(
                    peer,
                    ServerMessage::BallSync {
                        room_id,
                        state: state.clone(),
                    },
                );
            }
        }
    }

    // === Outbound ===========================================================

    /// Best-effort send. A detached or closed connection drops the
    /// message; gameplay must never block on a slow reader.
    fn send(&self, conn: ConnId, msg: ServerMessage) {
        if let Some(tx) = self.conns.get(&conn) {
            let _ = tx.send(msg);
        }
    }

    fn broadcast(&self, room_id: RoomId, msg: &ServerMessage) {
        for conn in self.registry.conns_for(room_id) {
            self.send(conn, msg.clone());
        }
    }

    fn reject_join(&self, conn: ConnId, err: &EngineError) {
        warn!(conn = %conn.short(), code = err.code(), "join rejected: {err}");
        self.send(
            conn,
            ServerMessage::JoinError {
                reason: err.to_string(),
            },
        );
    }

    fn require_attached(&self, conn: ConnId) -> Result<()> {
        if self.conns.contains_key(&conn) {
            Ok(())
        } else {
            Err(EngineError::ConnNotAttached(conn))
        }
    }

    // === Queries ============================================================

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The armed grace timer for a room, if any.
    #[must_use]
    pub fn pending_abandon(&self, room_id: RoomId) -> Option<&PendingAbandon> {
        self.pending_abandons.get(&room_id)
    }

    /// Current persistable state: ledger snapshot, journal, and rooms.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            ledger: self.ledger.snapshot(),
            journal: self.ledger.entries().to_vec(),
            rooms: self.registry.iter().cloned().collect(),
        }
    }
}
