//! Room registry — owner of every live room and its connection routing.
//!
//! The registry is the single writer of room state. `transition` funnels
//! every lifecycle change through [`Room::advance`], so terminal re-entry
//! is rejected in exactly one place; settlement and abandonment treat that
//! rejection as "already handled".
//!
//! Terminal rooms stay in the table as history. Their connection
//! associations are released so the routing side forgets them.

use std::collections::HashMap;

use chrono::Utc;
use rackup_types::{
    AccountId, ConnId, EngineError, Participant, Result, Room, RoomId, RoomState,
};
use rust_decimal::Decimal;

/// One seat plus the live connection occupying it (`None` for the bot).
pub type SeatAssignment = (Participant, Option<ConnId>);

/// Owns rooms and the `conn -> room` routing used by relay and disconnect.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    conn_rooms: HashMap<ConnId, RoomId>,
}

impl RoomRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            conn_rooms: HashMap::new(),
        }
    }

    // =================================================================
    // Creation
    // =================================================================

    /// Allocate a room for the given seats and pair it up.
    ///
    /// The room starts in `Forming`, every live connection is associated,
    /// and the room advances to `Active` once all seats are registered.
    /// Seat order is preserved: seat 0 takes the opening turn.
    ///
    /// # Errors
    /// `RoomTransitionRejected` is impossible for a fresh room but is
    /// propagated rather than swallowed.
    pub fn create_room(
        &mut self,
        seats: Vec<SeatAssignment>,
        stake: Decimal,
        bot_match: bool,
    ) -> Result<RoomId> {
        let id = RoomId::new();
        let mut participants = Vec::with_capacity(seats.len());
        let mut conns = Vec::new();
        for (participant, conn) in seats {
            participants.push(participant);
            if let Some(conn) = conn {
                conns.push(conn);
            }
        }

        let mut room = Room {
            id,
            participants,
            stake,
            bot_match,
            state: RoomState::Forming,
            created_at: Utc::now(),
        };
        room.advance(RoomState::Active)?;

        for conn in conns {
            self.conn_rooms.insert(conn, id);
        }
        self.rooms.insert(id, room);
        Ok(id)
    }

    /// Re-insert a persisted room, without connection associations.
    pub fn restore(&mut self, room: Room) {
        self.rooms.insert(room.id, room);
    }

    // =================================================================
    // Lookup
    // =================================================================

    #[must_use]
    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(&id)
    }

    /// # Errors
    /// `RoomNotFound` for an unknown id.
    pub fn lookup(&self, id: RoomId) -> Result<&Room> {
        self.rooms.get(&id).ok_or(EngineError::RoomNotFound(id))
    }

    /// The room a connection is seated in, if any.
    #[must_use]
    pub fn room_for_conn(&self, conn: ConnId) -> Option<RoomId> {
        self.conn_rooms.get(&conn).copied()
    }

    /// The non-terminal room an account is seated in, if any. Terminal
    /// rooms are history and never claim an account.
    #[must_use]
    pub fn room_of_account(&self, account: AccountId) -> Option<&Room> {
        self.rooms
            .values()
            .find(|room| !room.is_terminal() && room.seat_of(account).is_some())
    }

    /// Live connections seated in a room, for broadcast.
    #[must_use]
    pub fn conns_for(&self, room: RoomId) -> Vec<ConnId> {
        self.conn_rooms
            .iter()
            .filter(|(_, r)| **r == room)
            .map(|(c, _)| *c)
            .collect()
    }

    // =================================================================
    // Lifecycle
    // =================================================================

    /// Advance a room's state through the one-way machine.
    ///
    /// # Errors
    /// `RoomNotFound`, or `RoomTransitionRejected` for an illegal move —
    /// including any transition out of a terminal state.
    pub fn transition(&mut self, id: RoomId, to: RoomState) -> Result<()> {
        let room = self.rooms.get_mut(&id).ok_or(EngineError::RoomNotFound(id))?;
        room.advance(to)
    }

    /// Associate a connection with a room (reconnect re-seating).
    pub fn associate(&mut self, conn: ConnId, room: RoomId) {
        self.conn_rooms.insert(conn, room);
    }

    /// Drop one connection's association (disconnect).
    pub fn dissociate(&mut self, conn: ConnId) {
        self.conn_rooms.remove(&conn);
    }

    /// Drop every connection association for a retired room.
    pub fn release_conns(&mut self, room: RoomId) {
        self.conn_rooms.retain(|_, r| *r != room);
    }

    // =================================================================
    // Queries
    // =================================================================

    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Rooms still in play (not terminal).
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.rooms.values().filter(|r| !r.is_terminal()).count()
    }

    /// Every room, live and terminal, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }
}
