//! # Room — the live pairing of two staked participants
//!
//! A `Room` tracks one wagered contest from creation to terminal
//! resolution. The registry owns every `Room` and is the only writer of
//! its state.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  both seats   ┌────────┐  game end   ┌─────────┐
//!   │ FORMING ├──────────────▶│ ACTIVE ├────────────▶│ SETTLED │
//!   └─────────┘  registered   └───┬────┘             └─────────┘
//!                                 │ grace expired
//!                                 ▼
//!                           ┌───────────┐
//!                           │ ABANDONED │
//!                           └───────────┘
//! ```
//!
//! `SETTLED` and `ABANDONED` are terminal. A terminal room rejects every
//! further transition, which is what makes duplicate game-end reports
//! harmless.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AccountId, HoldId, RoomId};

/// The lifecycle state of a Room. Transitions are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomState {
    /// Allocated, seats not yet registered.
    Forming,
    /// Both participants seated; gameplay relay and settlement accepted.
    Active,
    /// A winner was paid. **Terminal.**
    Settled,
    /// A participant never returned; stakes resolved by policy. **Terminal.**
    Abandoned,
}

impl RoomState {
    /// Can this room transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Forming, Self::Active) | (Self::Active, Self::Settled | Self::Abandoned)
        )
    }

    /// `true` for `Settled` and `Abandoned`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Settled | Self::Abandoned)
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forming => write!(f, "FORMING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Abandoned => write!(f, "ABANDONED"),
        }
    }
}

/// A seated human player: account, display name, and the hold escrowing
/// their stake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSeat {
    pub account: AccountId,
    pub display_name: String,
    pub hold: HoldId,
}

/// One seat of a room: a staked player, or the sentinel bot opponent.
///
/// The bot holds no account and no stake; a bot match escrows only the
/// human's side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Participant {
    Player(PlayerSeat),
    Bot,
}

impl Participant {
    #[must_use]
    pub fn account(&self) -> Option<AccountId> {
        match self {
            Self::Player(seat) => Some(seat.account),
            Self::Bot => None,
        }
    }

    #[must_use]
    pub fn hold(&self) -> Option<HoldId> {
        match self {
            Self::Player(seat) => Some(seat.hold),
            Self::Bot => None,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Player(seat) => &seat.display_name,
            Self::Bot => "BOT",
        }
    }

    #[must_use]
    pub fn is_bot(&self) -> bool {
        matches!(self, Self::Bot)
    }
}

/// A wagered contest between the seated participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Globally unique room identifier.
    pub id: RoomId,
    /// Ordered seats; seat 0 takes the opening turn.
    pub participants: Vec<Participant>,
    /// Stake per participant.
    pub stake: Decimal,
    /// `true` if one seat is the bot opponent.
    pub bot_match: bool,
    /// Current lifecycle state.
    pub state: RoomState,
    /// When the room was allocated.
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Seat index of the given account, if seated here.
    #[must_use]
    pub fn seat_of(&self, account: AccountId) -> Option<usize> {
        self.participants
            .iter()
            .position(|p| p.account() == Some(account))
    }

    /// The combined pot: stake × participant count. Bot seats count —
    /// the house backs the bot's side of the wager.
    #[must_use]
    pub fn pot(&self) -> Decimal {
        self.stake * Decimal::from(self.participants.len())
    }

    /// `true` once the room reached `Settled` or `Abandoned`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Attempt a state transition, enforcing the one-way machine.
    ///
    /// # Errors
    /// Returns [`EngineError::RoomTransitionRejected`](crate::EngineError::RoomTransitionRejected)
    /// if the transition is not legal from the current state. Callers must
    /// treat a rejection on a terminal room as "already handled".
    pub fn advance(&mut self, to: RoomState) -> crate::Result<()> {
        if !self.state.can_transition_to(to) {
            return Err(crate::EngineError::RoomTransitionRejected {
                room: self.id,
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

/// Dummy rooms for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Room {
    /// Two-player room in `Active` state with fresh accounts and holds.
    pub fn dummy_pair(stake: Decimal) -> Self {
        Self {
            id: RoomId::new(),
            participants: vec![
                Participant::Player(PlayerSeat {
                    account: AccountId::new(),
                    display_name: "alice".into(),
                    hold: HoldId::new(),
                }),
                Participant::Player(PlayerSeat {
                    account: AccountId::new(),
                    display_name: "bob".into(),
                    hold: HoldId::new(),
                }),
            ],
            stake,
            bot_match: false,
            state: RoomState::Active,
            created_at: Utc::now(),
        }
    }

    /// Human-versus-bot room in `Active` state.
    pub fn dummy_bot(stake: Decimal) -> Self {
        Self {
            id: RoomId::new(),
            participants: vec![
                Participant::Player(PlayerSeat {
                    account: AccountId::new(),
                    display_name: "alice".into(),
                    hold: HoldId::new(),
                }),
                Participant::Bot,
            ],
            stake,
            bot_match: true,
            state: RoomState::Active,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_transitions_valid() {
        assert!(RoomState::Forming.can_transition_to(RoomState::Active));
        assert!(RoomState::Active.can_transition_to(RoomState::Settled));
        assert!(RoomState::Active.can_transition_to(RoomState::Abandoned));
    }

    #[test]
    fn state_transitions_invalid() {
        assert!(!RoomState::Forming.can_transition_to(RoomState::Settled));
        assert!(!RoomState::Settled.can_transition_to(RoomState::Active));
        assert!(!RoomState::Settled.can_transition_to(RoomState::Abandoned));
        assert!(!RoomState::Abandoned.can_transition_to(RoomState::Settled));
    }

    #[test]
    fn terminal_states() {
        assert!(!RoomState::Forming.is_terminal());
        assert!(!RoomState::Active.is_terminal());
        assert!(RoomState::Settled.is_terminal());
        assert!(RoomState::Abandoned.is_terminal());
    }

    #[test]
    fn advance_enforces_one_way() {
        let mut room = Room::dummy_pair(Decimal::new(500, 2));
        room.advance(RoomState::Settled).unwrap();

        let err = room.advance(RoomState::Abandoned).unwrap_err();
        assert!(err.is_benign_replay(), "terminal re-entry is benign");
        assert_eq!(room.state, RoomState::Settled);
    }

    #[test]
    fn seat_lookup() {
        let room = Room::dummy_pair(Decimal::ONE);
        let first = room.participants[0].account().unwrap();
        let second = room.participants[1].account().unwrap();
        assert_eq!(room.seat_of(first), Some(0));
        assert_eq!(room.seat_of(second), Some(1));
        assert_eq!(room.seat_of(AccountId::new()), None);
    }

    #[test]
    fn pot_is_stake_times_seats() {
        let room = Room::dummy_pair(Decimal::new(500, 2));
        assert_eq!(room.pot(), Decimal::new(1000, 2));

        let bot_room = Room::dummy_bot(Decimal::new(500, 2));
        assert_eq!(bot_room.pot(), Decimal::new(1000, 2));
    }

    #[test]
    fn bot_seat_has_no_account() {
        let room = Room::dummy_bot(Decimal::ONE);
        assert!(room.participants[1].is_bot());
        assert_eq!(room.participants[1].account(), None);
        assert_eq!(room.participants[1].hold(), None);
        assert_eq!(room.participants[1].display_name(), "BOT");
    }

    #[test]
    fn serde_roundtrip_with_bot() {
        let room = Room::dummy_bot(Decimal::new(250, 2));
        let json = serde_json::to_string(&room).unwrap();
        assert!(json.contains("\"kind\":\"bot\""));
        let back: Room = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, room.id);
        assert!(back.bot_match);
        assert_eq!(back.participants.len(), 2);
    }
}
