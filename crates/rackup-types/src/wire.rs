//! Wire contract — the transport-agnostic message set.
//!
//! Tagged with a `type` field and camelCase keys so any JSON-speaking
//! transport (websocket, long-poll, test harness) can carry it unchanged.
//! Relay payloads (`ballUpdate`/`ballSync`) are opaque: unknown keys pass
//! through untouched, the engine never interprets them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AccountId, Participant, RoomId};

/// Messages a participant's connection sends to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Escrow `stake` and wait for an equal-stake opponent.
    JoinQueue {
        #[serde(rename = "accountId")]
        account_id: AccountId,
        stake: Decimal,
    },
    /// Escrow `stake` and start immediately against the bot opponent.
    JoinBot {
        #[serde(rename = "accountId")]
        account_id: AccountId,
        stake: Decimal,
    },
    /// Gameplay relay: a shot taken, forwarded to the opponent verbatim.
    GameShot {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        power: f64,
        angle: f64,
    },
    /// Gameplay relay: table-state synchronization, opaque passthrough.
    BallUpdate {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(flatten)]
        state: Map<String, Value>,
    },
    /// The client-reported outcome. Accepted at face value (trust gap by
    /// design); settlement validates only that the winner is seated.
    /// `winnerAccountId: null` claims the bot seat won.
    GameEnd {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "winnerAccountId", default)]
        winner_account_id: Option<AccountId>,
    },
}

/// Messages the engine sends to participant connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Join accepted; the stake is escrowed and the entry is waiting.
    Queued { stake: Decimal },
    /// Join rejected; nothing was escrowed or enqueued.
    JoinError { reason: String },
    /// A room formed. Sent independently to each participant with their
    /// own seat index; seat 0 takes the opening turn.
    MatchFound {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        players: Vec<PlayerInfo>,
        stake: Decimal,
        #[serde(rename = "yourTurn")]
        your_turn: bool,
        #[serde(rename = "playerIndex")]
        player_index: usize,
    },
    /// Relay of the opponent's `gameShot`.
    OpponentShot { power: f64, angle: f64 },
    /// Relay of the opponent's `ballUpdate`, payload untouched.
    BallSync {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(flatten)]
        state: Map<String, Value>,
    },
    /// Settlement resolved the room; broadcast to both seats. A `null`
    /// winner means the bot seat took the pot.
    GameSettlement {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        winner: Option<AccountId>,
    },
    /// The opponent never returned; the room was voided. `refunded` tells
    /// the recipient whether their stake came back.
    RoomAbandoned {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        refunded: bool,
    },
}

/// One seat as presented on the wire. The bot seat has no account id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInfo {
    #[serde(
        rename = "id",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub account: Option<AccountId>,
    pub username: String,
}

impl From<&Participant> for PlayerInfo {
    fn from(participant: &Participant) -> Self {
        Self {
            account: participant.account(),
            username: participant.display_name().to_string(),
        }
    }
}
