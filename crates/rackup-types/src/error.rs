//! Error types for the Rackup escrow/matchmaking engine.
//!
//! All errors use the `RK_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by class:
//! - 1xx: Validation errors
//! - 2xx: Funds errors
//! - 3xx: Not-found errors
//! - 4xx: Lifecycle errors (terminal holds/rooms)
//! - 5xx: Concurrency errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, ConnId, HoldId, HoldState, RoomId, RoomState};

/// Central error enum for all Rackup operations.
#[derive(Debug, Error)]
pub enum EngineError {
    // =================================================================
    // Validation Errors (1xx)
    // =================================================================
    /// Every ledger operation requires a strictly positive amount.
    #[error("RK_ERR_100: Amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },

    /// The requested stake falls outside the configured bounds.
    #[error("RK_ERR_101: Stake {stake} outside allowed range [{min}, {max}]")]
    StakeOutOfBounds {
        stake: Decimal,
        min: Decimal,
        max: Decimal,
    },

    /// An inbound message failed validation (missing fields, bad values).
    #[error("RK_ERR_102: Invalid message: {reason}")]
    InvalidMessage { reason: String },

    /// A game-end report claimed a winner who is not seated in the room.
    #[error("RK_ERR_103: Claimed winner {winner} is not a participant of {room}")]
    WinnerNotInRoom { winner: AccountId, room: RoomId },

    /// The account already has a waiting queue entry.
    #[error("RK_ERR_104: Account {0} is already queued")]
    AlreadyQueued(AccountId),

    // =================================================================
    // Funds Errors (2xx)
    // =================================================================
    /// Not enough balance to place the hold or debit.
    #[error("RK_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: Decimal, available: Decimal },

    // =================================================================
    // Not-Found Errors (3xx)
    // =================================================================
    /// The account does not exist.
    #[error("RK_ERR_300: Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The room does not exist.
    #[error("RK_ERR_301: Room not found: {0}")]
    RoomNotFound(RoomId),

    /// The hold does not exist.
    #[error("RK_ERR_302: Hold not found: {0}")]
    HoldNotFound(HoldId),

    /// The connection is not attached to the engine.
    #[error("RK_ERR_303: Connection not attached: {0}")]
    ConnNotAttached(ConnId),

    // =================================================================
    // Lifecycle Errors (4xx)
    // =================================================================
    /// The hold has already been consumed or refunded.
    #[error("RK_ERR_400: Hold {hold} is {state}, not ACTIVE")]
    HoldNotActive { hold: HoldId, state: HoldState },

    /// The room state machine rejected a transition (already terminal).
    #[error("RK_ERR_401: Room {room} cannot transition {from} -> {to}")]
    RoomTransitionRejected {
        room: RoomId,
        from: RoomState,
        to: RoomState,
    },

    // =================================================================
    // Concurrency Errors (5xx)
    // =================================================================
    /// A scanned queue pair was gone by the time it was taken.
    #[error("RK_ERR_500: Queue pair no longer available: {reason}")]
    QueuePairGone { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("RK_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("RK_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid bounds, missing fields, etc.).
    #[error("RK_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error (journal log, snapshot store).
    #[error("RK_ERR_903: I/O error: {0}")]
    Io(String),
}

impl EngineError {
    /// Stable `RK_ERR_*` code for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount { .. } => "RK_ERR_100",
            Self::StakeOutOfBounds { .. } => "RK_ERR_101",
            Self::InvalidMessage { .. } => "RK_ERR_102",
            Self::WinnerNotInRoom { .. } => "RK_ERR_103",
            Self::AlreadyQueued(_) => "RK_ERR_104",
            Self::InsufficientBalance { .. } => "RK_ERR_200",
            Self::AccountNotFound(_) => "RK_ERR_300",
            Self::RoomNotFound(_) => "RK_ERR_301",
            Self::HoldNotFound(_) => "RK_ERR_302",
            Self::ConnNotAttached(_) => "RK_ERR_303",
            Self::HoldNotActive { .. } => "RK_ERR_400",
            Self::RoomTransitionRejected { .. } => "RK_ERR_401",
            Self::QueuePairGone { .. } => "RK_ERR_500",
            Self::Internal(_) => "RK_ERR_900",
            Self::Serialization(_) => "RK_ERR_901",
            Self::Configuration(_) => "RK_ERR_902",
            Self::Io(_) => "RK_ERR_903",
        }
    }

    /// `true` for the lifecycle rejections a duplicate or late report is
    /// allowed to hit. Settlement and abandonment convert these into
    /// no-ops instead of surfacing them to the reporter.
    #[must_use]
    pub fn is_benign_replay(&self) -> bool {
        matches!(
            self,
            Self::RoomTransitionRejected { .. } | Self::HoldNotActive { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EngineError>;

// Conversion from std::io::Error
impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = EngineError::AccountNotFound(AccountId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("RK_ERR_300"), "Got: {msg}");
    }

    #[test]
    fn insufficient_balance_display() {
        let err = EngineError::InsufficientBalance {
            needed: Decimal::new(500, 2),
            available: Decimal::new(300, 2),
        };
        let msg = format!("{err}");
        assert!(msg.contains("RK_ERR_200"));
        assert!(msg.contains("5.00"));
        assert!(msg.contains("3.00"));
    }

    #[test]
    fn code_matches_display_prefix() {
        let errors = [
            EngineError::NonPositiveAmount {
                amount: Decimal::ZERO,
            },
            EngineError::AlreadyQueued(AccountId::new()),
            EngineError::RoomNotFound(RoomId::new()),
            EngineError::QueuePairGone {
                reason: "test".into(),
            },
            EngineError::Io("disk".into()),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(msg.starts_with(err.code()), "code/display mismatch: {msg}");
        }
    }

    #[test]
    fn benign_replay_classification() {
        let terminal = EngineError::RoomTransitionRejected {
            room: RoomId::new(),
            from: RoomState::Settled,
            to: RoomState::Settled,
        };
        assert!(terminal.is_benign_replay());

        let spent = EngineError::HoldNotActive {
            hold: HoldId::new(),
            state: HoldState::Refunded,
        };
        assert!(spent.is_benign_replay());

        let not_benign = EngineError::InsufficientBalance {
            needed: Decimal::ONE,
            available: Decimal::ZERO,
        };
        assert!(!not_benign.is_benign_replay());
    }

    #[test]
    fn all_errors_have_rk_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(EngineError::NonPositiveAmount {
                amount: Decimal::NEGATIVE_ONE,
            }),
            Box::new(EngineError::ConnNotAttached(ConnId::new())),
            Box::new(EngineError::Internal("test".into())),
            Box::new(EngineError::Configuration("bad bounds".into())),
            Box::new(EngineError::HoldNotFound(HoldId::new())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("RK_ERR_"),
                "Error missing RK_ERR_ prefix: {msg}"
            );
        }
    }
}
