//! Abandonment resolution after the disconnect grace period.
//!
//! An abandoned room is a voided match, not a win: every remaining
//! player's stake comes back, and only the leaver pays — their hold is
//! consumed as a forfeit and their account is flagged for review.
//!
//! The resolver runs when a grace timer expires. Timers race settlement
//! and reconnects, so a stale expiry (terminal room, re-seated account)
//! resolves to `Ok(None)` with nothing touched.

use rackup_ledger::Ledger;
use rackup_matchcore::RoomRegistry;
use rackup_types::{AccountId, EngineError, HoldId, Participant, Result, RoomId, RoomState};
use rust_decimal::Decimal;

/// What an abandonment resolved, for the engine to broadcast.
#[derive(Debug, Clone)]
pub struct AbandonOutcome {
    pub room: RoomId,
    pub leaver: AccountId,
    /// Refunds issued to the remaining player seats.
    pub refunded: Vec<(AccountId, Decimal)>,
    /// The leaver's forfeited stake.
    pub forfeited: Decimal,
}

/// Resolve an expired grace period for `leaver` in `room_id`.
///
/// Returns `Ok(None)` when there is nothing left to do: the room is
/// unknown or terminal (settlement won the race), or the leaver is no
/// longer seated there.
///
/// # Errors
/// Ledger errors for inconsistent holds or accounts; nothing mutates on
/// any error path.
pub fn resolve_abandonment(
    ledger: &mut Ledger,
    registry: &mut RoomRegistry,
    room_id: RoomId,
    leaver: AccountId,
) -> Result<Option<AbandonOutcome>> {
    // 1. Stale-timer filters.
    let Some(room) = registry.get(room_id) else {
        return Ok(None);
    };
    if room.is_terminal() || room.seat_of(leaver).is_none() {
        return Ok(None);
    }

    // 2. Split the seats: the leaver forfeits, everyone else is made whole.
    let mut refunds: Vec<(AccountId, HoldId)> = Vec::new();
    let mut leaver_hold = None;
    for participant in &room.participants {
        let (Some(account), Some(hold)) = (participant.account(), participant.hold()) else {
            continue; // bot seat, no stake to return
        };
        if account == leaver {
            leaver_hold = Some(hold);
        } else {
            refunds.push((account, hold));
        }
    }
    let Some(leaver_hold) = leaver_hold else {
        return Ok(None);
    };

    // 3. Preconditions, before any mutation.
    let mut forfeited = Decimal::ZERO;
    for hold in refunds.iter().map(|(_, h)| *h).chain([leaver_hold]) {
        let record = ledger
            .hold_record(hold)
            .ok_or(EngineError::HoldNotFound(hold))?;
        if !record.is_active() {
            return Err(EngineError::HoldNotActive {
                hold,
                state: record.state,
            });
        }
        if hold == leaver_hold {
            forfeited = record.amount;
        }
    }
    for (account, _) in &refunds {
        ledger.account(*account)?;
    }
    ledger.account(leaver)?;

    // 4. Critical section. Nothing below can fail after the checks above.
    registry.transition(room_id, RoomState::Abandoned)?;
    let mut refunded = Vec::with_capacity(refunds.len());
    for (account, hold) in refunds {
        let amount = ledger.refund(hold)?;
        refunded.push((account, amount));
    }
    ledger.consume(leaver_hold, room_id)?;
    ledger.flag_for_review(leaver)?;

    Ok(Some(AbandonOutcome {
        room: room_id,
        leaver,
        refunded,
        forfeited,
    }))
}
