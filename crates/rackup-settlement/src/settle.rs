//! Game-end settlement.
//!
//! A reported outcome resolves a room exactly once:
//! 1. Resolve the room; absent or terminal means a duplicate or late
//!    report, returned as `Ok(None)` with nothing touched.
//! 2. Validate the claimed winner is seated (`null` claims the bot seat).
//! 3. Verify every precondition the mutations depend on.
//! 4. Critical section: transition to `Settled`, consume the player holds,
//!    credit the winner with the whole pot.
//!
//! All checks run before the first mutation, so a failed settlement leaves
//! room, holds, and balances exactly as they were.

use rackup_ledger::Ledger;
use rackup_matchcore::RoomRegistry;
use rackup_types::{
    AccountId, EngineError, EntryKind, HoldId, Participant, Result, RoomId, RoomState,
};
use rust_decimal::Decimal;

/// What a successful settlement resolved, for the engine to broadcast.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub room: RoomId,
    /// `None` when the bot seat took the pot.
    pub winner: Option<AccountId>,
    pub winner_seat: usize,
    /// Amount credited to the winner; zero for a bot victory.
    pub payout: Decimal,
    /// Seats at settlement time, in seat order.
    pub participants: Vec<Participant>,
}

/// Settle a reported game end for `room_id`.
///
/// Returns `Ok(None)` when the room is unknown or already terminal — the
/// duplicate-report path. The payout is applied at most once per room.
///
/// # Errors
/// `WinnerNotInRoom` for a claim naming a non-participant,
/// `InvalidMessage` for a bot claim in a room without a bot seat, and the
/// ledger's errors if the room's holds or accounts are inconsistent. On
/// any error nothing has mutated.
pub fn settle_game_end(
    ledger: &mut Ledger,
    registry: &mut RoomRegistry,
    room_id: RoomId,
    claimed_winner: Option<AccountId>,
) -> Result<Option<SettlementOutcome>> {
    // 1. Resolve. Unknown or terminal rooms are already handled.
    let Some(room) = registry.get(room_id) else {
        return Ok(None);
    };
    if room.is_terminal() {
        return Ok(None);
    }

    // 2. Validate the claim.
    let winner_seat = match claimed_winner {
        Some(winner) => room
            .seat_of(winner)
            .ok_or(EngineError::WinnerNotInRoom {
                winner,
                room: room_id,
            })?,
        None => room
            .participants
            .iter()
            .position(Participant::is_bot)
            .ok_or_else(|| EngineError::InvalidMessage {
                reason: "no winner named and no bot seated".into(),
            })?,
    };

    // 3. Preconditions for the mutations below. Player holds must still be
    //    active and the winner's account must exist, or the critical
    //    section could die halfway.
    let payout = room.pot();
    let holds: Vec<HoldId> = room.participants.iter().filter_map(Participant::hold).collect();
    let participants = room.participants.clone();
    for hold in &holds {
        let record = ledger
            .hold_record(*hold)
            .ok_or(EngineError::HoldNotFound(*hold))?;
        if !record.is_active() {
            return Err(EngineError::HoldNotActive {
                hold: *hold,
                state: record.state,
            });
        }
    }
    if let Some(winner) = claimed_winner {
        ledger.account(winner)?;
    }

    // 4. Critical section. Nothing below can fail after the checks above.
    registry.transition(room_id, RoomState::Settled)?;
    for hold in holds {
        ledger.consume(hold, room_id)?;
    }
    if let Some(winner) = claimed_winner {
        ledger.credit(winner, payout, EntryKind::Payout, "game win", Some(room_id))?;
    }

    Ok(Some(SettlementOutcome {
        room: room_id,
        winner: claimed_winner,
        winner_seat,
        payout: if claimed_winner.is_some() {
            payout
        } else {
            Decimal::ZERO
        },
        participants,
    }))
}

/// The escrow holds behind a room's player seats, in seat order.
#[must_use]
pub fn player_holds(participants: &[Participant]) -> Vec<HoldId> {
    participants.iter().filter_map(Participant::hold).collect()
}

#[cfg(test)]
mod tests {
    use rackup_types::{EngineConfig, PlayerSeat};
    use rust_decimal::Decimal;

    use super::*;

    struct Fixture {
        ledger: Ledger,
        registry: RoomRegistry,
        room: RoomId,
        alice: AccountId,
        bob: AccountId,
    }

    /// Two players, 10.00 each, both escrow 5.00 into an active room.
    fn staked_room() -> Fixture {
        let mut ledger = Ledger::new(&EngineConfig::default());
        let mut registry = RoomRegistry::new();
        let stake = Decimal::new(500, 2);

        let alice = ledger.open_account("alice", Decimal::new(1000, 2));
        let bob = ledger.open_account("bob", Decimal::new(1000, 2));
        let hold_a = ledger.hold(alice, stake).unwrap();
        let hold_b = ledger.hold(bob, stake).unwrap();

        let seats = vec![
            (
                Participant::Player(PlayerSeat {
                    account: alice,
                    display_name: "alice".into(),
                    hold: hold_a,
                }),
                None,
            ),
            (
                Participant::Player(PlayerSeat {
                    account: bob,
                    display_name: "bob".into(),
                    hold: hold_b,
                }),
                None,
            ),
        ];
        let room = registry.create_room(seats, stake, false).unwrap();
        Fixture {
            ledger,
            registry,
            room,
            alice,
            bob,
        }
    }

    fn bot_room(stake: Decimal) -> (Ledger, RoomRegistry, RoomId, AccountId) {
        let mut ledger = Ledger::new(&EngineConfig::default());
        let mut registry = RoomRegistry::new();
        let alice = ledger.open_account("alice", Decimal::new(1000, 2));
        let hold = ledger.hold(alice, stake).unwrap();
        let seats = vec![
            (
                Participant::Player(PlayerSeat {
                    account: alice,
                    display_name: "alice".into(),
                    hold,
                }),
                None,
            ),
            (Participant::Bot, None),
        ];
        let room = registry.create_room(seats, stake, true).unwrap();
        (ledger, registry, room, alice)
    }

    #[test]
    fn winner_takes_the_whole_pot() {
        let mut fx = staked_room();
        let outcome =
            settle_game_end(&mut fx.ledger, &mut fx.registry, fx.room, Some(fx.alice))
                .unwrap()
                .unwrap();

        assert_eq!(outcome.winner, Some(fx.alice));
        assert_eq!(outcome.winner_seat, 0);
        assert_eq!(outcome.payout, Decimal::new(1000, 2));

        // 10.00 - 5.00 + 10.00 = 15.00 for the winner, 5.00 for the loser.
        assert_eq!(fx.ledger.balance(fx.alice).unwrap(), Decimal::new(1500, 2));
        assert_eq!(fx.ledger.balance(fx.bob).unwrap(), Decimal::new(500, 2));
        assert_eq!(
            fx.registry.lookup(fx.room).unwrap().state,
            RoomState::Settled
        );
        assert!(fx.ledger.all_conserved());
    }

    #[test]
    fn duplicate_report_is_a_noop() {
        let mut fx = staked_room();
        settle_game_end(&mut fx.ledger, &mut fx.registry, fx.room, Some(fx.alice)).unwrap();

        let second =
            settle_game_end(&mut fx.ledger, &mut fx.registry, fx.room, Some(fx.bob)).unwrap();
        assert!(second.is_none());
        // Exactly one payout entry exists.
        let payouts = fx
            .ledger
            .entries()
            .iter()
            .filter(|e| e.kind == EntryKind::Payout)
            .count();
        assert_eq!(payouts, 1);
        assert_eq!(fx.ledger.balance(fx.alice).unwrap(), Decimal::new(1500, 2));
    }

    #[test]
    fn unknown_room_is_a_noop() {
        let mut fx = staked_room();
        let outcome =
            settle_game_end(&mut fx.ledger, &mut fx.registry, RoomId::new(), Some(fx.alice))
                .unwrap();
        assert!(outcome.is_none());
        assert_eq!(fx.ledger.balance(fx.alice).unwrap(), Decimal::new(500, 2));
    }

    #[test]
    fn outsider_winner_rejected_without_mutation() {
        let mut fx = staked_room();
        let outsider = fx.ledger.open_account("mallory", Decimal::ZERO);

        let err = settle_game_end(&mut fx.ledger, &mut fx.registry, fx.room, Some(outsider))
            .unwrap_err();
        assert!(matches!(err, EngineError::WinnerNotInRoom { .. }));

        // Room still live, holds still active, no payout.
        assert_eq!(fx.registry.lookup(fx.room).unwrap().state, RoomState::Active);
        assert_eq!(fx.ledger.balance(outsider).unwrap(), Decimal::ZERO);
        let room = fx.registry.lookup(fx.room).unwrap();
        for hold in player_holds(&room.participants) {
            assert!(fx.ledger.hold_record(hold).unwrap().is_active());
        }
    }

    #[test]
    fn human_beats_bot_and_wins_double() {
        let stake = Decimal::new(500, 2);
        let (mut ledger, mut registry, room, alice) = bot_room(stake);

        let outcome = settle_game_end(&mut ledger, &mut registry, room, Some(alice))
            .unwrap()
            .unwrap();
        assert_eq!(outcome.payout, Decimal::new(1000, 2));
        // 10.00 - 5.00 + 10.00: the house backed the bot's side.
        assert_eq!(ledger.balance(alice).unwrap(), Decimal::new(1500, 2));
    }

    #[test]
    fn bot_victory_consumes_without_credit() {
        let stake = Decimal::new(500, 2);
        let (mut ledger, mut registry, room, alice) = bot_room(stake);

        let outcome = settle_game_end(&mut ledger, &mut registry, room, None)
            .unwrap()
            .unwrap();
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.winner_seat, 1);
        assert_eq!(outcome.payout, Decimal::ZERO);

        // Stake stays gone; the only entry is the original hold.
        assert_eq!(ledger.balance(alice).unwrap(), Decimal::new(500, 2));
        assert_eq!(ledger.entries_for(alice).len(), 1);
        assert_eq!(registry.lookup(room).unwrap().state, RoomState::Settled);
    }

    #[test]
    fn bot_claim_in_human_room_rejected() {
        let mut fx = staked_room();
        let err = settle_game_end(&mut fx.ledger, &mut fx.registry, fx.room, None).unwrap_err();
        assert!(matches!(err, EngineError::InvalidMessage { .. }));
        assert_eq!(fx.registry.lookup(fx.room).unwrap().state, RoomState::Active);
    }

    #[test]
    fn settled_holds_are_stamped_with_the_room() {
        let mut fx = staked_room();
        settle_game_end(&mut fx.ledger, &mut fx.registry, fx.room, Some(fx.bob)).unwrap();

        let room = fx.registry.lookup(fx.room).unwrap();
        for hold in player_holds(&room.participants) {
            let record = fx.ledger.hold_record(hold).unwrap();
            assert_eq!(record.room, Some(fx.room));
            assert!(!record.is_active());
        }
    }
}
