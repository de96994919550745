//! The standard round.
//!
//! ## Phases
//!
//! - Dynasty: an action window
//! - Draw: both seats bid honor; the higher bidder pays the difference
//! - Conflict: an action window, then alternating conflict opportunities
//! - Fate: an action window
//! - Regroup: the imperial favor goes to the higher glory count, every
//!   piece readies, round-long effects expire and the first player passes
//!
//! Windows and the favor prompt are step factories: who acts first and who
//! claims the favor are only known once the phase reaches them.

use tracing::debug;

use crate::cards::{Attribute, ConflictType};
use crate::contest::{ConflictFlow, MAX_BID, MIN_BID};
use crate::core::{EngineError, PhaseId, PlayerId};
use crate::effects::Duration;
use crate::pipeline::{Phase, SimpleStep, Step, StepContext, StepSlot};
use crate::prompt::{DecisionKind, Input};

use super::context::Game;
use super::decision_step::DecisionStep;
use super::window::ActionWindow;

/// Every phase of one round, in order.
#[must_use]
pub fn round_phases(game: &Game) -> Vec<StepSlot<Game>> {
    vec![
        dynasty_phase(game),
        draw_phase(game),
        conflict_phase(game),
        fate_phase(game),
        regroup_phase(game),
    ]
}

fn window(name: &'static str) -> StepSlot<Game> {
    StepSlot::factory(name, move |game: &mut Game| {
        Some(Box::new(ActionWindow::for_game(name, game)) as Box<dyn Step<Game>>)
    })
}

fn phase(game: &Game, id: PhaseId, steps: Vec<StepSlot<Game>>) -> StepSlot<Game> {
    StepSlot::new(Phase::new(id, steps).with_limit(game.config().max_drain_iterations))
}

pub fn dynasty_phase(game: &Game) -> StepSlot<Game> {
    phase(game, PhaseId::DYNASTY, vec![window("dynasty actions")])
}

// === Draw ===

fn record_bid(cx: &mut StepContext<'_, Game>, input: &Input) -> Result<(), EngineError> {
    if let Input::Bid { player, amount } = input {
        cx.game.state.honor_bids[*player] = Some(*amount);
    }
    Ok(())
}

fn settle_bids(cx: &mut StepContext<'_, Game>) -> Result<bool, EngineError> {
    let bids = &cx.game.state.honor_bids;
    let (Some(first), Some(second)) = (bids[PlayerId::FIRST], bids[PlayerId::SECOND]) else {
        return Ok(true);
    };
    let (first, second) = (i64::from(first), i64::from(second));
    if first > second {
        cx.game.transfer_honor(PlayerId::FIRST, PlayerId::SECOND, first - second);
    } else if second > first {
        cx.game.transfer_honor(PlayerId::SECOND, PlayerId::FIRST, second - first);
    }
    Ok(true)
}

pub fn draw_phase(game: &Game) -> StepSlot<Game> {
    let mut steps: Vec<StepSlot<Game>> = PlayerId::both()
        .map(|player| {
            StepSlot::new(DecisionStep::new(
                "honor bid",
                player,
                DecisionKind::Bid { min: MIN_BID, max: MAX_BID },
                "Bid honor",
                record_bid,
            ))
        })
        .collect();
    steps.push(StepSlot::new(SimpleStep::new("settle honor bids", settle_bids)));
    phase(game, PhaseId::DRAW, steps)
}

// === Conflict ===

/// Conflict opportunities alternate between seats, first player first.
pub fn conflict_phase(game: &Game) -> StepSlot<Game> {
    let first = game.state.first_player;
    let mut steps = vec![window("conflict phase actions")];
    for _ in 0..game.config().conflicts_per_player {
        steps.push(StepSlot::new(ConflictFlow::new(first)));
        steps.push(StepSlot::new(ConflictFlow::new(first.opponent())));
    }
    phase(game, PhaseId::CONFLICT, steps)
}

pub fn fate_phase(game: &Game) -> StepSlot<Game> {
    phase(game, PhaseId::FATE, vec![window("fate actions")])
}

// === Regroup ===

/// Resolved glory of `player`'s ready characters.
#[must_use]
pub fn glory_count(game: &Game, player: PlayerId) -> f64 {
    game.state
        .characters_in_play(player)
        .into_iter()
        .filter(|id| game.state.card(*id).is_some_and(|c| !c.bowed))
        .map(|id| game.value(id, Attribute::Glory).or_zero())
        .sum()
}

fn claim_favor(cx: &mut StepContext<'_, Game>, input: &Input) -> Result<(), EngineError> {
    let Input::Choose { player, index } = input else {
        return Ok(());
    };
    let kind = ConflictType::ALL
        .get(*index)
        .copied()
        .ok_or_else(|| EngineError::step_failed("imperial favor", format!("no favor option {index}")))?;
    cx.game.claim_favor(*player, kind);
    Ok(())
}

fn favor_contest() -> StepSlot<Game> {
    StepSlot::factory("imperial favor", |game: &mut Game| {
        let first = glory_count(game, PlayerId::FIRST);
        let second = glory_count(game, PlayerId::SECOND);
        debug!(first, second, "glory count");
        let winner = if first > second {
            PlayerId::FIRST
        } else if second > first {
            PlayerId::SECOND
        } else {
            return None;
        };
        let choices = ConflictType::ALL.iter().map(ToString::to_string).collect();
        Some(Box::new(DecisionStep::new(
            "imperial favor",
            winner,
            DecisionKind::ChooseOne { choices },
            "Choose the favor",
            claim_favor,
        )) as Box<dyn Step<Game>>)
    })
}

fn ready_all(cx: &mut StepContext<'_, Game>) -> Result<bool, EngineError> {
    cx.game.state.ready_all();
    Ok(true)
}

fn end_round(cx: &mut StepContext<'_, Game>) -> Result<bool, EngineError> {
    cx.game.expire_effects(Duration::UntilEndOfRound);
    let next = cx.game.state.first_player.opponent();
    cx.game.state.first_player = next;
    debug!(round = cx.game.state.round, first_player = ?next, "round ended");
    Ok(true)
}

pub fn regroup_phase(game: &Game) -> StepSlot<Game> {
    phase(
        game,
        PhaseId::REGROUP,
        vec![
            favor_contest(),
            StepSlot::new(SimpleStep::new("ready", ready_all)),
            StepSlot::new(SimpleStep::new("end round", end_round)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardInstance;
    use crate::core::{EngineConfig, EntityId};
    use crate::pipeline::{DrainOutcome, Pipeline};

    fn game() -> Game {
        let mut game = Game::default();
        game.state.add_card(CardInstance::character(EntityId(0), "Doji Hotaru", PlayerId::FIRST, Some(2.0), Some(4.0), 3.0));
        game.state.add_card(CardInstance::character(EntityId(1), "Shiba Tsukune", PlayerId::SECOND, Some(3.0), Some(3.0), 2.0));
        game
    }

    #[test]
    fn test_draw_bids_move_honor() {
        let mut game = game();
        let mut pipeline = Pipeline::new();
        pipeline.queue(draw_phase(&game));

        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Paused);
        assert!(pipeline.handle_input(&mut game, &Input::Bid { player: PlayerId::FIRST, amount: 5 }));
        pipeline.drain(&mut game);
        assert!(pipeline.handle_input(&mut game, &Input::Bid { player: PlayerId::SECOND, amount: 2 }));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);

        assert_eq!(game.state.honor[PlayerId::FIRST], 7);
        assert_eq!(game.state.honor[PlayerId::SECOND], 13);
    }

    #[test]
    fn test_glory_count_skips_bowed() {
        let mut game = game();
        assert_eq!(glory_count(&game, PlayerId::FIRST), 3.0);
        game.state.card_mut(EntityId(0)).unwrap().bowed = true;
        assert_eq!(glory_count(&game, PlayerId::FIRST), 0.0);
    }

    #[test]
    fn test_regroup_claims_favor_and_readies() {
        let mut game = game();
        game.state.card_mut(EntityId(1)).unwrap().bowed = true;
        let mut pipeline = Pipeline::new();
        pipeline.queue(regroup_phase(&game));

        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Paused);
        assert_eq!(game.pending_decisions()[0].player, PlayerId::FIRST);
        assert!(pipeline.handle_input(&mut game, &Input::Choose { player: PlayerId::FIRST, index: 1 }));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);

        assert!(game.state.favor.favors(PlayerId::FIRST, ConflictType::Political));
        assert!(!game.state.card(EntityId(1)).unwrap().bowed);
        assert_eq!(game.state.first_player, PlayerId::SECOND);
    }

    #[test]
    fn test_tied_glory_leaves_favor() {
        let mut game = game();
        game.state.card_mut(EntityId(0)).unwrap().stats.set_printed(Attribute::Glory, 2.0);
        let mut pipeline = Pipeline::new();
        pipeline.queue(regroup_phase(&game));

        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);
        assert_eq!(game.state.favor.holder, None);
    }

    #[test]
    fn test_conflict_phase_opportunities() {
        let mut game = Game::new(EngineConfig::new().with_conflicts_per_player(1));
        let mut pipeline = Pipeline::new();
        pipeline.queue(conflict_phase(&game));

        // window, then one opportunity per seat; nobody has characters
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Paused);
        pipeline.handle_input(&mut game, &Input::Pass { player: PlayerId::FIRST });
        pipeline.drain(&mut game);
        pipeline.handle_input(&mut game, &Input::Pass { player: PlayerId::SECOND });
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);

        let passes: Vec<_> = game.state.conflicts.iter().map(|r| (r.attacker, r.passed)).collect();
        assert_eq!(passes, vec![(PlayerId::FIRST, true), (PlayerId::SECOND, true)]);
    }
}
