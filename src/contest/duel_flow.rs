//! The step that runs a duel: both sides bid, then the duel resolves.
//!
//! The higher bidder gives the difference in honor to the lower bidder.
//! The finished duel is kept on the game so a follow-up duel can chain to
//! it.

use tracing::debug;

use crate::cards::Attribute;
use crate::core::{EngineError, EntityId, PlayerId};
use crate::events::{GameEvent, ScriptCommand};
use crate::game::Game;
use crate::pipeline::{Step, StepContext, StepSlot, StepStatus};
use crate::prompt::{DecisionId, DecisionKind, Input};

use super::duel::{Duel, DuelSide};

/// Smallest honor bid.
pub const MIN_BID: u32 = 1;

/// Largest honor bid.
pub const MAX_BID: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Start,
    Bidding,
    Resolve,
}

#[derive(Clone, Copy, Debug)]
struct Bidder {
    side: DuelSide,
    player: PlayerId,
    request: Option<DecisionId>,
}

/// Runs one duel to completion.
#[derive(Debug)]
pub struct DuelFlow {
    challenger: EntityId,
    targets: Vec<EntityId>,
    attribute: Attribute,
    chain: bool,
    duel: Option<Duel>,
    bidders: Vec<Bidder>,
    stage: Stage,
    status: StepStatus,
}

impl DuelFlow {
    /// `chain` links the new duel to the last finished one.
    #[must_use]
    pub fn new(challenger: EntityId, targets: Vec<EntityId>, attribute: Attribute, chain: bool) -> Self {
        Self {
            challenger,
            targets,
            attribute,
            chain,
            duel: None,
            bidders: Vec::new(),
            stage: Stage::Start,
            status: StepStatus::Pending,
        }
    }

    /// The duel, once started.
    #[must_use]
    pub fn duel(&self) -> Option<&Duel> {
        self.duel.as_ref()
    }

    fn start(&mut self, game: &mut Game) {
        let mut duel = Duel::new(self.challenger, &self.targets, self.attribute);
        if self.chain {
            if let Some(previous) = game.take_last_duel() {
                duel = duel.with_previous(previous);
            }
        }

        for side in [DuelSide::Challenger, DuelSide::Target] {
            let Some(player) = duel.controller(&game.contest(), side) else {
                continue;
            };
            let request = game.request_decision(player, DecisionKind::Bid { min: MIN_BID, max: MAX_BID }, "Duel bid");
            self.bidders.push(Bidder {
                side,
                player,
                request: Some(request),
            });
        }

        debug!(challenger = %self.challenger, targets = ?self.targets, "duel started");
        self.duel = Some(duel);
        self.stage = Stage::Bidding;
    }

    /// Pick up duel commands; leave the rest for whatever else is running.
    fn apply_commands(&mut self, game: &mut Game) {
        let Some(duel) = self.duel.as_mut() else {
            return;
        };
        let mut rest = Vec::new();
        for command in game.take_contest_commands() {
            match command {
                ScriptCommand::LeaveDuel(card) => {
                    duel.remove_participant(card);
                }
                other => rest.push(other),
            }
        }
        game.return_contest_commands(rest);
    }

    fn resolve(&mut self, game: &mut Game) {
        let Some(mut duel) = self.duel.take() else {
            return;
        };
        let outcome = duel.determine_result(&game.contest());

        let bid_of = |side| duel.bid(side).map(i64::from);
        let player_of = |side| self.bidders.iter().find(|b| b.side == side).map(|b| b.player);
        if let (Some(c), Some(t), Some(cp), Some(tp)) = (
            bid_of(DuelSide::Challenger),
            bid_of(DuelSide::Target),
            player_of(DuelSide::Challenger),
            player_of(DuelSide::Target),
        ) {
            if c > t {
                game.transfer_honor(cp, tp, c - t);
            } else if t > c {
                game.transfer_honor(tp, cp, t - c);
            }
        }

        game.emit(GameEvent::DuelResolved {
            winners: outcome.winner_ids(),
            losers: outcome.loser_ids(),
        });
        let record = duel.record(game.state.round);
        game.state.duels.push_back(record);
        game.set_last_duel(duel);
    }
}

impl Step<Game> for DuelFlow {
    fn name(&self) -> &str {
        "duel"
    }

    fn status(&self) -> StepStatus {
        self.status
    }

    fn continue_step(&mut self, cx: &mut StepContext<'_, Game>) -> Result<bool, EngineError> {
        if self.status.is_finished() {
            return Ok(true);
        }
        self.status = StepStatus::Active;

        if self.stage == Stage::Start {
            self.start(cx.game);
        }
        self.apply_commands(cx.game);

        if self.stage == Stage::Bidding {
            if self.bidders.iter().any(|b| b.request.is_some()) {
                return Ok(false);
            }
            self.stage = Stage::Resolve;
        }

        self.resolve(cx.game);
        self.status = StepStatus::Complete;
        Ok(true)
    }

    fn cancel(&mut self, cx: &mut StepContext<'_, Game>) {
        for bidder in &mut self.bidders {
            if let Some(id) = bidder.request.take() {
                cx.game.cancel_decision(id);
            }
        }
        self.duel = None;
        self.status = StepStatus::Cancelled;
    }

    fn on_input(&mut self, cx: &mut StepContext<'_, Game>, input: &Input) -> bool {
        let Input::Bid { amount, .. } = input else {
            return false;
        };
        let Some(duel) = self.duel.as_mut() else {
            return false;
        };
        for bidder in &mut self.bidders {
            if let Some(id) = bidder.request {
                if cx.game.answer(id, input) {
                    bidder.request = None;
                    duel.set_bid(bidder.side, *amount);
                    return true;
                }
            }
        }
        false
    }
}

impl From<DuelFlow> for StepSlot<Game> {
    fn from(step: DuelFlow) -> Self {
        StepSlot::new(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardInstance;
    use crate::pipeline::{DrainOutcome, Pipeline};

    fn game() -> Game {
        let mut game = Game::default();
        game.state.add_card(CardInstance::character(EntityId(0), "Kakita Kaezin", PlayerId::FIRST, Some(3.0), Some(3.0), 2.0));
        game.state.add_card(CardInstance::character(EntityId(1), "Isawa Kaede", PlayerId::SECOND, Some(1.0), Some(4.0), 3.0));
        game
    }

    fn bid(player: PlayerId, amount: u32) -> Input {
        Input::Bid { player, amount }
    }

    #[test]
    fn test_duel_with_bids() {
        let mut game = game();
        let mut pipeline = Pipeline::new();
        pipeline.queue(DuelFlow::new(EntityId(0), vec![EntityId(1)], Attribute::Political, false));

        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Paused);
        assert_eq!(game.pending_decisions().len(), 2);

        assert!(pipeline.handle_input(&mut game, &bid(PlayerId::FIRST, 3)));
        assert!(!pipeline.handle_input(&mut game, &bid(PlayerId::FIRST, 3)));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Paused);
        assert!(pipeline.handle_input(&mut game, &bid(PlayerId::SECOND, 1)));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);

        // 3 + 3 against 4 + 1
        let record = game.state.duels.back().unwrap();
        assert_eq!(record.winners, vec![EntityId(0)]);
        assert_eq!(record.losers, vec![EntityId(1)]);
        assert_eq!(game.state.honor[PlayerId::FIRST], 8);
        assert_eq!(game.state.honor[PlayerId::SECOND], 12);
        assert!(game.last_duel().is_some());
    }

    #[test]
    fn test_chained_duel() {
        let mut game = game();
        game.set_last_duel(Duel::new(EntityId(5), &[EntityId(6)], Attribute::Military));

        let mut pipeline = Pipeline::new();
        pipeline.queue(DuelFlow::new(EntityId(0), vec![EntityId(1)], Attribute::Military, true));
        pipeline.drain(&mut game);
        pipeline.handle_input(&mut game, &bid(PlayerId::FIRST, 1));
        pipeline.handle_input(&mut game, &bid(PlayerId::SECOND, 1));
        pipeline.drain(&mut game);

        let last = game.last_duel().unwrap();
        assert!(last.is_involved(EntityId(6)));
        assert!(last.is_involved(EntityId(1)));
    }

    #[test]
    fn test_cancel_withdraws_bids() {
        let mut game = game();
        let mut pipeline = Pipeline::new();
        pipeline.queue(DuelFlow::new(EntityId(0), vec![EntityId(1)], Attribute::Military, false));
        pipeline.drain(&mut game);

        assert!(pipeline.cancel_current(&mut game));
        assert!(pipeline.is_empty());
        assert!(game.pending_decisions().is_empty());
        assert!(game.state.duels.is_empty());
    }
}
