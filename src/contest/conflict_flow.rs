//! The step that runs one conflict opportunity.
//!
//! ## Stages
//!
//! 1. Declare: the attacker picks a type and attackers, or passes
//! 2. Defenders: the defender picks defenders (possibly none)
//! 3. Window: an action window, defender first
//! 4. Resolve: determine, record, close
//!
//! Contest commands from card scripting are applied to this flow's own
//! conflict at every step boundary. Duels started during the conflict are
//! queued ahead of the flow and run before it continues.

use tracing::{debug, warn};

use crate::core::{ConflictRecord, EngineError, EntityId, PlayerId};
use crate::effects::Duration;
use crate::events::{GameEvent, ScriptCommand};
use crate::game::{ActionWindow, Game, WindowPoll};
use crate::pipeline::{Step, StepContext, StepSlot, StepStatus};
use crate::prompt::{DecisionId, DecisionKind, Input};

use super::conflict::{Conflict, Side};
use super::duel_flow::DuelFlow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Declare,
    Defenders,
    Window,
    Resolve,
}

/// One conflict opportunity for `attacker`.
#[derive(Debug)]
pub struct ConflictFlow {
    attacker: PlayerId,
    conflict: Option<Conflict>,
    stage: Stage,
    pending: Option<DecisionId>,
    answer: Option<Input>,
    window: Option<ActionWindow>,
    status: StepStatus,
}

impl ConflictFlow {
    #[must_use]
    pub fn new(attacker: PlayerId) -> Self {
        Self {
            attacker,
            conflict: None,
            stage: Stage::Declare,
            pending: None,
            answer: None,
            window: None,
            status: StepStatus::Pending,
        }
    }

    #[must_use]
    pub fn attacker(&self) -> PlayerId {
        self.attacker
    }

    /// The conflict, once declared.
    #[must_use]
    pub fn conflict(&self) -> Option<&Conflict> {
        self.conflict.as_ref()
    }

    fn finish(&mut self) -> Result<bool, EngineError> {
        self.status = StepStatus::Complete;
        Ok(true)
    }

    fn record_pass(&mut self, game: &mut Game) {
        debug!(attacker = ?self.attacker, "conflict passed");
        game.state.conflicts.push_back(ConflictRecord {
            round: game.state.round,
            attacker: self.attacker,
            conflict_type: None,
            winner: None,
            skill_difference: 0.0,
            passed: true,
        });
        game.emit(GameEvent::ConflictPassed { player: self.attacker });
    }

    fn apply_commands(&mut self, cx: &mut StepContext<'_, Game>) {
        let commands = cx.game.take_contest_commands();
        for command in commands {
            match command {
                ScriptCommand::StartDuel {
                    challenger,
                    targets,
                    attribute,
                    chain,
                } => cx.queue(DuelFlow::new(challenger, targets, attribute, chain)),
                command => self.apply_to_conflict(cx.game, command),
            }
        }
    }

    fn apply_to_conflict(&mut self, game: &mut Game, command: ScriptCommand) {
        let Some(conflict) = self.conflict.as_mut() else {
            warn!(?command, "contest command before a conflict was declared");
            return;
        };
        match command {
            ScriptCommand::AdjustSideSkill { side, amount } => {
                conflict.adjust_side(side, amount);
            }
            ScriptCommand::Withdraw(card) => {
                if conflict.remove_participant(&mut game.state, card) {
                    game.emit(GameEvent::ParticipantLeft { card });
                }
            }
            ScriptCommand::JoinConflict { card, side } => {
                for card in conflict.add_participants(&mut game.state, side, &[card]) {
                    game.emit(GameEvent::ParticipantJoined { card, side });
                }
            }
            other => warn!(?other, "contest command has no effect on a conflict"),
        }
    }

    fn declare(&mut self, game: &mut Game) -> Option<bool> {
        if let Some(input) = self.answer.take() {
            self.pending = None;
            match input {
                Input::Declare {
                    conflict_type,
                    attackers,
                    ..
                } => {
                    let mut conflict = Conflict::new(self.attacker, conflict_type);
                    let added = conflict.add_attackers(&mut game.state, &attackers);
                    game.state.declared[self.attacker].push(conflict_type);
                    debug!(attacker = ?self.attacker, ?conflict_type, "conflict declared");
                    game.emit(GameEvent::ConflictDeclared {
                        attacker: self.attacker,
                        conflict_type,
                        attackers: added,
                    });
                    self.conflict = Some(conflict);
                    self.stage = Stage::Defenders;
                    return None;
                }
                _ => {
                    self.record_pass(game);
                    return Some(true);
                }
            }
        }

        if self.pending.is_none() {
            let types = game.state.declarable_types(self.attacker);
            let candidates = game.state.available_characters(self.attacker);
            if types.is_empty() || candidates.is_empty() {
                self.record_pass(game);
                return Some(true);
            }
            self.pending = Some(game.request_decision(
                self.attacker,
                DecisionKind::DeclareConflict { types, candidates },
                "Declare a conflict or pass",
            ));
        }
        Some(false)
    }

    fn defenders(&mut self, game: &mut Game) -> bool {
        let Some(defender) = self.conflict.as_ref().map(|c| c.defender) else {
            return false;
        };

        if let Some(input) = self.answer.take() {
            self.pending = None;
            let chosen = match input {
                Input::SelectCards { cards, .. } => cards,
                _ => Vec::new(),
            };
            self.choose_defenders(game, &chosen);
            return true;
        }

        if self.pending.is_none() {
            let candidates = game.state.available_characters(defender);
            if candidates.is_empty() {
                self.choose_defenders(game, &[]);
                return true;
            }
            let max = candidates.len();
            self.pending = Some(game.request_decision(
                defender,
                DecisionKind::SelectCards { candidates, min: 0, max },
                "Choose defenders",
            ));
        }
        false
    }

    fn choose_defenders(&mut self, game: &mut Game, cards: &[EntityId]) {
        let Some(conflict) = self.conflict.as_mut() else {
            return;
        };
        for card in conflict.add_defenders(&mut game.state, cards) {
            game.emit(GameEvent::ParticipantJoined {
                card,
                side: Side::Defender,
            });
        }
        let window = ActionWindow::new("conflict actions", conflict.defender, game.config().passes_to_close_window);
        self.window = Some(window);
        self.stage = Stage::Window;
    }

    fn resolve(&mut self, game: &mut Game) {
        let Some(mut conflict) = self.conflict.take() else {
            return;
        };
        conflict.begin_resolving();
        let outcome = conflict.determine_winner(&game.contest());
        game.emit(GameEvent::ConflictDetermined {
            winner: outcome.winner,
            loser: outcome.loser,
            attacker_total: outcome.attacker_total,
            defender_total: outcome.defender_total,
            skill_difference: outcome.skill_difference,
        });

        let record = conflict.record(game.state.round);
        game.state.conflicts.push_back(record);
        conflict.close(&mut game.state);
        game.expire_effects(Duration::UntilEndOfConflict);
        game.emit(GameEvent::ConflictClosed);
        self.conflict = Some(conflict);
    }
}

impl Step<Game> for ConflictFlow {
    fn name(&self) -> &str {
        "conflict"
    }

    fn status(&self) -> StepStatus {
        self.status
    }

    fn continue_step(&mut self, cx: &mut StepContext<'_, Game>) -> Result<bool, EngineError> {
        if self.status.is_finished() {
            return Ok(true);
        }
        self.status = StepStatus::Active;

        loop {
            self.apply_commands(cx);
            if cx.queued_len() > 0 {
                return Ok(false);
            }

            match self.stage {
                Stage::Declare => match self.declare(cx.game) {
                    Some(true) => return self.finish(),
                    Some(false) => return Ok(false),
                    None => {}
                },
                Stage::Defenders => {
                    if self.conflict.is_none() {
                        return Err(EngineError::step_failed("conflict", "no declared conflict"));
                    }
                    if !self.defenders(cx.game) {
                        return Ok(false);
                    }
                }
                Stage::Window => {
                    let Some(window) = self.window.as_mut() else {
                        self.stage = Stage::Resolve;
                        continue;
                    };
                    match window.poll(cx.game) {
                        WindowPoll::Closed => self.stage = Stage::Resolve,
                        WindowPoll::Waiting => return Ok(false),
                        WindowPoll::Acted => {}
                    }
                }
                Stage::Resolve => {
                    self.resolve(cx.game);
                    return self.finish();
                }
            }
        }
    }

    fn cancel(&mut self, cx: &mut StepContext<'_, Game>) {
        if let Some(id) = self.pending.take() {
            cx.game.cancel_decision(id);
        }
        if let Some(window) = self.window.as_mut() {
            window.abandon(cx.game);
        }
        if let Some(conflict) = self.conflict.as_ref() {
            for card in conflict.attackers().iter().chain(conflict.defenders()) {
                if let Some(instance) = cx.game.state.card_mut(*card) {
                    instance.in_conflict = false;
                }
            }
        }
        self.status = StepStatus::Cancelled;
    }

    fn on_input(&mut self, cx: &mut StepContext<'_, Game>, input: &Input) -> bool {
        if let (Stage::Window, Some(window)) = (self.stage, self.window.as_mut()) {
            return window.offer(cx.game, input);
        }
        match self.pending {
            Some(id) if self.answer.is_none() && cx.game.answer(id, input) => {
                self.answer = Some(input.clone());
                true
            }
            _ => false,
        }
    }
}

impl From<ConflictFlow> for StepSlot<Game> {
    fn from(step: ConflictFlow) -> Self {
        StepSlot::new(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardInstance, ConflictType};
    use crate::pipeline::{DrainOutcome, Pipeline};
    use crate::prompt::ActionChoice;

    fn game() -> Game {
        let mut game = Game::default();
        game.state.add_card(CardInstance::character(EntityId(0), "Akodo Zentaro", PlayerId::FIRST, Some(3.0), Some(1.0), 1.0));
        game.state.add_card(CardInstance::character(EntityId(1), "Hida Amoro", PlayerId::SECOND, Some(2.0), Some(0.0), 1.0));
        game
    }

    fn pass(player: PlayerId) -> Input {
        Input::Pass { player }
    }

    fn declare(pipeline: &mut Pipeline<Game>, game: &mut Game) {
        pipeline.queue(ConflictFlow::new(PlayerId::FIRST));
        assert_eq!(pipeline.drain(game), DrainOutcome::Paused);
        assert!(pipeline.handle_input(
            game,
            &Input::Declare {
                player: PlayerId::FIRST,
                conflict_type: ConflictType::Military,
                attackers: vec![EntityId(0)],
            }
        ));
        assert_eq!(pipeline.drain(game), DrainOutcome::Paused);
    }

    #[test]
    fn test_full_conflict() {
        let mut game = game();
        let mut pipeline = Pipeline::new();
        declare(&mut pipeline, &mut game);

        assert!(pipeline.handle_input(
            &mut game,
            &Input::SelectCards {
                player: PlayerId::SECOND,
                cards: vec![EntityId(1)],
            }
        ));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Paused);
        assert!(game.state.card(EntityId(1)).unwrap().in_conflict);

        // defender has priority first
        assert!(pipeline.handle_input(&mut game, &pass(PlayerId::SECOND)));
        pipeline.drain(&mut game);
        assert!(pipeline.handle_input(&mut game, &pass(PlayerId::FIRST)));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);

        let record = game.state.conflicts.back().unwrap();
        assert_eq!(record.winner, Some(PlayerId::FIRST));
        assert_eq!(record.skill_difference, 1.0);
        assert!(!game.state.card(EntityId(0)).unwrap().in_conflict);
        assert!(game.state.has_declared(PlayerId::FIRST, ConflictType::Military));
    }

    #[test]
    fn test_attacker_passes() {
        let mut game = game();
        let mut pipeline = Pipeline::new();
        pipeline.queue(ConflictFlow::new(PlayerId::FIRST));
        pipeline.drain(&mut game);
        assert!(pipeline.handle_input(&mut game, &pass(PlayerId::FIRST)));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);

        let record = game.state.conflicts.back().unwrap();
        assert!(record.passed);
        assert!(game.state.declared[PlayerId::FIRST].is_empty());
    }

    #[test]
    fn test_no_candidates_passes_automatically() {
        let mut game = game();
        game.state.card_mut(EntityId(0)).unwrap().bowed = true;
        let mut pipeline = Pipeline::new();
        pipeline.queue(ConflictFlow::new(PlayerId::FIRST));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);
        assert!(game.state.conflicts.back().unwrap().passed);
    }

    struct Sabotage;

    impl crate::events::ScriptHost for Sabotage {
        fn perform_action(
            &mut self,
            _player: PlayerId,
            action: &ActionChoice,
            _state: &crate::core::GameState,
        ) -> Vec<ScriptCommand> {
            match action.ability {
                0 => vec![ScriptCommand::Withdraw(EntityId(0))],
                _ => vec![ScriptCommand::AdjustSideSkill {
                    side: Side::Defender,
                    amount: 5.0,
                }],
            }
        }
    }

    #[test]
    fn test_actions_change_the_conflict() {
        let mut game = game().with_script(Sabotage);
        let mut pipeline = Pipeline::new();
        declare(&mut pipeline, &mut game);
        pipeline.handle_input(
            &mut game,
            &Input::SelectCards {
                player: PlayerId::SECOND,
                cards: vec![],
            },
        );
        pipeline.drain(&mut game);

        let act = Input::Action {
            player: PlayerId::SECOND,
            action: ActionChoice::new(0, None),
        };
        assert!(pipeline.handle_input(&mut game, &act));
        pipeline.drain(&mut game);
        assert!(!game.state.card(EntityId(0)).unwrap().in_conflict);

        pipeline.handle_input(&mut game, &pass(PlayerId::FIRST));
        pipeline.drain(&mut game);
        pipeline.handle_input(&mut game, &pass(PlayerId::SECOND));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);

        // nobody left on either side: 0-0
        let record = game.state.conflicts.back().unwrap();
        assert_eq!(record.winner, None);
        assert!(!record.passed);
    }
}
