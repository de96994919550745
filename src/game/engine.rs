//! The outer driver: a [`Game`] plus the top-level pipeline.
//!
//! Hosts queue work, drain it, and feed player input back in through
//! [`Engine::submit`]. Step failures and runaway drains surface as
//! [`GameEvent`]s so observers see them without any return-value plumbing.

use tracing::{debug, warn};

use crate::contest::DuelFlow;
use crate::core::EngineError;
use crate::events::{GameEvent, ScriptCommand};
use crate::pipeline::{DrainOutcome, Pipeline, Step, StepSlot};
use crate::prompt::{AutoDecider, DecisionRequest, Input};

use super::context::Game;
use super::phases::round_phases;

/// Game plus scheduler.
#[derive(Debug)]
pub struct Engine {
    pub game: Game,
    pipeline: Pipeline<Game>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Game::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new(game: Game) -> Self {
        let limit = game.config().max_drain_iterations;
        Self {
            game,
            pipeline: Pipeline::with_limit(limit),
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline<Game> {
        &self.pipeline
    }

    /// Queue a step (routed like any queued step).
    pub fn queue(&mut self, step: impl Into<StepSlot<Game>>) {
        self.pipeline.queue(step);
    }

    /// Queue a step built when it is first reached.
    pub fn queue_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl FnOnce(&mut Game) -> Option<Box<dyn Step<Game>>> + 'static,
    ) {
        self.pipeline.queue(StepSlot::factory(name, factory));
    }

    /// Start the next round and queue its phases behind anything waiting.
    pub fn begin_round(&mut self) -> u32 {
        let round = self.game.start_round();
        for phase in round_phases(&self.game) {
            self.pipeline.push_back(phase);
        }
        round
    }

    /// Run until everything finishes or something waits for input.
    pub fn drain(&mut self) -> DrainOutcome {
        loop {
            let outcome = self.pipeline.drain(&mut self.game);
            self.report_failures();
            if outcome != DrainOutcome::Complete || !self.start_loose_duels() {
                debug!(?outcome, "drain finished");
                return outcome;
            }
        }
    }

    /// Deliver input to the waiting step, then drain. `None` if nothing
    /// accepted the input.
    pub fn submit(&mut self, input: &Input) -> Option<DrainOutcome> {
        if !self.pipeline.handle_input(&mut self.game, input) {
            debug!(player = ?input.player(), "input not accepted");
            return None;
        }
        Some(self.drain())
    }

    /// Cancel the front step.
    pub fn cancel_current(&mut self) -> bool {
        self.pipeline.cancel_current(&mut self.game)
    }

    /// Open decision requests, oldest first.
    #[must_use]
    pub fn pending_requests(&self) -> &[DecisionRequest] {
        self.game.pending_decisions()
    }

    /// Drain, answering every request with `auto`, until the pipeline
    /// completes or stops making progress.
    pub fn run_unattended(&mut self, auto: &mut AutoDecider) -> DrainOutcome {
        let mut outcome = self.drain();
        let mut answered = 0usize;
        while outcome == DrainOutcome::Paused {
            let Some(request) = self.game.pending_decisions().first().cloned() else {
                warn!(step = ?self.pipeline.current_name(), "paused without a request");
                break;
            };
            answered += 1;
            if answered > self.game.config().max_drain_iterations {
                warn!(answered, "unattended run cut off");
                break;
            }
            let input = auto.decide(&request);
            match self.submit(&input) {
                Some(next) => outcome = next,
                None => {
                    warn!(decision = %request.id, "default answer refused");
                    break;
                }
            }
        }
        outcome
    }

    fn report_failures(&mut self) {
        for failure in self.pipeline.take_failures() {
            let event = match failure {
                EngineError::RunawayPipeline { limit } => GameEvent::PipelineAborted { limit },
                other => GameEvent::StepFailed {
                    reason: other.to_string(),
                },
            };
            self.game.emit(event);
        }
    }

    /// Contest commands nobody picked up: duels start, the rest is dropped.
    fn start_loose_duels(&mut self) -> bool {
        let mut started = false;
        for command in self.game.take_contest_commands() {
            match command {
                ScriptCommand::StartDuel {
                    challenger,
                    targets,
                    attribute,
                    chain,
                } => {
                    self.pipeline.queue(DuelFlow::new(challenger, targets, attribute, chain));
                    started = true;
                }
                other => warn!(?other, "contest command outside a contest dropped"),
            }
        }
        started
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Attribute, CardInstance};
    use crate::core::{EntityId, PlayerId};
    use crate::pipeline::{SimpleStep, StepContext};
    use crate::prompt::FallbackStrategy;

    fn explode(_: &mut StepContext<'_, Game>) -> Result<bool, EngineError> {
        Err(EngineError::step_failed("explode", "boom"))
    }

    #[test]
    fn test_failures_become_events() {
        let mut engine = Engine::new(Game::default().with_event_log());
        engine.queue(SimpleStep::new("explode", explode));
        assert_eq!(engine.drain(), DrainOutcome::Complete);

        let kinds: Vec<_> = engine.game.hooks.log().iter().map(GameEvent::kind).collect();
        assert_eq!(kinds, vec!["step_failed"]);
    }

    #[test]
    fn test_loose_duel_is_started() {
        let mut engine = Engine::default();
        engine.game.state.add_card(CardInstance::character(EntityId(0), "Bayushi Aramoro", PlayerId::FIRST, Some(4.0), Some(2.0), 1.0));
        engine.game.state.add_card(CardInstance::character(EntityId(1), "Akodo Kage", PlayerId::SECOND, Some(2.0), Some(2.0), 1.0));
        engine.game.apply_command(ScriptCommand::StartDuel {
            challenger: EntityId(0),
            targets: vec![EntityId(1)],
            attribute: Attribute::Military,
            chain: false,
        });

        assert_eq!(engine.drain(), DrainOutcome::Paused);
        assert_eq!(engine.pending_requests().len(), 2);

        let mut auto = AutoDecider::new(1, FallbackStrategy::Decline);
        assert_eq!(engine.run_unattended(&mut auto), DrainOutcome::Complete);
        assert_eq!(engine.game.state.duels.len(), 1);
    }

    #[test]
    fn test_submit_without_waiting_step() {
        let mut engine = Engine::default();
        assert_eq!(engine.submit(&Input::Pass { player: PlayerId::FIRST }), None);
    }
}
