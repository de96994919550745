//! A generic prompt: ask one player, wait, hand the answer to a function.

use crate::core::{EngineError, PlayerId};
use crate::pipeline::{Step, StepContext, StepSlot, StepStatus};
use crate::prompt::{DecisionId, DecisionKind, Input};

use super::context::Game;

/// Called with the accepted answer.
pub type AnswerFn = fn(&mut StepContext<'_, Game>, &Input) -> Result<(), EngineError>;

/// Opens a decision request on first continue and completes once a legal
/// answer arrives.
///
/// ```
/// use conflict_rules::core::PlayerId;
/// use conflict_rules::game::{DecisionStep, Game};
/// use conflict_rules::pipeline::{DrainOutcome, Pipeline};
/// use conflict_rules::prompt::{DecisionKind, Input};
///
/// let mut game = Game::default();
/// let mut pipeline = Pipeline::new();
/// pipeline.queue(DecisionStep::new("bid", PlayerId::FIRST, DecisionKind::Bid { min: 1, max: 5 }, "Bid", |cx, input| {
///     if let Input::Bid { amount, .. } = input {
///         cx.game.state.honor[PlayerId::FIRST] -= i64::from(*amount);
///     }
///     Ok(())
/// }));
///
/// assert_eq!(pipeline.drain(&mut game), DrainOutcome::Paused);
/// assert!(pipeline.handle_input(&mut game, &Input::Bid { player: PlayerId::FIRST, amount: 3 }));
/// assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);
/// assert_eq!(game.state.honor[PlayerId::FIRST], 7);
/// ```
pub struct DecisionStep {
    name: String,
    player: PlayerId,
    kind: Option<DecisionKind>,
    prompt: String,
    on_answer: AnswerFn,
    pending: Option<DecisionId>,
    answer: Option<Input>,
    status: StepStatus,
}

impl DecisionStep {
    pub fn new(
        name: impl Into<String>,
        player: PlayerId,
        kind: DecisionKind,
        prompt: impl Into<String>,
        on_answer: AnswerFn,
    ) -> Self {
        Self {
            name: name.into(),
            player,
            kind: Some(kind),
            prompt: prompt.into(),
            on_answer,
            pending: None,
            answer: None,
            status: StepStatus::Pending,
        }
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// The open request, once asked.
    #[must_use]
    pub fn pending(&self) -> Option<DecisionId> {
        self.pending
    }
}

impl Step<Game> for DecisionStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> StepStatus {
        self.status
    }

    fn continue_step(&mut self, cx: &mut StepContext<'_, Game>) -> Result<bool, EngineError> {
        if self.status.is_finished() {
            return Ok(true);
        }

        if let Some(input) = self.answer.take() {
            self.status = StepStatus::Complete;
            (self.on_answer)(cx, &input)?;
            return Ok(true);
        }

        if let Some(kind) = self.kind.take() {
            self.status = StepStatus::Active;
            self.pending = Some(cx.game.request_decision(self.player, kind, self.prompt.clone()));
        }
        Ok(false)
    }

    fn cancel(&mut self, cx: &mut StepContext<'_, Game>) {
        if let Some(id) = self.pending.take() {
            cx.game.cancel_decision(id);
        }
        self.status = StepStatus::Cancelled;
    }

    fn on_input(&mut self, cx: &mut StepContext<'_, Game>, input: &Input) -> bool {
        match self.pending {
            Some(id) if self.answer.is_none() && cx.game.answer(id, input) => {
                self.answer = Some(input.clone());
                true
            }
            _ => false,
        }
    }
}

impl From<DecisionStep> for StepSlot<Game> {
    fn from(step: DecisionStep) -> Self {
        StepSlot::new(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{DrainOutcome, Pipeline};

    fn record_choice(cx: &mut StepContext<'_, Game>, input: &Input) -> Result<(), EngineError> {
        if let Input::Choose { index, .. } = input {
            cx.game.state.round = *index as u32 + 10;
        }
        Ok(())
    }

    fn fail(_: &mut StepContext<'_, Game>, _: &Input) -> Result<(), EngineError> {
        Err(EngineError::step_failed("choice", "no such option"))
    }

    fn choose() -> DecisionKind {
        DecisionKind::ChooseOne {
            choices: smallvec::smallvec!["stay".into(), "go".into()],
        }
    }

    #[test]
    fn test_wrong_seat_is_ignored() {
        let mut game = Game::default();
        let mut pipeline = Pipeline::new();
        pipeline.queue(DecisionStep::new("choice", PlayerId::SECOND, choose(), "Pick", record_choice));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Paused);

        assert!(!pipeline.handle_input(&mut game, &Input::Choose { player: PlayerId::FIRST, index: 1 }));
        assert!(!pipeline.handle_input(&mut game, &Input::Choose { player: PlayerId::SECOND, index: 5 }));
        assert_eq!(game.pending_decisions().len(), 1);

        assert!(pipeline.handle_input(&mut game, &Input::Choose { player: PlayerId::SECOND, index: 1 }));
        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);
        assert_eq!(game.state.round, 11);
    }

    #[test]
    fn test_failing_handler_discards_step() {
        let mut game = Game::default();
        let mut pipeline = Pipeline::new();
        pipeline.queue(DecisionStep::new("choice", PlayerId::FIRST, choose(), "Pick", fail));
        pipeline.drain(&mut game);
        pipeline.handle_input(&mut game, &Input::Choose { player: PlayerId::FIRST, index: 0 });

        assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);
        assert_eq!(pipeline.take_failures().len(), 1);
    }
}
