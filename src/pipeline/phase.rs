//! Phases: named segments of a round.
//!
//! A [`Phase`] is a nested pipeline bracketed by `begin_phase` and
//! `end_phase` calls on its host, which is where the game records the
//! current phase, emits notifications and expires phase-long effects.

use crate::core::{EngineError, PhaseId};
use crate::prompt::Input;

use super::scheduler::Pipeline;
use super::simple::PipelineStep;
use super::step::{Step, StepContext, StepSlot, StepStatus};

/// Game-side hooks around a phase.
pub trait PhaseHost {
    fn begin_phase(&mut self, phase: PhaseId);
    fn end_phase(&mut self, phase: PhaseId);
}

/// An ordered sequence of steps for one phase.
pub struct Phase<G> {
    id: PhaseId,
    started: bool,
    ended: bool,
    body: PipelineStep<G>,
}

impl<G: PhaseHost> Phase<G> {
    pub fn new(id: PhaseId, steps: impl IntoIterator<Item = StepSlot<G>>) -> Self {
        Self {
            id,
            started: false,
            ended: false,
            body: PipelineStep::new(id.name(), steps),
        }
    }

    /// Set the nested iteration cap (builder pattern).
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.body = self.body.with_limit(limit);
        self
    }

    #[must_use]
    pub fn id(&self) -> PhaseId {
        self.id
    }

    /// The steps still to run in this phase.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline<G> {
        self.body.pipeline_mut()
    }

    fn finish(&mut self, game: &mut G) {
        if !self.ended {
            self.ended = true;
            game.end_phase(self.id);
        }
    }
}

impl<G: PhaseHost> Step<G> for Phase<G> {
    fn name(&self) -> &str {
        self.body.name()
    }

    fn status(&self) -> StepStatus {
        match self.body.status() {
            StepStatus::Pending if self.started => StepStatus::Active,
            status => status,
        }
    }

    fn continue_step(&mut self, cx: &mut StepContext<'_, G>) -> Result<bool, EngineError> {
        if !self.started {
            self.started = true;
            cx.game.begin_phase(self.id);
        }

        let result = self.body.continue_step(cx);
        if !matches!(result, Ok(false)) {
            self.finish(cx.game);
        }
        result
    }

    fn cancel(&mut self, cx: &mut StepContext<'_, G>) {
        self.body.cancel(cx);
        if self.body.is_complete() && self.started {
            self.finish(cx.game);
        }
    }

    fn queue_child(&mut self, step: StepSlot<G>) -> Result<(), StepSlot<G>> {
        self.body.queue_child(step)
    }

    fn on_input(&mut self, cx: &mut StepContext<'_, G>, input: &Input) -> bool {
        self.body.on_input(cx, input)
    }
}

impl<G: PhaseHost + 'static> From<Phase<G>> for StepSlot<G> {
    fn from(phase: Phase<G>) -> Self {
        StepSlot::new(phase)
    }
}
