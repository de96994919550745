//! Ready-made steps.
//!
//! - [`SimpleStep`]: runs a plain function once
//! - [`PipelineStep`]: owns a nested pipeline and accepts children into it

use tracing::debug;

use crate::core::EngineError;
use crate::prompt::Input;

use super::scheduler::{DrainOutcome, Pipeline};
use super::step::{Step, StepContext, StepSlot, StepStatus};

/// Function run by a [`SimpleStep`].
pub type StepFn<G> = fn(&mut StepContext<'_, G>) -> Result<bool, EngineError>;

/// A step backed by a function pointer. Anything it needs lives in `G`.
pub struct SimpleStep<G> {
    name: String,
    handler: StepFn<G>,
    status: StepStatus,
}

impl<G> SimpleStep<G> {
    pub fn new(name: impl Into<String>, handler: StepFn<G>) -> Self {
        Self {
            name: name.into(),
            handler,
            status: StepStatus::Pending,
        }
    }

    /// Boxed, for factories.
    pub fn boxed(name: impl Into<String>, handler: StepFn<G>) -> Box<dyn Step<G>>
    where
        G: 'static,
    {
        Box::new(Self::new(name, handler))
    }
}

impl<G> Step<G> for SimpleStep<G> {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> StepStatus {
        self.status
    }

    fn continue_step(&mut self, cx: &mut StepContext<'_, G>) -> Result<bool, EngineError> {
        if self.status.is_finished() {
            return Ok(true);
        }
        self.status = StepStatus::Active;
        let finished = (self.handler)(cx)?;
        if finished {
            self.status = StepStatus::Complete;
        }
        Ok(finished)
    }

    fn cancel(&mut self, _cx: &mut StepContext<'_, G>) {
        self.status = StepStatus::Cancelled;
    }
}

impl<G: 'static> From<SimpleStep<G>> for StepSlot<G> {
    fn from(step: SimpleStep<G>) -> Self {
        StepSlot::new(step)
    }
}

/// A step that drains its own pipeline. Children offered to it join that
/// pipeline, so nested procedures finish before siblings continue.
pub struct PipelineStep<G> {
    name: String,
    pipeline: Pipeline<G>,
    status: StepStatus,
}

impl<G> PipelineStep<G> {
    pub fn new(name: impl Into<String>, steps: impl IntoIterator<Item = StepSlot<G>>) -> Self {
        Self {
            name: name.into(),
            pipeline: Pipeline::from_steps(steps),
            status: StepStatus::Pending,
        }
    }

    /// Set the nested iteration cap (builder pattern).
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.pipeline = self.pipeline.limit(limit);
        self
    }

    /// The nested pipeline.
    pub fn pipeline_mut(&mut self) -> &mut Pipeline<G> {
        &mut self.pipeline
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline<G> {
        &self.pipeline
    }
}

impl<G> Step<G> for PipelineStep<G> {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> StepStatus {
        self.status
    }

    fn continue_step(&mut self, cx: &mut StepContext<'_, G>) -> Result<bool, EngineError> {
        if self.status.is_finished() {
            return Ok(true);
        }
        self.status = StepStatus::Active;

        match self.pipeline.drain(cx.game) {
            DrainOutcome::Complete => {
                self.status = StepStatus::Complete;
                Ok(true)
            }
            DrainOutcome::Paused => Ok(false),
            DrainOutcome::Aborted => {
                self.status = StepStatus::Complete;
                Err(self
                    .pipeline
                    .take_failures()
                    .pop()
                    .unwrap_or_else(|| EngineError::step_failed(self.name.clone(), "nested pipeline aborted")))
            }
        }
    }

    fn cancel(&mut self, cx: &mut StepContext<'_, G>) {
        self.pipeline.cancel_current(cx.game);
        if self.pipeline.is_empty() {
            debug!(step = %self.name, "nested pipeline unwound");
            self.status = StepStatus::Cancelled;
        }
    }

    fn queue_child(&mut self, step: StepSlot<G>) -> Result<(), StepSlot<G>> {
        if self.status.is_finished() {
            return Err(step);
        }
        self.pipeline.queue(step);
        Ok(())
    }

    fn on_input(&mut self, cx: &mut StepContext<'_, G>, input: &Input) -> bool {
        self.pipeline.handle_input(cx.game, input)
    }
}

impl<G: 'static> From<PipelineStep<G>> for StepSlot<G> {
    fn from(step: PipelineStep<G>) -> Self {
        StepSlot::new(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(cx: &mut StepContext<'_, Vec<u32>>) -> Result<bool, EngineError> {
        let next = cx.game.len() as u32;
        cx.game.push(next);
        Ok(true)
    }

    #[test]
    fn test_simple_step_runs_once() {
        let mut game = Vec::new();
        let mut step = SimpleStep::new("push", push);

        let mut cx = StepContext::new(&mut game);
        assert!(step.continue_step(&mut cx).unwrap());
        assert!(step.continue_step(&mut cx).unwrap());
        assert_eq!(game, vec![0]);
        assert_eq!(step.status(), StepStatus::Complete);
    }

    #[test]
    fn test_simple_step_refuses_children() {
        let mut step: SimpleStep<Vec<u32>> = SimpleStep::new("push", push);
        assert!(step.queue_child(StepSlot::new(SimpleStep::new("child", push))).is_err());
    }

    #[test]
    fn test_pipeline_step_accepts_children_until_finished() {
        let mut game = Vec::new();
        let mut step = PipelineStep::new("outer", vec![StepSlot::new(SimpleStep::new("a", push))]);
        assert!(step.queue_child(StepSlot::new(SimpleStep::new("b", push))).is_ok());

        let mut cx = StepContext::new(&mut game);
        assert!(step.continue_step(&mut cx).unwrap());
        assert_eq!(game, vec![0, 1]);
        assert!(step.queue_child(StepSlot::new(SimpleStep::new("late", push))).is_err());
    }

    #[test]
    fn test_pipeline_step_reports_nested_runaway() {
        fn again(cx: &mut StepContext<'_, Vec<u32>>) -> Result<bool, EngineError> {
            cx.queue(SimpleStep::new("again", again));
            Ok(false)
        }

        let mut game = Vec::new();
        let mut step = PipelineStep::new("outer", vec![StepSlot::new(SimpleStep::new("again", again))]).with_limit(5);

        let mut cx = StepContext::new(&mut game);
        let err = step.continue_step(&mut cx).unwrap_err();
        assert_eq!(err, EngineError::RunawayPipeline { limit: 5 });
        assert!(step.pipeline().is_empty());
    }
}
