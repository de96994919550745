//! The step scheduler.
//!
//! A [`Pipeline`] holds step slots in run order plus a side queue of steps
//! that arrived while something was running. The front slot is always the
//! next thing to run.
//!
//! ## Routing
//!
//! - An empty pipeline takes a queued step at the front.
//! - Otherwise the running (front) step is offered the step through
//!   [`Step::queue_child`]; if it refuses, the step waits in the side queue.
//! - The side queue merges in front of the pipeline before each drain
//!   and after every continuation, so children run before the step that
//!   queued them continues.
//!
//! ## Liveness
//!
//! A step returning `Err` is logged and discarded, together with any steps
//! it queued before failing. A drain that exceeds
//! the iteration cap clears everything and reports [`DrainOutcome::Aborted`].
//!
//! ```
//! use conflict_rules::pipeline::{DrainOutcome, Pipeline, SimpleStep};
//!
//! let mut game = 0u32;
//! let mut pipeline: Pipeline<u32> = Pipeline::new();
//! for _ in 0..3 {
//!     pipeline.queue(SimpleStep::<u32>::new("bump", |cx| {
//!         *cx.game += 1;
//!         Ok(true)
//!     }));
//! }
//!
//! assert_eq!(pipeline.drain(&mut game), DrainOutcome::Complete);
//! assert_eq!(game, 3);
//! assert!(pipeline.is_empty());
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::core::{EngineConfig, EngineError};
use crate::prompt::Input;

use super::step::{Step, StepContext, StepSlot};

/// How a drain ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrainOutcome {
    /// Nothing left to run.
    Complete,
    /// The front step is waiting (usually for input).
    Paused,
    /// The iteration cap was hit; the pipeline was cleared.
    Aborted,
}

/// Ordered steps plus the side queue.
pub struct Pipeline<G> {
    steps: VecDeque<StepSlot<G>>,
    queue: Vec<StepSlot<G>>,
    limit: usize,
    failures: Vec<EngineError>,
}

impl<G> Default for Pipeline<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G> std::fmt::Debug for Pipeline<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps)
            .field("queue", &self.queue)
            .field("limit", &self.limit)
            .finish()
    }
}

impl<G> Pipeline<G> {
    /// Empty pipeline with the default iteration cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(EngineConfig::default().max_drain_iterations)
    }

    /// Empty pipeline with a custom iteration cap.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            steps: VecDeque::new(),
            queue: Vec::new(),
            limit: limit.max(1),
            failures: Vec::new(),
        }
    }

    /// Pipeline pre-filled with `steps`, in order.
    pub fn from_steps(steps: impl IntoIterator<Item = StepSlot<G>>) -> Self {
        let mut pipeline = Self::new();
        pipeline.steps.extend(steps);
        pipeline
    }

    /// Set the iteration cap (builder pattern).
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Queue a step from outside any running step.
    pub fn queue(&mut self, step: impl Into<StepSlot<G>>) {
        let slot = step.into();
        if self.is_empty() {
            self.steps.push_front(slot);
            return;
        }
        let slot = match self.steps.front_mut().and_then(StepSlot::step_mut) {
            Some(front) => match front.queue_child(slot) {
                Ok(()) => return,
                Err(slot) => slot,
            },
            None => slot,
        };
        self.queue.push(slot);
    }

    /// Append a step at the back, behind everything already waiting.
    pub fn push_back(&mut self, step: impl Into<StepSlot<G>>) {
        self.steps.push_back(step.into());
    }

    /// Run steps until the pipeline empties or the front step waits.
    pub fn drain(&mut self, game: &mut G) -> DrainOutcome {
        self.merge_queue();
        let mut iterations = 0usize;

        while let Some(mut slot) = self.steps.pop_front() {
            iterations += 1;
            if iterations > self.limit {
                error!(limit = self.limit, step = slot.name(), "runaway pipeline cleared");
                self.failures.push(EngineError::RunawayPipeline { limit: self.limit });
                self.clear();
                return DrainOutcome::Aborted;
            }

            let Some(step) = slot.materialize(game) else {
                warn!(slot = slot.name(), "discarded empty step slot");
                self.merge_queue();
                continue;
            };

            let mut cx = StepContext::new(game);
            let result = step.continue_step(&mut cx);
            let queued = cx.into_queued();

            let finished = match result {
                Ok(finished) => finished,
                Err(err) => {
                    error!(step = step.name(), %err, dropped = queued.len(), "step failed and was discarded");
                    self.failures.push(err);
                    self.merge_queue();
                    continue;
                }
            };

            if finished {
                debug!(step = step.name(), "step finished");
                self.queue.extend(queued);
                self.merge_queue();
                continue;
            }

            let arrived = !queued.is_empty();
            for child in queued {
                if let Err(child) = step.queue_child(child) {
                    self.queue.push(child);
                }
            }
            self.steps.push_front(slot);
            self.merge_queue();

            if !arrived {
                return DrainOutcome::Paused;
            }
        }

        DrainOutcome::Complete
    }

    /// Cancel the front step. Returns `false` if nothing was running.
    pub fn cancel_current(&mut self, game: &mut G) -> bool {
        let Some(mut slot) = self.steps.pop_front() else {
            return false;
        };
        let Some(step) = slot.materialize(game) else {
            return true;
        };

        let mut cx = StepContext::new(game);
        step.cancel(&mut cx);
        let queued = cx.into_queued();
        let complete = step.is_complete();
        debug!(step = step.name(), complete, "step cancelled");

        self.queue.extend(queued);
        if !complete {
            self.steps.push_front(slot);
        }
        self.merge_queue();
        true
    }

    /// Deliver input to the front step. Returns `true` if it was accepted.
    pub fn handle_input(&mut self, game: &mut G, input: &Input) -> bool {
        self.merge_queue();
        let Some(slot) = self.steps.front_mut() else {
            return false;
        };
        let Some(step) = slot.materialize(game) else {
            return false;
        };

        let mut cx = StepContext::new(game);
        let accepted = step.on_input(&mut cx, input);
        for child in cx.into_queued() {
            if let Err(child) = step.queue_child(child) {
                self.queue.push(child);
            }
        }
        accepted
    }

    /// Drop every step and queued step.
    pub fn clear(&mut self) {
        self.steps.clear();
        self.queue.clear();
    }

    /// Errors recorded since the last call.
    pub fn take_failures(&mut self) -> Vec<EngineError> {
        std::mem::take(&mut self.failures)
    }

    /// Name of the next step to run.
    #[must_use]
    pub fn current_name(&self) -> Option<&str> {
        self.queue
            .first()
            .or_else(|| self.steps.front())
            .map(StepSlot::name)
    }

    /// The front step, if it has been built.
    pub fn current_mut(&mut self) -> Option<&mut (dyn Step<G> + 'static)> {
        self.merge_queue();
        self.steps.front_mut().and_then(StepSlot::step_mut)
    }

    /// Slots waiting, including the side queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len() + self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.queue.is_empty()
    }

    fn merge_queue(&mut self) {
        for slot in self.queue.drain(..).rev() {
            self.steps.push_front(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{SimpleStep, StepStatus};

    #[derive(Default)]
    struct Log(Vec<&'static str>);

    struct Waiter {
        status: StepStatus,
        cancellable: bool,
    }

    impl Step<Log> for Waiter {
        fn name(&self) -> &str {
            "waiter"
        }

        fn status(&self) -> StepStatus {
            self.status
        }

        fn continue_step(&mut self, cx: &mut StepContext<'_, Log>) -> Result<bool, EngineError> {
            cx.game.0.push("wait");
            self.status = StepStatus::Active;
            Ok(false)
        }

        fn cancel(&mut self, _cx: &mut StepContext<'_, Log>) {
            if self.cancellable {
                self.status = StepStatus::Cancelled;
            }
        }
    }

    fn waiter(cancellable: bool) -> StepSlot<Log> {
        StepSlot::new(Waiter {
            status: StepStatus::Pending,
            cancellable,
        })
    }

    #[test]
    fn test_error_discards_step() {
        let mut log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline.queue(SimpleStep::new("broken", |_| Err(EngineError::step_failed("broken", "boom"))));
        pipeline.push_back(SimpleStep::new("after", |cx: &mut StepContext<'_, Log>| {
            cx.game.0.push("after");
            Ok(true)
        }));

        assert_eq!(pipeline.drain(&mut log), DrainOutcome::Complete);
        assert_eq!(log.0, vec!["after"]);
        assert_eq!(pipeline.take_failures().len(), 1);
        assert!(pipeline.take_failures().is_empty());
    }

    #[test]
    fn test_error_drops_queued_children() {
        let mut log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline.queue(SimpleStep::new("half-built", |cx: &mut StepContext<'_, Log>| {
            cx.queue(SimpleStep::new("orphan", |cx: &mut StepContext<'_, Log>| {
                cx.game.0.push("orphan");
                Ok(true)
            }));
            Err(EngineError::step_failed("half-built", "boom"))
        }));

        assert_eq!(pipeline.drain(&mut log), DrainOutcome::Complete);
        assert!(log.0.is_empty());
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.take_failures().len(), 1);
    }

    #[test]
    fn test_queue_behind_waiting_step_runs_first() {
        let mut log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline.queue(waiter(false));
        assert_eq!(pipeline.drain(&mut log), DrainOutcome::Paused);

        pipeline.queue(SimpleStep::new("urgent", |cx: &mut StepContext<'_, Log>| {
            cx.game.0.push("urgent");
            Ok(true)
        }));
        assert_eq!(pipeline.current_name(), Some("urgent"));
        assert_eq!(pipeline.drain(&mut log), DrainOutcome::Paused);
        assert_eq!(log.0, vec!["wait", "urgent", "wait"]);
    }

    #[test]
    fn test_cancel_keeps_uncancellable_step() {
        let mut log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline.queue(waiter(false));
        pipeline.drain(&mut log);

        assert!(pipeline.cancel_current(&mut log));
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn test_cancel_removes_cancelled_step() {
        let mut log = Log::default();
        let mut pipeline = Pipeline::new();
        pipeline.queue(waiter(true));
        pipeline.drain(&mut log);

        assert!(pipeline.cancel_current(&mut log));
        assert!(pipeline.is_empty());
        assert!(!pipeline.cancel_current(&mut log));
    }

    #[test]
    fn test_empty_factory_is_skipped() {
        let mut log = Log::default();
        let mut pipeline: Pipeline<Log> = Pipeline::new();
        pipeline.queue(StepSlot::factory("nothing", |_| None));
        pipeline.push_back(SimpleStep::new("real", |cx: &mut StepContext<'_, Log>| {
            cx.game.0.push("real");
            Ok(true)
        }));

        assert_eq!(pipeline.drain(&mut log), DrainOutcome::Complete);
        assert_eq!(log.0, vec!["real"]);
    }

    #[test]
    fn test_input_to_empty_pipeline_is_ignored() {
        let mut log = Log::default();
        let mut pipeline: Pipeline<Log> = Pipeline::new();
        let input = Input::Pass {
            player: crate::core::PlayerId::FIRST,
        };
        assert!(!pipeline.handle_input(&mut log, &input));
    }
}
