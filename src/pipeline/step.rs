//! The step contract.
//!
//! A step is the smallest resumable unit of procedure. The scheduler calls
//! [`Step::continue_step`] until it returns `Ok(true)`; `Ok(false)` means
//! "not finished" and normally pauses draining until input arrives.
//!
//! Steps never reach into the scheduler. Anything a step wants to run next
//! goes through [`StepContext::queue`], and the scheduler routes it once
//! the step yields.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::EngineError;
use crate::prompt::Input;

/// Lifecycle of a step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    /// Never continued.
    #[default]
    Pending,
    /// Started, waiting or mid-way.
    Active,
    Complete,
    Cancelled,
}

impl StepStatus {
    /// Complete or cancelled.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, StepStatus::Complete | StepStatus::Cancelled)
    }
}

/// A resumable unit of procedure over game context `G`.
pub trait Step<G> {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    fn status(&self) -> StepStatus;

    /// Advance. `Ok(true)` when finished, `Ok(false)` when waiting.
    fn continue_step(&mut self, cx: &mut StepContext<'_, G>) -> Result<bool, EngineError>;

    fn is_complete(&self) -> bool {
        self.status().is_finished()
    }

    /// Unwind cooperatively. The step is removed only if this leaves it
    /// complete.
    fn cancel(&mut self, _cx: &mut StepContext<'_, G>) {}

    /// Offer a step to run inside this one. Returns it back if refused.
    fn queue_child(&mut self, step: StepSlot<G>) -> Result<(), StepSlot<G>> {
        Err(step)
    }

    /// Deliver external input. Returns `true` if it was accepted.
    fn on_input(&mut self, _cx: &mut StepContext<'_, G>, _input: &Input) -> bool {
        false
    }
}

/// Builds a step once the slot is first inspected. `None` means nothing
/// needs to run.
pub type StepFactory<G> = Box<dyn FnOnce(&mut G) -> Option<Box<dyn Step<G>>>>;

enum SlotInner<G> {
    Ready(Box<dyn Step<G>>),
    Factory(StepFactory<G>),
    Empty,
}

/// A pipeline entry: a step, or a factory that produces one in place.
pub struct StepSlot<G> {
    name: String,
    inner: SlotInner<G>,
}

impl<G> StepSlot<G> {
    /// Slot holding a ready step.
    pub fn new(step: impl Step<G> + 'static) -> Self {
        Self::boxed(Box::new(step))
    }

    pub fn boxed(step: Box<dyn Step<G>>) -> Self {
        Self {
            name: step.name().to_string(),
            inner: SlotInner::Ready(step),
        }
    }

    /// Slot whose step is built from game state the first time it is
    /// inspected.
    ///
    /// ```
    /// use conflict_rules::pipeline::{SimpleStep, StepSlot};
    ///
    /// struct Counter(u32);
    ///
    /// let slot: StepSlot<Counter> = StepSlot::factory("maybe-count", |game: &mut Counter| {
    ///     (game.0 > 0).then(|| SimpleStep::<Counter>::boxed("count", |cx| {
    ///         cx.game.0 += 1;
    ///         Ok(true)
    ///     }))
    /// });
    /// assert!(!slot.is_materialized());
    /// ```
    pub fn factory(
        name: impl Into<String>,
        factory: impl FnOnce(&mut G) -> Option<Box<dyn Step<G>>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            inner: SlotInner::Factory(Box::new(factory)),
        }
    }

    /// Name of the step, or of the factory until it runs.
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.inner {
            SlotInner::Ready(step) => step.name(),
            _ => &self.name,
        }
    }

    #[must_use]
    pub fn is_materialized(&self) -> bool {
        matches!(self.inner, SlotInner::Ready(_))
    }

    /// The step, if already built.
    pub fn step_mut(&mut self) -> Option<&mut (dyn Step<G> + 'static)> {
        match &mut self.inner {
            SlotInner::Ready(step) => Some(step.as_mut()),
            _ => None,
        }
    }

    /// Replace a factory by its product. Returns `None` if the slot holds
    /// nothing to run.
    pub fn materialize(&mut self, game: &mut G) -> Option<&mut (dyn Step<G> + 'static)> {
        if let SlotInner::Factory(_) = self.inner {
            if let SlotInner::Factory(factory) = std::mem::replace(&mut self.inner, SlotInner::Empty) {
                match factory(game) {
                    Some(step) => self.inner = SlotInner::Ready(step),
                    None => warn!(slot = %self.name, "step factory produced nothing"),
                }
            }
        }
        self.step_mut()
    }
}

impl<G> From<Box<dyn Step<G>>> for StepSlot<G> {
    fn from(step: Box<dyn Step<G>>) -> Self {
        Self::boxed(step)
    }
}

impl<G> std::fmt::Debug for StepSlot<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepSlot")
            .field("name", &self.name())
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

/// What a running step sees: the game, plus a place to queue more steps.
pub struct StepContext<'a, G> {
    pub game: &'a mut G,
    queued: Vec<StepSlot<G>>,
}

impl<'a, G> StepContext<'a, G> {
    pub fn new(game: &'a mut G) -> Self {
        Self {
            game,
            queued: Vec::new(),
        }
    }

    /// Queue a step to run after this one yields.
    pub fn queue(&mut self, step: impl Into<StepSlot<G>>) {
        self.queued.push(step.into());
    }

    /// Queue a factory.
    pub fn queue_factory(
        &mut self,
        name: impl Into<String>,
        factory: impl FnOnce(&mut G) -> Option<Box<dyn Step<G>>> + 'static,
    ) {
        self.queued.push(StepSlot::factory(name, factory));
    }

    /// Number of steps queued so far.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Hand the queued steps over, in queue order.
    pub fn into_queued(self) -> Vec<StepSlot<G>> {
        self.queued
    }
}
