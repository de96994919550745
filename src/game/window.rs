//! Action windows: players alternate taking actions or passing.
//!
//! A window closes once the configured number of consecutive passes is
//! reached (two by default, so both players passing in a row). Any action
//! resets the count.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::contest::DuelFlow;
use crate::core::{EngineError, PlayerId};
use crate::events::ScriptCommand;
use crate::pipeline::{Step, StepContext, StepSlot, StepStatus};
use crate::prompt::{DecisionId, DecisionKind, Input};

use super::context::Game;

/// Priority bookkeeping for an action window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassTracker {
    current: PlayerId,
    passes: usize,
    needed: usize,
}

impl PassTracker {
    #[must_use]
    pub fn new(first: PlayerId, needed: usize) -> Self {
        Self {
            current: first,
            passes: 0,
            needed: needed.max(1),
        }
    }

    /// Seat with priority.
    #[must_use]
    pub fn current(&self) -> PlayerId {
        self.current
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.passes >= self.needed
    }

    /// Current player passes. Returns `true` if that closed the window.
    pub fn record_pass(&mut self) -> bool {
        self.passes += 1;
        self.current = self.current.opponent();
        self.is_closed()
    }

    /// Current player acted; priority moves on and passes reset.
    pub fn record_action(&mut self) {
        self.passes = 0;
        self.current = self.current.opponent();
    }
}

/// What one poll of a window did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowPoll {
    /// Both players are done.
    Closed,
    /// Waiting for the player with priority.
    Waiting,
    /// An action was resolved; contest commands may be waiting.
    Acted,
}

/// An action window. Usable on its own as a step, or driven by a contest
/// flow through [`ActionWindow::poll`] and [`ActionWindow::offer`].
#[derive(Clone, Debug)]
pub struct ActionWindow {
    name: String,
    tracker: PassTracker,
    pending: Option<DecisionId>,
    answer: Option<Input>,
    status: StepStatus,
}

impl ActionWindow {
    pub fn new(name: impl Into<String>, first: PlayerId, passes_to_close: usize) -> Self {
        Self {
            name: name.into(),
            tracker: PassTracker::new(first, passes_to_close),
            pending: None,
            answer: None,
            status: StepStatus::Pending,
        }
    }

    /// A window using the game's configured pass threshold.
    pub fn for_game(name: impl Into<String>, game: &Game) -> Self {
        Self::new(name, game.state.first_player, game.config().passes_to_close_window)
    }

    #[must_use]
    pub fn tracker(&self) -> &PassTracker {
        &self.tracker
    }

    /// Advance the window as far as it can go without input.
    pub fn poll(&mut self, game: &mut Game) -> WindowPoll {
        if let Some(input) = self.answer.take() {
            self.pending = None;
            match input {
                Input::Action { player, action } => {
                    debug!(window = %self.name, ?player, ability = action.ability, "action");
                    self.tracker.record_action();
                    game.perform_action(player, &action);
                    return WindowPoll::Acted;
                }
                _ => {
                    debug!(window = %self.name, player = ?input.player(), "pass");
                    self.tracker.record_pass();
                }
            }
        }

        if self.tracker.is_closed() {
            return WindowPoll::Closed;
        }
        if self.pending.is_none() {
            let player = self.tracker.current();
            self.pending = Some(game.request_decision(player, DecisionKind::ActionOrPass, "Take an action or pass"));
        }
        WindowPoll::Waiting
    }

    /// Accept `input` if it answers the open request.
    pub fn offer(&mut self, game: &mut Game, input: &Input) -> bool {
        match self.pending {
            Some(id) if self.answer.is_none() && game.answer(id, input) => {
                self.answer = Some(input.clone());
                true
            }
            _ => false,
        }
    }

    /// Withdraw the open request, if any.
    pub fn abandon(&mut self, game: &mut Game) {
        if let Some(id) = self.pending.take() {
            game.cancel_decision(id);
        }
        self.answer = None;
    }
}

/// Handle contest commands raised where no contest is running. Duels can
/// start anywhere; everything else needs a conflict and is dropped.
pub(crate) fn apply_loose_contest_commands(cx: &mut StepContext<'_, Game>) {
    for command in cx.game.take_contest_commands() {
        match command {
            ScriptCommand::StartDuel {
                challenger,
                targets,
                attribute,
                chain,
            } => cx.queue(DuelFlow::new(challenger, targets, attribute, chain)),
            other => warn!(?other, "contest command outside a conflict dropped"),
        }
    }
}

impl Step<Game> for ActionWindow {
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
        self.status = StepStatus::Active;

        loop {
            match self.poll(cx.game) {
                WindowPoll::Closed => {
                    self.status = StepStatus::Complete;
                    return Ok(true);
                }
                WindowPoll::Waiting => return Ok(false),
                WindowPoll::Acted => {
                    apply_loose_contest_commands(cx);
                    if cx.queued_len() > 0 {
                        return Ok(false);
                    }
                }
            }
        }
    }

    fn cancel(&mut self, cx: &mut StepContext<'_, Game>) {
        self.abandon(cx.game);
        self.status = StepStatus::Cancelled;
    }

    fn on_input(&mut self, cx: &mut StepContext<'_, Game>, input: &Input) -> bool {
        self.offer(cx.game, input)
    }
}

impl From<ActionWindow> for StepSlot<Game> {
    fn from(step: ActionWindow) -> Self {
        StepSlot::new(step)
    }
}
