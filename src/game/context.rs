//! The game context every step runs against.
//!
//! ## Game
//!
//! - [`GameState`] plus the [`EngineConfig`] and [`Resolver`] built from it
//! - The contest rules and the card scripting host
//! - Event hooks and the outbox of open decision requests
//! - Contest commands waiting for the running contest to pick them up
//!
//! All mutation from rule content goes through here so notifications are
//! emitted in one place.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::cards::{Attribute, CardInstance, ConflictType};
use crate::contest::{ContestContext, ContestRules, Duel, StandardRules};
use crate::core::{EngineConfig, EntityId, GameState, PhaseId, PlayerId};
use crate::effects::{Duration, Effect, EffectId, Resolution, Resolver, StatValue};
use crate::events::{EventHooks, GameEvent, NullScript, ScriptCommand, ScriptHost};
use crate::pipeline::PhaseHost;
use crate::prompt::{ActionChoice, DecisionId, DecisionKind, DecisionRequest, Input};

/// Shared context for every step.
pub struct Game {
    pub state: GameState,
    config: EngineConfig,
    resolver: Resolver,
    rules: Box<dyn ContestRules>,
    script: Box<dyn ScriptHost>,
    pub hooks: EventHooks,

    outbox: Vec<DecisionRequest>,
    next_decision: u32,

    contest_commands: VecDeque<ScriptCommand>,
    script_events: VecDeque<GameEvent>,
    in_script: bool,

    last_duel: Option<Duel>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("round", &self.state.round)
            .field("phase", &self.state.phase)
            .field("config", &self.config)
            .field("hooks", &self.hooks)
            .field("outbox", &self.outbox)
            .field("contest_commands", &self.contest_commands)
            .finish_non_exhaustive()
    }
}

impl Game {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: GameState::new(),
            resolver: Resolver::from_config(&config),
            config,
            rules: Box::new(StandardRules),
            script: Box::new(NullScript),
            hooks: EventHooks::new(),
            outbox: Vec::new(),
            next_decision: 0,
            contest_commands: VecDeque::new(),
            script_events: VecDeque::new(),
            in_script: false,
            last_duel: None,
        }
    }

    /// Start from an existing state (builder pattern).
    #[must_use]
    pub fn with_state(mut self, state: GameState) -> Self {
        self.state = state;
        self
    }

    /// Replace the contest rules (builder pattern).
    #[must_use]
    pub fn with_rules(mut self, rules: impl ContestRules + 'static) -> Self {
        self.rules = Box::new(rules);
        self
    }

    /// Attach card scripting (builder pattern).
    #[must_use]
    pub fn with_script(mut self, script: impl ScriptHost + 'static) -> Self {
        self.script = Box::new(script);
        self
    }

    /// Keep a log of every event (builder pattern).
    #[must_use]
    pub fn with_event_log(mut self) -> Self {
        self.hooks = std::mem::take(&mut self.hooks).with_log();
        self
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    #[must_use]
    pub fn rules(&self) -> &dyn ContestRules {
        self.rules.as_ref()
    }

    /// Read-only view for contest operations.
    #[must_use]
    pub fn contest(&self) -> ContestContext<'_> {
        ContestContext::new(&self.state, &self.resolver, self.rules.as_ref(), &self.config)
    }

    // === Events ===

    /// Notify hooks, then card scripting.
    ///
    /// Hooks see the event immediately. Scripting reactions are applied in
    /// event order; events raised while a reaction is applied queue behind
    /// it instead of recursing.
    pub fn emit(&mut self, event: GameEvent) {
        self.hooks.dispatch(&event);
        self.script_events.push_back(event);
        if self.in_script {
            return;
        }

        self.in_script = true;
        let mut handled = 0usize;
        while let Some(event) = self.script_events.pop_front() {
            handled += 1;
            if handled > self.config.max_drain_iterations {
                warn!(pending = self.script_events.len(), "script reactions cut off");
                self.script_events.clear();
                break;
            }
            let commands = self.script.on_event(&event, &self.state);
            for command in commands {
                self.apply_command(command);
            }
        }
        self.in_script = false;
    }

    // === Effects ===

    /// Attach `effect` to `target`. `None` if the target is unknown or the
    /// effect is malformed.
    pub fn add_effect(&mut self, target: EntityId, effect: Effect) -> Option<EffectId> {
        let attribute = effect.attribute;
        let Some(card) = self.state.card_mut(target) else {
            warn!(target = %target, "effect for unknown entity ignored");
            return None;
        };
        let id = card.stats.add_effect(effect).ok()?;
        self.emit(GameEvent::EffectApplied {
            target,
            effect: id,
            attribute,
        });
        Some(id)
    }

    /// Returns `false` for an unknown target or effect.
    pub fn remove_effect(&mut self, target: EntityId, effect: EffectId) -> bool {
        let removed = self
            .state
            .card_mut(target)
            .and_then(|card| card.stats.remove_effect(effect))
            .is_some();
        if removed {
            self.emit(GameEvent::EffectRemoved { target, effect });
        }
        removed
    }

    /// Remove every effect `origin` created, on every piece.
    pub fn remove_effects_from(&mut self, origin: EntityId) -> usize {
        let ids: Vec<EntityId> = self.state.cards().map(|c| c.entity_id).collect();
        let mut removed = Vec::new();
        for id in ids {
            if let Some(card) = self.state.card_mut(id) {
                removed.extend(card.stats.remove_effects_from(origin).into_iter().map(|e| (id, e.id)));
            }
        }
        let count = removed.len();
        for (target, effect) in removed {
            self.emit(GameEvent::EffectRemoved { target, effect });
        }
        count
    }

    /// Drop every effect lasting `duration`.
    pub fn expire_effects(&mut self, duration: Duration) -> usize {
        let ids: Vec<EntityId> = self.state.cards().map(|c| c.entity_id).collect();
        let mut expired = Vec::new();
        for id in ids {
            if let Some(card) = self.state.card_mut(id) {
                expired.extend(card.stats.expire(duration).into_iter().map(|e| (id, e.id)));
            }
        }
        if !expired.is_empty() {
            debug!(?duration, count = expired.len(), "effects expired");
        }
        let count = expired.len();
        for (target, effect) in expired {
            self.emit(GameEvent::EffectRemoved { target, effect });
        }
        count
    }

    #[must_use]
    pub fn resolve(&self, target: EntityId, attribute: Attribute) -> Option<Resolution> {
        let card = self.state.card(target)?;
        Some(self.resolver.resolve(&card.stats, attribute))
    }

    /// Resolved value; an unknown piece reads as disabled.
    #[must_use]
    pub fn value(&self, target: EntityId, attribute: Attribute) -> StatValue {
        self.state
            .card(target)
            .map_or(StatValue::Disabled, |card| self.resolver.value(&card.stats, attribute))
    }

    // === Honor and favor ===

    /// Move honor between seats. Nothing happens for a non-positive amount.
    pub fn transfer_honor(&mut self, from: PlayerId, to: PlayerId, amount: i64) {
        if amount <= 0 || from == to {
            return;
        }
        self.state.honor[from] -= amount;
        self.state.honor[to] += amount;
        self.emit(GameEvent::HonorTransferred { from, to, amount });
    }

    pub fn claim_favor(&mut self, player: PlayerId, kind: ConflictType) {
        self.state.favor.holder = Some(player);
        self.state.favor.kind = Some(kind);
        self.emit(GameEvent::FavorClaimed { player, kind });
    }

    // === Script commands ===

    /// Apply a command from card scripting. Contest commands are held for
    /// the running contest. Returns `false` if the command did nothing.
    pub fn apply_command(&mut self, command: ScriptCommand) -> bool {
        if command.is_contest_command() {
            self.contest_commands.push_back(command);
            return true;
        }

        match command {
            ScriptCommand::AddEffect { target, effect } => self.add_effect(target, effect).is_some(),
            ScriptCommand::RemoveEffect { target, effect } => self.remove_effect(target, effect),
            ScriptCommand::RemoveEffectsFrom { origin } => self.remove_effects_from(origin) > 0,
            ScriptCommand::SetHonor { target, honor } => self.with_card(target, |card| card.stats.set_honor(honor)),
            ScriptCommand::SetTainted { target, tainted } => {
                self.with_card(target, |card| card.stats.set_tainted(tainted))
            }
            ScriptCommand::SetFlag { target, flag, value } => self.with_card(target, |card| card.set_flag(flag, value)),
            ScriptCommand::Bow(target) => self.with_card(target, |card| card.bowed = true),
            ScriptCommand::Ready(target) => self.with_card(target, |card| card.bowed = false),
            ScriptCommand::AdjustHonor { player, amount } => {
                self.state.honor[player] += amount;
                true
            }
            ScriptCommand::LeavePlay(target) => {
                let left = self.state.remove_from_play(target);
                if left {
                    self.emit(GameEvent::ParticipantLeft { card: target });
                }
                left
            }
            ScriptCommand::AdjustSideSkill { .. }
            | ScriptCommand::Withdraw(_)
            | ScriptCommand::JoinConflict { .. }
            | ScriptCommand::LeaveDuel(_)
            | ScriptCommand::StartDuel { .. } => false,
        }
    }

    fn with_card(&mut self, target: EntityId, apply: impl FnOnce(&mut CardInstance)) -> bool {
        match self.state.card_mut(target) {
            Some(card) => {
                apply(card);
                true
            }
            None => {
                warn!(target = %target, "command for unknown entity ignored");
                false
            }
        }
    }

    /// Resolve an ability a player used in an action window.
    pub fn perform_action(&mut self, player: PlayerId, action: &ActionChoice) {
        self.emit(GameEvent::ActionTaken {
            player,
            ability: action.ability,
        });
        let commands = self.script.perform_action(player, action, &self.state);
        for command in commands {
            self.apply_command(command);
        }
    }

    /// Contest commands waiting to be applied, oldest first.
    pub fn take_contest_commands(&mut self) -> Vec<ScriptCommand> {
        self.contest_commands.drain(..).collect()
    }

    /// Put back commands a contest could not use, ahead of newer ones.
    pub fn return_contest_commands(&mut self, commands: Vec<ScriptCommand>) {
        for command in commands.into_iter().rev() {
            self.contest_commands.push_front(command);
        }
    }

    #[must_use]
    pub fn has_contest_commands(&self) -> bool {
        !self.contest_commands.is_empty()
    }

    // === Duels ===

    #[must_use]
    pub fn last_duel(&self) -> Option<&Duel> {
        self.last_duel.as_ref()
    }

    pub fn take_last_duel(&mut self) -> Option<Duel> {
        self.last_duel.take()
    }

    pub fn set_last_duel(&mut self, duel: Duel) {
        self.last_duel = Some(duel);
    }

    // === Decisions ===

    /// Open a decision request and announce it.
    pub fn request_decision(&mut self, player: PlayerId, kind: DecisionKind, prompt: impl Into<String>) -> DecisionId {
        let id = DecisionId(self.next_decision);
        self.next_decision += 1;
        self.outbox.push(DecisionRequest::new(id, player, kind, prompt));
        self.emit(GameEvent::DecisionRequested { id, player });
        id
    }

    /// Open requests, oldest first.
    #[must_use]
    pub fn pending_decisions(&self) -> &[DecisionRequest] {
        &self.outbox
    }

    #[must_use]
    pub fn decision(&self, id: DecisionId) -> Option<&DecisionRequest> {
        self.outbox.iter().find(|r| r.id == id)
    }

    /// Close request `id` with `input` if it is a legal answer.
    pub fn answer(&mut self, id: DecisionId, input: &Input) -> bool {
        let Some(index) = self.outbox.iter().position(|r| r.id == id) else {
            return false;
        };
        if !self.outbox[index].accepts(input) {
            debug!(decision = %id, player = ?input.player(), "input rejected");
            return false;
        }
        self.outbox.remove(index);
        true
    }

    /// Withdraw a request nobody answered.
    pub fn cancel_decision(&mut self, id: DecisionId) -> bool {
        let before = self.outbox.len();
        self.outbox.retain(|r| r.id != id);
        self.outbox.len() != before
    }

    // === Rounds ===

    /// Advance the round counter and announce it.
    pub fn start_round(&mut self) -> u32 {
        let round = if self.state.phase == PhaseId::SETUP {
            self.state.round
        } else {
            self.state.round + 1
        };
        self.state.start_round(round);
        self.emit(GameEvent::RoundStarted(round));
        round
    }
}

impl PhaseHost for Game {
    fn begin_phase(&mut self, phase: PhaseId) {
        debug!(%phase, "phase started");
        self.state.phase = phase;
        self.emit(GameEvent::PhaseStarted(phase));
    }

    fn end_phase(&mut self, phase: PhaseId) {
        self.expire_effects(Duration::UntilEndOfPhase);
        self.emit(GameEvent::PhaseEnded(phase));
    }
}
