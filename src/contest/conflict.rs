//! Conflicts: two sides comparing aggregate skill.
//!
//! ## Lifecycle
//!
//! ```text
//! Declared -> AttackersChosen -> DefendersChosen -> Resolving -> Determined -> Closed
//!     \-> Passed
//! ```
//!
//! Totals can be recomputed any time before the result is determined;
//! [`Conflict::determine_winner`] finalizes them exactly once.
//!
//! ```
//! use conflict_rules::cards::{CardInstance, ConflictType};
//! use conflict_rules::contest::{Conflict, ContestContext, StandardRules};
//! use conflict_rules::core::{EngineConfig, EntityId, GameState, PlayerId};
//! use conflict_rules::effects::Resolver;
//!
//! let mut state = GameState::new();
//! state.add_card(CardInstance::character(EntityId(0), "Akodo Toturi", PlayerId::FIRST, Some(6.0), Some(3.0), 3.0));
//! state.add_card(CardInstance::character(EntityId(1), "Bayushi Shoju", PlayerId::SECOND, Some(4.0), Some(4.0), 3.0));
//!
//! let mut conflict = Conflict::new(PlayerId::FIRST, ConflictType::Military);
//! conflict.add_attackers(&mut state, &[EntityId(0)]);
//! conflict.add_defenders(&mut state, &[EntityId(1)]);
//!
//! let (config, resolver) = (EngineConfig::default(), Resolver::default());
//! let cx = ContestContext::new(&state, &resolver, &StandardRules, &config);
//! let outcome = conflict.determine_winner(&cx);
//! assert_eq!(outcome.winner, Some(PlayerId::FIRST));
//! assert_eq!(outcome.skill_difference, 2.0);
//! ```

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::cards::ConflictType;
use crate::core::{ConflictRecord, EntityId, GameState, PlayerId, TieBreak};

use super::rules::ContestContext;

/// One side of a conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    #[must_use]
    pub const fn opposite(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }
}

/// Where a conflict is in its lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictState {
    #[default]
    Declared,
    AttackersChosen,
    DefendersChosen,
    Resolving,
    Determined,
    Closed,
    /// The attacker declined before choosing attackers.
    Passed,
}

impl ConflictState {
    /// Are the totals frozen?
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(self, ConflictState::Determined | ConflictState::Closed | ConflictState::Passed)
    }
}

/// The finalized result.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictOutcome {
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    pub attacker_total: f64,
    pub defender_total: f64,
    pub skill_difference: f64,
}

impl ConflictOutcome {
    /// No winner and no loser.
    #[must_use]
    pub fn no_contest(attacker_total: f64, defender_total: f64) -> Self {
        Self {
            winner: None,
            loser: None,
            attacker_total,
            defender_total,
            skill_difference: 0.0,
        }
    }
}

type Participants = SmallVec<[EntityId; 4]>;

/// A single conflict between the two seats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub attacker: PlayerId,
    pub defender: PlayerId,
    pub conflict_type: ConflictType,
    attackers: Participants,
    defenders: Participants,
    /// Flat skill adjustments per side, from card abilities.
    attacker_modifier: f64,
    defender_modifier: f64,
    attacker_total: f64,
    defender_total: f64,
    outcome: Option<ConflictOutcome>,
    state: ConflictState,
}

impl Conflict {
    /// A newly declared conflict; the defender is the attacker's opponent.
    #[must_use]
    pub fn new(attacker: PlayerId, conflict_type: ConflictType) -> Self {
        Self {
            attacker,
            defender: attacker.opponent(),
            conflict_type,
            attackers: SmallVec::new(),
            defenders: SmallVec::new(),
            attacker_modifier: 0.0,
            defender_modifier: 0.0,
            attacker_total: 0.0,
            defender_total: 0.0,
            outcome: None,
            state: ConflictState::Declared,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn state(&self) -> ConflictState {
        self.state
    }

    #[must_use]
    pub fn attackers(&self) -> &[EntityId] {
        &self.attackers
    }

    #[must_use]
    pub fn defenders(&self) -> &[EntityId] {
        &self.defenders
    }

    #[must_use]
    pub fn participants(&self, side: Side) -> &[EntityId] {
        match side {
            Side::Attacker => &self.attackers,
            Side::Defender => &self.defenders,
        }
    }

    /// The seat fighting on `side`.
    #[must_use]
    pub fn player(&self, side: Side) -> PlayerId {
        match side {
            Side::Attacker => self.attacker,
            Side::Defender => self.defender,
        }
    }

    /// Which side `card` is on, if any.
    #[must_use]
    pub fn side_of(&self, card: EntityId) -> Option<Side> {
        if self.attackers.contains(&card) {
            Some(Side::Attacker)
        } else if self.defenders.contains(&card) {
            Some(Side::Defender)
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_participating(&self, card: EntityId) -> bool {
        self.side_of(card).is_some()
    }

    /// Last computed totals, `(attacker, defender)`.
    #[must_use]
    pub fn totals(&self) -> (f64, f64) {
        (self.attacker_total, self.defender_total)
    }

    #[must_use]
    pub fn side_modifier(&self, side: Side) -> f64 {
        match side {
            Side::Attacker => self.attacker_modifier,
            Side::Defender => self.defender_modifier,
        }
    }

    /// The result, once determined.
    #[must_use]
    pub fn outcome(&self) -> Option<ConflictOutcome> {
        self.outcome
    }

    // === Participants ===

    /// Add attackers. Returns the cards actually added.
    pub fn add_attackers(&mut self, state: &mut GameState, cards: &[EntityId]) -> Vec<EntityId> {
        let added = self.add_participants(state, Side::Attacker, cards);
        if self.state == ConflictState::Declared && !self.attackers.is_empty() {
            self.state = ConflictState::AttackersChosen;
        }
        added
    }

    /// Add defenders. Returns the cards actually added.
    ///
    /// The first call closes defender selection even when `cards` is
    /// empty; defending with nobody is legal.
    pub fn add_defenders(&mut self, state: &mut GameState, cards: &[EntityId]) -> Vec<EntityId> {
        let added = self.add_participants(state, Side::Defender, cards);
        if self.state == ConflictState::AttackersChosen {
            self.state = ConflictState::DefendersChosen;
        }
        added
    }

    /// Add participants to `side` without moving the lifecycle along.
    /// Cards already in the conflict, unknown, or out of play are skipped.
    pub fn add_participants(&mut self, state: &mut GameState, side: Side, cards: &[EntityId]) -> Vec<EntityId> {
        if self.state.is_final() {
            warn!(state = ?self.state, "participants added to a finished conflict");
            return Vec::new();
        }

        let mut added = Vec::new();
        for &id in cards {
            if self.is_participating(id) || added.contains(&id) {
                continue;
            }
            match state.card_mut(id) {
                Some(card) if card.is_in_play() => {
                    card.in_conflict = true;
                    added.push(id);
                }
                _ => warn!(card = %id, "cannot join conflict"),
            }
        }

        match side {
            Side::Attacker => self.attackers.extend(added.iter().copied()),
            Side::Defender => self.defenders.extend(added.iter().copied()),
        }
        added
    }

    /// Take `card` out of the conflict. Returns `false` if it was not in it.
    pub fn remove_participant(&mut self, state: &mut GameState, card: EntityId) -> bool {
        let removed = match self.side_of(card) {
            Some(Side::Attacker) => {
                self.attackers.retain(|id| *id != card);
                true
            }
            Some(Side::Defender) => {
                self.defenders.retain(|id| *id != card);
                true
            }
            None => false,
        };
        if removed {
            if let Some(instance) = state.card_mut(card) {
                instance.in_conflict = false;
            }
            debug!(card = %card, "participant withdrawn");
        }
        removed
    }

    /// Add a flat amount to one side's total. Ignored once final.
    pub fn adjust_side(&mut self, side: Side, amount: f64) -> bool {
        if self.state.is_final() || !amount.is_finite() {
            return false;
        }
        match side {
            Side::Attacker => self.attacker_modifier += amount,
            Side::Defender => self.defender_modifier += amount,
        }
        true
    }

    // === Lifecycle ===

    /// The attacker declines. Only possible before attackers are chosen.
    pub fn pass(&mut self) -> bool {
        if self.state != ConflictState::Declared {
            return false;
        }
        self.state = ConflictState::Passed;
        true
    }

    /// Move from defender selection to resolution.
    pub fn begin_resolving(&mut self) -> bool {
        if self.state != ConflictState::DefendersChosen {
            return false;
        }
        self.state = ConflictState::Resolving;
        true
    }

    /// Total for `side` computed from the current state.
    ///
    /// Counts each participant that is in play, ready, not disabled in the
    /// contested skill, and not vetoed by the rules; then adds the side
    /// modifier and the favor bonus. Never negative.
    #[must_use]
    pub fn skill_of(&self, cx: &ContestContext<'_>, side: Side) -> f64 {
        let attribute = self.conflict_type.attribute();
        let participants = self.participants(side);

        let skill: f64 = participants
            .iter()
            .filter_map(|id| cx.state.card(*id))
            .filter(|card| card.is_in_play() && !card.bowed && !cx.rules.cannot_contribute(card, self))
            .filter_map(|card| cx.resolver.value(&card.stats, attribute).amount())
            .sum();

        let favor = if !participants.is_empty() && cx.state.favor.favors(self.player(side), self.conflict_type) {
            cx.config.favor_bonus
        } else {
            0.0
        };

        (skill + self.side_modifier(side) + favor).max(0.0)
    }

    /// Recompute both totals. Returns the stored totals once final.
    pub fn calculate_skill(&mut self, cx: &ContestContext<'_>) -> (f64, f64) {
        if !self.state.is_final() {
            self.attacker_total = self.skill_of(cx, Side::Attacker);
            self.defender_total = self.skill_of(cx, Side::Defender);
        }
        self.totals()
    }

    /// Finalize the result. Later calls return the same outcome.
    pub fn determine_winner(&mut self, cx: &ContestContext<'_>) -> ConflictOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }

        let (attack, defence) = self.calculate_skill(cx);
        let outcome = if attack == 0.0 && defence == 0.0 {
            ConflictOutcome::no_contest(attack, defence)
        } else {
            let attacker_wins = match cx.config.tie_break {
                TieBreak::Attacker => defence <= attack,
                TieBreak::Defender => attack > defence,
            };
            let (winner, loser) = if attacker_wins {
                (self.attacker, self.defender)
            } else {
                (self.defender, self.attacker)
            };
            ConflictOutcome {
                winner: Some(winner),
                loser: Some(loser),
                attacker_total: attack,
                defender_total: defence,
                skill_difference: (attack - defence).abs(),
            }
        };

        debug!(
            winner = ?outcome.winner,
            attack,
            defence,
            "conflict determined"
        );
        self.outcome = Some(outcome);
        self.state = ConflictState::Determined;
        outcome
    }

    /// Send everyone home. Only a determined conflict can close.
    pub fn close(&mut self, state: &mut GameState) -> bool {
        if self.state != ConflictState::Determined {
            return false;
        }
        for id in self.attackers.iter().chain(self.defenders.iter()) {
            if let Some(card) = state.card_mut(*id) {
                card.in_conflict = false;
            }
        }
        self.state = ConflictState::Closed;
        true
    }

    /// History entry for this conflict.
    #[must_use]
    pub fn record(&self, round: u32) -> ConflictRecord {
        let passed = self.state == ConflictState::Passed;
        ConflictRecord {
            round,
            attacker: self.attacker,
            conflict_type: (!passed).then_some(self.conflict_type),
            winner: self.outcome.and_then(|o| o.winner),
            skill_difference: self.outcome.map_or(0.0, |o| o.skill_difference),
            passed,
        }
    }
}
