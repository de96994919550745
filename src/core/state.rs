//! Game state shared by every step.
//!
//! ## GameState
//!
//! - Pieces on the table, keyed by `EntityId` (each with its own ledger)
//! - Round progression: phase, round number, first player
//! - Per-seat honor totals and the conflicts declared this round
//! - The imperial favor
//! - History of finished conflicts and duels
//!
//! Uses `im` persistent collections so snapshots are O(1) to clone.
//! Contest objects themselves are owned by the steps driving them; state
//! only keeps their finished records.

use im::{OrdMap, Vector};
use serde::{Deserialize, Serialize};

use super::config::PhaseId;
use super::entity::{EntityAllocator, EntityId};
use super::error::EngineError;
use super::player::{PlayerId, PlayerMap};
use crate::cards::{CardInstance, ConflictType, Location};

/// The claimed advantage token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImperialFavor {
    /// Seat holding the favor, if anyone has claimed it.
    pub holder: Option<PlayerId>,
    /// Which conflicts the favor helps in.
    pub kind: Option<ConflictType>,
}

impl ImperialFavor {
    /// Does `player` hold the favor for `conflict_type`?
    #[must_use]
    pub fn favors(&self, player: PlayerId, conflict_type: ConflictType) -> bool {
        self.holder == Some(player) && self.kind == Some(conflict_type)
    }
}

/// Summary of a finished conflict.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub round: u32,
    pub attacker: PlayerId,
    /// `None` when the attacker passed before choosing a type.
    pub conflict_type: Option<ConflictType>,
    /// `None` on a pass or a 0-0 conflict.
    pub winner: Option<PlayerId>,
    pub skill_difference: f64,
    pub passed: bool,
}

/// Summary of a finished duel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DuelRecord {
    pub round: u32,
    pub challenger: EntityId,
    pub targets: Vec<EntityId>,
    pub winners: Vec<EntityId>,
    pub losers: Vec<EntityId>,
}

/// Complete rules state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    cards: OrdMap<EntityId, CardInstance>,
    allocator: EntityAllocator,

    /// Current phase.
    pub phase: PhaseId,

    /// Round number (starts at 1).
    pub round: u32,

    /// Seat that acts first this round.
    pub first_player: PlayerId,

    /// Honor total per seat.
    pub honor: PlayerMap<i64>,

    pub favor: ImperialFavor,

    /// Conflict types each seat declared this round.
    pub declared: PlayerMap<Vec<ConflictType>>,

    /// Honor dial bids this round.
    pub honor_bids: PlayerMap<Option<u32>>,

    pub conflicts: Vector<ConflictRecord>,
    pub duels: Vector<DuelRecord>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// Empty table, round 1, first seat to act.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cards: OrdMap::new(),
            allocator: EntityAllocator::new(),
            phase: PhaseId::SETUP,
            round: 1,
            first_player: PlayerId::FIRST,
            honor: PlayerMap::with_value(10),
            favor: ImperialFavor::default(),
            declared: PlayerMap::with_default(),
            honor_bids: PlayerMap::with_default(),
            conflicts: Vector::new(),
            duels: Vector::new(),
        }
    }

    /// Set starting honor for both seats (builder pattern).
    #[must_use]
    pub fn with_honor(mut self, honor: i64) -> Self {
        self.honor = PlayerMap::with_value(honor);
        self
    }

    // === Pieces ===

    /// Allocate an ID for a piece about to be created.
    pub fn alloc_id(&mut self) -> EntityId {
        self.allocator.alloc()
    }

    /// Put a piece on the table. Replaces any piece with the same ID.
    pub fn add_card(&mut self, card: CardInstance) -> EntityId {
        let id = card.entity_id;
        self.allocator.reserve(id);
        self.cards.insert(id, card);
        id
    }

    #[must_use]
    pub fn card(&self, id: EntityId) -> Option<&CardInstance> {
        self.cards.get(&id)
    }

    pub fn card_mut(&mut self, id: EntityId) -> Option<&mut CardInstance> {
        self.cards.get_mut(&id)
    }

    /// Look up a piece, failing with [`EngineError::UnknownEntity`].
    pub fn try_card(&self, id: EntityId) -> Result<&CardInstance, EngineError> {
        self.cards.get(&id).ok_or(EngineError::UnknownEntity(id))
    }

    pub fn try_card_mut(&mut self, id: EntityId) -> Result<&mut CardInstance, EngineError> {
        self.cards.get_mut(&id).ok_or(EngineError::UnknownEntity(id))
    }

    /// All pieces, in ID order.
    pub fn cards(&self) -> impl Iterator<Item = &CardInstance> {
        self.cards.values()
    }

    /// IDs of `player`'s characters in play, in ID order.
    #[must_use]
    pub fn characters_in_play(&self, player: PlayerId) -> Vec<EntityId> {
        self.cards
            .values()
            .filter(|c| c.is_character() && c.is_in_play() && c.controller == player)
            .map(|c| c.entity_id)
            .collect()
    }

    /// Ready characters of `player` not already in a conflict.
    #[must_use]
    pub fn available_characters(&self, player: PlayerId) -> Vec<EntityId> {
        self.characters_in_play(player)
            .into_iter()
            .filter(|id| self.card(*id).is_some_and(|c| !c.bowed && !c.in_conflict))
            .collect()
    }

    /// Move a piece out of play. Returns `false` if it was not in play.
    pub fn remove_from_play(&mut self, id: EntityId) -> bool {
        match self.cards.get_mut(&id) {
            Some(card) if card.is_in_play() => {
                card.location = Location::OutOfPlay;
                card.in_conflict = false;
                true
            }
            _ => false,
        }
    }

    /// Ready every piece on the table.
    pub fn ready_all(&mut self) {
        let ids: Vec<EntityId> = self.cards.keys().copied().collect();
        for id in ids {
            if let Some(card) = self.cards.get_mut(&id) {
                card.bowed = false;
            }
        }
    }

    // === Round bookkeeping ===

    /// Has `player` declared a conflict of `conflict_type` this round?
    #[must_use]
    pub fn has_declared(&self, player: PlayerId, conflict_type: ConflictType) -> bool {
        self.declared[player].contains(&conflict_type)
    }

    /// Conflict types `player` may still declare this round.
    #[must_use]
    pub fn declarable_types(&self, player: PlayerId) -> Vec<ConflictType> {
        ConflictType::ALL
            .into_iter()
            .filter(|t| !self.has_declared(player, *t))
            .collect()
    }

    /// Advance to the next round.
    pub fn start_round(&mut self, round: u32) {
        self.round = round;
        self.declared = PlayerMap::with_default();
        self.honor_bids = PlayerMap::with_default();
    }

    /// Conflicts finished this round.
    pub fn conflicts_this_round(&self) -> impl Iterator<Item = &ConflictRecord> {
        let round = self.round;
        self.conflicts.iter().filter(move |r| r.round == round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> GameState {
        let mut state = GameState::new();
        let a = state.alloc_id();
        state.add_card(CardInstance::character(a, "Akodo Toturi", PlayerId::FIRST, Some(3.0), Some(2.0), 2.0));
        let b = state.alloc_id();
        state.add_card(CardInstance::character(b, "Bayushi Kachiko", PlayerId::SECOND, Some(1.0), Some(5.0), 3.0));
        let c = state.alloc_id();
        state.add_card(CardInstance::province(c, "Shameful Display", PlayerId::SECOND, 4.0));
        state
    }

    #[test]
    fn test_characters_in_play() {
        let state = table();
        assert_eq!(state.characters_in_play(PlayerId::FIRST), vec![EntityId(0)]);
        assert_eq!(state.characters_in_play(PlayerId::SECOND), vec![EntityId(1)]);
    }

    #[test]
    fn test_add_card_reserves_id() {
        let mut state = GameState::new();
        state.add_card(CardInstance::province(EntityId(5), "Pilgrimage", PlayerId::FIRST, 3.0));
        assert_eq!(state.alloc_id(), EntityId(6));
    }

    #[test]
    fn test_remove_from_play() {
        let mut state = table();
        state.card_mut(EntityId(0)).unwrap().in_conflict = true;

        assert!(state.remove_from_play(EntityId(0)));
        assert!(!state.remove_from_play(EntityId(0)));
        assert!(!state.card(EntityId(0)).unwrap().in_conflict);
        assert!(state.characters_in_play(PlayerId::FIRST).is_empty());
    }

    #[test]
    fn test_available_characters_skip_bowed() {
        let mut state = table();
        state.card_mut(EntityId(1)).unwrap().bowed = true;
        assert!(state.available_characters(PlayerId::SECOND).is_empty());

        state.ready_all();
        assert_eq!(state.available_characters(PlayerId::SECOND), vec![EntityId(1)]);
    }

    #[test]
    fn test_unknown_entity() {
        let state = table();
        assert_eq!(
            state.try_card(EntityId(99)).unwrap_err(),
            EngineError::UnknownEntity(EntityId(99))
        );
    }

    #[test]
    fn test_declarable_types_reset_each_round() {
        let mut state = table();
        state.declared[PlayerId::FIRST].push(ConflictType::Military);
        assert_eq!(state.declarable_types(PlayerId::FIRST), vec![ConflictType::Political]);

        state.start_round(2);
        assert_eq!(state.declarable_types(PlayerId::FIRST).len(), 2);
        assert_eq!(state.round, 2);
    }

    #[test]
    fn test_favor() {
        let mut state = table();
        assert!(!state.favor.favors(PlayerId::FIRST, ConflictType::Military));

        state.favor = ImperialFavor {
            holder: Some(PlayerId::FIRST),
            kind: Some(ConflictType::Military),
        };
        assert!(state.favor.favors(PlayerId::FIRST, ConflictType::Military));
        assert!(!state.favor.favors(PlayerId::FIRST, ConflictType::Political));
        assert!(!state.favor.favors(PlayerId::SECOND, ConflictType::Military));
    }

    #[test]
    fn test_clone_is_independent() {
        let state = table();
        let mut snapshot = state.clone();
        snapshot.card_mut(EntityId(0)).unwrap().bowed = true;
        assert!(!state.card(EntityId(0)).unwrap().bowed);
    }
}
