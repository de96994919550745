//! Duels: a challenger against one or more targets.
//!
//! Unlike conflicts, duels tell an absent duelist apart from one who
//! contributes nothing:
//!
//! - both sides absent: no winner, no loser
//! - one side absent, the other above 0: the present side wins and nobody
//!   loses (a duelist who already left cannot lose again)
//! - equal totals: no winner, no loser
//!
//! A duelist is absent once removed from the duel or out of play, or when
//! the dueled attribute is disabled for it.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::cards::{Attribute, CardInstance};
use crate::core::{DuelRecord, EntityId, PlayerId};

use super::rules::ContestContext;

type Duelists = SmallVec<[EntityId; 4]>;

/// A filtered set of duelists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelParticipants {
    Single(EntityId),
    Many(Duelists),
}

impl DuelParticipants {
    /// `Single` when exactly one card remains, `Many` for more, `None`
    /// when nothing is left.
    pub fn collapse(cards: impl IntoIterator<Item = EntityId>) -> Option<Self> {
        let mut cards: Duelists = cards.into_iter().collect();
        match cards.len() {
            0 => None,
            1 => cards.pop().map(DuelParticipants::Single),
            _ => Some(DuelParticipants::Many(cards)),
        }
    }

    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        match self {
            DuelParticipants::Single(id) => std::slice::from_ref(id),
            DuelParticipants::Many(ids) => ids,
        }
    }

    #[must_use]
    pub fn contains(&self, card: EntityId) -> bool {
        self.ids().contains(&card)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids().is_empty()
    }
}

/// The two sides of a duel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DuelSide {
    Challenger,
    Target,
}

/// Duel result. A `None` total marks an absent side.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DuelOutcome {
    pub winners: Option<DuelParticipants>,
    pub losers: Option<DuelParticipants>,
    pub challenger_total: Option<f64>,
    pub target_total: Option<f64>,
}

impl DuelOutcome {
    #[must_use]
    pub fn winner_ids(&self) -> Vec<EntityId> {
        self.winners.as_ref().map(|w| w.ids().to_vec()).unwrap_or_default()
    }

    #[must_use]
    pub fn loser_ids(&self) -> Vec<EntityId> {
        self.losers.as_ref().map(|l| l.ids().to_vec()).unwrap_or_default()
    }
}

/// One duel, optionally chained to the duel before it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Duel {
    challenger: EntityId,
    targets: Duelists,
    attribute: Attribute,
    /// Duelists taken out of the duel after it started.
    removed: Duelists,
    challenger_bid: Option<u32>,
    target_bid: Option<u32>,
    previous: Option<Box<Duel>>,
    outcome: Option<DuelOutcome>,
}

impl Duel {
    #[must_use]
    pub fn new(challenger: EntityId, targets: &[EntityId], attribute: Attribute) -> Self {
        let mut unique = Duelists::new();
        for &id in targets {
            if id != challenger && !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self {
            challenger,
            targets: unique,
            attribute,
            removed: Duelists::new(),
            challenger_bid: None,
            target_bid: None,
            previous: None,
            outcome: None,
        }
    }

    /// Link the duel this one follows (builder pattern).
    #[must_use]
    pub fn with_previous(mut self, previous: Duel) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }

    #[must_use]
    pub fn challenger(&self) -> EntityId {
        self.challenger
    }

    #[must_use]
    pub fn targets(&self) -> &[EntityId] {
        &self.targets
    }

    #[must_use]
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    #[must_use]
    pub fn previous(&self) -> Option<&Duel> {
        self.previous.as_deref()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&DuelOutcome> {
        self.outcome.as_ref()
    }

    /// Is `card` still dueling in this duel or any duel it follows?
    /// Removed duelists are not.
    #[must_use]
    pub fn is_involved(&self, card: EntityId) -> bool {
        let present = (self.challenger == card && !self.removed.contains(&card)) || self.targets.contains(&card);
        present || self.previous.as_ref().is_some_and(|p| p.is_involved(card))
    }

    /// Seat controlling `side`, looked up in `cx`.
    #[must_use]
    pub fn controller(&self, cx: &ContestContext<'_>, side: DuelSide) -> Option<PlayerId> {
        let id = match side {
            DuelSide::Challenger => Some(self.challenger),
            DuelSide::Target => self.targets.first().copied(),
        };
        id.and_then(|id| cx.state.card(id)).map(|c| c.controller)
    }

    // === Participants ===

    /// Take a duelist out. Returns `false` if it was not dueling or the
    /// duel is already resolved.
    pub fn remove_participant(&mut self, card: EntityId) -> bool {
        if self.outcome.is_some() || self.removed.contains(&card) {
            return false;
        }
        let present = card == self.challenger || self.targets.contains(&card);
        if present {
            self.targets.retain(|id| *id != card);
            self.removed.push(card);
            debug!(card = %card, "duelist removed");
        }
        present
    }

    /// Record a bid added to `side`'s total. Ignored once resolved.
    pub fn set_bid(&mut self, side: DuelSide, amount: u32) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        match side {
            DuelSide::Challenger => self.challenger_bid = Some(amount),
            DuelSide::Target => self.target_bid = Some(amount),
        }
        true
    }

    #[must_use]
    pub fn bid(&self, side: DuelSide) -> Option<u32> {
        match side {
            DuelSide::Challenger => self.challenger_bid,
            DuelSide::Target => self.target_bid,
        }
    }

    // === Resolution ===

    fn present<'a>(&self, cx: &ContestContext<'a>, card: EntityId) -> Option<(&'a CardInstance, f64)> {
        if self.removed.contains(&card) {
            return None;
        }
        let instance = cx.state.card(card).filter(|c| c.is_in_play())?;
        let value = cx.resolver.value(&instance.stats, self.attribute).amount()?;
        Some((instance, value))
    }

    fn side_total(values: &[(&CardInstance, f64)], bid: Option<u32>) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let skill: f64 = values.iter().map(|(_, v)| v).sum();
        Some(skill + bid.map_or(0.0, f64::from))
    }

    /// Resolve the duel. Later calls return the same outcome.
    pub fn determine_result(&mut self, cx: &ContestContext<'_>) -> DuelOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        let challengers: Vec<_> = self.present(cx, self.challenger).into_iter().collect();
        let targets: Vec<_> = self.targets.iter().filter_map(|id| self.present(cx, *id)).collect();

        let challenger_total = Self::side_total(&challengers, self.challenger_bid);
        let target_total = Self::side_total(&targets, self.target_bid);

        let (winners, losers) = match (challenger_total, target_total) {
            (Some(c), None) if c > 0.0 => (challengers.as_slice(), &[][..]),
            (None, Some(t)) if t > 0.0 => (targets.as_slice(), &[][..]),
            (Some(c), Some(t)) if c > t => (challengers.as_slice(), targets.as_slice()),
            (Some(c), Some(t)) if t > c => (targets.as_slice(), challengers.as_slice()),
            _ => (&[][..], &[][..]),
        };

        let outcome = DuelOutcome {
            winners: DuelParticipants::collapse(winners.iter().map(|(c, _)| c.entity_id)),
            losers: DuelParticipants::collapse(
                losers
                    .iter()
                    .filter(|(c, _)| cx.rules.may_lose_duel(c, self))
                    .map(|(c, _)| c.entity_id),
            ),
            challenger_total,
            target_total,
        };

        debug!(winners = ?outcome.winners, losers = ?outcome.losers, "duel resolved");
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// History entry for this duel.
    #[must_use]
    pub fn record(&self, round: u32) -> DuelRecord {
        let outcome = self.outcome.clone().unwrap_or_default();
        DuelRecord {
            round,
            challenger: self.challenger,
            targets: self
                .targets
                .iter()
                .chain(self.removed.iter())
                .copied()
                .filter(|id| *id != self.challenger)
                .collect(),
            winners: outcome.winner_ids(),
            losers: outcome.loser_ids(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::flags;
    use crate::contest::StandardRules;
    use crate::core::{EngineConfig, GameState};
    use crate::effects::{Effect, Resolver};

    struct Table {
        state: GameState,
        config: EngineConfig,
        resolver: Resolver,
    }

    impl Table {
        fn new() -> Self {
            let mut state = GameState::new();
            state.add_card(CardInstance::character(EntityId(0), "Kakita Toshimoko", PlayerId::FIRST, Some(4.0), Some(3.0), 2.0));
            state.add_card(CardInstance::character(EntityId(1), "Mirumoto Raitsugu", PlayerId::SECOND, Some(3.0), Some(1.0), 2.0));
            state.add_card(CardInstance::character(EntityId(2), "Togashi Initiate", PlayerId::SECOND, Some(1.0), Some(1.0), 0.0));
            Self {
                state,
                config: EngineConfig::default(),
                resolver: Resolver::default(),
            }
        }

        fn cx(&self) -> ContestContext<'_> {
            ContestContext::new(&self.state, &self.resolver, &StandardRules, &self.config)
        }
    }

    #[test]
    fn test_collapse() {
        assert_eq!(DuelParticipants::collapse([]), None);
        assert_eq!(DuelParticipants::collapse([EntityId(3)]), Some(DuelParticipants::Single(EntityId(3))));
        let many = DuelParticipants::collapse([EntityId(1), EntityId(2)]).unwrap();
        assert_eq!(many.ids(), &[EntityId(1), EntityId(2)]);
        assert!(many.contains(EntityId(2)));
    }

    #[test]
    fn test_higher_total_wins() {
        let table = Table::new();
        let mut duel = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Military);
        let outcome = duel.determine_result(&table.cx());
        assert_eq!(outcome.winners, Some(DuelParticipants::Single(EntityId(0))));
        assert_eq!(outcome.losers, Some(DuelParticipants::Single(EntityId(1))));
    }

    #[test]
    fn test_bids_count() {
        let table = Table::new();
        let mut duel = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Military);
        duel.set_bid(DuelSide::Challenger, 1);
        duel.set_bid(DuelSide::Target, 3);
        let outcome = duel.determine_result(&table.cx());
        assert_eq!(outcome.challenger_total, Some(5.0));
        assert_eq!(outcome.target_total, Some(6.0));
        assert_eq!(outcome.winner_ids(), vec![EntityId(1)]);
    }

    #[test]
    fn test_tie_has_no_result() {
        let table = Table::new();
        let mut duel = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Political);
        duel.set_bid(DuelSide::Target, 2);
        let outcome = duel.determine_result(&table.cx());
        assert_eq!(outcome.winners, None);
        assert_eq!(outcome.losers, None);
    }

    #[test]
    fn test_absent_challenger() {
        let table = Table::new();
        let mut duel = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Military);
        assert!(duel.remove_participant(EntityId(0)));

        let outcome = duel.determine_result(&table.cx());
        assert_eq!(outcome.challenger_total, None);
        assert_eq!(outcome.target_total, Some(3.0));
        assert_eq!(outcome.winners, Some(DuelParticipants::Single(EntityId(1))));
        assert_eq!(outcome.losers, None);
    }

    #[test]
    fn test_both_absent() {
        let mut table = Table::new();
        table.state.remove_from_play(EntityId(0));
        table.state.remove_from_play(EntityId(1));
        let mut duel = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Military);
        assert_eq!(duel.determine_result(&table.cx()), DuelOutcome::default());
    }

    #[test]
    fn test_disabled_duelist_is_absent() {
        let mut table = Table::new();
        table
            .state
            .card_mut(EntityId(1))
            .unwrap()
            .stats
            .add_effect(Effect::disable(Attribute::Military))
            .unwrap();
        let mut duel = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Military);
        let outcome = duel.determine_result(&table.cx());
        assert_eq!(outcome.target_total, None);
        assert_eq!(outcome.winner_ids(), vec![EntityId(0)]);
        assert!(outcome.loser_ids().is_empty());
    }

    #[test]
    fn test_multiple_targets_collapse() {
        let table = Table::new();
        let mut duel = Duel::new(EntityId(0), &[EntityId(1), EntityId(2)], Attribute::Military);
        duel.remove_participant(EntityId(2));
        let outcome = duel.determine_result(&table.cx());
        assert_eq!(outcome.losers, Some(DuelParticipants::Single(EntityId(1))));

        let mut duel = Duel::new(EntityId(0), &[EntityId(1), EntityId(2)], Attribute::Political);
        let outcome = duel.determine_result(&table.cx());
        assert_eq!(outcome.winners, Some(DuelParticipants::Single(EntityId(0))));
        assert_eq!(outcome.loser_ids(), vec![EntityId(1), EntityId(2)]);
    }

    #[test]
    fn test_cannot_lose_flag() {
        let mut table = Table::new();
        table.state.card_mut(EntityId(1)).unwrap().set_flag(flags::CANNOT_LOSE_DUELS, true);
        let mut duel = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Military);
        let outcome = duel.determine_result(&table.cx());
        assert_eq!(outcome.winner_ids(), vec![EntityId(0)]);
        assert_eq!(outcome.losers, None);
    }

    #[test]
    fn test_result_is_final() {
        let mut table = Table::new();
        let mut duel = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Military);
        let first = duel.determine_result(&table.cx());
        table.state.remove_from_play(EntityId(0));
        assert!(!duel.remove_participant(EntityId(1)));
        assert!(!duel.set_bid(DuelSide::Target, 5));
        assert_eq!(duel.determine_result(&table.cx()), first);
    }

    #[test]
    fn test_chain_involvement() {
        let first = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Military);
        let second = Duel::new(EntityId(2), &[EntityId(0)], Attribute::Political).with_previous(first);

        assert!(second.is_involved(EntityId(1)));
        assert!(second.is_involved(EntityId(2)));
        assert!(!second.is_involved(EntityId(7)));
        assert!(second.previous().is_some());
    }

    #[test]
    fn test_removed_challenger_not_involved() {
        let mut duel = Duel::new(EntityId(0), &[EntityId(1)], Attribute::Military);
        assert!(duel.remove_participant(EntityId(0)));

        assert!(!duel.is_involved(EntityId(0)));
        assert!(duel.is_involved(EntityId(1)));
        assert_eq!(duel.challenger(), EntityId(0));
    }

    #[test]
    fn test_record() {
        let table = Table::new();
        let mut duel = Duel::new(EntityId(0), &[EntityId(1), EntityId(2)], Attribute::Military);
        duel.remove_participant(EntityId(2));
        duel.determine_result(&table.cx());
        let record = duel.record(2);
        assert_eq!(record.targets, vec![EntityId(1), EntityId(2)]);
        assert_eq!(record.winners, vec![EntityId(0)]);
        assert_eq!(record.losers, vec![EntityId(1)]);
    }
}
