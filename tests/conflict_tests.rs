//! Conflict resolution integration tests.

use conflict_rules::cards::{flags, Attribute, CardInstance, ConflictType};
use conflict_rules::contest::{Conflict, ConflictState, ContestContext, Side, StandardRules};
use conflict_rules::core::{EngineConfig, EntityId, GameState, PlayerId, TieBreak};
use conflict_rules::effects::{Effect, Resolver};

struct Table {
    state: GameState,
    config: EngineConfig,
    resolver: Resolver,
}

impl Table {
    /// Two attackers (2 and 3 military) against one defender (5 military).
    fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    fn with_config(config: EngineConfig) -> Self {
        let mut state = GameState::new();
        state.add_card(CardInstance::character(EntityId(0), "Hida Kisada", PlayerId::FIRST, Some(2.0), Some(1.0), 1.0));
        state.add_card(CardInstance::character(EntityId(1), "Hida Yakamo", PlayerId::FIRST, Some(3.0), None, 2.0));
        state.add_card(CardInstance::character(EntityId(2), "Doji Challenger", PlayerId::SECOND, Some(5.0), Some(3.0), 2.0));
        let resolver = Resolver::from_config(&config);
        Self { state, config, resolver }
    }

    fn cx(&self) -> ContestContext<'_> {
        ContestContext::new(&self.state, &self.resolver, &StandardRules, &self.config)
    }

    fn conflict(&mut self, kind: ConflictType, attackers: &[EntityId], defenders: &[EntityId]) -> Conflict {
        let mut conflict = Conflict::new(PlayerId::FIRST, kind);
        conflict.add_attackers(&mut self.state, attackers);
        conflict.add_defenders(&mut self.state, defenders);
        conflict
    }
}

// =============================================================================
// Winner Determination
// =============================================================================

/// Nobody contributing means nobody wins.
#[test]
fn test_zero_zero_has_no_winner() {
    let mut table = Table::new();
    let mut conflict = table.conflict(ConflictType::Military, &[], &[]);

    let outcome = conflict.determine_winner(&table.cx());
    assert_eq!(outcome.winner, None);
    assert_eq!(outcome.loser, None);
    assert_eq!(outcome.skill_difference, 0.0);
    assert_eq!(conflict.state(), ConflictState::Determined);
}

/// Equal totals go to the attacker under the default tie break.
#[test]
fn test_tie_goes_to_attacker() {
    let mut table = Table::new();
    let mut conflict = table.conflict(ConflictType::Military, &[EntityId(0), EntityId(1)], &[EntityId(2)]);

    let outcome = conflict.determine_winner(&table.cx());
    assert_eq!((outcome.attacker_total, outcome.defender_total), (5.0, 5.0));
    assert_eq!(outcome.winner, Some(PlayerId::FIRST));
    assert_eq!(outcome.loser, Some(PlayerId::SECOND));
}

/// The tie break is configurable.
#[test]
fn test_tie_to_defender_when_configured() {
    let mut table = Table::with_config(EngineConfig::new().with_tie_break(TieBreak::Defender));
    let mut conflict = table.conflict(ConflictType::Military, &[EntityId(0), EntityId(1)], &[EntityId(2)]);

    assert_eq!(conflict.determine_winner(&table.cx()).winner, Some(PlayerId::SECOND));
}

/// A determined result does not move when the table changes.
#[test]
fn test_determination_is_idempotent() {
    let mut table = Table::new();
    let mut conflict = table.conflict(ConflictType::Military, &[EntityId(1)], &[EntityId(2)]);

    let first = conflict.determine_winner(&table.cx());
    assert_eq!(first.winner, Some(PlayerId::SECOND));
    assert_eq!(first.skill_difference, 2.0);

    table
        .state
        .card_mut(EntityId(1))
        .unwrap()
        .stats
        .add_effect(Effect::additive(Attribute::Military, 10.0))
        .unwrap();
    assert_eq!(conflict.determine_winner(&table.cx()), first);
    assert_eq!(conflict.calculate_skill(&table.cx()), (3.0, 5.0));
}

// =============================================================================
// Contributions
// =============================================================================

/// The favor bonus applies only to a side that has participants.
#[test]
fn test_favor_needs_a_participant() {
    let mut table = Table::new();
    table.state.favor.holder = Some(PlayerId::SECOND);
    table.state.favor.kind = Some(ConflictType::Political);

    let empty = table.conflict(ConflictType::Political, &[EntityId(0)], &[]);
    assert_eq!(empty.skill_of(&table.cx(), Side::Defender), 0.0);

    let defended = table.conflict(ConflictType::Political, &[EntityId(0)], &[EntityId(2)]);
    assert_eq!(defended.skill_of(&table.cx(), Side::Defender), 4.0);
}

/// Withdrawn participants stop counting.
#[test]
fn test_withdrawn_participant_stops_contributing() {
    let mut table = Table::new();
    let mut conflict = table.conflict(ConflictType::Military, &[EntityId(0), EntityId(1)], &[EntityId(2)]);
    assert_eq!(conflict.skill_of(&table.cx(), Side::Attacker), 5.0);

    assert!(conflict.remove_participant(&mut table.state, EntityId(1)));
    assert!(!table.state.card(EntityId(1)).unwrap().in_conflict);
    assert_eq!(conflict.skill_of(&table.cx(), Side::Attacker), 2.0);

    let outcome = conflict.determine_winner(&table.cx());
    assert_eq!(outcome.winner, Some(PlayerId::SECOND));
}

/// Bowed, dashed and vetoed participants add nothing; the side modifier
/// still counts.
#[test]
fn test_ineligible_participants() {
    let mut table = Table::new();
    let mut conflict = table.conflict(ConflictType::Political, &[EntityId(0), EntityId(1)], &[EntityId(2)]);

    // Hida Yakamo has a political dash
    assert_eq!(conflict.skill_of(&table.cx(), Side::Attacker), 1.0);

    table.state.card_mut(EntityId(0)).unwrap().bowed = true;
    assert_eq!(conflict.skill_of(&table.cx(), Side::Attacker), 0.0);

    table.state.card_mut(EntityId(2)).unwrap().set_flag(flags::CANNOT_CONTRIBUTE, true);
    assert!(conflict.adjust_side(Side::Defender, 2.0));
    assert_eq!(conflict.skill_of(&table.cx(), Side::Defender), 2.0);
}

/// Closing sends every participant home.
#[test]
fn test_close_clears_participation() {
    let mut table = Table::new();
    let mut conflict = table.conflict(ConflictType::Military, &[EntityId(0)], &[EntityId(2)]);
    assert!(!conflict.close(&mut table.state));

    conflict.determine_winner(&table.cx());
    assert!(conflict.close(&mut table.state));
    assert_eq!(conflict.state(), ConflictState::Closed);
    assert!(table.state.cards().all(|c| !c.in_conflict));

    let record = conflict.record(1);
    assert_eq!(record.winner, Some(PlayerId::SECOND));
    assert_eq!(record.conflict_type, Some(ConflictType::Military));
    assert!(!record.passed);
}
