//! Decision requests pushed to the outside world.
//!
//! A step that needs a seat to decide something builds a
//! [`DecisionRequest`], publishes it, and returns "not finished". The
//! answer comes back as an [`Input`]; [`DecisionRequest::accepts`] is the
//! single place that decides whether an input answers a request.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::ConflictType;
use crate::core::{EntityId, PlayerId};

use super::input::Input;

/// Identifier of an outstanding request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecisionId(pub u32);

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Decision({})", self.0)
    }
}

/// What shape of answer is expected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DecisionKind {
    /// Pick one labelled option by index.
    ChooseOne { choices: SmallVec<[String; 4]> },

    /// Declare a conflict (type plus attackers) or pass.
    DeclareConflict {
        types: Vec<ConflictType>,
        candidates: Vec<EntityId>,
    },

    /// Pick between `min` and `max` of the candidates.
    SelectCards {
        candidates: Vec<EntityId>,
        min: usize,
        max: usize,
    },

    /// Bid a number in `min..=max`.
    Bid { min: u32, max: u32 },

    /// Use an ability or pass.
    ActionOrPass,
}

/// A question for one seat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub id: DecisionId,
    pub player: PlayerId,
    pub kind: DecisionKind,
    /// Human-readable prompt.
    pub prompt: String,
}

impl DecisionRequest {
    #[must_use]
    pub fn new(id: DecisionId, player: PlayerId, kind: DecisionKind, prompt: impl Into<String>) -> Self {
        Self {
            id,
            player,
            kind,
            prompt: prompt.into(),
        }
    }

    /// Does `input` answer this request?
    ///
    /// Input from the wrong seat, of the wrong shape, or outside the
    /// offered options is rejected.
    ///
    /// ```
    /// use conflict_rules::core::PlayerId;
    /// use conflict_rules::prompt::{DecisionId, DecisionKind, DecisionRequest, Input};
    ///
    /// let request = DecisionRequest::new(DecisionId(0), PlayerId::FIRST, DecisionKind::Bid { min: 1, max: 5 }, "Bid");
    /// assert!(request.accepts(&Input::Bid { player: PlayerId::FIRST, amount: 3 }));
    /// assert!(!request.accepts(&Input::Bid { player: PlayerId::SECOND, amount: 3 }));
    /// assert!(!request.accepts(&Input::Bid { player: PlayerId::FIRST, amount: 9 }));
    /// ```
    #[must_use]
    pub fn accepts(&self, input: &Input) -> bool {
        if input.player() != self.player {
            return false;
        }

        match (&self.kind, input) {
            (DecisionKind::ChooseOne { choices }, Input::Choose { index, .. }) => *index < choices.len(),
            (DecisionKind::DeclareConflict { .. }, Input::Pass { .. }) => true,
            (
                DecisionKind::DeclareConflict { types, candidates },
                Input::Declare {
                    conflict_type,
                    attackers,
                    ..
                },
            ) => types.contains(conflict_type) && !attackers.is_empty() && is_distinct_subset(attackers, candidates),
            (DecisionKind::SelectCards { candidates, min, max }, Input::SelectCards { cards, .. }) => {
                (*min..=*max).contains(&cards.len()) && is_distinct_subset(cards, candidates)
            }
            (DecisionKind::Bid { min, max }, Input::Bid { amount, .. }) => (*min..=*max).contains(amount),
            (DecisionKind::ActionOrPass, Input::Action { .. } | Input::Pass { .. }) => true,
            _ => false,
        }
    }
}

fn is_distinct_subset(picked: &[EntityId], offered: &[EntityId]) -> bool {
    picked.iter().all(|id| offered.contains(id))
        && picked.iter().enumerate().all(|(i, id)| !picked[..i].contains(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn request(kind: DecisionKind) -> DecisionRequest {
        DecisionRequest::new(DecisionId(1), PlayerId::FIRST, kind, "test")
    }

    #[test]
    fn test_choose_one_bounds() {
        let req = request(DecisionKind::ChooseOne {
            choices: smallvec!["military".to_string(), "political".to_string()],
        });
        assert!(req.accepts(&Input::Choose { player: PlayerId::FIRST, index: 1 }));
        assert!(!req.accepts(&Input::Choose { player: PlayerId::FIRST, index: 2 }));
    }

    #[test]
    fn test_declare_conflict() {
        let req = request(DecisionKind::DeclareConflict {
            types: vec![ConflictType::Military],
            candidates: vec![EntityId(1), EntityId(2)],
        });

        let declare = |conflict_type, attackers: Vec<EntityId>| Input::Declare {
            player: PlayerId::FIRST,
            conflict_type,
            attackers,
        };
        assert!(req.accepts(&declare(ConflictType::Military, vec![EntityId(2)])));
        assert!(!req.accepts(&declare(ConflictType::Political, vec![EntityId(2)])));
        assert!(!req.accepts(&declare(ConflictType::Military, vec![])));
        assert!(!req.accepts(&declare(ConflictType::Military, vec![EntityId(3)])));
        assert!(!req.accepts(&declare(ConflictType::Military, vec![EntityId(1), EntityId(1)])));
        assert!(req.accepts(&Input::Pass { player: PlayerId::FIRST }));
    }

    #[test]
    fn test_select_cards_range() {
        let req = request(DecisionKind::SelectCards {
            candidates: vec![EntityId(1), EntityId(2), EntityId(3)],
            min: 0,
            max: 2,
        });
        let select = |cards: Vec<EntityId>| Input::SelectCards { player: PlayerId::FIRST, cards };

        assert!(req.accepts(&select(vec![])));
        assert!(req.accepts(&select(vec![EntityId(3), EntityId(1)])));
        assert!(!req.accepts(&select(vec![EntityId(1), EntityId(2), EntityId(3)])));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let req = request(DecisionKind::ActionOrPass);
        assert!(req.accepts(&Input::Pass { player: PlayerId::FIRST }));
        assert!(!req.accepts(&Input::Bid { player: PlayerId::FIRST, amount: 1 }));
        assert!(!req.accepts(&Input::Pass { player: PlayerId::SECOND }));
    }
}
