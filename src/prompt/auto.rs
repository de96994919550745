//! Default answers for seats nobody is driving.
//!
//! The scheduler has no timeout concept; when a prompt goes unanswered the
//! caller asks an [`AutoDecider`] for a legal default and submits it like
//! any other input.

use serde::{Deserialize, Serialize};

use crate::cards::ConflictType;
use crate::core::{EntityId, GameRng, PlayerId, PlayerMap};

use super::decision::{DecisionKind, DecisionRequest};
use super::input::Input;

/// How default answers are picked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackStrategy {
    /// Decline optional decisions, take the first or smallest option
    /// otherwise.
    #[default]
    Decline,

    /// Commit fully: declare with every candidate, select the maximum,
    /// bid high.
    Eager,

    /// Seeded random legal answers.
    Random,
}

/// Produces legal answers to decision requests.
///
/// ```
/// use conflict_rules::core::PlayerId;
/// use conflict_rules::prompt::{AutoDecider, DecisionId, DecisionKind, DecisionRequest, FallbackStrategy};
///
/// let mut auto = AutoDecider::new(7, FallbackStrategy::Random);
/// let request = DecisionRequest::new(DecisionId(0), PlayerId::SECOND, DecisionKind::Bid { min: 1, max: 5 }, "Bid");
/// let answer = auto.decide(&request);
/// assert!(request.accepts(&answer));
/// ```
#[derive(Clone, Debug)]
pub struct AutoDecider {
    strategy: FallbackStrategy,
    rng: PlayerMap<GameRng>,
}

impl AutoDecider {
    #[must_use]
    pub fn new(seed: u64, strategy: FallbackStrategy) -> Self {
        let base = GameRng::new(seed);
        Self {
            strategy,
            rng: PlayerMap::new(|p| base.for_seat(p)),
        }
    }

    #[must_use]
    pub fn strategy(&self) -> FallbackStrategy {
        self.strategy
    }

    /// A legal answer for `request`.
    pub fn decide(&mut self, request: &DecisionRequest) -> Input {
        let player = request.player;
        match &request.kind {
            DecisionKind::ChooseOne { choices } => {
                let index = match self.strategy {
                    FallbackStrategy::Random => self.rng[player].pick_index(choices.len()).unwrap_or(0),
                    _ => 0,
                };
                Input::Choose { player, index }
            }
            DecisionKind::DeclareConflict { types, candidates } => {
                self.declare(player, types, candidates)
            }
            DecisionKind::SelectCards { candidates, min, max } => {
                let cards = match self.strategy {
                    FallbackStrategy::Decline => candidates.iter().take(*min).copied().collect(),
                    FallbackStrategy::Eager => candidates.iter().take(*max).copied().collect(),
                    FallbackStrategy::Random => {
                        let mut picked = self.rng[player].subset(candidates);
                        picked.truncate(*max);
                        for id in candidates {
                            if picked.len() >= *min {
                                break;
                            }
                            if !picked.contains(id) {
                                picked.push(*id);
                            }
                        }
                        picked
                    }
                };
                Input::SelectCards { player, cards }
            }
            DecisionKind::Bid { min, max } => {
                let amount = match self.strategy {
                    FallbackStrategy::Decline => *min,
                    FallbackStrategy::Eager => *max,
                    FallbackStrategy::Random => {
                        let value = self.rng[player].gen_inclusive(i64::from(*min), i64::from(*max));
                        u32::try_from(value).unwrap_or(*min)
                    }
                };
                Input::Bid { player, amount }
            }
            DecisionKind::ActionOrPass => Input::Pass { player },
        }
    }

    fn declare(&mut self, player: PlayerId, types: &[ConflictType], candidates: &[EntityId]) -> Input {
        let pass = Input::Pass { player };
        let Some(first) = types.first().copied() else {
            return pass;
        };
        if candidates.is_empty() {
            return pass;
        }

        match self.strategy {
            FallbackStrategy::Decline => pass,
            FallbackStrategy::Eager => Input::Declare {
                player,
                conflict_type: first,
                attackers: candidates.to_vec(),
            },
            FallbackStrategy::Random => {
                let rng = &mut self.rng[player];
                let conflict_type = rng.pick_index(types.len()).map_or(first, |i| types[i]);
                let mut attackers = rng.subset(candidates);
                if attackers.is_empty() {
                    let index = rng.pick_index(candidates.len()).unwrap_or(0);
                    attackers.push(candidates[index]);
                }
                Input::Declare {
                    player,
                    conflict_type,
                    attackers,
                }
            }
        }
    }
}
