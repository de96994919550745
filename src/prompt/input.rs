//! Input delivered from outside the core.
//!
//! Inputs are compositional, like the actions they carry: an
//! [`ActionChoice`] is an ability index (the "verb") plus entity pointers
//! (the "nouns"). The core never interprets ability indices; the script
//! host does.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::ConflictType;
use crate::core::{EntityId, PlayerId};

/// A card ability a player wants to use during an action window.
///
/// ```
/// use conflict_rules::core::EntityId;
/// use conflict_rules::prompt::ActionChoice;
///
/// let play = ActionChoice::with_targets(2, Some(EntityId(5)), &[EntityId(9)]);
/// assert_eq!(play.target_count(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionChoice {
    /// Script-defined ability index.
    pub ability: u32,

    /// The piece whose ability this is, if any.
    pub source: Option<EntityId>,

    /// Chosen targets. SmallVec keeps the common 0-3 targets inline.
    pub targets: SmallVec<[EntityId; 3]>,
}

impl ActionChoice {
    #[must_use]
    pub fn new(ability: u32, source: Option<EntityId>) -> Self {
        Self {
            ability,
            source,
            targets: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_targets(ability: u32, source: Option<EntityId>, targets: &[EntityId]) -> Self {
        Self {
            ability,
            source,
            targets: SmallVec::from_slice(targets),
        }
    }

    pub fn push_target(&mut self, target: EntityId) {
        self.targets.push(target);
    }

    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }
}

/// Something a seat tells the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Input {
    /// Pick one of a list of choices.
    Choose { player: PlayerId, index: usize },

    /// Declare a conflict with the given attackers.
    Declare {
        player: PlayerId,
        conflict_type: ConflictType,
        attackers: Vec<EntityId>,
    },

    /// Pick a set of pieces.
    SelectCards { player: PlayerId, cards: Vec<EntityId> },

    /// Secret bid (duels).
    Bid { player: PlayerId, amount: u32 },

    /// Use an ability.
    Action { player: PlayerId, action: ActionChoice },

    /// Decline.
    Pass { player: PlayerId },
}

impl Input {
    /// The seat this input came from.
    #[must_use]
    pub fn player(&self) -> PlayerId {
        match self {
            Input::Choose { player, .. }
            | Input::Declare { player, .. }
            | Input::SelectCards { player, .. }
            | Input::Bid { player, .. }
            | Input::Action { player, .. }
            | Input::Pass { player } => *player,
        }
    }

    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Input::Pass { .. })
    }
}
