//! Card instances - runtime state of a game piece.
//!
//! A `CardInstance` is a specific piece on the table: its controller,
//! whether it is in play, bowed, or participating in a conflict, and its
//! [`AttributeSource`] (printed values, status tokens, effect ledger).
//!
//! ## Flags
//!
//! Rule content marks pieces with integer-valued flags (`state`). The
//! contest predicates look at [`flags::CANNOT_CONTRIBUTE`] and
//! [`flags::CANNOT_LOSE_DUELS`]; everything else is opaque to the core.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::attributes::Attribute;
use crate::core::{EntityId, PlayerId};
use crate::effects::AttributeSource;

/// Well-known flag keys.
pub mod flags {
    /// The piece never adds its skill to a conflict total.
    pub const CANNOT_CONTRIBUTE: &str = "cannot_contribute";

    /// The piece cannot be recorded as the loser of a duel.
    pub const CANNOT_LOSE_DUELS: &str = "cannot_lose_duels";
}

/// What kind of piece this is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    Character,
    Province,
    Holding,
    Stronghold,
}

/// Where the piece currently is, as far as contests care.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    /// On the table and able to participate.
    #[default]
    InPlay,
    /// Left play (discarded, removed, returned to hand).
    OutOfPlay,
}

/// A piece on the table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardInstance {
    /// Unique entity ID for this instance.
    pub entity_id: EntityId,

    /// Display name.
    pub name: String,

    /// What kind of piece this is.
    pub kind: CardKind,

    /// Owner (who brought it to the game).
    pub owner: PlayerId,

    /// Controller (who currently controls it).
    pub controller: PlayerId,

    /// Current location.
    pub location: Location,

    /// Bowed pieces are incapacitated: they stay in a conflict but add
    /// nothing to it.
    pub bowed: bool,

    /// Currently counted toward one side of a conflict.
    pub in_conflict: bool,

    /// Printed values, status tokens and the effect ledger.
    pub stats: AttributeSource,

    /// Opaque integer state (flags, counters).
    #[serde(default)]
    pub state: FxHashMap<String, i64>,
}

impl CardInstance {
    /// Create an in-play piece controlled by its owner.
    #[must_use]
    pub fn new(entity_id: EntityId, name: impl Into<String>, kind: CardKind, owner: PlayerId) -> Self {
        Self {
            entity_id,
            name: name.into(),
            kind,
            owner,
            controller: owner,
            location: Location::InPlay,
            bowed: false,
            in_conflict: false,
            stats: AttributeSource::new(entity_id),
            state: FxHashMap::default(),
        }
    }

    /// Create a character with printed skills and glory.
    ///
    /// `None` for a skill is a printed dash: that skill is disabled.
    ///
    /// ```
    /// use conflict_rules::cards::{Attribute, CardInstance};
    /// use conflict_rules::core::{EntityId, PlayerId};
    ///
    /// let card = CardInstance::character(EntityId(3), "Doji Whisperer", PlayerId::FIRST, None, Some(3.0), 2.0);
    /// assert_eq!(card.stats.printed(Attribute::Military), None);
    /// assert_eq!(card.stats.printed(Attribute::Political), Some(3.0));
    /// ```
    #[must_use]
    pub fn character(
        entity_id: EntityId,
        name: impl Into<String>,
        owner: PlayerId,
        military: Option<f64>,
        political: Option<f64>,
        glory: f64,
    ) -> Self {
        let mut card = Self::new(entity_id, name, CardKind::Character, owner);
        if let Some(value) = military {
            card.stats.set_printed(Attribute::Military, value);
        }
        if let Some(value) = political {
            card.stats.set_printed(Attribute::Political, value);
        }
        card.stats.set_printed(Attribute::Glory, glory);
        card
    }

    /// Create a province with printed strength.
    #[must_use]
    pub fn province(entity_id: EntityId, name: impl Into<String>, owner: PlayerId, strength: f64) -> Self {
        let mut card = Self::new(entity_id, name, CardKind::Province, owner);
        card.stats.set_printed(Attribute::Strength, strength);
        card
    }

    /// Is this piece on the table?
    #[must_use]
    pub fn is_in_play(&self) -> bool {
        self.location == Location::InPlay
    }

    /// Is this a character?
    #[must_use]
    pub fn is_character(&self) -> bool {
        self.kind == CardKind::Character
    }

    /// Set the controller.
    pub fn set_controller(&mut self, controller: PlayerId) {
        self.controller = controller;
    }

    /// Get a state value with a default.
    #[must_use]
    pub fn get_state(&self, key: &str, default: i64) -> i64 {
        self.state.get(key).copied().unwrap_or(default)
    }

    /// Set a state value.
    pub fn set_state(&mut self, key: impl Into<String>, value: i64) {
        self.state.insert(key.into(), value);
    }

    /// Check if a state flag is set (non-zero).
    #[must_use]
    pub fn has_flag(&self, key: &str) -> bool {
        self.get_state(key, 0) != 0
    }

    /// Set a boolean flag.
    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.set_state(key, i64::from(value));
    }
}
