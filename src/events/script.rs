//! The seam to card scripting.
//!
//! Card text lives outside the core. The core calls a [`ScriptHost`] when
//! events occur and when a player uses an ability; the host answers with
//! [`ScriptCommand`]s, which the core validates and applies. The host
//! only ever sees `&GameState`.

use serde::{Deserialize, Serialize};

use crate::cards::Attribute;
use crate::contest::Side;
use crate::core::{EntityId, GameState, PlayerId};
use crate::effects::{Effect, EffectId, PersonalHonor};
use crate::prompt::ActionChoice;

use super::event::GameEvent;

/// A state change requested by card scripting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScriptCommand {
    AddEffect { target: EntityId, effect: Effect },
    RemoveEffect { target: EntityId, effect: EffectId },
    /// Remove everything `origin` created, on every piece.
    RemoveEffectsFrom { origin: EntityId },
    SetHonor { target: EntityId, honor: PersonalHonor },
    SetTainted { target: EntityId, tainted: bool },
    SetFlag { target: EntityId, flag: String, value: bool },
    Bow(EntityId),
    Ready(EntityId),
    AdjustHonor { player: PlayerId, amount: i64 },
    LeavePlay(EntityId),

    // Contest commands, applied by the running contest.
    /// Add to a side's conflict total.
    AdjustSideSkill { side: Side, amount: f64 },
    /// Remove a participant from the current conflict.
    Withdraw(EntityId),
    JoinConflict { card: EntityId, side: Side },
    /// Remove a duelist from the running duel.
    LeaveDuel(EntityId),
    /// Start a duel, optionally chained to the previous one.
    StartDuel {
        challenger: EntityId,
        targets: Vec<EntityId>,
        attribute: Attribute,
        chain: bool,
    },
}

impl ScriptCommand {
    /// Does this command act on the running contest rather than on state?
    #[must_use]
    pub fn is_contest_command(&self) -> bool {
        matches!(
            self,
            ScriptCommand::AdjustSideSkill { .. }
                | ScriptCommand::Withdraw(_)
                | ScriptCommand::JoinConflict { .. }
                | ScriptCommand::LeaveDuel(_)
                | ScriptCommand::StartDuel { .. }
        )
    }
}

/// External card scripting.
pub trait ScriptHost {
    /// React to an event (triggered abilities, lasting effects).
    fn on_event(&mut self, _event: &GameEvent, _state: &GameState) -> Vec<ScriptCommand> {
        Vec::new()
    }

    /// Resolve an ability a player used in an action window.
    fn perform_action(&mut self, _player: PlayerId, _action: &ActionChoice, _state: &GameState) -> Vec<ScriptCommand> {
        Vec::new()
    }
}

/// A host with no card text.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullScript;

impl ScriptHost for NullScript {}
