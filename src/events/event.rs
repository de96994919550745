//! Notifications emitted by the core.

use serde::{Deserialize, Serialize};

use crate::cards::{Attribute, ConflictType};
use crate::contest::Side;
use crate::core::{EntityId, PhaseId, PlayerId};
use crate::effects::EffectId;
use crate::prompt::DecisionId;

/// Something that happened.
///
/// Events carry copies of the data they describe; observers never get
/// access to mutable state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EffectApplied {
        target: EntityId,
        effect: EffectId,
        attribute: Attribute,
    },
    EffectRemoved {
        target: EntityId,
        effect: EffectId,
    },

    RoundStarted(u32),
    PhaseStarted(PhaseId),
    PhaseEnded(PhaseId),

    ConflictDeclared {
        attacker: PlayerId,
        conflict_type: ConflictType,
        attackers: Vec<EntityId>,
    },
    ConflictPassed {
        player: PlayerId,
    },
    ParticipantJoined {
        card: EntityId,
        side: Side,
    },
    ParticipantLeft {
        card: EntityId,
    },
    ConflictDetermined {
        winner: Option<PlayerId>,
        loser: Option<PlayerId>,
        attacker_total: f64,
        defender_total: f64,
        skill_difference: f64,
    },
    ConflictClosed,

    DuelResolved {
        winners: Vec<EntityId>,
        losers: Vec<EntityId>,
    },
    HonorTransferred {
        from: PlayerId,
        to: PlayerId,
        amount: i64,
    },
    FavorClaimed {
        player: PlayerId,
        kind: ConflictType,
    },

    DecisionRequested {
        id: DecisionId,
        player: PlayerId,
    },
    ActionTaken {
        player: PlayerId,
        ability: u32,
    },

    StepFailed {
        reason: String,
    },
    PipelineAborted {
        limit: usize,
    },
}

impl GameEvent {
    /// Short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::EffectApplied { .. } => "effect_applied",
            GameEvent::EffectRemoved { .. } => "effect_removed",
            GameEvent::RoundStarted(_) => "round_started",
            GameEvent::PhaseStarted(_) => "phase_started",
            GameEvent::PhaseEnded(_) => "phase_ended",
            GameEvent::ConflictDeclared { .. } => "conflict_declared",
            GameEvent::ConflictPassed { .. } => "conflict_passed",
            GameEvent::ParticipantJoined { .. } => "participant_joined",
            GameEvent::ParticipantLeft { .. } => "participant_left",
            GameEvent::ConflictDetermined { .. } => "conflict_determined",
            GameEvent::ConflictClosed => "conflict_closed",
            GameEvent::DuelResolved { .. } => "duel_resolved",
            GameEvent::HonorTransferred { .. } => "honor_transferred",
            GameEvent::FavorClaimed { .. } => "favor_claimed",
            GameEvent::DecisionRequested { .. } => "decision_requested",
            GameEvent::ActionTaken { .. } => "action_taken",
            GameEvent::StepFailed { .. } => "step_failed",
            GameEvent::PipelineAborted { .. } => "pipeline_aborted",
        }
    }
}
