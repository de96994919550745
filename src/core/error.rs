//! Internal error type.
//!
//! Errors here are programming or content faults. Rule-defined outcomes
//! (a 0–0 conflict, an absent duelist, a disabled attribute) are never
//! errors; they are ordinary return values.

use super::EntityId;
use crate::cards::Attribute;

/// Faults surfaced while mutating ledgers or running steps.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("malformed effect on {attribute}: {reason}")]
    MalformedEffect {
        attribute: Attribute,
        reason: String,
    },

    #[error("step `{step}` failed: {reason}")]
    StepFailed {
        step: String,
        reason: String,
    },

    #[error("pipeline exceeded {limit} iterations and was cleared")]
    RunawayPipeline { limit: usize },
}

impl EngineError {
    /// Shorthand for a failing step.
    pub fn step_failed(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StepFailed {
            step: step.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = EngineError::UnknownEntity(EntityId(4));
        assert_eq!(err.to_string(), "unknown entity Entity(4)");

        let err = EngineError::MalformedEffect {
            attribute: Attribute::Military,
            reason: "multiplier is NaN".into(),
        };
        assert_eq!(err.to_string(), "malformed effect on military: multiplier is NaN");

        let err = EngineError::step_failed("draw", "deck missing");
        assert_eq!(err.to_string(), "step `draw` failed: deck missing");
    }
}
