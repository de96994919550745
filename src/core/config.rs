//! Engine configuration.
//!
//! Rule constants that differ between formats, plus the scheduler's
//! safety limits. Games build an [`EngineConfig`] at startup; every field
//! has a default matching the standard ruleset.

use serde::{Deserialize, Serialize};

/// Opaque phase identifier.
///
/// The engine only compares phase IDs for equality; [`PhaseId::name`]
/// covers the standard round structure for logging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhaseId(pub u32);

impl PhaseId {
    pub const SETUP: PhaseId = PhaseId(0);
    pub const DYNASTY: PhaseId = PhaseId(1);
    pub const DRAW: PhaseId = PhaseId(2);
    pub const CONFLICT: PhaseId = PhaseId(3);
    pub const FATE: PhaseId = PhaseId(4);
    pub const REGROUP: PhaseId = PhaseId(5);

    /// Create a new phase ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Display name for the standard phases.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::SETUP => "setup",
            Self::DYNASTY => "dynasty",
            Self::DRAW => "draw",
            Self::CONFLICT => "conflict",
            Self::FATE => "fate",
            Self::REGROUP => "regroup",
            _ => "custom",
        }
    }
}

impl std::fmt::Display for PhaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Phase({}:{})", self.0, self.name())
    }
}

/// Who wins when both conflict totals are equal and non-zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreak {
    /// The defender must strictly exceed the attacker.
    #[default]
    Attacker,
    /// The attacker must strictly exceed the defender.
    Defender,
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum step continuations in one drain before the pipeline is
    /// declared runaway and cleared.
    pub max_drain_iterations: usize,

    /// Skill added to a side holding the imperial favor for the contested
    /// dimension.
    pub favor_bonus: f64,

    /// Skill added by a tainted status token.
    pub tainted_bonus: f64,

    /// Tie-break rule for conflicts.
    pub tie_break: TieBreak,

    /// Conflict declaration opportunities per seat per round.
    pub conflicts_per_player: u32,

    /// Consecutive passes that close an action window.
    pub passes_to_close_window: usize,

    /// Seed for default decisions.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_drain_iterations: 10_000,
            favor_bonus: 1.0,
            tainted_bonus: 2.0,
            tie_break: TieBreak::Attacker,
            conflicts_per_player: 2,
            passes_to_close_window: 2,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Standard configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the drain iteration cap.
    #[must_use]
    pub fn with_max_drain_iterations(mut self, limit: usize) -> Self {
        assert!(limit > 0, "Iteration cap must be positive");
        self.max_drain_iterations = limit;
        self
    }

    /// Set the imperial favor bonus.
    #[must_use]
    pub fn with_favor_bonus(mut self, bonus: f64) -> Self {
        self.favor_bonus = bonus;
        self
    }

    /// Set the tainted status bonus.
    #[must_use]
    pub fn with_tainted_bonus(mut self, bonus: f64) -> Self {
        self.tainted_bonus = bonus;
        self
    }

    /// Set the tie-break rule.
    #[must_use]
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Set conflict opportunities per seat.
    #[must_use]
    pub fn with_conflicts_per_player(mut self, count: u32) -> Self {
        self.conflicts_per_player = count;
        self
    }

    /// Set the pass count that closes an action window.
    #[must_use]
    pub fn with_passes_to_close_window(mut self, passes: usize) -> Self {
        assert!(passes > 0, "An action window needs at least one pass to close");
        self.passes_to_close_window = passes;
        self
    }

    /// Set the default-decision seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
