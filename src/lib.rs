//! # conflict-rules
//!
//! A rules engine for a two-seat strategic card game: dynamic attribute
//! resolution over layered effects, and resumable game procedures that
//! pause for player decisions.
//!
//! ## Design Principles
//!
//! 1. **Precedence in one place**: effects are a closed set of kinds, each
//!    resolved by a handler keyed on its stage. The resolver never fails;
//!    a disabled attribute is a value, not an error.
//!
//! 2. **Explicit suspension**: procedures are steps with a visible status.
//!    A step waiting for input returns "not finished"; input arrives as an
//!    explicit event routed to the front of the pipeline.
//!
//! 3. **Explicit context**: contests receive the state they read. There is
//!    no ambient "current conflict".
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: `im` collections make snapshots of
//!   [`GameState`] O(1) to clone.
//!
//! - **Liveness over retries**: a failing step is logged and discarded, a
//!   runaway drain is cleared. Both surface as events.
//!
//! ## Modules
//!
//! - `core`: entity IDs, seats, state, configuration, errors, RNG
//! - `cards`: attributes and card instances
//! - `effects`: effect ledger, attribute sources, the resolver
//! - `pipeline`: steps, the scheduler, phases
//! - `prompt`: decision requests, player input, default answers
//! - `events`: notifications, hooks and the card scripting seam
//! - `contest`: conflicts, duels and the steps that run them
//! - `game`: the game context, action windows, the round, the engine
//!
//! ## Quick Example
//!
//! ```
//! use conflict_rules::cards::CardInstance;
//! use conflict_rules::core::{EntityId, PlayerId};
//! use conflict_rules::game::Engine;
//! use conflict_rules::pipeline::DrainOutcome;
//! use conflict_rules::prompt::{AutoDecider, FallbackStrategy};
//!
//! let mut engine = Engine::default();
//! let state = &mut engine.game.state;
//! state.add_card(CardInstance::character(EntityId(0), "Matsu Tsuko", PlayerId::FIRST, Some(4.0), Some(2.0), 2.0));
//! state.add_card(CardInstance::character(EntityId(1), "Bayushi Shoju", PlayerId::SECOND, Some(3.0), Some(4.0), 2.0));
//!
//! engine.begin_round();
//! let mut auto = AutoDecider::new(1, FallbackStrategy::Eager);
//! assert_eq!(engine.run_unattended(&mut auto), DrainOutcome::Complete);
//! assert_eq!(engine.game.state.conflicts.len(), 4);
//! ```

pub mod cards;
pub mod contest;
pub mod core;
pub mod effects;
pub mod events;
pub mod game;
pub mod pipeline;
pub mod prompt;

// Re-export commonly used types
pub use crate::core::{
    ConflictRecord, DuelRecord, EngineConfig, EngineError, EntityId, GameRng, GameState, ImperialFavor, PhaseId,
    PlayerId, PlayerMap, TieBreak,
};

pub use crate::cards::{Attribute, CardInstance, CardKind, ConflictType};

pub use crate::effects::{
    AttributeSource, Duration, Effect, EffectId, EffectKind, EffectLedger, Resolution, Resolver, StatModifier,
    StatValue, ValueRule,
};

pub use crate::pipeline::{DrainOutcome, Phase, Pipeline, PipelineStep, SimpleStep, Step, StepContext, StepSlot};

pub use crate::prompt::{AutoDecider, DecisionKind, DecisionRequest, FallbackStrategy, Input};

pub use crate::events::{EventHook, EventHooks, GameEvent, ScriptCommand, ScriptHost};

pub use crate::contest::{Conflict, ConflictFlow, ContestContext, ContestRules, Duel, DuelFlow, Side, StandardRules};

pub use crate::game::{ActionWindow, DecisionStep, Engine, Game};
