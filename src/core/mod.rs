//! Core engine types: entities, seats, state, RNG, configuration, errors.
//!
//! Everything here is independent of how procedures are scheduled; the
//! pipeline, contest and game modules build on these types.

pub mod config;
pub mod entity;
pub mod error;
pub mod player;
pub mod rng;
pub mod state;

pub use config::{EngineConfig, PhaseId, TieBreak};
pub use entity::{EntityAllocator, EntityId};
pub use error::EngineError;
pub use player::{PlayerId, PlayerMap};
pub use rng::GameRng;
pub use state::{ConflictRecord, DuelRecord, GameState, ImperialFavor};
