//! Game context and turn orchestration.
//!
//! - [`Game`]: state, rules, scripting seam, hooks and the decision outbox
//! - [`Engine`]: a game plus its top-level pipeline
//! - [`ActionWindow`] / [`DecisionStep`]: the interactive steps
//! - [`phases`]: the standard round

mod context;
mod decision_step;
mod engine;
pub mod phases;
mod window;

pub use context::Game;
pub use decision_step::{AnswerFn, DecisionStep};
pub use engine::Engine;
pub use window::{ActionWindow, PassTracker, WindowPoll};
