//! Decisions and the input that answers them.
//!
//! - [`DecisionRequest`]: what a waiting step asks a seat
//! - [`Input`]: what comes back
//! - [`AutoDecider`]: legal defaults for unattended seats

mod auto;
mod decision;
mod input;

pub use auto::{AutoDecider, FallbackStrategy};
pub use decision::{DecisionId, DecisionKind, DecisionRequest};
pub use input::{ActionChoice, Input};
