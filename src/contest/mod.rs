//! Contests: conflicts and duels.
//!
//! [`Conflict`] and [`Duel`] are plain state machines; every operation
//! takes the state it reads as explicit context ([`ContestContext`]).
//! [`ConflictFlow`] and [`DuelFlow`] are the steps that drive them through
//! player decisions.

mod conflict;
mod conflict_flow;
mod duel;
mod duel_flow;
mod rules;

pub use conflict::{Conflict, ConflictOutcome, ConflictState, Side};
pub use conflict_flow::ConflictFlow;
pub use duel::{Duel, DuelOutcome, DuelParticipants, DuelSide};
pub use duel_flow::{DuelFlow, MAX_BID, MIN_BID};
pub use rules::{ContestContext, ContestRules, StandardRules};
