//! Pluggable contest predicates and the context every contest operation
//! reads from.

use crate::cards::{flags, CardInstance};
use crate::core::{EngineConfig, GameState};
use crate::effects::Resolver;

use super::conflict::Conflict;
use super::duel::Duel;

/// Rule content that can veto contributions and duel losses.
///
/// The defaults read the well-known card flags; formats with extra
/// restrictions implement the trait themselves.
pub trait ContestRules {
    /// Is `card` barred from adding its skill to `conflict`?
    fn cannot_contribute(&self, card: &CardInstance, _conflict: &Conflict) -> bool {
        card.has_flag(flags::CANNOT_CONTRIBUTE)
    }

    /// May `card` be recorded as a loser of `duel`?
    fn may_lose_duel(&self, card: &CardInstance, _duel: &Duel) -> bool {
        !card.has_flag(flags::CANNOT_LOSE_DUELS)
    }
}

/// The standard ruleset: flags only.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardRules;

impl ContestRules for StandardRules {}

/// Everything a contest reads. Passed explicitly; contests never look up
/// "the current conflict" anywhere.
#[derive(Clone, Copy)]
pub struct ContestContext<'a> {
    pub state: &'a GameState,
    pub resolver: &'a Resolver,
    pub rules: &'a dyn ContestRules,
    pub config: &'a EngineConfig,
}

impl<'a> ContestContext<'a> {
    pub fn new(
        state: &'a GameState,
        resolver: &'a Resolver,
        rules: &'a dyn ContestRules,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            state,
            resolver,
            rules,
            config,
        }
    }
}

impl std::fmt::Debug for ContestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContestContext")
            .field("round", &self.state.round)
            .field("resolver", self.resolver)
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}
