//! Attribute sources: printed values, status tokens and the effect ledger
//! of one piece, plus its cached base trails.
//!
//! ## Caching
//!
//! The base trail (printed or copied value, base additives, base
//! multipliers) only depends on printed values and the ledger. It is
//! computed once per attribute and reused until a ledger mutation or a
//! printed value change clears the cache. Status tokens are applied after
//! the base trail and never touch the cache.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cards::Attribute;
use crate::core::{EngineError, EntityId};

use super::effect::{Duration, Effect, EffectId};
use super::ledger::EffectLedger;
use super::modifier::StatModifier;
use super::resolver::build_base_trail;

/// Personal honor of a piece. Honored and dishonored are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonalHonor {
    #[default]
    Ordinary,
    Honored,
    Dishonored,
}

/// Everything the resolver reads for one piece.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttributeSource {
    owner: EntityId,
    printed: FxHashMap<Attribute, f64>,
    ledger: EffectLedger,
    honor: PersonalHonor,
    tainted: bool,
    #[serde(skip)]
    base_cache: RefCell<FxHashMap<Attribute, Option<Vec<StatModifier>>>>,
}

impl AttributeSource {
    /// Source with no printed values and an empty ledger.
    #[must_use]
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            printed: FxHashMap::default(),
            ledger: EffectLedger::new(),
            honor: PersonalHonor::Ordinary,
            tainted: false,
            base_cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// The piece this source belongs to.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Printed value, `None` for a printed dash.
    #[must_use]
    pub fn printed(&self, attribute: Attribute) -> Option<f64> {
        self.printed.get(&attribute).copied()
    }

    pub fn set_printed(&mut self, attribute: Attribute, value: f64) {
        self.printed.insert(attribute, value);
        self.invalidate();
    }

    /// Make the printed value a dash.
    pub fn clear_printed(&mut self, attribute: Attribute) {
        self.printed.remove(&attribute);
        self.invalidate();
    }

    #[must_use]
    pub fn ledger(&self) -> &EffectLedger {
        &self.ledger
    }

    #[must_use]
    pub fn honor(&self) -> PersonalHonor {
        self.honor
    }

    pub fn set_honor(&mut self, honor: PersonalHonor) {
        self.honor = honor;
    }

    #[must_use]
    pub fn is_tainted(&self) -> bool {
        self.tainted
    }

    pub fn set_tainted(&mut self, tainted: bool) {
        self.tainted = tainted;
    }

    /// Add an effect to the ledger.
    pub fn add_effect(&mut self, effect: Effect) -> Result<EffectId, EngineError> {
        let id = self.ledger.add(effect)?;
        self.invalidate();
        Ok(id)
    }

    pub fn remove_effect(&mut self, id: EffectId) -> Option<Effect> {
        let removed = self.ledger.remove(id);
        if removed.is_some() {
            self.invalidate();
        }
        removed
    }

    pub fn remove_effects_from(&mut self, origin: EntityId) -> Vec<Effect> {
        let removed = self.ledger.remove_from_origin(origin);
        if !removed.is_empty() {
            self.invalidate();
        }
        removed
    }

    pub fn expire(&mut self, duration: Duration) -> Vec<Effect> {
        let removed = self.ledger.expire(duration);
        if !removed.is_empty() {
            self.invalidate();
        }
        removed
    }

    /// The base trail for `attribute`, or `None` for an uncopied printed
    /// dash.
    #[must_use]
    pub fn base_trail(&self, attribute: Attribute) -> Option<Vec<StatModifier>> {
        if let Some(cached) = self.base_cache.borrow().get(&attribute) {
            return cached.clone();
        }
        let trail = build_base_trail(self, attribute);
        self.base_cache.borrow_mut().insert(attribute, trail.clone());
        trail
    }

    /// Is a base trail for `attribute` currently cached?
    #[must_use]
    pub fn is_base_cached(&self, attribute: Attribute) -> bool {
        self.base_cache.borrow().contains_key(&attribute)
    }

    fn invalidate(&mut self) {
        self.base_cache.get_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> AttributeSource {
        let mut source = AttributeSource::new(EntityId(1));
        source.set_printed(Attribute::Military, 3.0);
        source
    }

    #[test]
    fn test_base_trail_cached_until_mutation() {
        let mut source = source();
        assert!(!source.is_base_cached(Attribute::Military));

        let first = source.base_trail(Attribute::Military);
        assert!(source.is_base_cached(Attribute::Military));
        assert_eq!(source.base_trail(Attribute::Military), first);

        source.add_effect(Effect::base_additive(Attribute::Military, 1.0)).unwrap();
        assert!(!source.is_base_cached(Attribute::Military));

        let trail = source.base_trail(Attribute::Military).unwrap();
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn test_status_change_keeps_cache() {
        let mut source = source();
        let _ = source.base_trail(Attribute::Military);

        source.set_honor(PersonalHonor::Honored);
        source.set_tainted(true);
        assert!(source.is_base_cached(Attribute::Military));
    }

    #[test]
    fn test_failed_add_keeps_cache() {
        let mut source = source();
        let _ = source.base_trail(Attribute::Military);

        assert!(source.add_effect(Effect::additive(Attribute::Military, f64::NAN)).is_err());
        assert!(source.is_base_cached(Attribute::Military));
    }

    #[test]
    fn test_printed_dash() {
        let mut source = source();
        assert_eq!(source.base_trail(Attribute::Political), None);

        source.clear_printed(Attribute::Military);
        assert_eq!(source.printed(Attribute::Military), None);
        assert_eq!(source.base_trail(Attribute::Military), None);
    }

    #[test]
    fn test_remove_effects_from_origin() {
        let mut source = source();
        source
            .add_effect(Effect::additive(Attribute::Military, 1.0).from_origin(EntityId(8)))
            .unwrap();
        assert_eq!(source.remove_effects_from(EntityId(8)).len(), 1);
        assert!(source.ledger().is_empty());
    }

    #[test]
    fn test_serialization_drops_cache() {
        let source = source();
        let _ = source.base_trail(Attribute::Military);

        let json = serde_json::to_string(&source).unwrap();
        let back: AttributeSource = serde_json::from_str(&json).unwrap();
        assert!(!back.is_base_cached(Attribute::Military));
        assert_eq!(back.printed(Attribute::Military), Some(3.0));
    }
}
