//! Per-piece ordered collection of active effects.
//!
//! Insertion order matters for every "last wins" and "in order" rule, so
//! the ledger hands out a monotonically increasing sequence number and
//! never reorders. Backed by `im::Vector` so cloning a whole game state
//! stays cheap.

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cards::Attribute;
use crate::core::{EngineError, EntityId};

use super::effect::{Duration, Effect, EffectId};

/// Active effects for one piece, in insertion order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EffectLedger {
    effects: Vector<Effect>,
    next_id: u32,
    next_sequence: u64,
}

impl EffectLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an effect, assigning its id and sequence.
    ///
    /// Malformed effects are rejected and never reach the ledger.
    pub fn add(&mut self, mut effect: Effect) -> Result<EffectId, EngineError> {
        if let Err(err) = effect.validate() {
            warn!(%err, label = %effect.label, "rejected effect");
            return Err(err);
        }

        effect.id = EffectId(self.next_id);
        effect.sequence = self.next_sequence;
        self.next_id += 1;
        self.next_sequence += 1;

        debug!(id = %effect.id, kind = ?effect.kind, attribute = %effect.attribute, "effect added");
        let id = effect.id;
        self.effects.push_back(effect);
        Ok(id)
    }

    /// Remove one effect. Returns it if it was present.
    pub fn remove(&mut self, id: EffectId) -> Option<Effect> {
        let index = self.effects.iter().position(|e| e.id == id)?;
        Some(self.effects.remove(index))
    }

    /// Remove every effect matching `pred`, returning them in order.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&Effect) -> bool) -> Vec<Effect> {
        let (removed, kept): (Vector<Effect>, Vector<Effect>) =
            self.effects.iter().cloned().partition(|e| pred(e));
        self.effects = kept;
        removed.into_iter().collect()
    }

    /// Remove every effect created by `origin`.
    pub fn remove_from_origin(&mut self, origin: EntityId) -> Vec<Effect> {
        self.remove_where(|e| e.origin == Some(origin))
    }

    /// Remove every effect with the given duration.
    pub fn expire(&mut self, duration: Duration) -> Vec<Effect> {
        self.remove_where(|e| e.duration == duration)
    }

    /// Effects targeting `attribute`, in insertion order.
    pub fn for_attribute(&self, attribute: Attribute) -> impl Iterator<Item = &Effect> {
        self.effects.iter().filter(move |e| e.attribute == attribute)
    }

    /// Look up an effect.
    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&Effect> {
        self.effects.iter().find(|e| e.id == id)
    }

    /// All effects, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}
