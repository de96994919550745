//! Effect definitions.
//!
//! An effect is one rule-driven adjustment to one attribute of one piece.
//! Kinds form a closed set; the resolver maps each kind onto a resolution
//! stage (see [`EffectKind::stage`]) and never inspects anything else to
//! decide precedence.

use serde::{Deserialize, Serialize};

use crate::cards::Attribute;
use crate::core::{EngineError, EntityId};

use super::source::AttributeSource;

/// Identifier of an effect within one ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub u32);

impl std::fmt::Display for EffectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Effect({})", self.0)
    }
}

/// How long an effect lasts before the engine expires it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Duration {
    /// Until removed by whoever added it.
    #[default]
    Persistent,
    UntilEndOfConflict,
    UntilEndOfPhase,
    UntilEndOfRound,
}

/// Which records a reinterpretation rule touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordFilter {
    /// Every status token record.
    StatusTokens,
    /// The honored token record.
    Honored,
    /// The dishonored token record.
    Dishonored,
    /// Records with a positive amount, excluding the printed base.
    Bonuses,
    /// Records with a negative amount.
    Penalties,
    /// Records produced by effects from one origin.
    FromOrigin(EntityId),
}

/// Status-driven rewrite of records already on the trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reinterpretation {
    /// Matching records count for nothing.
    Nullify(RecordFilter),
    /// Matching records count with the opposite sign.
    Invert(RecordFilter),
}

impl Reinterpretation {
    /// The filter selecting affected records.
    #[must_use]
    pub const fn filter(self) -> RecordFilter {
        match self {
            Reinterpretation::Nullify(f) | Reinterpretation::Invert(f) => f,
        }
    }
}

/// The closed set of effect kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// The attribute cannot be used (a dash).
    Disable,
    /// Replace the printed base wholesale (copy another piece's printed value).
    CopyBase,
    /// Add to the base value.
    BaseAdditive,
    /// Multiply the running base value.
    BaseMultiplier,
    /// Override the final value; every other record is discarded.
    Set,
    /// Add to the final value.
    Additive,
    /// Rewrite existing records.
    Reinterpret(Reinterpretation),
    /// Multiply the running total at the time the record is appended.
    Multiplicative,
}

/// Resolution stage an effect kind belongs to.
///
/// Declaration order is evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stage {
    Gate,
    Base,
    Override,
    /// Additives and multipliers, interleaved in insertion order.
    Arithmetic,
    Status,
    Reinterpret,
}

impl Stage {
    /// Stages applied on top of the base trail when no override exists.
    pub const AGGREGATE: [Stage; 3] = [Stage::Arithmetic, Stage::Status, Stage::Reinterpret];
}

impl EffectKind {
    /// The stage this kind is applied in.
    #[must_use]
    pub const fn stage(self) -> Stage {
        match self {
            EffectKind::Disable => Stage::Gate,
            EffectKind::CopyBase | EffectKind::BaseAdditive | EffectKind::BaseMultiplier => Stage::Base,
            EffectKind::Set => Stage::Override,
            EffectKind::Additive | EffectKind::Multiplicative => Stage::Arithmetic,
            EffectKind::Reinterpret(_) => Stage::Reinterpret,
        }
    }

    /// Does this kind carry a multiplier rather than an amount?
    #[must_use]
    pub const fn is_multiplier(self) -> bool {
        matches!(self, EffectKind::BaseMultiplier | EffectKind::Multiplicative)
    }
}

/// How an effect's number is produced.
///
/// Rules only read the piece's own printed values, which never change, so
/// the cached base trail stays valid for every rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ValueRule {
    Fixed(f64),
    /// The piece's printed value of another attribute (0 when printed dash).
    PrintedOf(Attribute),
    /// `factor` times a printed value.
    Scaled { attribute: Attribute, factor: f64 },
}

impl ValueRule {
    /// Produce the number for `source`.
    #[must_use]
    pub fn evaluate(&self, source: &AttributeSource) -> f64 {
        match *self {
            ValueRule::Fixed(v) => v,
            ValueRule::PrintedOf(attribute) => source.printed(attribute).unwrap_or(0.0),
            ValueRule::Scaled { attribute, factor } => source.printed(attribute).unwrap_or(0.0) * factor,
        }
    }

    fn constant(&self) -> Option<f64> {
        match *self {
            ValueRule::Fixed(v) => Some(v),
            ValueRule::Scaled { factor, .. } => Some(factor),
            ValueRule::PrintedOf(_) => None,
        }
    }
}

impl From<f64> for ValueRule {
    fn from(v: f64) -> Self {
        ValueRule::Fixed(v)
    }
}

/// One active modification.
///
/// `id` and `sequence` are assigned by the ledger on insertion.
///
/// ```
/// use conflict_rules::cards::Attribute;
/// use conflict_rules::core::EntityId;
/// use conflict_rules::effects::{Effect, EffectKind};
///
/// let effect = Effect::additive(Attribute::Military, 2.0)
///     .from_origin(EntityId(9))
///     .labelled("Fine Katana");
///
/// assert_eq!(effect.kind, EffectKind::Additive);
/// assert_eq!(effect.origin, Some(EntityId(9)));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub id: EffectId,
    pub kind: EffectKind,
    pub attribute: Attribute,
    pub value: ValueRule,
    /// The piece whose card text created this effect, if any.
    pub origin: Option<EntityId>,
    pub label: String,
    pub duration: Duration,
    /// Insertion order within the ledger.
    pub sequence: u64,
}

impl Effect {
    /// Create an effect of any kind.
    pub fn new(kind: EffectKind, attribute: Attribute, value: impl Into<ValueRule>) -> Self {
        Self {
            id: EffectId(0),
            kind,
            attribute,
            value: value.into(),
            origin: None,
            label: String::new(),
            duration: Duration::default(),
            sequence: 0,
        }
    }

    pub fn additive(attribute: Attribute, amount: f64) -> Self {
        Self::new(EffectKind::Additive, attribute, amount)
    }

    pub fn multiplier(attribute: Attribute, factor: f64) -> Self {
        Self::new(EffectKind::Multiplicative, attribute, factor)
    }

    pub fn set(attribute: Attribute, value: f64) -> Self {
        Self::new(EffectKind::Set, attribute, value)
    }

    pub fn base_additive(attribute: Attribute, amount: f64) -> Self {
        Self::new(EffectKind::BaseAdditive, attribute, amount)
    }

    pub fn base_multiplier(attribute: Attribute, factor: f64) -> Self {
        Self::new(EffectKind::BaseMultiplier, attribute, factor)
    }

    /// Replace the printed base with `value` (typically another piece's
    /// printed value).
    pub fn copy_base(attribute: Attribute, value: f64) -> Self {
        Self::new(EffectKind::CopyBase, attribute, value)
    }

    pub fn disable(attribute: Attribute) -> Self {
        Self::new(EffectKind::Disable, attribute, 0.0)
    }

    pub fn nullify(attribute: Attribute, filter: RecordFilter) -> Self {
        Self::new(EffectKind::Reinterpret(Reinterpretation::Nullify(filter)), attribute, 0.0)
    }

    pub fn invert(attribute: Attribute, filter: RecordFilter) -> Self {
        Self::new(EffectKind::Reinterpret(Reinterpretation::Invert(filter)), attribute, 0.0)
    }

    /// Set the originating piece (builder pattern).
    #[must_use]
    pub fn from_origin(mut self, origin: EntityId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the display label (builder pattern).
    #[must_use]
    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Replace the value rule (builder pattern).
    #[must_use]
    pub fn with_value(mut self, value: ValueRule) -> Self {
        self.value = value;
        self
    }

    /// Set the duration (builder pattern).
    #[must_use]
    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Label shown on trail records.
    #[must_use]
    pub fn display_label(&self) -> String {
        if self.label.is_empty() {
            match self.origin {
                Some(origin) => format!("{} from {}", self.id, origin),
                None => self.id.to_string(),
            }
        } else {
            self.label.clone()
        }
    }

    /// Reject effects the resolver cannot apply meaningfully.
    pub fn validate(&self) -> Result<(), EngineError> {
        let malformed = |reason: &str| EngineError::MalformedEffect {
            attribute: self.attribute,
            reason: reason.to_string(),
        };

        if let Some(v) = self.value.constant() {
            if !v.is_finite() {
                return Err(malformed("value is not finite"));
            }
            if self.kind.is_multiplier() && v < 0.0 {
                return Err(malformed("multiplier is negative"));
            }
        }
        Ok(())
    }
}
