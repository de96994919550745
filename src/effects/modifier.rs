//! Resolution output: modifier records and resolved values.

use serde::{Deserialize, Serialize};

use crate::core::EntityId;

use super::effect::EffectId;

/// Status tokens a piece can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusToken {
    Honored,
    Dishonored,
    Tainted,
}

impl StatusToken {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusToken::Honored => "honored",
            StatusToken::Dishonored => "dishonored",
            StatusToken::Tainted => "tainted",
        }
    }
}

/// Where a record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierSource {
    /// The piece's printed value.
    Printed(EntityId),
    /// An effect in the ledger.
    Effect {
        effect: EffectId,
        origin: Option<EntityId>,
    },
    /// A status token on the piece.
    Status(StatusToken),
}

/// One line of the audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatModifier {
    pub amount: f64,
    pub label: String,
    pub source: ModifierSource,
    /// Set only on the record of a final-value override.
    pub overrides: bool,
}

impl StatModifier {
    #[must_use]
    pub fn new(amount: f64, label: impl Into<String>, source: ModifierSource) -> Self {
        Self {
            amount,
            label: label.into(),
            source,
            overrides: false,
        }
    }

    #[must_use]
    pub fn overriding(mut self) -> Self {
        self.overrides = true;
        self
    }

    /// Is this record produced by a status token?
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self.source, ModifierSource::Status(_))
    }

    /// Is this the printed base record?
    #[must_use]
    pub fn is_printed(&self) -> bool {
        matches!(self.source, ModifierSource::Printed(_))
    }
}

/// A resolved attribute value.
///
/// `Disabled` is not zero. Arithmetic reads it through [`StatValue::or_zero`];
/// participation checks read it through [`StatValue::is_eligible`].
///
/// ```
/// use conflict_rules::effects::StatValue;
///
/// assert_eq!(StatValue::Disabled.or_zero(), 0.0);
/// assert!(!StatValue::Disabled.is_eligible());
/// assert!(StatValue::Amount(0.0).is_eligible());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatValue {
    Amount(f64),
    Disabled,
}

impl StatValue {
    /// The amount, with a disabled attribute counting as 0.
    #[must_use]
    pub fn or_zero(self) -> f64 {
        match self {
            StatValue::Amount(v) => v,
            StatValue::Disabled => 0.0,
        }
    }

    /// Can this attribute be used in a comparison at all?
    #[must_use]
    pub fn is_eligible(self) -> bool {
        matches!(self, StatValue::Amount(_))
    }

    /// The amount, if not disabled.
    #[must_use]
    pub fn amount(self) -> Option<f64> {
        match self {
            StatValue::Amount(v) => Some(v),
            StatValue::Disabled => None,
        }
    }
}

/// Value plus the records that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub value: StatValue,
    pub trail: Vec<StatModifier>,
}

impl Resolution {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            value: StatValue::Disabled,
            trail: Vec::new(),
        }
    }

    /// Sum of the trail, ignoring any floor.
    #[must_use]
    pub fn trail_sum(&self) -> f64 {
        self.trail.iter().map(|m| m.amount).sum()
    }
}
