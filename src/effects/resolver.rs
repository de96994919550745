//! Modifier resolution.
//!
//! Turns a piece's printed values, status tokens and ledger into a final
//! value plus the audit trail that produced it. Precedence is fixed:
//!
//! 1. any `Disable` effect, or an uncopied printed dash, gives
//!    [`StatValue::Disabled`]
//! 2. the base trail (printed or last copied value, then base additives
//!    and base multipliers in insertion order)
//! 3. the last `Set` effect, alone, if there is one
//! 4. otherwise the base trail followed by the aggregate stages: additives
//!    and multipliers in insertion order, status tokens, then
//!    reinterpretation
//! 5. the sum, floored at 0 unless asked otherwise
//!
//! A multiplier appends `(factor - 1) * running total` at the point it was
//! inserted, so it scales what came before it and nothing after.
//!
//! Each aggregate stage is dispatched through a per-stage handler; the order
//! is [`Stage::AGGREGATE`].
//!
//! ```
//! use conflict_rules::cards::Attribute;
//! use conflict_rules::core::EntityId;
//! use conflict_rules::effects::{AttributeSource, Effect, Resolver, StatValue};
//!
//! let mut source = AttributeSource::new(EntityId(0));
//! source.set_printed(Attribute::Military, 10.0);
//! source.add_effect(Effect::multiplier(Attribute::Military, 2.0)).unwrap();
//! source.add_effect(Effect::additive(Attribute::Military, 5.0)).unwrap();
//!
//! // 10 * 2 + 5
//! let resolver = Resolver::default();
//! assert_eq!(resolver.value(&source, Attribute::Military), StatValue::Amount(25.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::cards::Attribute;
use crate::core::EngineConfig;

use super::effect::{Effect, EffectKind, RecordFilter, Reinterpretation, Stage};
use super::modifier::{ModifierSource, Resolution, StatModifier, StatValue, StatusToken};
use super::source::{AttributeSource, PersonalHonor};

type Handler = fn(&Resolver, &mut Pass<'_>);

/// Working state while one attribute is resolved.
struct Pass<'a> {
    source: &'a AttributeSource,
    attribute: Attribute,
    effects: &'a [&'a Effect],
    trail: Vec<StatModifier>,
}

impl Pass<'_> {
    fn running_total(&self) -> f64 {
        self.trail.iter().map(|m| m.amount).sum()
    }
}

fn of_kind<'a>(effects: &'a [&'a Effect], stage: Stage) -> impl Iterator<Item = &'a Effect> + 'a {
    effects.iter().copied().filter(move |e| e.kind.stage() == stage)
}

/// Computes resolved values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resolver {
    /// Skill added by the tainted token.
    pub tainted_bonus: f64,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Resolver {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            tainted_bonus: config.tainted_bonus,
        }
    }

    /// Resolve with the result floored at 0.
    #[must_use]
    pub fn resolve(&self, source: &AttributeSource, attribute: Attribute) -> Resolution {
        self.resolve_inner(source, attribute, true)
    }

    /// Resolve without the floor.
    #[must_use]
    pub fn resolve_unfloored(&self, source: &AttributeSource, attribute: Attribute) -> Resolution {
        self.resolve_inner(source, attribute, false)
    }

    /// Just the floored value.
    #[must_use]
    pub fn value(&self, source: &AttributeSource, attribute: Attribute) -> StatValue {
        self.resolve(source, attribute).value
    }

    fn resolve_inner(&self, source: &AttributeSource, attribute: Attribute, floor: bool) -> Resolution {
        let effects: Vec<&Effect> = source.ledger().for_attribute(attribute).collect();

        if effects.iter().any(|e| e.kind.stage() == Stage::Gate) {
            return Resolution::disabled();
        }
        let Some(base) = source.base_trail(attribute) else {
            return Resolution::disabled();
        };

        if let Some(set) = effects.iter().rev().find(|e| e.kind.stage() == Stage::Override) {
            let record = StatModifier::new(set.value.evaluate(source), set.display_label(), origin_of(set)).overriding();
            return finish(vec![record], floor);
        }

        let mut pass = Pass {
            source,
            attribute,
            effects: &effects,
            trail: base,
        };
        for stage in Stage::AGGREGATE {
            Self::handler(stage)(self, &mut pass);
        }
        finish(pass.trail, floor)
    }

    /// Handler for one aggregate stage.
    fn handler(stage: Stage) -> Handler {
        match stage {
            Stage::Arithmetic => Self::apply_arithmetic,
            Stage::Status => Self::apply_status,
            Stage::Reinterpret => Self::apply_reinterpret,
            Stage::Gate | Stage::Base | Stage::Override => Self::apply_nothing,
        }
    }

    fn apply_nothing(&self, _pass: &mut Pass<'_>) {}

    fn apply_arithmetic(&self, pass: &mut Pass<'_>) {
        for effect in of_kind(pass.effects, Stage::Arithmetic) {
            let value = effect.value.evaluate(pass.source);
            let record = if effect.kind.is_multiplier() {
                StatModifier::new(
                    (value - 1.0) * pass.running_total(),
                    format!("x{} ({})", value, effect.display_label()),
                    origin_of(effect),
                )
            } else {
                StatModifier::new(value, effect.display_label(), origin_of(effect))
            };
            pass.trail.push(record);
        }
    }

    fn apply_status(&self, pass: &mut Pass<'_>) {
        if !pass.attribute.is_skill() {
            return;
        }
        let source = pass.source;

        let honor = match source.honor() {
            PersonalHonor::Ordinary => None,
            PersonalHonor::Honored => Some((StatusToken::Honored, 1.0)),
            PersonalHonor::Dishonored => Some((StatusToken::Dishonored, -1.0)),
        };
        if let Some((token, sign)) = honor {
            let glory = self.value(source, Attribute::Glory).or_zero();
            pass.trail
                .push(StatModifier::new(sign * glory, token.as_str(), ModifierSource::Status(token)));
        }

        if source.is_tainted() {
            pass.trail.push(StatModifier::new(
                self.tainted_bonus,
                StatusToken::Tainted.as_str(),
                ModifierSource::Status(StatusToken::Tainted),
            ));
        }
    }

    fn apply_reinterpret(&self, pass: &mut Pass<'_>) {
        let rules: Vec<Reinterpretation> = of_kind(pass.effects, Stage::Reinterpret)
            .filter_map(|e| match e.kind {
                EffectKind::Reinterpret(rule) => Some(rule),
                _ => None,
            })
            .collect();

        for rule in rules {
            for record in pass.trail.iter_mut().filter(|m| matches_filter(m, rule.filter())) {
                match rule {
                    Reinterpretation::Nullify(_) => {
                        record.amount = 0.0;
                        record.label = format!("{} (nullified)", record.label);
                    }
                    Reinterpretation::Invert(_) => {
                        record.amount = -record.amount;
                        record.label = format!("{} (inverted)", record.label);
                    }
                }
            }
        }
    }
}

/// Base trail for `attribute`, `None` when the printed value is a dash and
/// nothing copies a base over it.
pub(crate) fn build_base_trail(source: &AttributeSource, attribute: Attribute) -> Option<Vec<StatModifier>> {
    let effects: Vec<&Effect> = source.ledger().for_attribute(attribute).collect();

    let first = match effects.iter().rev().find(|e| e.kind == EffectKind::CopyBase) {
        Some(copy) => StatModifier::new(
            copy.value.evaluate(source),
            format!("base {} ({})", attribute, copy.display_label()),
            origin_of(copy),
        ),
        None => {
            let printed = source.printed(attribute)?;
            StatModifier::new(printed, format!("printed {attribute}"), ModifierSource::Printed(source.owner()))
        }
    };

    let mut trail = vec![first];
    for effect in effects {
        match effect.kind {
            EffectKind::BaseAdditive => trail.push(StatModifier::new(
                effect.value.evaluate(source),
                effect.display_label(),
                origin_of(effect),
            )),
            EffectKind::BaseMultiplier => {
                let factor = effect.value.evaluate(source);
                let running: f64 = trail.iter().map(|m| m.amount).sum();
                trail.push(StatModifier::new(
                    (factor - 1.0) * running,
                    format!("base x{} ({})", factor, effect.display_label()),
                    origin_of(effect),
                ));
            }
            _ => {}
        }
    }
    Some(trail)
}

fn origin_of(effect: &Effect) -> ModifierSource {
    ModifierSource::Effect {
        effect: effect.id,
        origin: effect.origin,
    }
}

fn matches_filter(record: &StatModifier, filter: RecordFilter) -> bool {
    match filter {
        RecordFilter::StatusTokens => record.is_status(),
        RecordFilter::Honored => record.source == ModifierSource::Status(StatusToken::Honored),
        RecordFilter::Dishonored => record.source == ModifierSource::Status(StatusToken::Dishonored),
        RecordFilter::Bonuses => !record.is_printed() && record.amount > 0.0,
        RecordFilter::Penalties => record.amount < 0.0,
        RecordFilter::FromOrigin(id) => {
            matches!(record.source, ModifierSource::Effect { origin: Some(origin), .. } if origin == id)
        }
    }
}

fn finish(trail: Vec<StatModifier>, floor: bool) -> Resolution {
    let sum: f64 = trail.iter().map(|m| m.amount).sum();
    let value = if floor { sum.max(0.0) } else { sum };
    Resolution {
        value: StatValue::Amount(value),
        trail,
    }
}
