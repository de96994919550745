//! Numeric effects and their resolution.
//!
//! - [`Effect`]: one adjustment of one attribute (closed set of kinds)
//! - [`EffectLedger`]: per-piece effects in insertion order
//! - [`AttributeSource`]: printed values, status tokens, ledger, cached base
//! - [`Resolver`]: turns a source into a [`Resolution`] (value plus trail)
//!
//! ## Design
//!
//! Effects never delete each other. Overrides (`Set`, `CopyBase`) win by
//! being the last inserted of their kind when an attribute is resolved,
//! and removing the override brings the earlier records back.
//!
//! A disabled attribute is [`StatValue::Disabled`], not 0. Callers choose
//! between arithmetic ([`StatValue::or_zero`]) and eligibility
//! ([`StatValue::is_eligible`]) explicitly.

mod effect;
mod ledger;
mod modifier;
mod resolver;
mod source;

pub use effect::{Duration, Effect, EffectId, EffectKind, RecordFilter, Reinterpretation, Stage, ValueRule};
pub use ledger::EffectLedger;
pub use modifier::{ModifierSource, Resolution, StatModifier, StatValue, StatusToken};
pub use resolver::Resolver;
pub use source::{AttributeSource, PersonalHonor};
