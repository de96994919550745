//! Game pieces and the attributes they carry.
//!
//! - [`Attribute`] / [`ConflictType`]: what can be resolved and contested
//! - [`CardInstance`]: a piece on the table with its effect ledger
//!
//! Card content (names, printed values, card text) comes from outside the
//! core; instances are built directly from those values.

mod attributes;
mod instance;

pub use attributes::{Attribute, ConflictType};
pub use instance::{flags, CardInstance, CardKind, Location};
