//! Numeric attributes carried by game pieces.
//!
//! - `Military` / `Political`: the two combat skills contested in conflicts
//! - `Glory`: prestige; feeds status token bonuses and the favor count
//! - `Strength`: province defence value
//!
//! [`ConflictType`] names the dimension a conflict is fought in and maps
//! onto the matching skill attribute.

use serde::{Deserialize, Serialize};

/// A resolvable numeric attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Attribute {
    Military,
    Political,
    Glory,
    Strength,
}

impl Attribute {
    /// All attributes, in display order.
    pub const ALL: [Attribute; 4] = [
        Attribute::Military,
        Attribute::Political,
        Attribute::Glory,
        Attribute::Strength,
    ];

    /// Is this one of the two combat skills?
    ///
    /// Status tokens only affect skills.
    #[must_use]
    pub const fn is_skill(self) -> bool {
        matches!(self, Attribute::Military | Attribute::Political)
    }

    /// Lowercase name used in labels and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Attribute::Military => "military",
            Attribute::Political => "political",
            Attribute::Glory => "glory",
            Attribute::Strength => "strength",
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The dimension a conflict is contested in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConflictType {
    Military,
    Political,
}

impl ConflictType {
    /// Both conflict types.
    pub const ALL: [ConflictType; 2] = [ConflictType::Military, ConflictType::Political];

    /// The skill attribute contested by this conflict type.
    #[must_use]
    pub const fn attribute(self) -> Attribute {
        match self {
            ConflictType::Military => Attribute::Military,
            ConflictType::Political => Attribute::Political,
        }
    }
}

impl std::fmt::Display for ConflictType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.attribute().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_attributes() {
        assert!(Attribute::Military.is_skill());
        assert!(Attribute::Political.is_skill());
        assert!(!Attribute::Glory.is_skill());
        assert!(!Attribute::Strength.is_skill());
    }

    #[test]
    fn test_conflict_type_maps_to_skill() {
        for kind in ConflictType::ALL {
            assert!(kind.attribute().is_skill());
        }
        assert_eq!(ConflictType::Political.attribute(), Attribute::Political);
    }

    #[test]
    fn test_display() {
        assert_eq!(Attribute::Glory.to_string(), "glory");
        assert_eq!(ConflictType::Military.to_string(), "military");
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_string(&Attribute::Strength).unwrap();
        let back: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Attribute::Strength);
    }
}
