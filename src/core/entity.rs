//! Entity identification.
//!
//! Every game piece that can carry an effect ledger (characters, holdings,
//! provinces, the stronghold) has a unique `EntityId`. Players are not
//! entities here; they are addressed by [`PlayerId`](super::PlayerId).
//!
//! ```
//! use conflict_rules::core::EntityId;
//!
//! let a = EntityId::new(7);
//! assert_eq!(a.raw(), 7);
//! assert_eq!(a.to_string(), "Entity(7)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for any game piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Create an entity ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Hands out sequential entity IDs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntityAllocator {
    next: u32,
}

impl EntityAllocator {
    /// Start allocating from zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next unused ID.
    pub fn alloc(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Make sure `id` is never handed out again.
    ///
    /// Used when pieces are inserted with caller-chosen IDs.
    pub fn reserve(&mut self, id: EntityId) {
        if id.0 >= self.next {
            self.next = id.0 + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", EntityId(42)), "Entity(42)");
    }

    #[test]
    fn test_ordering() {
        assert!(EntityId(1) < EntityId(2));
    }

    #[test]
    fn test_allocator_sequential() {
        let mut alloc = EntityAllocator::new();
        assert_eq!(alloc.alloc(), EntityId(0));
        assert_eq!(alloc.alloc(), EntityId(1));
    }

    #[test]
    fn test_allocator_reserve_skips_taken_ids() {
        let mut alloc = EntityAllocator::new();
        alloc.reserve(EntityId(10));
        assert_eq!(alloc.alloc(), EntityId(11));

        // Reserving something lower changes nothing
        alloc.reserve(EntityId(3));
        assert_eq!(alloc.alloc(), EntityId(12));
    }

    #[test]
    fn test_serialization() {
        let id = EntityId(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
