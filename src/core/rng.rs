//! Deterministic random number generation.
//!
//! The rules core itself is deterministic; randomness is only used to pick
//! default answers for seats nobody is driving (timeouts, soak tests).
//! Each seat gets an independent stream so answers for one seat never
//! shift the sequence seen by the other.
//!
//! ```
//! use conflict_rules::core::{GameRng, PlayerId};
//!
//! let mut a = GameRng::new(42).for_seat(PlayerId::FIRST);
//! let mut b = GameRng::new(42).for_seat(PlayerId::FIRST);
//! assert_eq!(a.pick_index(10), b.pick_index(10));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::PlayerId;

/// Seeded ChaCha8 stream.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Independent stream for one seat.
    #[must_use]
    pub fn for_seat(&self, player: PlayerId) -> Self {
        let seat_seed = self
            .seed
            .wrapping_add((player.index() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        Self::new(seat_seed)
    }

    /// Pick an index in `0..len`, or `None` when there is nothing to pick.
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            None
        } else {
            Some(self.inner.gen_range(0..len))
        }
    }

    /// Uniform integer in `low..=high`.
    pub fn gen_inclusive(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        self.inner.gen_range(low..=high)
    }

    /// Choose a random subset of `items`, preserving their order.
    pub fn subset<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .filter(|_| self.inner.gen_bool(0.5))
            .cloned()
            .collect()
    }
}
