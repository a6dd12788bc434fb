//! Deterministic random number generation for generated map variants.
//!
//! The engine itself is deterministic given an action sequence; randomness is
//! only used when authoring topologies (`scatter` boards). The same seed always
//! produces the same board, so generated variants can be persisted by name and
//! seed alone.
//!
//! ```
//! use nodewar::core::GameRng;
//!
//! let mut a = GameRng::new(42);
//! let mut b = GameRng::new(42);
//! assert_eq!(a.gen_range_u32(0..100), b.gen_range_u32(0..100));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hash::{Hash, Hasher};

/// Seeded ChaCha8 RNG with context streams.
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

    /// The seed this RNG was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Create an independent stream for a specific context.
    ///
    /// Separates randomness domains (e.g. topology vs. deployment) so that
    /// changing how many draws one domain makes does not shift the other.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        let mut hasher = rustc_hash::FxHasher::default();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a random u32 in the given range.
    pub fn gen_range_u32(&mut self, range: std::ops::Range<u32>) -> u32 {
        self.inner.gen_range(range)
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Generate a random boolean with given probability of true.
    pub fn gen_bool(&mut self, probability: f64) -> bool {
        self.inner.gen_bool(probability)
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = GameRng::new(42);
        let mut rng2 = GameRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_range_u32(0..1000), rng2.gen_range_u32(0..1000));
        }
    }

    #[test]
    fn test_different_seeds() {
        let mut rng1 = GameRng::new(1);
        let mut rng2 = GameRng::new(2);

        let a: Vec<_> = (0..16).map(|_| rng1.gen_range_u32(0..1_000_000)).collect();
        let b: Vec<_> = (0..16).map(|_| rng2.gen_range_u32(0..1_000_000)).collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_context_streams_are_stable() {
        let rng = GameRng::new(7);
        let mut a = rng.for_context("topology");
        let mut b = rng.for_context("topology");
        let mut c = rng.for_context("deployment");

        let xs: Vec<_> = (0..8).map(|_| a.gen_range_u32(0..1000)).collect();
        let ys: Vec<_> = (0..8).map(|_| b.gen_range_u32(0..1000)).collect();
        let zs: Vec<_> = (0..8).map(|_| c.gen_range_u32(0..1000)).collect();
        assert_eq!(xs, ys);
        assert_ne!(xs, zs);
    }

    #[test]
    fn test_shuffle_deterministic() {
        let mut v1: Vec<u32> = (0..20).collect();
        let mut v2 = v1.clone();
        GameRng::new(9).shuffle(&mut v1);
        GameRng::new(9).shuffle(&mut v2);
        assert_eq!(v1, v2);
    }
}
