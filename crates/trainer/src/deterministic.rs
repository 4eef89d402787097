//! Deterministic utilities for reproducible training
//!
//! Provides an LCG-based RNG, seed mixing and split tie-breaking so that a
//! fixed seed and a fixed input order always grow the same forest, whatever
//! the platform or the number of worker threads.

use std::num::Wrapping;

/// 64-bit linear congruential generator (Knuth MMIX constants)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<u64>,
}

impl LcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        Self {
            state: Wrapping(seed),
        }
    }

    /// Independent stream for one tree of a forest
    pub fn for_tree(seed: u64, tree_idx: usize) -> Self {
        Self::new(mix_seed(seed, tree_idx as u64))
    }

    /// Next 32 random bits (the high half of the state)
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        (self.state.0 >> 32) as u32
    }

    /// Uniform value in `[0, max)`; 0 when `max == 0`
    pub fn next_below(&mut self, max: usize) -> usize {
        if max == 0 {
            return 0;
        }
        let wide = ((self.next_u32() as u64) << 32) | self.next_u32() as u64;
        (wide % max as u64) as usize
    }

    /// In-place Fisher-Yates shuffle
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_below(i + 1);
            items.swap(i, j);
        }
    }

    /// `n` row indices drawn with replacement from `0..n`
    pub fn bootstrap_indices(&mut self, n: usize) -> Vec<usize> {
        (0..n).map(|_| self.next_below(n)).collect()
    }
}

/// Derive a well-spread seed for `stream` from a base seed
/// (xxhash64-style avalanche in wrapping arithmetic)
pub fn mix_seed(seed: u64, stream: u64) -> u64 {
    const PRIME1: u64 = 0x9E3779B185EBCA87;
    const PRIME2: u64 = 0xC2B2AE3D27D4EB4F;
    const PRIME3: u64 = 0x165667B19E3779F9;
    const PRIME5: u64 = 0x85EBCA77C2B2AE63;

    let mut h = seed.wrapping_add(PRIME5);
    h = h.wrapping_add(stream.wrapping_mul(PRIME3));
    h = h.rotate_left(17).wrapping_mul(PRIME2);

    h ^= h >> 33;
    h = h.wrapping_mul(PRIME1);
    h ^= h >> 29;
    h = h.wrapping_mul(PRIME2);
    h ^= h >> 32;

    h
}

/// Deterministic tie-breaker for split selection: among equal gains the
/// lowest `(feature_idx, threshold)` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold: i64,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: i64) -> Self {
        Self {
            feature_idx,
            threshold,
        }
    }
}
