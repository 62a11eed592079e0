// ─────────────────────────────────────────────────────────────────────
// Lorenz-96 GAN Kernel — State Layout
// ─────────────────────────────────────────────────────────────────────
//! Slow/fast variable layout and circular index arithmetic.
//!
//! The slow ring has length K. The fast variables form a single ring of
//! length K·J, with Y_{i,j} stored at flat index `i·J + j`, so the
//! `j±1, j±2` neighbours of a block's edge fall into the adjacent block.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Wrap `i + offset` onto a ring of length `len`.
///
/// `len` must be non-zero.
#[inline]
pub fn ring_index(i: usize, offset: isize, len: usize) -> usize {
    debug_assert!(len > 0, "ring_index on an empty ring");
    let len = len as i64;
    (i as i64 + offset as i64).rem_euclid(len) as usize
}

/// Dimensions of one two-scale state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Slow variable count K.
    pub k: usize,
    /// Fast variables per slow variable J.
    pub j: usize,
}

impl Layout {
    pub fn new(k: usize, j: usize) -> Self {
        Self { k, j }
    }

    #[inline]
    pub fn n_slow(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn n_fast(&self) -> usize {
        self.k * self.j
    }

    /// Total values in one state (slow + fast).
    #[inline]
    pub fn state_len(&self) -> usize {
        self.k + self.k * self.j
    }

    /// Flat position of Y_{i,j} in the fast vector.
    #[inline]
    pub fn fast_flat(&self, i: usize, j: usize) -> usize {
        i * self.j + j
    }

    /// Flat range of the fast block owned by slow index `i`.
    #[inline]
    pub fn fast_block(&self, i: usize) -> Range<usize> {
        i * self.j..(i + 1) * self.j
    }

    /// Slow index `i + offset`, modulo K.
    #[inline]
    pub fn slow_neighbor(&self, i: usize, offset: isize) -> usize {
        ring_index(i, offset, self.k)
    }

    /// Fast flat index `n + offset`, modulo K·J.
    #[inline]
    pub fn fast_neighbor(&self, n: usize, offset: isize) -> usize {
        ring_index(n, offset, self.n_fast())
    }
}
