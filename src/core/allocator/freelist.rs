//! Per-level FIFO free lists
//!
//! One queue per quadtree level. Pops take the front (oldest entry); pushes
//! append to the back.

use crate::core::allocator::quad::Quad;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct FreeLists {
    levels: Vec<VecDeque<Quad>>,
}

impl FreeLists {
    pub fn new(level_count: usize) -> Self {
        FreeLists {
            levels: vec![VecDeque::new(); level_count],
        }
    }

    pub fn push(&mut self, level: usize, quad: Quad) {
        self.levels[level].push_back(quad);
    }

    /// Pop the oldest quad from the deepest non-empty level in `0..=level`
    ///
    /// Returns the level the quad came from along with the quad.
    pub fn pop_coarser(&mut self, level: usize) -> Option<(usize, Quad)> {
        (0..=level)
            .rev()
            .find_map(|i| self.levels[i].pop_front().map(|quad| (i, quad)))
    }

    /// True when every level in `0..=level` is empty
    pub fn exhausted(&self, level: usize) -> bool {
        self.levels[..=level].iter().all(VecDeque::is_empty)
    }

    pub fn len_at(&self, level: usize) -> usize {
        self.levels[level].len()
    }

    pub fn lens(&self) -> Vec<usize> {
        self.levels.iter().map(VecDeque::len).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quad> {
        self.levels.iter().flatten()
    }

    /// Total area of all free quads
    pub fn free_area(&self) -> u64 {
        self.iter().map(Quad::area).sum()
    }

    pub fn contains(&self, level: usize, quad: &Quad) -> bool {
        self.levels[level].contains(quad)
    }
}
