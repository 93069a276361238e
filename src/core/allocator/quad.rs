//! Quad geometry and quadtree level arithmetic
//!
//! A quad is a square, power-of-two sized region of a page whose top-left
//! corner is aligned to its own size. Level 0 is a whole page; each deeper
//! level halves the side length.

use serde::{Deserialize, Serialize};

/// Round up to the next power of two, `None` for zero or on overflow
pub fn checked_pow2(value: u32) -> Option<u32> {
    if value == 0 {
        return None;
    }
    value.checked_next_power_of_two()
}

/// Exact log2 of a power of two
pub fn log2_exact(value: u32) -> u32 {
    debug_assert!(value.is_power_of_two());
    value.trailing_zeros()
}

/// Side length of the quad that holds a `width` x `height` request
///
/// Callers validate `1 <= width, height <= page_size` first, so the rounding
/// cannot overflow.
pub fn target_size(width: u32, height: u32, min_size: u32) -> u32 {
    width
        .next_power_of_two()
        .max(height.next_power_of_two())
        .max(min_size)
}

/// Quadtree level whose quads have side `size`
pub fn level_for(page_size: u32, size: u32) -> usize {
    log2_exact(page_size / size) as usize
}

/// Side length of quads at `level`
pub fn size_at(page_size: u32, level: usize) -> u32 {
    page_size >> level
}

/// A square free or in-use region of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad {
    /// Index of the page this quad lives on
    pub page: u32,
    pub x: u32,
    pub y: u32,
    /// Side length, always a power of two
    pub size: u32,
}

impl Quad {
    pub fn new(page: u32, x: u32, y: u32, size: u32) -> Self {
        Quad { page, x, y, size }
    }

    /// The level-0 quad covering an entire page
    pub fn whole_page(page: u32, page_size: u32) -> Self {
        Quad::new(page, 0, 0, page_size)
    }

    pub fn area(&self) -> u64 {
        self.size as u64 * self.size as u64
    }

    /// Split into four half-size quadrants
    ///
    /// Order: top-left, top-right, bottom-left, bottom-right. The caller keeps
    /// the first and free-lists the other three.
    pub fn split(&self) -> [Quad; 4] {
        let half = self.size / 2;
        [
            Quad::new(self.page, self.x, self.y, half),
            Quad::new(self.page, self.x + half, self.y, half),
            Quad::new(self.page, self.x, self.y + half, half),
            Quad::new(self.page, self.x + half, self.y + half, half),
        ]
    }

    /// Check that the corner is aligned to the quad's own size
    pub fn is_aligned(&self) -> bool {
        self.size.is_power_of_two() && self.x % self.size == 0 && self.y % self.size == 0
    }

    pub fn overlaps(&self, other: &Quad) -> bool {
        self.page == other.page
            && self.x < other.x + other.size
            && other.x < self.x + self.size
            && self.y < other.y + other.size
            && other.y < self.y + self.size
    }
}
