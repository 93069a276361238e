//! Quad allocation for atlas pages
//!
//! - [`quad`] - quad geometry and level arithmetic
//! - [`freelist`] - per-level FIFO free lists
//! - [`quadtree`] - buddy-style quadtree allocator (the one the atlas uses)

pub mod freelist;
pub mod quad;
pub mod quadtree;

use crate::core::error::Result;
use quad::Quad;

/// Quad allocator trait
///
/// Hands out square regions of fixed-size pages. Pages are counted, not
/// owned: whoever holds the pixel buffers grows them when `page_count` rises.
pub trait QuadAllocator {
    /// Allocate a quad large enough for a `width` x `height` request
    ///
    /// Fails without side effects on zero or oversized dimensions.
    fn allocate(&mut self, width: u32, height: u32) -> Result<Quad>;

    /// Return a previously allocated quad to the free lists
    fn release(&mut self, quad: Quad) -> Result<()>;

    /// Number of pages created so far
    fn page_count(&self) -> usize;

    /// Area of all free quads
    fn free_area(&self) -> u64;

    /// Area of all allocated quads
    fn used_area(&self) -> u64;

    /// Area of all pages
    fn total_area(&self) -> u64;
}
