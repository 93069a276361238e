//! Quadtree (buddy-style) quad allocator
//!
//! Requests are rounded up to a power-of-two quad. The search walks the free
//! lists from the exact level towards level 0 and takes the front of the first
//! non-empty list. A coarser quad is cut down by repeated four-way splits:
//! the top-left quadrant is kept and its three siblings go to the free list one
//! level deeper. When nothing fits, a new page is appended.
//!
//! Released quads go back to their own level. Siblings are never merged.

use crate::core::allocator::freelist::FreeLists;
use crate::core::allocator::quad::{level_for, target_size, Quad};
use crate::core::allocator::QuadAllocator;
use crate::core::error::{AtlasError, Result};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct QuadTreeAllocator {
    /// Side of every page, a power of two
    page_size: u32,

    /// Smallest quad side, a power of two
    min_size: u32,

    free: FreeLists,

    /// Pages created so far
    page_count: u32,

    /// Area of quads currently handed out
    used_area: u64,
}

impl QuadTreeAllocator {
    /// Create an allocator for already-normalized sizes
    ///
    /// `page_size` and `min_size` must both be powers of two with
    /// `page_size >= min_size`; `AtlasConfig::normalized` guarantees this.
    pub fn new(page_size: u32, min_size: u32) -> Self {
        debug_assert!(page_size.is_power_of_two() && min_size.is_power_of_two());
        debug_assert!(page_size >= min_size);

        let level_count = level_for(page_size, min_size) + 1;
        QuadTreeAllocator {
            page_size,
            min_size,
            free: FreeLists::new(level_count),
            page_count: 0,
            used_area: 0,
        }
    }

    /// Free quads per level, level 0 first
    pub fn free_quads_per_level(&self) -> Vec<usize> {
        self.free.lens()
    }

    pub fn free_quads(&self) -> impl Iterator<Item = &Quad> {
        self.free.iter()
    }

    /// Reject requests before any state is touched
    pub fn check_request(&self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(AtlasError::InvalidRequest(format!(
                "image dimensions must be positive, got {}x{}",
                width, height
            )));
        }

        if width > self.page_size || height > self.page_size {
            return Err(AtlasError::ImageTooLarge {
                width,
                height,
                page_size: self.page_size,
            });
        }

        Ok(())
    }

    /// Cut `quad` (sitting at `level`) down to side `target`
    fn decompose(&mut self, mut quad: Quad, mut level: usize, target: u32) -> Quad {
        while quad.size > target {
            level += 1;
            let [keep, rest @ ..] = quad.split();
            for sibling in rest {
                self.free.push(level, sibling);
            }
            quad = keep;
        }
        quad
    }

    fn grow(&mut self) -> Quad {
        let page = self.page_count;
        self.page_count += 1;
        info!(
            "Growing atlas: {} -> {} pages ({}x{})",
            page, self.page_count, self.page_size, self.page_size
        );
        Quad::whole_page(page, self.page_size)
    }
}

impl QuadAllocator for QuadTreeAllocator {
    fn allocate(&mut self, width: u32, height: u32) -> Result<Quad> {
        self.check_request(width, height)?;

        let target = target_size(width, height, self.min_size);
        let level = level_for(self.page_size, target);

        let quad = match self.free.pop_coarser(level) {
            Some((found, quad)) => {
                debug!(
                    "Reusing free quad {:?} from level {} for level {}",
                    quad, found, level
                );
                self.decompose(quad, found, target)
            }
            None => {
                let page = self.grow();
                self.decompose(page, 0, target)
            }
        };

        self.used_area += quad.area();
        Ok(quad)
    }

    fn release(&mut self, quad: Quad) -> Result<()> {
        if quad.page >= self.page_count
            || !quad.is_aligned()
            || quad.size < self.min_size
            || quad.size > self.page_size
            || quad.x + quad.size > self.page_size
            || quad.y + quad.size > self.page_size
        {
            return Err(AtlasError::InvalidRequest(format!(
                "quad {:?} was not handed out by this allocator",
                quad
            )));
        }

        let level = level_for(self.page_size, quad.size);
        if self.free.contains(level, &quad) {
            warn!("Double release detected for quad {:?}", quad);
            return Ok(());
        }

        self.free.push(level, quad);
        self.used_area -= quad.area();
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.page_count as usize
    }

    fn free_area(&self) -> u64 {
        self.free.free_area()
    }

    fn used_area(&self) -> u64 {
        self.used_area
    }

    fn total_area(&self) -> u64 {
        self.page_count as u64 * self.page_size as u64 * self.page_size as u64
    }
}
