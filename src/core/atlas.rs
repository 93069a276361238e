//! The atlas allocator
//!
//! Owns the page buffers, the quadtree free lists and the dedup cache. Each
//! [`AtlasAllocator::load`] either returns the cached placement for its key or
//! carves a power-of-two quad out of the free lists (growing a page if none
//! fits), copies the pixels in and records the result.
//!
//! The allocator is a plain single-threaded data structure. Wrap it in
//! [`crate::SharedAtlas`] to share it between threads.

use crate::core::allocator::quad::{target_size, Quad};
use crate::core::allocator::quadtree::QuadTreeAllocator;
use crate::core::allocator::QuadAllocator;
use crate::core::cache::PlacementCache;
use crate::core::config::AtlasConfig;
use crate::core::consumer::{ImageSource, PageConsumer, PageLayout};
use crate::core::error::{AtlasError, Result};
use crate::core::manifest::AtlasManifest;
use crate::core::page::Page;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Where an image was written
///
/// `size` is the caller's original request; the quad reserved behind it may
/// be larger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Page index
    pub page: u32,
    /// Top-left texel inside the page
    pub offset: (u32, u32),
    /// `(width, height)` of the image
    pub size: (u32, u32),
}

impl Placement {
    pub fn new(page: u32, offset: (u32, u32), size: (u32, u32)) -> Self {
        Placement { page, offset, size }
    }

    /// Side of the quad reserved for this placement
    pub fn quad_size(&self, min_size: u32) -> u32 {
        target_size(self.size.0, self.size.1, min_size)
    }

    /// The quad reserved for this placement
    pub fn quad(&self, min_size: u32) -> Quad {
        Quad::new(
            self.page,
            self.offset.0,
            self.offset.1,
            self.quad_size(min_size),
        )
    }

    /// Texels covered by the image itself
    pub fn area(&self) -> u64 {
        self.size.0 as u64 * self.size.1 as u64
    }

    /// Normalized `[u0, v0, u1, v1]` for sampling the image from its page
    pub fn uv_rect(&self, page_side: u32) -> [f32; 4] {
        let side = page_side as f32;
        [
            self.offset.0 as f32 / side,
            self.offset.1 as f32 / side,
            (self.offset.0 + self.size.0) as f32 / side,
            (self.offset.1 + self.size.1) as f32 / side,
        ]
    }

    /// True if both images share texels on the same page
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.page == other.page
            && self.offset.0 < other.offset.0 + other.size.0
            && other.offset.0 < self.offset.0 + self.size.0
            && self.offset.1 < other.offset.1 + other.size.1
            && other.offset.1 < self.offset.1 + self.size.1
    }
}

/// Snapshot of atlas occupancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasStats {
    pub page_count: usize,
    pub page_size: u32,
    pub min_size: u32,
    /// Live placements
    pub placements: usize,
    /// Area of quads reserved for live placements
    pub used_area: u64,
    /// Area of free quads
    pub free_area: u64,
    /// Area actually covered by images
    pub requested_area: u64,
    /// Free quads per level, level 0 first
    pub free_quads_per_level: Vec<usize>,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl AtlasStats {
    /// Area of all pages
    pub fn total_area(&self) -> u64 {
        self.page_count as u64 * self.page_size as u64 * self.page_size as u64
    }

    /// Fraction of reserved area not covered by image texels
    ///
    /// 0.0 = every quad is filled exactly, approaching 1.0 = mostly letterbox.
    pub fn waste_ratio(&self) -> f64 {
        if self.used_area == 0 {
            return 0.0;
        }
        1.0 - self.requested_area as f64 / self.used_area as f64
    }
}

#[derive(Debug)]
pub struct AtlasAllocator {
    /// Normalized configuration
    config: AtlasConfig,
    allocator: QuadTreeAllocator,
    pages: Vec<Page>,
    cache: PlacementCache,
    requested_area: u64,
}

impl AtlasAllocator {
    /// Create an atlas with the default texel layout
    ///
    /// Both sizes are rounded up to powers of two; read the rounded values
    /// back with [`page_side_length`](Self::page_side_length) and
    /// [`min_size`](Self::min_size).
    pub fn new(page_size: u32, min_size: u32) -> Result<Self> {
        Self::with_config(AtlasConfig::new(page_size, min_size))
    }

    pub fn with_config(config: AtlasConfig) -> Result<Self> {
        let config = config.normalized()?;
        info!(
            "Creating atlas: page size {}, min size {}, {} levels, {} bytes per texel",
            config.page_size,
            config.min_size,
            config.level_count(),
            config.texel_size
        );

        Ok(AtlasAllocator {
            allocator: QuadTreeAllocator::new(config.page_size, config.min_size),
            config,
            pages: Vec::new(),
            cache: PlacementCache::new(),
            requested_area: 0,
        })
    }

    /// Place an image, or return the placement already recorded for `key`
    ///
    /// On a cache hit `pixels` is not read. Otherwise the request is validated
    /// before any state changes, so a failed call leaves the atlas untouched.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` for a zero dimension or a pixel buffer shorter than
    ///   `width * height * texel_size` bytes
    /// - `ImageTooLarge` if either dimension exceeds the page size
    pub fn load(&mut self, key: &str, width: u32, height: u32, pixels: &[u8]) -> Result<Placement> {
        if let Some(placement) = self.cache.get(key) {
            debug!("Using cached image: {}", key);
            return Ok(placement);
        }

        self.allocator.check_request(width, height)?;
        let needed = width as usize * height as usize * self.config.texel_size;
        if pixels.len() < needed {
            return Err(AtlasError::InvalidRequest(format!(
                "pixel buffer for {} holds {} bytes, {}x{} needs {}",
                key,
                pixels.len(),
                width,
                height,
                needed
            )));
        }

        debug!("Loading image: {} ({}x{})", key, width, height);

        let quad = self.allocator.allocate(width, height)?;
        while self.pages.len() < self.allocator.page_count() {
            self.pages.push(Page::new(&self.config));
        }

        self.pages[quad.page as usize].blit(quad.x, quad.y, width, height, pixels)?;

        let placement = Placement::new(quad.page, (quad.x, quad.y), (width, height));
        self.cache.record_miss();
        self.cache.insert(key, placement);
        self.requested_area += placement.area();

        debug!("Placed {} at {:?} in quad of side {}", key, placement, quad.size);
        Ok(placement)
    }

    /// [`load`](Self::load) driven by an image source
    pub fn load_image<S: ImageSource + ?Sized>(&mut self, image: &S) -> Result<Placement> {
        let (width, height) = image.dimensions();
        self.load(image.key(), width, height, image.pixels())
    }

    /// Forget `key` and return its quad to the free list of its level
    ///
    /// The quad is not merged with free siblings and its texels are not
    /// cleared. Loading the same key again allocates afresh.
    pub fn release(&mut self, key: &str) -> Result<Placement> {
        let placement = self
            .get(key)
            .ok_or_else(|| AtlasError::UnknownKey(key.to_string()))?;

        self.allocator.release(placement.quad(self.config.min_size))?;
        self.cache.remove(key);
        self.requested_area -= placement.area();

        debug!("Released image: {} from {:?}", key, placement);
        Ok(placement)
    }

    /// Placement recorded for `key`, if any
    pub fn get(&self, key: &str) -> Option<Placement> {
        self.cache.peek(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains(key)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Side length shared by every page (the rounded page size)
    pub fn page_side_length(&self) -> u32 {
        self.config.page_size
    }

    /// Smallest quad side (the rounded min size)
    pub fn min_size(&self) -> u32 {
        self.config.min_size
    }

    pub fn texel_size(&self) -> usize {
        self.config.texel_size
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Raw bytes of page `index`
    pub fn page_buffer(&self, index: usize) -> Result<&[u8]> {
        self.pages
            .get(index)
            .map(Page::data)
            .ok_or(AtlasError::PageOutOfRange(index))
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    /// Live placements keyed by image key, in no particular order
    pub fn placements(&self) -> impl Iterator<Item = (&str, &Placement)> {
        self.cache.iter()
    }

    /// Free quads currently available for reuse
    pub fn free_quads(&self) -> impl Iterator<Item = &Quad> {
        self.allocator.free_quads()
    }

    pub fn layout(&self) -> PageLayout {
        PageLayout {
            side: self.config.page_size,
            texel_size: self.config.texel_size,
            count: self.pages.len(),
        }
    }

    /// Hand every page to `consumer` in index order
    pub fn export<C: PageConsumer + ?Sized>(&self, consumer: &mut C) -> Result<()> {
        let pages: Vec<&[u8]> = self.pages.iter().map(Page::data).collect();
        info!(
            "Exporting {} atlas pages of side {}",
            pages.len(),
            self.config.page_size
        );
        consumer.consume(self.layout(), &pages)
    }

    pub fn stats(&self) -> AtlasStats {
        AtlasStats {
            page_count: self.pages.len(),
            page_size: self.config.page_size,
            min_size: self.config.min_size,
            placements: self.cache.len(),
            used_area: self.allocator.used_area(),
            free_area: self.allocator.free_area(),
            requested_area: self.requested_area,
            free_quads_per_level: self.allocator.free_quads_per_level(),
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
        }
    }

    /// Serializable listing of every live placement
    pub fn manifest(&self) -> AtlasManifest {
        AtlasManifest::from_placements(
            self.config.page_size,
            self.config.min_size,
            self.pages.len(),
            self.cache.iter(),
        )
    }
}
