//! # Quadatlas - Quadtree Texture Atlas Allocator
//!
//! `quadatlas` packs variable-sized images into fixed-size square pages:
//!
//! - **Power-of-two quads**: every image gets the smallest quad that holds it
//! - **Buddy-style splits**: cutting a quad keeps one quadrant and free-lists
//!   the other three for later requests
//! - **Page growth on demand**: a new page appears only when no free quad fits
//! - **Dedup by key**: loading the same key twice returns the first placement
//!   without copying pixels again
//!
//! The atlas decides where pixels go and copies them into page buffers.
//! Decoding images and uploading pages are left to the caller (see
//! [`ImageSource`] and [`PageConsumer`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use quadatlas::{AtlasAllocator, Placement, Result};
//!
//! # fn main() -> Result<()> {
//! let mut atlas = AtlasAllocator::new(64, 16)?;
//!
//! let pixels = vec![255u8; 10 * 10 * 4];
//! let a = atlas.load("a.png", 10, 10, &pixels)?;
//! assert_eq!(a, Placement::new(0, (0, 0), (10, 10)));
//!
//! // Same key, same placement, nothing copied
//! assert_eq!(atlas.load("a.png", 10, 10, &pixels)?, a);
//!
//! let page = atlas.page_buffer(a.page as usize)?;
//! assert_eq!(page.len(), 64 * 64 * 4);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use quadatlas::{AtlasBuilder, Result};
//!
//! # fn main() -> Result<()> {
//! let atlas = AtlasBuilder::new()
//!     .page_size(2048)
//!     .min_size(8)
//!     .texel_size(1)
//!     .build()?;
//!
//! assert_eq!(atlas.page_side_length(), 2048);
//! # Ok(())
//! # }
//! ```

pub mod core;

pub use crate::core::{
    allocator::{quad::Quad, quadtree::QuadTreeAllocator, QuadAllocator},
    atlas::{AtlasAllocator, AtlasStats, Placement},
    config::{AtlasConfig, DEFAULT_MIN_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_TEXEL_SIZE},
    consumer::{ImageSource, PageConsumer, PageLayout, RawImage},
    error::{AtlasError, Result},
    manifest::{AtlasManifest, ManifestEntry},
    page::Page,
};

use parking_lot::{Mutex, MutexGuard};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Builder for customizing atlas creation
///
/// # Examples
///
/// ```rust
/// use quadatlas::AtlasBuilder;
///
/// # fn main() -> quadatlas::Result<()> {
/// let atlas = AtlasBuilder::new()
///     .page_size(1000) // rounded up to 1024
///     .min_size(16)
///     .clear_texel([0u8, 0, 0, 255])
///     .build()?;
///
/// assert_eq!(atlas.page_side_length(), 1024);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AtlasBuilder {
    config: AtlasConfig,
}

impl AtlasBuilder {
    /// Create a new builder with default settings (4096 / 16 / RGBA8)
    pub fn new() -> Self {
        AtlasBuilder {
            config: AtlasConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: AtlasConfig) -> Self {
        AtlasBuilder { config }
    }

    /// Start from a TOML configuration file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::from_config(AtlasConfig::from_toml_file(path)?))
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    pub fn min_size(mut self, min_size: u32) -> Self {
        self.config.min_size = min_size;
        self
    }

    /// Set bytes per texel
    ///
    /// Resets the clear texel to zeros of the new width; call
    /// [`clear_texel`](Self::clear_texel) afterwards to override.
    pub fn texel_size(mut self, texel_size: usize) -> Self {
        self.config.texel_size = texel_size;
        self.config.clear_texel = vec![0; texel_size];
        self
    }

    pub fn clear_texel<T: Into<Vec<u8>>>(mut self, texel: T) -> Self {
        self.config.clear_texel = texel.into();
        self
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Build the atlas
    pub fn build(self) -> Result<AtlasAllocator> {
        AtlasAllocator::with_config(self.config)
    }

    /// Build an atlas shareable between threads
    pub fn build_shared(self) -> Result<SharedAtlas> {
        Ok(SharedAtlas::new(self.build()?))
    }
}

/// Thread-safe handle to an atlas
///
/// Every call takes the lock for its whole duration, so a load's search,
/// split, blit and cache insert happen as one unit. Clones share the same
/// atlas.
#[derive(Debug, Clone)]
pub struct SharedAtlas {
    inner: Arc<Mutex<AtlasAllocator>>,
}

impl SharedAtlas {
    pub fn new(atlas: AtlasAllocator) -> Self {
        SharedAtlas {
            inner: Arc::new(Mutex::new(atlas)),
        }
    }

    pub fn load(&self, key: &str, width: u32, height: u32, pixels: &[u8]) -> Result<Placement> {
        self.inner.lock().load(key, width, height, pixels)
    }

    pub fn load_image<S: ImageSource + ?Sized>(&self, image: &S) -> Result<Placement> {
        self.inner.lock().load_image(image)
    }

    pub fn release(&self, key: &str) -> Result<Placement> {
        self.inner.lock().release(key)
    }

    pub fn get(&self, key: &str) -> Option<Placement> {
        self.inner.lock().get(key)
    }

    pub fn page_count(&self) -> usize {
        self.inner.lock().page_count()
    }

    pub fn page_side_length(&self) -> u32 {
        self.inner.lock().page_side_length()
    }

    /// Run `f` on page `index` while holding the lock
    pub fn with_page<R, F>(&self, index: usize, f: F) -> Result<R>
    where
        F: FnOnce(&[u8]) -> R,
    {
        let atlas = self.inner.lock();
        let buffer = atlas.page_buffer(index)?;
        Ok(f(buffer))
    }

    pub fn export<C: PageConsumer + ?Sized>(&self, consumer: &mut C) -> Result<()> {
        self.inner.lock().export(consumer)
    }

    pub fn stats(&self) -> AtlasStats {
        self.inner.lock().stats()
    }

    pub fn manifest(&self) -> AtlasManifest {
        self.inner.lock().manifest()
    }

    /// Lock the atlas for a batch of operations
    pub fn lock(&self) -> MutexGuard<'_, AtlasAllocator> {
        self.inner.lock()
    }

    /// Take the atlas back once no other handle is alive
    pub fn into_inner(self) -> std::result::Result<AtlasAllocator, SharedAtlas> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => {
                debug!("Unwrapping shared atlas");
                Ok(mutex.into_inner())
            }
            Err(inner) => Err(SharedAtlas { inner }),
        }
    }
}

impl From<AtlasAllocator> for SharedAtlas {
    fn from(atlas: AtlasAllocator) -> Self {
        SharedAtlas::new(atlas)
    }
}
