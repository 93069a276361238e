//! Atlas engine
//!
//! - [`error`] - Error types for atlas operations
//! - [`config`] - Page/quad sizing and texel layout
//! - [`allocator`] - Quadtree quad allocation:
//!   - [`allocator::quad`] - Quad geometry and level math
//!   - [`allocator::freelist`] - Per-level FIFO free lists
//!   - [`allocator::quadtree`] - Buddy-style split allocator
//! - [`page`] - Page pixel buffers
//! - [`cache`] - Dedup cache of placements
//! - [`atlas`] - The atlas allocator tying it together
//! - [`manifest`] - Serializable placement listing
//! - [`consumer`] - Image source and page consumer interfaces

pub mod allocator;
pub mod atlas;
pub mod cache;
pub mod config;
pub mod consumer;
pub mod error;
pub mod manifest;
pub mod page;

pub use atlas::{AtlasAllocator, AtlasStats, Placement};
