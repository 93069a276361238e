//! Dedup cache for placements
//!
//! Maps an opaque image key (usually a source path) to the placement computed
//! the first time that key was loaded. Entries live until released or until
//! the atlas is dropped; there is no eviction, since forgetting an entry would
//! leak its quad.

use crate::core::atlas::Placement;
use ahash::AHashMap;

#[derive(Debug, Clone, Default)]
pub struct PlacementCache {
    entries: AHashMap<String, Placement>,
    hits: u64,
    misses: u64,
}

impl PlacementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key, counting a hit when it is present
    ///
    /// Misses are not counted here; the caller records one with
    /// [`record_miss`](Self::record_miss) once it commits to placing the image.
    pub fn get(&mut self, key: &str) -> Option<Placement> {
        let placement = self.entries.get(key).copied();
        if placement.is_some() {
            self.hits += 1;
        }
        placement
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Look up a key without touching the counters
    pub fn peek(&self, key: &str) -> Option<&Placement> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: &str, placement: Placement) {
        self.entries.insert(key.to_string(), placement);
    }

    pub fn remove(&mut self, key: &str) -> Option<Placement> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Placement)> {
        self.entries.iter().map(|(key, placement)| (key.as_str(), placement))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
