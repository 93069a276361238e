//! Atlas manifest
//!
//! A serializable listing of every live placement, for consumers that need to
//! map image keys to page regions after the atlas itself is gone (e.g. a
//! renderer building UV lookups, or a baked asset bundle).

use crate::core::atlas::Placement;
use crate::core::error::{AtlasError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One placed image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Dedup key the image was loaded under
    pub key: String,
    pub placement: Placement,
}

/// Atlas manifest
///
/// # Examples
///
/// ```
/// use quadatlas::AtlasAllocator;
///
/// let mut atlas = AtlasAllocator::new(64, 16).unwrap();
/// atlas.load("a.png", 10, 10, &[0u8; 400]).unwrap();
///
/// let manifest = atlas.manifest();
/// let json = manifest.to_json().unwrap();
/// let restored = quadatlas::AtlasManifest::from_json(&json).unwrap();
/// assert_eq!(restored.get("a.png"), manifest.get("a.png"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasManifest {
    /// Side length of every page
    pub page_size: u32,

    /// Smallest quad side the atlas was built with
    pub min_size: u32,

    pub page_count: usize,

    /// Entries sorted by key
    #[serde(default)]
    pub entries: Vec<ManifestEntry>,
}

impl AtlasManifest {
    pub fn from_placements<'a, I>(
        page_size: u32,
        min_size: u32,
        page_count: usize,
        placements: I,
    ) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a Placement)>,
    {
        let mut entries: Vec<ManifestEntry> = placements
            .into_iter()
            .map(|(key, placement)| ManifestEntry {
                key: key.to_string(),
                placement: *placement,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        AtlasManifest {
            page_size,
            min_size,
            page_count,
            entries,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Placement> {
        self.entries
            .binary_search_by(|entry| entry.key.as_str().cmp(key))
            .ok()
            .map(|index| &self.entries[index].placement)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that every entry fits its page and no two entries overlap
    pub fn validate(&self) -> Result<()> {
        for entry in &self.entries {
            let p = &entry.placement;
            if p.page as usize >= self.page_count
                || p.offset.0 + p.size.0 > self.page_size
                || p.offset.1 + p.size.1 > self.page_size
            {
                return Err(AtlasError::InvalidRequest(format!(
                    "manifest entry {} lies outside the atlas: {:?}",
                    entry.key, p
                )));
            }
        }

        for (i, a) in self.entries.iter().enumerate() {
            if let Some(b) = self.entries[i + 1..]
                .iter()
                .find(|b| a.placement.overlaps(&b.placement))
            {
                return Err(AtlasError::InvalidRequest(format!(
                    "manifest entries {} and {} overlap",
                    a.key, b.key
                )));
            }
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a manifest; entries are re-sorted so lookups keep working
    pub fn from_json(json: &str) -> Result<Self> {
        let mut manifest: AtlasManifest = serde_json::from_str(json)?;
        manifest.entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(manifest)
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AtlasManifest {
        let a = Placement::new(0, (0, 0), (10, 10));
        let b = Placement::new(0, (16, 0), (10, 10));
        let c = Placement::new(1, (0, 0), (50, 50));
        AtlasManifest::from_placements(64, 16, 2, vec![("c", &c), ("a", &a), ("b", &b)])
    }

    #[test]
    fn test_entries_sorted() {
        let manifest = sample();
        let keys: Vec<_> = manifest.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(manifest.get("b"), Some(&Placement::new(0, (16, 0), (10, 10))));
        assert_eq!(manifest.get("z"), None);
    }

    #[test]
    fn test_serialize_deserialize() -> Result<()> {
        let manifest = sample();
        let json = manifest.to_json()?;
        let restored = AtlasManifest::from_json(&json)?;
        assert_eq!(restored, manifest);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let a = Placement::new(0, (0, 0), (20, 20));
        let b = Placement::new(0, (16, 0), (10, 10));
        let overlapping = AtlasManifest::from_placements(64, 16, 1, vec![("a", &a), ("b", &b)]);
        assert!(overlapping.validate().is_err());

        let outside = Placement::new(3, (0, 0), (10, 10));
        let missing_page = AtlasManifest::from_placements(64, 16, 1, vec![("x", &outside)]);
        assert!(missing_page.validate().is_err());
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            AtlasManifest::from_json("{ not json"),
            Err(AtlasError::Serialization(_))
        ));
    }
}
