//! Atlas configuration
//!
//! Page side, minimum quad granularity and texel layout are fixed when the
//! allocator is built. Both sizes are rounded up to powers of two; the
//! rounded values are what [`AtlasConfig::normalized`] returns and what the
//! allocator reports afterwards.

use crate::core::allocator::quad::{checked_pow2, log2_exact};
use crate::core::error::{AtlasError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default maximum page side in texels
pub const DEFAULT_PAGE_SIZE: u32 = 4096;

/// Default smallest quad side in texels
pub const DEFAULT_MIN_SIZE: u32 = 16;

/// Default bytes per texel (RGBA8)
pub const DEFAULT_TEXEL_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// Side length of every page
    pub page_size: u32,

    /// Smallest quad handed out
    pub min_size: u32,

    /// Bytes per texel in both requests and pages
    pub texel_size: usize,

    /// Texel written across a freshly created page
    pub clear_texel: Vec<u8>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        AtlasConfig {
            page_size: DEFAULT_PAGE_SIZE,
            min_size: DEFAULT_MIN_SIZE,
            texel_size: DEFAULT_TEXEL_SIZE,
            clear_texel: vec![0; DEFAULT_TEXEL_SIZE],
        }
    }
}

impl AtlasConfig {
    pub fn new(page_size: u32, min_size: u32) -> Self {
        AtlasConfig {
            page_size,
            min_size,
            ..Default::default()
        }
    }

    /// Parse from TOML, missing fields fall back to defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Validate without rounding
    pub fn validate(&self) -> Result<()> {
        self.normalized().map(|_| ())
    }

    /// Validate and round both sizes up to powers of two
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if either size is zero or too large to
    /// round, if the rounded page size is smaller than the rounded minimum
    /// size, or if the texel layout is inconsistent.
    pub fn normalized(&self) -> Result<Self> {
        let page_size = checked_pow2(self.page_size).ok_or_else(|| {
            AtlasError::InvalidConfiguration(format!(
                "page size must be a positive power of two once rounded, got {}",
                self.page_size
            ))
        })?;
        let min_size = checked_pow2(self.min_size).ok_or_else(|| {
            AtlasError::InvalidConfiguration(format!(
                "min size must be a positive power of two once rounded, got {}",
                self.min_size
            ))
        })?;

        if page_size < min_size {
            return Err(AtlasError::InvalidConfiguration(format!(
                "page size {} is smaller than min size {}",
                page_size, min_size
            )));
        }

        if self.texel_size == 0 {
            return Err(AtlasError::InvalidConfiguration(
                "texel size cannot be zero".to_string(),
            ));
        }

        if self.clear_texel.len() != self.texel_size {
            return Err(AtlasError::InvalidConfiguration(format!(
                "clear texel has {} bytes, texel size is {}",
                self.clear_texel.len(),
                self.texel_size
            )));
        }

        let side = page_size as usize;
        if side
            .checked_mul(side)
            .and_then(|texels| texels.checked_mul(self.texel_size))
            .is_none()
        {
            return Err(AtlasError::InvalidConfiguration(format!(
                "page of side {} does not fit in memory",
                page_size
            )));
        }

        Ok(AtlasConfig {
            page_size,
            min_size,
            texel_size: self.texel_size,
            clear_texel: self.clear_texel.clone(),
        })
    }

    /// Number of free-list levels, `log2(page_size / min_size) + 1`
    ///
    /// Only meaningful on a normalized config.
    pub fn level_count(&self) -> usize {
        log2_exact(self.page_size / self.min_size) as usize + 1
    }

    /// Bytes in one page row
    pub fn row_stride(&self) -> usize {
        self.page_size as usize * self.texel_size
    }

    /// Bytes in one page
    pub fn page_bytes(&self) -> usize {
        self.row_stride() * self.page_size as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AtlasConfig::default();
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.min_size, 16);
        assert_eq!(config.texel_size, 4);
        assert_eq!(config.normalized().unwrap(), config);
        assert_eq!(config.level_count(), 9);
    }

    #[test]
    fn test_rounding_is_visible() {
        let config = AtlasConfig::new(3000, 10).normalized().unwrap();
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.min_size, 16);
    }

    #[test]
    fn test_page_smaller_than_min() {
        let err = AtlasConfig::new(16, 64).normalized().unwrap_err();
        assert!(matches!(err, AtlasError::InvalidConfiguration(_)));

        // Rounding happens before the comparison: 17 -> 32, 20 -> 32
        assert!(AtlasConfig::new(17, 20).normalized().is_ok());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(matches!(
            AtlasConfig::new(0, 16).validate(),
            Err(AtlasError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            AtlasConfig::new(64, 0).validate(),
            Err(AtlasError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_clear_texel_must_match_texel_size() {
        let config = AtlasConfig {
            texel_size: 2,
            ..AtlasConfig::new(64, 16)
        };
        assert!(config.validate().is_err());

        let config = AtlasConfig {
            texel_size: 2,
            clear_texel: vec![0, 255],
            ..AtlasConfig::new(64, 16)
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.row_stride(), 128);
        assert_eq!(config.page_bytes(), 128 * 64);
    }

    #[test]
    fn test_from_toml() {
        let config = AtlasConfig::from_toml_str("page_size = 1024\nmin_size = 32\n").unwrap();
        assert_eq!(config.page_size, 1024);
        assert_eq!(config.min_size, 32);
        assert_eq!(config.texel_size, DEFAULT_TEXEL_SIZE);
        assert_eq!(config.clear_texel, vec![0; 4]);
    }

    #[test]
    fn test_from_toml_rejects_garbage() {
        let err = AtlasConfig::from_toml_str("page_size = \"big\"").unwrap_err();
        assert!(matches!(err, AtlasError::Config(_)));
    }
}
