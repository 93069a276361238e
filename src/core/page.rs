use crate::core::config::AtlasConfig;
use crate::core::error::{AtlasError, Result};

/// One square pixel buffer of the atlas
///
/// Pages are created on demand, never shrink and are never dropped while the
/// atlas lives. Texels are stored row-major with no padding.
#[derive(Debug, Clone)]
pub struct Page {
    side: u32,
    texel_size: usize,
    data: Vec<u8>,
}

impl Page {
    /// Create a page filled with the configured clear texel
    pub fn new(config: &AtlasConfig) -> Self {
        let texels = config.page_size as usize * config.page_size as usize;
        Page {
            side: config.page_size,
            texel_size: config.texel_size,
            data: config.clear_texel.repeat(texels),
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn row_stride(&self) -> usize {
        self.side as usize * self.texel_size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes of the texel at `(x, y)`
    pub fn texel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.side || y >= self.side {
            return None;
        }
        let start = y as usize * self.row_stride() + x as usize * self.texel_size;
        Some(&self.data[start..start + self.texel_size])
    }

    /// Copy a tightly packed `width` x `height` image to `(x, y)`
    ///
    /// Texels outside the image are left as they were.
    pub fn blit(&mut self, x: u32, y: u32, width: u32, height: u32, pixels: &[u8]) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }

        if x + width > self.side || y + height > self.side {
            return Err(AtlasError::InvalidRequest(format!(
                "blit of {}x{} at ({}, {}) leaves page of side {}",
                width, height, x, y, self.side
            )));
        }

        let row_bytes = width as usize * self.texel_size;
        if pixels.len() < row_bytes * height as usize {
            return Err(AtlasError::InvalidRequest(format!(
                "pixel buffer holds {} bytes, {}x{} needs {}",
                pixels.len(),
                width,
                height,
                row_bytes * height as usize
            )));
        }

        let stride = self.row_stride();
        let column = x as usize * self.texel_size;
        for (row, src) in pixels.chunks_exact(row_bytes).take(height as usize).enumerate() {
            let start = (y as usize + row) * stride + column;
            self.data[start..start + row_bytes].copy_from_slice(src);
        }

        Ok(())
    }
}
