//! Collaborator interfaces on either side of the atlas
//!
//! An [`ImageSource`] supplies decoded pixels for one image; a
//! [`PageConsumer`] receives the finished pages, typically to upload them as
//! layers of a 2D texture array.

use crate::core::error::Result;

/// Decoded image ready to be packed
pub trait ImageSource {
    /// Dedup key, usually the source path
    fn key(&self) -> &str;

    /// `(width, height)` in texels
    fn dimensions(&self) -> (u32, u32);

    /// Tightly packed rows, `height` rows of `width` texels
    fn pixels(&self) -> &[u8];
}

/// Shape shared by every page handed to a consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    /// Side length of each page in texels
    pub side: u32,
    pub texel_size: usize,
    pub count: usize,
}

impl PageLayout {
    pub fn page_bytes(&self) -> usize {
        self.side as usize * self.side as usize * self.texel_size
    }
}

/// Receives finished atlas pages in index order
pub trait PageConsumer {
    fn consume(&mut self, layout: PageLayout, pages: &[&[u8]]) -> Result<()>;
}

/// In-memory image, handy when pixels are already decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RawImage {
    pub fn new(key: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        RawImage {
            key: key.into(),
            width,
            height,
            pixels,
        }
    }

    /// Image where every texel is `texel`
    pub fn solid(key: impl Into<String>, width: u32, height: u32, texel: &[u8]) -> Self {
        let pixels = texel.repeat(width as usize * height as usize);
        Self::new(key, width, height, pixels)
    }
}

impl ImageSource for RawImage {
    fn key(&self) -> &str {
        &self.key
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}
