use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Image too large for page: {width}x{height} exceeds page size {page_size}")]
    ImageTooLarge {
        width: u32,
        height: u32,
        page_size: u32,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Page index out of range: {0}")]
    PageOutOfRange(usize),

    #[error("Unknown image key: {0}")]
    UnknownKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),
}

impl AtlasError {
    /// True for errors that reject a single request without touching allocator state
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            AtlasError::ImageTooLarge { .. } | AtlasError::InvalidRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
