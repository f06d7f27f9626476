use thiserror::Error;

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Cache encoding error: {0}")]
    Cache(#[from] bincode::Error),
    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Corpus yielded no fingerprints: {0}")]
    EmptyCorpus(String),
    #[error("Library is empty, nothing to match against")]
    EmptyLibrary,
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Frame {frame} is {width}x{height}, expected {expected_width}x{expected_height}")]
    FrameSize {
        frame: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
    #[error("Manifest for frame {frame} is corrupt: {reason}")]
    CorruptManifest { frame: usize, reason: String },
    #[error("Manifest for frame {0} not found")]
    MissingManifest(usize),
    #[error("Rasterize failed: {0}")]
    Rasterize(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Library cache mismatch: {0}")]
    CacheMismatch(String),
}

pub type Result<T> = std::result::Result<T, MosaicError>;
