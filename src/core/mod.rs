pub mod config;
pub mod error;
pub mod library;
pub mod matcher;
pub mod video;

pub use config::{
    CanvasSize, GreedyConfig, HybridConfig, IndexConfig, ManifestPolicy, MosaicConfig,
    QuadtreeConfig, StrategyConfig,
};
pub use error::{MosaicError, Result};
