//! 帧求解：分解、匹配回填、manifest 编解码与落盘

pub mod decomposer;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod store;

pub use decomposer::{
    build_decomposer, Decomposer, GreedyDecomposer, HybridDecomposer, QuadtreeDecomposer,
};
pub use layout::{Layout, Tile, TileContent};
pub use manifest::{ContentId, Manifest, ManifestEntry};
pub use pipeline::{FrameFailure, FrameSolver, SolveReport, SolvedVideo};
pub use store::ManifestStore;
