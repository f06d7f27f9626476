//! 空间分解策略：把一帧切成区块，纯色直接定值，其余作为叶子待匹配

pub mod greedy;
pub mod hybrid;
pub mod quadtree;

use super::layout::Layout;
use crate::core::config::StrategyConfig;
use crate::core::error::Result;
use crate::core::library::HeroSet;
use crate::core::video::frame::GrayFrame;
use std::sync::Arc;

pub use greedy::GreedyDecomposer;
pub use hybrid::HybridDecomposer;
pub use quadtree::QuadtreeDecomposer;

pub trait Decomposer: Send + Sync {
    fn name(&self) -> &'static str;

    fn decompose(&self, frame: &GrayFrame, frame_index: usize) -> Result<Layout>;
}

pub fn build_decomposer(strategy: &StrategyConfig, heroes: Arc<HeroSet>) -> Box<dyn Decomposer> {
    match strategy {
        StrategyConfig::Quadtree(c) => Box::new(QuadtreeDecomposer::new(c.clone())),
        StrategyConfig::Greedy(c) => Box::new(GreedyDecomposer::new(c.clone(), heroes)),
        StrategyConfig::Hybrid(c) => Box::new(HybridDecomposer::new(c.clone(), heroes)),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::config::CanvasSize;
    use crate::core::video::frame::GrayFrame;
    use crate::solver::layout::{Layout, TileContent};
    use crate::solver::manifest::{ContentId, Manifest, ManifestEntry};

    /// 未匹配的叶子以 id 0 占位，只用于几何校验
    pub fn as_manifest(layout: &Layout) -> Manifest {
        let entries = layout
            .tiles()
            .iter()
            .map(|t| {
                let id = match t.content {
                    TileContent::Resolved(id) => id,
                    TileContent::Pending(_) => ContentId::Library(0),
                };
                ManifestEntry::new(t.rect, id)
            })
            .collect();
        Manifest::new(0, entries)
    }

    pub fn assert_partition(layout: &Layout, frame: &GrayFrame) {
        let canvas = CanvasSize {
            width: frame.width,
            height: frame.height,
        };
        if let Err(e) = as_manifest(layout).validate_partition(canvas) {
            panic!("layout is not a partition: {}", e);
        }
    }

    /// 圆形剪影：圆内白，圆外黑
    pub fn create_disc_frame(width: u32, height: u32) -> GrayFrame {
        let mut frame = GrayFrame::filled(width, height, 0, 0);
        let (cx, cy) = (width as i64 / 2, height as i64 / 2);
        let r = (width.min(height) / 3) as i64;
        for y in 0..height as i64 {
            for x in 0..width as i64 {
                if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                    frame.data[(y * width as i64 + x) as usize] = 255;
                }
            }
        }
        frame
    }
}
