use super::Decomposer;
use crate::core::config::HybridConfig;
use crate::core::error::Result;
use crate::core::library::{HeroSet, Shade};
use crate::core::video::frame::{GrayFrame, Rect, MIDPOINT};
use crate::solver::layout::Layout;
use crate::solver::manifest::ContentId;
use std::sync::Arc;

/// 分层混合：画布先切成根块，再在 [min_block, max_block] 内四分。
/// 低方差终端块从黑 / 白轮换池按帧号取 id，避免相邻帧出现同一张页面。
pub struct HybridDecomposer {
    config: HybridConfig,
    heroes: Arc<HeroSet>,
}

impl HybridDecomposer {
    pub fn new(config: HybridConfig, heroes: Arc<HeroSet>) -> Self {
        Self { config, heroes }
    }

    fn split(&self, frame: &GrayFrame, frame_index: usize, rect: Rect, layout: &mut Layout) {
        if rect.is_empty() {
            return;
        }
        let stats = frame.region_stats(&rect);
        let flat = stats.std_dev() < self.config.std_threshold;
        let terminal =
            (flat && rect.max_side() <= self.config.max_block) || rect.min_side() <= self.config.min_block;

        if terminal {
            if flat {
                let shade = if stats.mean > MIDPOINT as f64 {
                    Shade::White
                } else {
                    Shade::Black
                };
                let id = self.heroes.pooled(shade, frame_index);
                layout.push_resolved(rect, ContentId::Library(id));
            } else {
                layout.push_pending(frame, rect);
            }
            return;
        }

        for q in rect.quadrants() {
            self.split(frame, frame_index, q, layout);
        }
    }
}

impl Decomposer for HybridDecomposer {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn decompose(&self, frame: &GrayFrame, frame_index: usize) -> Result<Layout> {
        let root = self.config.root_block.max(1);
        let mut layout = Layout::new();
        for y in (0..frame.height).step_by(root as usize) {
            for x in (0..frame.width).step_by(root as usize) {
                let rect = Rect::new(x, y, root.min(frame.width - x), root.min(frame.height - y));
                self.split(frame, frame_index, rect, &mut layout);
            }
        }
        Ok(layout)
    }
}
