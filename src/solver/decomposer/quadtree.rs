use super::Decomposer;
use crate::core::config::QuadtreeConfig;
use crate::core::error::Result;
use crate::core::video::frame::{GrayFrame, Rect, RegionStats};
use crate::solver::layout::Layout;
use crate::solver::manifest::ContentId;

/// 固定四叉树：低方差 → 纯色，边长到叶子上限 → 匹配，否则四分递归。
/// 四个子块全是纯色时，同色的相邻子块合并输出。
pub struct QuadtreeDecomposer {
    config: QuadtreeConfig,
}

impl QuadtreeDecomposer {
    pub fn new(config: QuadtreeConfig) -> Self {
        Self { config }
    }

    fn solid(&self, stats: &RegionStats) -> Option<ContentId> {
        if stats.variance < self.config.solidity_threshold {
            Some(if stats.is_dark() {
                ContentId::SolidBlack
            } else {
                ContentId::SolidWhite
            })
        } else {
            None
        }
    }

    fn visit(&self, frame: &GrayFrame, rect: Rect, layout: &mut Layout) {
        if rect.is_empty() {
            return;
        }
        if let Some(id) = self.solid(&frame.region_stats(&rect)) {
            layout.push_resolved(rect, id);
            return;
        }
        if rect.max_side() <= self.config.leaf_size {
            layout.push_pending(frame, rect);
            return;
        }

        let quads = rect.quadrants();
        if quads.iter().all(|q| !q.is_empty()) {
            let solids: Vec<Option<ContentId>> = quads
                .iter()
                .map(|q| self.solid(&frame.region_stats(q)))
                .collect();
            if let [Some(tl), Some(tr), Some(bl), Some(br)] = solids[..] {
                emit_merged(rect, &quads, [tl, tr, bl, br], layout);
                return;
            }
        }
        for q in quads {
            self.visit(frame, q, layout);
        }
    }
}

/// 四块均为纯色：全同 → 一块；左右两列各自同色 → 两列；上下两行各自同色 → 两行
fn emit_merged(rect: Rect, quads: &[Rect; 4], ids: [ContentId; 4], layout: &mut Layout) {
    let [tl, tr, bl, br] = ids;
    let [q_tl, q_tr, q_bl, _] = *quads;
    if tl == tr && tl == bl && tl == br {
        layout.push_resolved(rect, tl);
    } else if tl == bl && tr == br {
        layout.push_resolved(Rect::new(rect.x, rect.y, q_tl.w, rect.h), tl);
        layout.push_resolved(Rect::new(q_tr.x, rect.y, q_tr.w, rect.h), tr);
    } else if tl == tr && bl == br {
        layout.push_resolved(Rect::new(rect.x, rect.y, rect.w, q_tl.h), tl);
        layout.push_resolved(Rect::new(rect.x, q_bl.y, rect.w, q_bl.h), bl);
    } else {
        for (q, id) in quads.iter().zip(ids) {
            layout.push_resolved(*q, id);
        }
    }
}

impl Decomposer for QuadtreeDecomposer {
    fn name(&self) -> &'static str {
        "quadtree"
    }

    fn decompose(&self, frame: &GrayFrame, _frame_index: usize) -> Result<Layout> {
        let mut layout = Layout::new();
        self.visit(frame, frame.bounds(), &mut layout);
        Ok(layout)
    }
}
