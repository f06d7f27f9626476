use super::Decomposer;
use crate::core::config::GreedyConfig;
use crate::core::error::{MosaicError, Result};
use crate::core::library::{HeroSet, Shade};
use crate::core::video::frame::{GrayFrame, IntegralImage, Rect, MIDPOINT};
use crate::solver::layout::Layout;
use crate::solver::manifest::ContentId;
use std::sync::Arc;

/// 贪心矩形生长：按基础网格光栅扫描，先横向再纵向扩展纯色块。
/// 大块直接引用 hero id，小块 / 边缘块送去匹配。
pub struct GreedyDecomposer {
    config: GreedyConfig,
    heroes: Arc<HeroSet>,
}

/// 以网格为单位的访问标记
struct VisitedGrid {
    cols: u32,
    cells: Vec<bool>,
}

impl VisitedGrid {
    fn new(cols: u32, rows: u32) -> Self {
        Self {
            cols,
            cells: vec![false; cols as usize * rows as usize],
        }
    }

    fn is_set(&self, col: u32, row: u32) -> bool {
        self.cells[(row * self.cols + col) as usize]
    }

    /// [col, col+w) × [row, row+h) 内全部未访问
    fn is_free(&self, col: u32, row: u32, w: u32, h: u32) -> bool {
        (row..row + h).all(|r| (col..col + w).all(|c| !self.is_set(c, r)))
    }

    fn mark(&mut self, col: u32, row: u32, w: u32, h: u32) {
        for r in row..row + h {
            for c in col..col + w {
                self.cells[(r * self.cols + c) as usize] = true;
            }
        }
    }
}

impl GreedyDecomposer {
    pub fn new(config: GreedyConfig, heroes: Arc<HeroSet>) -> Self {
        Self { config, heroes }
    }

    fn grow(
        &self,
        frame: &GrayFrame,
        integral: &IntegralImage,
        visited: &VisitedGrid,
        col: u32,
        row: u32,
        white: bool,
    ) -> Rect {
        let cell = self.config.cell;
        let max = self.config.max_block;
        let (x, y) = (col * cell, row * cell);
        let (mut mw, mut mh) = (cell, cell);

        while x + mw + cell <= frame.width
            && mw + cell <= max
            && visited.is_free(col + mw / cell, row, 1, mh / cell)
            && integral.is_pure(&Rect::new(x, y, mw + cell, mh), white)
        {
            mw += cell;
        }
        while y + mh + cell <= frame.height
            && mh + cell <= max
            && visited.is_free(col, row + mh / cell, mw / cell, 1)
            && integral.is_pure(&Rect::new(x, y, mw, mh + cell), white)
        {
            mh += cell;
        }
        Rect::new(x, y, mw, mh)
    }
}

impl Decomposer for GreedyDecomposer {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn decompose(&self, frame: &GrayFrame, _frame_index: usize) -> Result<Layout> {
        let cell = self.config.cell;
        if cell == 0 || frame.width % cell != 0 || frame.height % cell != 0 {
            return Err(MosaicError::InvalidConfig(format!(
                "frame {}x{} is not a multiple of cell {}",
                frame.width, frame.height, cell
            )));
        }

        let (cols, rows) = (frame.width / cell, frame.height / cell);
        let integral = frame.binary_integral();
        let mut visited = VisitedGrid::new(cols, rows);
        let mut layout = Layout::new();

        for row in 0..rows {
            for col in 0..cols {
                if visited.is_set(col, row) {
                    continue;
                }
                let white = frame.pixel(col * cell, row * cell) > MIDPOINT;
                let rect = self.grow(frame, &integral, &visited, col, row, white);
                visited.mark(col, row, rect.w / cell, rect.h / cell);

                let large = rect.w >= self.config.hero_min_side && rect.h >= self.config.hero_min_side;
                if large && integral.is_pure(&rect, white) {
                    let shade = if white { Shade::White } else { Shade::Black };
                    layout.push_resolved(rect, ContentId::Library(self.heroes.hero(shade)));
                } else {
                    layout.push_pending(frame, rect);
                }
            }
        }
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::decomposer::test_support::{assert_partition, create_disc_frame};
    use crate::solver::layout::TileContent;
    use crate::testing::graded_library;

    fn decomposer() -> GreedyDecomposer {
        let heroes = HeroSet::from_library(&graded_library(10), 3);
        GreedyDecomposer::new(GreedyConfig::default(), Arc::new(heroes))
    }

    #[test]
    fn test_rects_are_cell_multiples_without_overlap() {
        let frame = create_disc_frame(512, 384);
        let layout = decomposer().decompose(&frame, 0).unwrap();

        assert_partition(&layout, &frame);
        for tile in layout.tiles() {
            assert_eq!(tile.rect.x % 8, 0);
            assert_eq!(tile.rect.y % 8, 0);
            assert_eq!(tile.rect.w % 8, 0);
            assert_eq!(tile.rect.h % 8, 0);
            assert!(tile.rect.w <= 256 && tile.rect.h <= 256);
        }
    }

    #[test]
    fn test_uniform_frame_uses_hero_ids() {
        let frame = GrayFrame::filled(512, 384, 0, 0);
        let layout = decomposer().decompose(&frame, 0).unwrap();

        assert_partition(&layout, &frame);
        assert!(layout.pending().is_empty());
        // 256 上限：512×384 → 2 列 × (256 + 128)
        assert_eq!(layout.tiles().len(), 4);
        for tile in layout.tiles() {
            assert_eq!(tile.content, TileContent::Resolved(ContentId::Library(0)));
        }

        let white = GrayFrame::filled(512, 384, 255, 0);
        let layout = decomposer().decompose(&white, 0).unwrap();
        assert!(layout
            .tiles()
            .iter()
            .all(|t| t.content == TileContent::Resolved(ContentId::Library(9))));
    }

    #[test]
    fn test_impure_cell_is_matched() {
        let mut frame = GrayFrame::filled(64, 64, 255, 0);
        frame.data[3 * 64 + 3] = 0;
        let layout = decomposer().decompose(&frame, 0).unwrap();

        assert_partition(&layout, &frame);
        assert_eq!(layout.tiles()[0].rect, Rect::new(0, 0, 8, 8));
        assert_eq!(layout.tiles()[0].content, TileContent::Pending(0));
    }

    #[test]
    fn test_small_blocks_are_matched() {
        // 16 像素宽的白条：宽度不足 hero 阈值
        let mut frame = GrayFrame::filled(64, 64, 0, 0);
        for y in 0..64 {
            for x in 24..40 {
                frame.data[y * 64 + x] = 255;
            }
        }
        let layout = decomposer().decompose(&frame, 0).unwrap();
        assert_partition(&layout, &frame);
        let stripe = layout
            .tiles()
            .iter()
            .find(|t| t.rect.x == 24)
            .unwrap();
        assert_eq!(stripe.rect, Rect::new(24, 0, 16, 64));
        assert!(matches!(stripe.content, TileContent::Pending(_)));
    }

    #[test]
    fn test_unaligned_frame_is_rejected() {
        let frame = GrayFrame::filled(30, 16, 0, 0);
        assert!(decomposer().decompose(&frame, 0).is_err());
    }
}
