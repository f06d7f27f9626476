//! 两阶段布局：分解时先收集待匹配叶子，批量匹配后按位置回填

use super::manifest::{ContentId, Manifest, ManifestEntry};
use crate::core::error::{MosaicError, Result};
use crate::core::library::Fingerprint;
use crate::core::video::frame::{GrayFrame, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileContent {
    Resolved(ContentId),
    /// 待匹配叶子在 pending 列表中的位置
    Pending(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub rect: Rect,
    pub content: TileContent,
}

/// 分解结果：区块序列 + 按入队顺序排列的叶子指纹
#[derive(Debug, Default)]
pub struct Layout {
    tiles: Vec<Tile>,
    pending: Vec<Fingerprint>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_resolved(&mut self, rect: Rect, content: ContentId) {
        self.tiles.push(Tile {
            rect,
            content: TileContent::Resolved(content),
        });
    }

    /// 对区块取指纹并入队
    pub fn push_pending(&mut self, frame: &GrayFrame, rect: Rect) {
        let slot = self.pending.len();
        self.pending.push(Fingerprint::from_region(frame, &rect));
        self.tiles.push(Tile {
            rect,
            content: TileContent::Pending(slot),
        });
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn pending(&self) -> &[Fingerprint] {
        &self.pending
    }

    /// 用批量匹配结果回填，生成最终 manifest
    pub fn splice(self, frame_index: usize, ids: &[u32]) -> Result<Manifest> {
        if ids.len() != self.pending.len() {
            return Err(MosaicError::CorruptManifest {
                frame: frame_index,
                reason: format!(
                    "{} match results for {} pending leaves",
                    ids.len(),
                    self.pending.len()
                ),
            });
        }
        let entries = self
            .tiles
            .into_iter()
            .map(|tile| {
                let content = match tile.content {
                    TileContent::Resolved(id) => id,
                    TileContent::Pending(slot) => ContentId::Library(ids[slot]),
                };
                ManifestEntry::new(tile.rect, content)
            })
            .collect();
        Ok(Manifest::new(frame_index, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splice_by_position() {
        let frame = GrayFrame::filled(8, 8, 0, 0);
        let mut layout = Layout::new();
        layout.push_pending(&frame, Rect::new(0, 0, 4, 4));
        layout.push_resolved(Rect::new(4, 0, 4, 4), ContentId::SolidWhite);
        layout.push_pending(&frame, Rect::new(0, 4, 8, 4));
        assert_eq!(layout.pending().len(), 2);

        let manifest = layout.splice(5, &[42, 7]).unwrap();
        let ids: Vec<i32> = manifest.entries().iter().map(|e| e.content_id.as_i32()).collect();
        assert_eq!(ids, vec![42, -2, 7]);
        assert_eq!(manifest.frame_index(), 5);
    }

    #[test]
    fn test_splice_rejects_wrong_count() {
        let frame = GrayFrame::filled(4, 4, 0, 0);
        let mut layout = Layout::new();
        layout.push_pending(&frame, frame.bounds());
        assert!(layout.splice(0, &[]).is_err());
    }
}
