use super::frame::GrayFrame;
use std::collections::{BTreeMap, HashMap};

/// 时序去重器 - 像素完全一致的帧复用首帧结果
/// 只做精确匹配，不做感知相似；必须按帧序串行调用
pub struct TemporalDeduplicator {
    /// 内容哈希 → 首次出现的帧号
    seen: HashMap<[u8; 32], usize>,
    unique: usize,
    aliased: usize,
}

/// 去重决策结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    Unique,
    AliasOf(usize),
}

impl TemporalDeduplicator {
    pub fn new() -> Self {
        Self {
            seen: HashMap::new(),
            unique: 0,
            aliased: 0,
        }
    }

    /// 帧尺寸 + 灰度像素的 blake3
    pub fn content_hash(frame: &GrayFrame) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&frame.width.to_le_bytes());
        hasher.update(&frame.height.to_le_bytes());
        hasher.update(&frame.data);
        *hasher.finalize().as_bytes()
    }

    pub fn classify(&mut self, frame: &GrayFrame) -> DedupDecision {
        let hash = Self::content_hash(frame);
        match self.seen.get(&hash) {
            Some(&first) => {
                self.aliased += 1;
                DedupDecision::AliasOf(first)
            }
            None => {
                self.seen.insert(hash, frame.frame_number);
                self.unique += 1;
                DedupDecision::Unique
            }
        }
    }

    /// 整批去重：返回唯一帧与 alias 表（帧号 → 首帧帧号）
    pub fn dedup(&mut self, frames: Vec<GrayFrame>) -> (Vec<GrayFrame>, BTreeMap<usize, usize>) {
        let mut unique = Vec::new();
        let mut aliases = BTreeMap::new();
        for frame in frames {
            match self.classify(&frame) {
                DedupDecision::Unique => unique.push(frame),
                DedupDecision::AliasOf(first) => {
                    aliases.insert(frame.frame_number, first);
                }
            }
        }
        (unique, aliases)
    }

    pub fn unique_count(&self) -> usize {
        self.unique
    }

    pub fn aliased_count(&self) -> usize {
        self.aliased
    }
}

impl Default for TemporalDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_frame(fill: u8, frame_number: usize) -> GrayFrame {
        GrayFrame::filled(16, 12, fill, frame_number)
    }

    #[test]
    fn test_identical_frames_alias_first() {
        let mut dedup = TemporalDeduplicator::new();
        let frames = vec![
            create_test_frame(0, 0),
            create_test_frame(255, 1),
            create_test_frame(0, 2),
            create_test_frame(0, 3),
            create_test_frame(255, 4),
        ];
        let (unique, aliases) = dedup.dedup(frames);

        assert_eq!(unique.iter().map(|f| f.frame_number).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(aliases.get(&2), Some(&0));
        assert_eq!(aliases.get(&3), Some(&0));
        assert_eq!(aliases.get(&4), Some(&1));
        assert_eq!(dedup.unique_count(), 2);
        assert_eq!(dedup.aliased_count(), 3);
    }

    #[test]
    fn test_single_pixel_difference_is_unique() {
        let mut dedup = TemporalDeduplicator::new();
        let a = create_test_frame(10, 0);
        let mut b = create_test_frame(10, 1);
        b.data[5] = 11;
        assert_eq!(dedup.classify(&a), DedupDecision::Unique);
        assert_eq!(dedup.classify(&b), DedupDecision::Unique);
    }

    #[test]
    fn test_size_is_part_of_identity() {
        let a = GrayFrame::filled(4, 8, 0, 0);
        let b = GrayFrame::filled(8, 4, 0, 1);
        assert_ne!(
            TemporalDeduplicator::content_hash(&a),
            TemporalDeduplicator::content_hash(&b)
        );
    }
}
