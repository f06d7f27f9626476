//! 测试辅助：合成光栅化器与指纹库

use crate::core::error::{MosaicError, Result};
use crate::core::library::{Fingerprint, Library, Locator, PageRasterizer, BITS, WORDS};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// 每页生成确定性的伪随机 64×64 位图
pub struct SyntheticRasterizer {
    pages: HashMap<PathBuf, u32>,
    failing: HashSet<(PathBuf, u32)>,
}

impl SyntheticRasterizer {
    pub fn new(docs: &[(&str, u32)]) -> Self {
        Self {
            pages: docs.iter().map(|(d, n)| (PathBuf::from(d), *n)).collect(),
            failing: HashSet::new(),
        }
    }

    pub fn failing_page(mut self, doc: &str, page: u32) -> Self {
        self.failing.insert((PathBuf::from(doc), page));
        self
    }

    pub fn bitmap(doc: &Path, page: u32) -> image::GrayImage {
        let mut hasher = blake3::Hasher::new();
        hasher.update(doc.to_string_lossy().as_bytes());
        hasher.update(&page.to_le_bytes());
        let mut bytes = vec![0u8; BITS];
        hasher.finalize_xof().fill(&mut bytes);
        image::GrayImage::from_raw(64, 64, bytes).unwrap()
    }

    pub fn fingerprint_of(&self, doc: &str, page: u32) -> Fingerprint {
        Fingerprint::from_luma(&Self::bitmap(Path::new(doc), page))
    }
}

impl PageRasterizer for SyntheticRasterizer {
    fn page_count(&self, document: &Path) -> Result<u32> {
        self.pages
            .get(document)
            .copied()
            .ok_or_else(|| MosaicError::Rasterize(format!("{:?} not found", document)))
    }

    fn rasterize(&self, locator: &Locator, _scale: f32) -> Result<image::GrayImage> {
        if self.failing.contains(&(locator.document.clone(), locator.page)) {
            return Err(MosaicError::Rasterize("synthetic failure".into()));
        }
        Ok(Self::bitmap(&locator.document, locator.page))
    }
}

/// 前 n 位置 1 的指纹
pub fn fp_with_popcount(n: usize) -> Fingerprint {
    let mut words = [0u64; WORDS];
    for i in 0..n.min(BITS) {
        words[i / 64] |= 1 << (63 - i % 64);
    }
    Fingerprint::from_words(words)
}

pub fn library_of(table: Vec<Fingerprint>) -> Library {
    let registry = (0..table.len())
        .map(|i| Locator::new("synthetic.pdf", i as u32))
        .collect();
    Library::new(registry, table).unwrap()
}

/// 按弹出数 0..n 均匀分布的指纹库
pub fn graded_library(n: usize) -> Library {
    library_of(
        (0..n)
            .map(|i| fp_with_popcount(i * BITS / n.max(1)))
            .collect(),
    )
}
