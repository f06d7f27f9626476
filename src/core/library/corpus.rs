//! 语料：文档发现 + 页面光栅化协作者

use crate::core::error::{MosaicError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// 页面定位：(文档, 页码)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub document: PathBuf,
    pub page: u32,
}

impl Locator {
    pub fn new(document: impl Into<PathBuf>, page: u32) -> Self {
        Self {
            document: document.into(),
            page,
        }
    }
}

/// 注册表条目，id 即在指纹表中的下标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub id: u32,
    pub locator: Locator,
}

/// 页面光栅化器。PDF 等格式由外部实现，本库自带图片实现
pub trait PageRasterizer: Send + Sync {
    fn page_count(&self, document: &Path) -> Result<u32>;

    fn rasterize(&self, locator: &Locator, scale: f32) -> Result<image::GrayImage>;
}

/// 每个图片文件视为单页文档
#[derive(Debug, Default, Clone, Copy)]
pub struct ImagePageRasterizer;

impl PageRasterizer for ImagePageRasterizer {
    fn page_count(&self, document: &Path) -> Result<u32> {
        image::image_dimensions(document)?;
        Ok(1)
    }

    fn rasterize(&self, locator: &Locator, scale: f32) -> Result<image::GrayImage> {
        if locator.page != 0 {
            return Err(MosaicError::Rasterize(format!(
                "{:?} has a single page, requested page {}",
                locator.document, locator.page
            )));
        }
        let gray = image::open(&locator.document)?.to_luma8();
        if (scale - 1.0).abs() < f32::EPSILON {
            return Ok(gray);
        }
        let (w, h) = gray.dimensions();
        let sw = ((w as f32 * scale).round() as u32).max(1);
        let sh = ((h as f32 * scale).round() as u32).max(1);
        Ok(image::imageops::resize(
            &gray,
            sw,
            sh,
            image::imageops::FilterType::Triangle,
        ))
    }
}

/// 待索引的文档集合（有序）
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<PathBuf>,
}

impl Corpus {
    pub fn from_documents(mut documents: Vec<PathBuf>) -> Self {
        documents.sort();
        Self { documents }
    }

    /// 递归扫描目录，按扩展名（忽略大小写）过滤
    pub fn discover(root: &Path, extensions: &[String]) -> Result<Self> {
        info!("📂 Scanning corpus under {:?}", root);
        if !root.is_dir() {
            return Err(MosaicError::EmptyCorpus(format!(
                "{:?} is not a directory",
                root
            )));
        }

        let mut documents = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| MosaicError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| extensions.iter().any(|want| want.eq_ignore_ascii_case(e)))
                .unwrap_or(false);
            if matches {
                documents.push(entry.into_path());
            }
        }

        if documents.is_empty() {
            return Err(MosaicError::EmptyCorpus(format!(
                "no documents with extensions {:?} under {:?}",
                extensions, root
            )));
        }
        debug!("Found {} documents", documents.len());
        Ok(Self::from_documents(documents))
    }

    pub fn documents(&self) -> &[PathBuf] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 文档路径 + 文件大小 + 修改时间的摘要，语料变动时缓存随之失效
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        for doc in &self.documents {
            hasher.update(doc.to_string_lossy().as_bytes());
            hasher.update(&[0]);
            let (size, mtime) = std::fs::metadata(doc)
                .map(|m| {
                    let mtime = m
                        .modified()
                        .ok()
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map(|d| d.as_nanos())
                        .unwrap_or(0);
                    (m.len(), mtime)
                })
                .unwrap_or((0, 0));
            hasher.update(&size.to_le_bytes());
            hasher.update(&mtime.to_le_bytes());
        }
        *hasher.finalize().as_bytes()
    }
}
