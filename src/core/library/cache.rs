//! 指纹库缓存：单个 bincode 文件，求解前整体载入

use super::corpus::{Corpus, Locator, PageRasterizer};
use super::fingerprint::{Fingerprint, WORDS};
use super::indexer::{IndexReport, LibraryIndexer};
use super::table::Library;
use crate::core::error::{MosaicError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub const CACHE_FORMAT_VERSION: u32 = 2;

/// 建库条件：语料摘要 + 光栅化缩放，任一变化缓存即失效
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStamp {
    pub corpus_digest: [u8; 32],
    pub raster_scale: f32,
}

#[derive(Serialize, Deserialize)]
struct LibraryCache {
    format_version: u32,
    stamp: CacheStamp,
    registry: Vec<Locator>,
    words: Vec<u64>,
}

impl Library {
    pub fn save_cache(&self, path: &Path, stamp: CacheStamp) -> Result<()> {
        let cache = LibraryCache {
            format_version: CACHE_FORMAT_VERSION,
            stamp,
            registry: self.registry().to_vec(),
            words: self
                .fingerprints()
                .iter()
                .flat_map(|fp| fp.words().iter().copied())
                .collect(),
        };

        let tmp = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            bincode::serialize_into(&mut writer, &cache)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        info!("💾 Library cache written: {:?} ({} entries)", path, self.len());
        Ok(())
    }

    /// 读取缓存，返回指纹库与建库条件
    pub fn load_cache(path: &Path) -> Result<(Library, CacheStamp)> {
        let reader = BufReader::new(File::open(path)?);
        let cache: LibraryCache = bincode::deserialize_from(reader)?;

        if cache.format_version != CACHE_FORMAT_VERSION {
            return Err(MosaicError::CacheMismatch(format!(
                "format version {} (expected {})",
                cache.format_version, CACHE_FORMAT_VERSION
            )));
        }
        if cache.words.len() != cache.registry.len() * WORDS {
            return Err(MosaicError::CacheMismatch(format!(
                "{} words for {} registry entries",
                cache.words.len(),
                cache.registry.len()
            )));
        }

        let table = cache
            .words
            .chunks_exact(WORDS)
            .map(|chunk| {
                let mut words = [0u64; WORDS];
                words.copy_from_slice(chunk);
                Fingerprint::from_words(words)
            })
            .collect();
        let library = Library::new(cache.registry, table)?;
        info!("📖 Library cache loaded: {:?} ({} entries)", path, library.len());
        Ok((library, cache.stamp))
    }

    /// 缓存存在且与当前语料一致时直接复用，否则重新索引并覆盖缓存
    pub fn load_or_index<R: PageRasterizer + ?Sized>(
        cache_path: &Path,
        corpus: &Corpus,
        rasterizer: &R,
        scale: f32,
    ) -> Result<(Library, Option<IndexReport>)> {
        let stamp = CacheStamp {
            corpus_digest: corpus.digest(),
            raster_scale: scale,
        };
        if cache_path.exists() {
            match Library::load_cache(cache_path) {
                Ok((library, cached)) if cached == stamp => return Ok((library, None)),
                Ok(_) => warn!(
                    "⚠️ Corpus or raster scale changed since {:?} was built, re-indexing",
                    cache_path
                ),
                Err(e) => warn!("⚠️ Ignoring unusable cache {:?}: {}", cache_path, e),
            }
        }

        let (library, report) = LibraryIndexer::new(rasterizer, scale).index(corpus)?;
        library.save_cache(cache_path, stamp)?;
        Ok((library, Some(report)))
    }
}
