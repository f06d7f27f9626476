use crate::core::error::Result;
use crate::core::library::{Library, PageRasterizer};
use image::GrayImage;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// 渲染用页面图集：只光栅化 manifest 实际引用到的 id
pub struct PageAtlas {
    pages: HashMap<u32, GrayImage>,
    missing: usize,
}

impl PageAtlas {
    pub fn build<R: PageRasterizer + ?Sized>(
        library: &Library,
        ids: &BTreeSet<u32>,
        rasterizer: &R,
        scale: f32,
    ) -> Result<Self> {
        let loaded: Vec<(u32, Option<GrayImage>)> = ids
            .par_iter()
            .map(|&id| {
                let Some(entry) = library.entry(id) else {
                    warn!("⚠️ Library id {} is out of range", id);
                    return (id, None);
                };
                match rasterizer.rasterize(&entry.locator, scale) {
                    Ok(img) => (id, Some(stretch_contrast(img))),
                    Err(e) => {
                        warn!("⚠️ Page {:?} unavailable: {}", entry.locator, e);
                        (id, None)
                    }
                }
            })
            .collect();

        let mut pages = HashMap::with_capacity(loaded.len());
        let mut missing = 0;
        for (id, img) in loaded {
            match img {
                Some(img) => {
                    pages.insert(id, img);
                }
                None => missing += 1,
            }
        }
        info!("🖼️ Page atlas: {} pages, {} missing", pages.len(), missing);
        Ok(Self { pages, missing })
    }

    pub fn get(&self, id: u32) -> Option<&GrayImage> {
        self.pages.get(&id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn missing(&self) -> usize {
        self.missing
    }
}

/// min–max 拉伸到 0..=255，平坦页面原样返回
pub fn stretch_contrast(mut img: GrayImage) -> GrayImage {
    let (lo, hi) = img
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if hi <= lo {
        return img;
    }
    let range = (hi - lo) as u32;
    for p in img.pixels_mut() {
        p[0] = ((p[0] - lo) as u32 * 255 / range) as u8;
    }
    img
}
