use super::atlas::PageAtlas;
use crate::core::config::CanvasSize;
use crate::solver::manifest::{ContentId, Manifest};
use image::imageops::{self, FilterType};

const BLACK: u8 = 0;
const WHITE: u8 = 255;

/// 按 manifest 合成输出帧（gray8，行优先）
pub struct Compositor<'a> {
    atlas: &'a PageAtlas,
    canvas: CanvasSize,
}

impl<'a> Compositor<'a> {
    pub fn new(atlas: &'a PageAtlas, canvas: CanvasSize) -> Self {
        Self { atlas, canvas }
    }

    pub fn output_size(&self, scale: f32) -> (u32, u32) {
        (scaled(self.canvas.width, scale), scaled(self.canvas.height, scale))
    }

    /// 白底；纯黑 / 纯白直接填充，库页面等比缩放后居中贴入。
    /// 缺失页面保持白底。
    pub fn render(&self, manifest: &Manifest, scale: f32) -> Vec<u8> {
        let (out_w, out_h) = self.output_size(scale);
        let mut out = vec![WHITE; out_w as usize * out_h as usize];

        for entry in manifest.entries() {
            // 两端各自取整，相邻块之间不留缝
            let x0 = scaled(entry.x, scale).min(out_w);
            let y0 = scaled(entry.y, scale).min(out_h);
            let x1 = scaled(entry.x + entry.w, scale).min(out_w);
            let y1 = scaled(entry.y + entry.h, scale).min(out_h);
            if x1 <= x0 || y1 <= y0 {
                continue;
            }
            let (rw, rh) = (x1 - x0, y1 - y0);

            match entry.content_id {
                ContentId::SolidBlack => fill(&mut out, out_w, x0, y0, rw, rh, BLACK),
                ContentId::SolidWhite => fill(&mut out, out_w, x0, y0, rw, rh, WHITE),
                ContentId::Library(id) => {
                    let Some(page) = self.atlas.get(id) else {
                        continue;
                    };
                    let (pw, ph) = page.dimensions();
                    if pw == 0 || ph == 0 {
                        continue;
                    }
                    let fit = (rw as f32 / pw as f32).min(rh as f32 / ph as f32);
                    let fw = ((pw as f32 * fit).round() as u32).clamp(1, rw);
                    let fh = ((ph as f32 * fit).round() as u32).clamp(1, rh);
                    let resized = imageops::resize(page, fw, fh, FilterType::Triangle);
                    let ox = x0 + (rw - fw) / 2;
                    let oy = y0 + (rh - fh) / 2;
                    for (dy, row) in resized.rows().enumerate() {
                        let start = (oy as usize + dy) * out_w as usize + ox as usize;
                        for (dx, p) in row.enumerate() {
                            out[start + dx] = p[0];
                        }
                    }
                }
            }
        }
        out
    }
}

fn scaled(v: u32, scale: f32) -> u32 {
    (v as f32 * scale).round() as u32
}

fn fill(out: &mut [u8], stride: u32, x: u32, y: u32, w: u32, h: u32, value: u8) {
    for row in y..y + h {
        let start = row as usize * stride as usize + x as usize;
        out[start..start + w as usize].fill(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::video::frame::Rect;
    use crate::solver::manifest::ManifestEntry;
    use crate::testing::{library_of, SyntheticRasterizer};
    use std::collections::BTreeSet;

    fn canvas() -> CanvasSize {
        CanvasSize {
            width: 8,
            height: 4,
        }
    }

    fn empty_atlas() -> PageAtlas {
        let rasterizer = SyntheticRasterizer::new(&[]);
        let library = crate::testing::graded_library(2);
        PageAtlas::build(&library, &BTreeSet::new(), &rasterizer, 1.0).unwrap()
    }

    #[test]
    fn test_solid_tiles() {
        let atlas = empty_atlas();
        let manifest = Manifest::new(
            0,
            vec![
                ManifestEntry::new(Rect::new(0, 0, 4, 4), ContentId::SolidBlack),
                ManifestEntry::new(Rect::new(4, 0, 4, 4), ContentId::SolidWhite),
            ],
        );
        let compositor = Compositor::new(&atlas, canvas());
        let out = compositor.render(&manifest, 1.0);
        assert_eq!(out.len(), 32);
        assert_eq!(&out[0..8], &[0, 0, 0, 0, 255, 255, 255, 255]);

        let half = compositor.render(&manifest, 0.5);
        assert_eq!(compositor.output_size(0.5), (4, 2));
        assert_eq!(half, vec![0, 0, 255, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn test_missing_page_stays_white() {
        let atlas = empty_atlas();
        let manifest = Manifest::new(
            0,
            vec![ManifestEntry::new(Rect::new(0, 0, 8, 4), ContentId::Library(1))],
        );
        let out = Compositor::new(&atlas, canvas()).render(&manifest, 1.0);
        assert!(out.iter().all(|&p| p == 255));
    }

    #[test]
    fn test_page_is_letterboxed() {
        // 64×64 页面贴进 8×4 区域：等比缩到 4×4，居中于 x=2..6
        let rasterizer = SyntheticRasterizer::new(&[("synthetic.pdf", 1)]);
        let library = library_of(vec![rasterizer.fingerprint_of("synthetic.pdf", 0)]);
        let ids: BTreeSet<u32> = [0].into_iter().collect();
        let atlas = PageAtlas::build(&library, &ids, &rasterizer, 1.0).unwrap();

        let manifest = Manifest::new(
            0,
            vec![ManifestEntry::new(Rect::new(0, 0, 8, 4), ContentId::Library(0))],
        );
        let out = Compositor::new(&atlas, canvas()).render(&manifest, 1.0);
        for y in 0..4 {
            for x in [0usize, 1, 6, 7] {
                assert_eq!(out[y * 8 + x], 255);
            }
        }
    }
}
