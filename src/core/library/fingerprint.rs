//! 64×64 二值指纹
//!
//! 页面位图与帧内区块走同一条路径：面积平均下采样到 64×64，
//! 以中点 127 二值化，按行优先打包成 64 个 u64（每字高位在前）。
//! 两侧任何一步不一致，匹配都会悄悄退化。

use crate::core::video::frame::{GrayFrame, Rect, MIDPOINT};
use std::fmt;

pub const SIDE: u32 = 64;
pub const WORDS: usize = 64;
pub const BITS: usize = WORDS * 64;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u64; WORDS]);

impl Fingerprint {
    pub const fn from_words(words: [u64; WORDS]) -> Self {
        Self(words)
    }

    pub fn words(&self) -> &[u64; WORDS] {
        &self.0
    }

    /// 从 4096 个灰度采样打包（> 127 记 1）
    pub fn from_samples(samples: &[u8]) -> Self {
        debug_assert_eq!(samples.len(), BITS);
        let mut words = [0u64; WORDS];
        for (i, &v) in samples.iter().enumerate().take(BITS) {
            if v > MIDPOINT {
                words[i / 64] |= 1 << (63 - i % 64);
            }
        }
        Self(words)
    }

    /// 帧内区块指纹
    pub fn from_region(frame: &GrayFrame, rect: &Rect) -> Self {
        let samples = downsample_area(&frame.data, frame.width as usize, rect);
        Self::from_samples(&samples)
    }

    /// 整张页面位图的指纹
    pub fn from_luma(img: &image::GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let samples = downsample_area(img.as_raw(), w as usize, &Rect::new(0, 0, w, h));
        Self::from_samples(&samples)
    }

    #[inline]
    pub fn hamming(&self, other: &Fingerprint) -> u32 {
        hamming_words(&self.0, &other.0)
    }

    pub fn popcount(&self) -> u32 {
        self.0.iter().map(|w| w.count_ones()).sum()
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fingerprint {{ popcount: {}, head: {:016x} }}",
            self.popcount(),
            self.0[0]
        )
    }
}

#[inline]
pub fn hamming_words(a: &[u64; WORDS], b: &[u64; WORDS]) -> u32 {
    let mut dist = 0u32;
    for j in 0..WORDS {
        dist += (a[j] ^ b[j]).count_ones();
    }
    dist
}

/// 一维面积权重：目标像素 d 覆盖源区间 [d*src, (d+1)*src)，
/// 源像素 s 覆盖 [s*dst, (s+1)*dst)，权重为重叠长度，总和恒为 src
fn area_weights(src: u32, dst: u32) -> Vec<Vec<(u32, u64)>> {
    let (src, dst) = (src as u64, dst as u64);
    (0..dst)
        .map(|d| {
            let start = d * src;
            let end = (d + 1) * src;
            let first = start / dst;
            let last = (end - 1) / dst;
            (first..=last)
                .map(|s| {
                    let lo = start.max(s * dst);
                    let hi = end.min((s + 1) * dst);
                    (s as u32, hi - lo)
                })
                .collect()
        })
        .collect()
}

/// 面积平均下采样到 64×64（整数权重，四舍五入）
fn downsample_area(data: &[u8], stride: usize, rect: &Rect) -> Vec<u8> {
    if rect.is_empty() {
        return vec![0u8; BITS];
    }
    let xw = area_weights(rect.w, SIDE);
    let yw = area_weights(rect.h, SIDE);
    let total = rect.w as u64 * rect.h as u64;

    let mut out = Vec::with_capacity(BITS);
    for ys in &yw {
        for xs in &xw {
            let mut acc = 0u64;
            for &(sy, wy) in ys {
                let row = (rect.y + sy) as usize * stride + rect.x as usize;
                for &(sx, wx) in xs {
                    acc += wy * wx * data[row + sx as usize] as u64;
                }
            }
            out.push(((acc + total / 2) / total) as u8);
        }
    }
    out
}
