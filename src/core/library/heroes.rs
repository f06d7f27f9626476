//! Hero 指纹：按置位数选出的极端页面，用来廉价覆盖大块纯色区域

use super::table::Library;

/// 区域二值色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    Black,
    White,
}

/// 每次求解前构建一次，之后只读
#[derive(Debug, Clone)]
pub struct HeroSet {
    white: u32,
    black: u32,
    white_pool: Vec<u32>,
    black_pool: Vec<u32>,
}

impl HeroSet {
    pub fn from_library(library: &Library, pool_size: usize) -> Self {
        let popcounts: Vec<u32> = library.fingerprints().iter().map(|fp| fp.popcount()).collect();

        // 同值取最小 id
        let mut white = 0usize;
        let mut black = 0usize;
        for (i, &p) in popcounts.iter().enumerate() {
            if p > popcounts[white] {
                white = i;
            }
            if p < popcounts[black] {
                black = i;
            }
        }

        let mut order: Vec<u32> = (0..popcounts.len() as u32).collect();
        order.sort_by_key(|&i| popcounts[i as usize]);
        let k = pool_size.max(1).min(order.len());
        let black_pool = order[..k].to_vec();
        let white_pool = order[order.len() - k..].to_vec();

        Self {
            white: white as u32,
            black: black as u32,
            white_pool,
            black_pool,
        }
    }

    pub fn hero(&self, shade: Shade) -> u32 {
        match shade {
            Shade::White => self.white,
            Shade::Black => self.black,
        }
    }

    pub fn pool(&self, shade: Shade) -> &[u32] {
        match shade {
            Shade::White => &self.white_pool,
            Shade::Black => &self.black_pool,
        }
    }

    /// 按帧号轮换，纯函数查表
    pub fn pooled(&self, shade: Shade, frame_index: usize) -> u32 {
        let pool = self.pool(shade);
        pool[frame_index % pool.len()]
    }
}
