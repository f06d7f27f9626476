use crate::core::error::{MosaicError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 512,
            height: 384,
        }
    }
}

/// 固定四叉树
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeConfig {
    /// 方差低于该值视为纯色
    pub solidity_threshold: f64,
    /// 边长不超过该值时作为叶子送去匹配
    pub leaf_size: u32,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            solidity_threshold: 5.0,
            leaf_size: 32,
        }
    }
}

/// 贪心矩形生长
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyConfig {
    pub cell: u32,
    pub max_block: u32,
    /// 宽高都不小于该值时直接用 hero id
    pub hero_min_side: u32,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            cell: 8,
            max_block: 256,
            hero_min_side: 32,
        }
    }
}

/// 分层混合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridConfig {
    /// 画布先切成该边长的根块
    pub root_block: u32,
    pub min_block: u32,
    pub max_block: u32,
    pub std_threshold: f64,
    /// 黑 / 白轮换池大小
    pub pool_size: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            root_block: 128,
            min_block: 16,
            max_block: 256,
            std_threshold: 2.0,
            pool_size: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    Quadtree(QuadtreeConfig),
    Greedy(GreedyConfig),
    Hybrid(HybridConfig),
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::Quadtree(QuadtreeConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// 建库时的光栅化缩放
    pub raster_scale: f32,
    pub extensions: Vec<String>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            raster_scale: 0.3,
            extensions: vec!["png".into(), "jpg".into(), "jpeg".into(), "bmp".into()],
        }
    }
}

/// 下游读取 manifest 出错时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestPolicy {
    /// 记录并跳过该帧
    #[default]
    Skip,
    /// 整体中止
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicConfig {
    pub canvas: CanvasSize,
    pub strategy: StrategyConfig,
    pub index: IndexConfig,
    /// 工作线程数，None 时取 CPU 核数
    pub workers: Option<usize>,
    pub manifest_policy: ManifestPolicy,
    pub manifest_name_width: usize,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            strategy: StrategyConfig::default(),
            index: IndexConfig::default(),
            workers: None,
            manifest_policy: ManifestPolicy::default(),
            manifest_name_width: 6,
        }
    }
}

impl MosaicConfig {
    pub fn quadtree() -> Self {
        Self::default()
    }

    pub fn greedy() -> Self {
        Self {
            strategy: StrategyConfig::Greedy(GreedyConfig::default()),
            ..Default::default()
        }
    }

    pub fn hybrid() -> Self {
        Self {
            strategy: StrategyConfig::Hybrid(HybridConfig::default()),
            ..Default::default()
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: MosaicConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(MosaicError::InvalidConfig(msg)) };
        let CanvasSize { width, height } = self.canvas;
        if width == 0 || height == 0 {
            return invalid(format!("canvas {}x{} is empty", width, height));
        }
        if self.index.raster_scale <= 0.0 {
            return invalid(format!("raster_scale {} must be positive", self.index.raster_scale));
        }
        if self.manifest_name_width == 0 {
            return invalid("manifest_name_width must be positive".into());
        }

        match &self.strategy {
            StrategyConfig::Quadtree(q) => {
                if q.leaf_size == 0 {
                    return invalid("leaf_size must be positive".into());
                }
            }
            StrategyConfig::Greedy(g) => {
                if g.cell == 0 || g.max_block < g.cell {
                    return invalid(format!("cell {} / max_block {}", g.cell, g.max_block));
                }
                if width % g.cell != 0 || height % g.cell != 0 {
                    return invalid(format!(
                        "canvas {}x{} is not a multiple of cell {}",
                        width, height, g.cell
                    ));
                }
            }
            StrategyConfig::Hybrid(h) => {
                if h.min_block == 0 || h.min_block > h.max_block {
                    return invalid(format!(
                        "min_block {} / max_block {}",
                        h.min_block, h.max_block
                    ));
                }
                if h.root_block == 0 || h.root_block > h.max_block {
                    return invalid(format!(
                        "root_block {} must be within 1..={}",
                        h.root_block, h.max_block
                    ));
                }
                if h.pool_size == 0 {
                    return invalid("pool_size must be positive".into());
                }
            }
        }
        Ok(())
    }
}
