//! 视频马赛克求解库
//!
//! 把视频逐帧分解成矩形区块：大块纯色直接定值，其余区块按 64×64 二值指纹
//! 在文档页面库中找汉明距离最近的页面。每帧输出一个 manifest，下游据此
//! 渲染并合成视频。
//!
//! 日志走 `log` 门面，由宿主程序安装具体实现。

pub mod api;
pub mod core;
pub mod render;
pub mod solver;

#[cfg(test)]
mod testing;

pub use crate::api::{AssemblyReport, MosaicPipeline, VideoAssembler};
pub use crate::core::{MosaicConfig, MosaicError, Result};
pub use crate::solver::{ContentId, FrameSolver, Manifest, ManifestEntry, ManifestStore, SolveReport};
