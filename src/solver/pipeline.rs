use super::decomposer::{build_decomposer, Decomposer};
use super::manifest::Manifest;
use super::store::ManifestStore;
use crate::core::config::{CanvasSize, MosaicConfig, StrategyConfig};
use crate::core::error::{MosaicError, Result};
use crate::core::library::{HeroSet, Library};
use crate::core::matcher::match_batch;
use crate::core::video::codec::FrameDecoder;
use crate::core::video::deduplicator::{DedupDecision, TemporalDeduplicator};
use crate::core::video::frame::GrayFrame;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// 单帧失败记录，不影响其他帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFailure {
    pub frame: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveReport {
    pub total_frames: usize,
    pub unique_frames: usize,
    pub aliased_frames: usize,
    /// 续跑时已存在 manifest 而跳过的帧
    pub skipped_existing: usize,
    pub failures: Vec<FrameFailure>,
}

impl SolveReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 内存中的整段求解结果，按帧号索引
#[derive(Debug, Default)]
pub struct SolvedVideo {
    manifests: BTreeMap<usize, Manifest>,
    failures: Vec<FrameFailure>,
}

impl SolvedVideo {
    pub fn get(&self, frame_index: usize) -> Option<&Manifest> {
        self.manifests.get(&frame_index)
    }

    /// 按原始帧序遍历
    pub fn in_order(&self) -> impl Iterator<Item = &Manifest> {
        self.manifests.values()
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn failures(&self) -> &[FrameFailure] {
        &self.failures
    }
}

/// 帧求解编排：分解 → 一次批量匹配 → 回填 → 落盘
pub struct FrameSolver {
    library: Arc<Library>,
    decomposer: Box<dyn Decomposer>,
    canvas: CanvasSize,
    pool: rayon::ThreadPool,
    batch_frames: usize,
}

impl FrameSolver {
    pub fn new(library: Arc<Library>, config: &MosaicConfig) -> Result<Self> {
        let pool_size = match &config.strategy {
            StrategyConfig::Hybrid(h) => h.pool_size,
            _ => 1,
        };
        let heroes = Arc::new(HeroSet::from_library(&library, pool_size));
        let decomposer = build_decomposer(&config.strategy, heroes);
        Self::with_decomposer(library, config, decomposer)
    }

    /// 使用自定义分解策略；config.strategy 仅参与校验
    pub fn with_decomposer(
        library: Arc<Library>,
        config: &MosaicConfig,
        decomposer: Box<dyn Decomposer>,
    ) -> Result<Self> {
        config.validate()?;
        if library.is_empty() {
            return Err(MosaicError::EmptyLibrary);
        }

        let workers = config.worker_count();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| MosaicError::InvalidConfig(format!("thread pool: {}", e)))?;

        info!(
            "🧩 FrameSolver: {} strategy, {} library entries, {} workers",
            decomposer.name(),
            library.len(),
            workers
        );
        Ok(Self {
            library,
            decomposer,
            canvas: config.canvas,
            pool,
            batch_frames: workers * 8,
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// 单帧求解；帧号取自 frame.frame_number
    pub fn solve_frame(&self, frame: &GrayFrame) -> Result<Manifest> {
        if frame.width != self.canvas.width || frame.height != self.canvas.height {
            return Err(MosaicError::FrameSize {
                frame: frame.frame_number,
                width: frame.width,
                height: frame.height,
                expected_width: self.canvas.width,
                expected_height: self.canvas.height,
            });
        }
        frame.check_buffer()?;

        let layout = self.decomposer.decompose(frame, frame.frame_number)?;
        let ids = match_batch(self.library.fingerprints(), layout.pending())?;
        debug!(
            "Frame {}: {} tiles, {} matched",
            frame.frame_number,
            layout.tiles().len(),
            ids.len()
        );
        layout.splice(frame.frame_number, &ids)
    }

    /// 内存模式：去重后并行求解，alias 帧复制目标帧的 manifest
    pub fn solve_frames(&self, frames: Vec<GrayFrame>) -> SolvedVideo {
        let mut dedup = TemporalDeduplicator::new();
        let mut failures = Vec::new();
        let mut fitted = Vec::with_capacity(frames.len());
        for frame in frames {
            let index = frame.frame_number;
            match frame.fit_to(self.canvas.width, self.canvas.height) {
                Ok(f) => fitted.push(f),
                Err(e) => failures.push(FrameFailure {
                    frame: index,
                    error: e.to_string(),
                }),
            }
        }
        let (unique, aliases) = dedup.dedup(fitted);

        let results: Vec<(usize, Result<Manifest>)> = self.pool.install(|| {
            unique
                .par_iter()
                .map(|f| (f.frame_number, self.solve_frame(f)))
                .collect()
        });

        let mut manifests = BTreeMap::new();
        for (index, result) in results {
            match result {
                Ok(m) => {
                    manifests.insert(index, m);
                }
                Err(e) => failures.push(FrameFailure {
                    frame: index,
                    error: e.to_string(),
                }),
            }
        }
        for (index, target) in aliases {
            match manifests.get(&target).map(|m| m.aliased_as(index)) {
                Some(m) => {
                    manifests.insert(index, m);
                }
                None => failures.push(FrameFailure {
                    frame: index,
                    error: format!("alias target {} failed", target),
                }),
            }
        }
        failures.sort_by_key(|f| f.frame);
        SolvedVideo {
            manifests,
            failures,
        }
    }

    /// 流式求解整段视频并写入 store。
    /// 去重串行进行，唯一帧按批并行求解；已有 manifest 的帧跳过，支持续跑。
    pub fn solve_video(
        &self,
        decoder: &mut dyn FrameDecoder,
        store: &ManifestStore,
    ) -> Result<SolveReport> {
        info!(
            "🎬 Solving video ({} frames expected)",
            decoder
                .frame_count_hint()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "?".into())
        );

        let mut dedup = TemporalDeduplicator::new();
        let mut report = SolveReport::default();
        let mut failed: HashSet<usize> = HashSet::new();
        let mut aliases: Vec<(usize, usize)> = Vec::new();
        let mut batch: Vec<GrayFrame> = Vec::with_capacity(self.batch_frames);

        loop {
            let index = report.total_frames;
            let frame = match decoder.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    // 解码器已越过坏帧，继续读取后续帧
                    warn!("⚠️ Frame {} could not be decoded: {}", index, e);
                    report.total_frames += 1;
                    failed.insert(index);
                    report.failures.push(FrameFailure {
                        frame: index,
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            report.total_frames += 1;
            let frame = GrayFrame {
                frame_number: index,
                ..frame
            };
            let frame = match frame.fit_to(self.canvas.width, self.canvas.height) {
                Ok(f) => f,
                Err(e) => {
                    warn!("⚠️ Frame {} could not be fitted: {}", index, e);
                    failed.insert(index);
                    report.failures.push(FrameFailure {
                        frame: index,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            match dedup.classify(&frame) {
                DedupDecision::AliasOf(target) => aliases.push((index, target)),
                DedupDecision::Unique => {
                    if store.contains(index) {
                        report.skipped_existing += 1;
                        continue;
                    }
                    batch.push(frame);
                    if batch.len() >= self.batch_frames {
                        self.flush_batch(&mut batch, store, &mut report, &mut failed);
                    }
                }
            }
        }
        self.flush_batch(&mut batch, store, &mut report, &mut failed);
        report.unique_frames = dedup.unique_count();
        report.aliased_frames = dedup.aliased_count();

        for (index, target) in aliases {
            if store.contains(index) {
                report.skipped_existing += 1;
                continue;
            }
            let result = if failed.contains(&target) {
                Err(MosaicError::MissingManifest(target))
            } else {
                store.copy(target, index)
            };
            if let Err(e) = result {
                warn!("⚠️ Alias frame {} → {} failed: {}", index, target, e);
                report.failures.push(FrameFailure {
                    frame: index,
                    error: e.to_string(),
                });
            }
        }

        report.failures.sort_by_key(|f| f.frame);
        info!(
            "✅ Solved {} frames: {} unique, {} aliased, {} skipped, {} failed",
            report.total_frames,
            report.unique_frames,
            report.aliased_frames,
            report.skipped_existing,
            report.failures.len()
        );
        Ok(report)
    }

    fn flush_batch(
        &self,
        batch: &mut Vec<GrayFrame>,
        store: &ManifestStore,
        report: &mut SolveReport,
        failed: &mut HashSet<usize>,
    ) {
        if batch.is_empty() {
            return;
        }
        let results: Vec<(usize, Result<()>)> = self.pool.install(|| {
            batch
                .par_iter()
                .map(|f| {
                    let result = self.solve_frame(f).and_then(|m| store.write(&m));
                    (f.frame_number, result)
                })
                .collect()
        });
        for (index, result) in results {
            if let Err(e) = result {
                warn!("⚠️ Frame {} failed: {}", index, e);
                failed.insert(index);
                report.failures.push(FrameFailure {
                    frame: index,
                    error: e.to_string(),
                });
            }
        }
        batch.clear();
    }
}
