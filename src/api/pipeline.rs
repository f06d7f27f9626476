//! 端到端流程：语料 → 指纹库 → 逐帧求解 → manifest → 合成

use super::assembly::{referenced_ids, AssemblyReport, VideoAssembler};
use crate::core::config::MosaicConfig;
use crate::core::error::Result;
use crate::core::library::{Corpus, IndexReport, Library, PageRasterizer};
use crate::core::video::codec::{FrameDecoder, FrameEncoder};
use crate::render::{Compositor, PageAtlas};
use crate::solver::pipeline::{FrameSolver, SolveReport};
use crate::solver::store::ManifestStore;
use log::info;
use std::path::Path;
use std::sync::Arc;

/// 马赛克流水线
///
/// ```ignore
/// let pipeline = MosaicPipeline::create(config, corpus_dir, cache_path, Arc::new(ImagePageRasterizer))?;
/// let report = pipeline.solve(&mut decoder, manifest_dir)?;
/// pipeline.assemble(manifest_dir, report.total_frames, &mut encoder, 1.0)?;
/// ```
pub struct MosaicPipeline {
    config: MosaicConfig,
    rasterizer: Arc<dyn PageRasterizer>,
    library: Arc<Library>,
    solver: FrameSolver,
    index_report: Option<IndexReport>,
}

impl MosaicPipeline {
    /// 扫描语料并加载（或重建）指纹库缓存
    pub fn create(
        config: MosaicConfig,
        corpus_root: &Path,
        cache_path: &Path,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Result<Self> {
        config.validate()?;
        info!("🧱 MosaicPipeline: corpus {:?}, cache {:?}", corpus_root, cache_path);

        let corpus = Corpus::discover(corpus_root, &config.index.extensions)?;
        let (library, index_report) = Library::load_or_index(
            cache_path,
            &corpus,
            rasterizer.as_ref(),
            config.index.raster_scale,
        )?;
        if let Some(report) = &index_report {
            info!(
                "📊 Indexed {} pages, dropped {} ({:.1}%)",
                report.pages_indexed,
                report.pages_dropped,
                report.drop_rate() * 100.0
            );
        }

        let mut pipeline = Self::from_library(config, Arc::new(library), rasterizer)?;
        pipeline.index_report = index_report;
        Ok(pipeline)
    }

    pub fn from_library(
        config: MosaicConfig,
        library: Arc<Library>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Result<Self> {
        let solver = FrameSolver::new(library.clone(), &config)?;
        Ok(Self {
            config,
            rasterizer,
            library,
            solver,
            index_report: None,
        })
    }

    pub fn config(&self) -> &MosaicConfig {
        &self.config
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// 本次新建索引时的统计；命中缓存时为 None
    pub fn index_report(&self) -> Option<&IndexReport> {
        self.index_report.as_ref()
    }

    pub fn solver(&self) -> &FrameSolver {
        &self.solver
    }

    pub fn open_store(&self, manifest_dir: &Path) -> Result<ManifestStore> {
        ManifestStore::open(
            manifest_dir,
            self.config.manifest_name_width,
            self.config.canvas,
        )
    }

    pub fn solve(&self, decoder: &mut dyn FrameDecoder, manifest_dir: &Path) -> Result<SolveReport> {
        let store = self.open_store(manifest_dir)?;
        self.solver.solve_video(decoder, &store)
    }

    /// 输出尺寸 = 画布 × scale，需与编码器声明一致
    pub fn assemble(
        &self,
        manifest_dir: &Path,
        frame_count: usize,
        encoder: &mut dyn FrameEncoder,
        scale: f32,
    ) -> Result<AssemblyReport> {
        let store = self.open_store(manifest_dir)?;
        let ids = referenced_ids(&store, frame_count);
        let atlas = PageAtlas::build(
            &self.library,
            &ids,
            self.rasterizer.as_ref(),
            self.config.index.raster_scale,
        )?;
        let assembler = VideoAssembler::new(
            Compositor::new(&atlas, self.config.canvas),
            self.config.manifest_policy,
            scale,
        );
        assembler.assemble(&store, frame_count, encoder)
    }
}

impl Drop for MosaicPipeline {
    fn drop(&mut self) {
        info!("🗑️ MosaicPipeline: released");
    }
}
