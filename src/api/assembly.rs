//! 视频合成 - 逐帧读取 manifest，渲染后交给编码器

use crate::core::config::ManifestPolicy;
use crate::core::error::{MosaicError, Result};
use crate::core::video::codec::FrameEncoder;
use crate::render::Compositor;
use crate::solver::store::ManifestStore;
use log::{error, info, warn};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub frames_written: usize,
    /// Skip 策略下被略过的帧号
    pub skipped: Vec<usize>,
}

/// 视频合成器
///
/// 单帧 manifest 损坏 / 缺失时按策略处理：
/// - `Skip`: 记录并略过该帧
/// - `Strict`: 立即中止
pub struct VideoAssembler<'a> {
    compositor: Compositor<'a>,
    policy: ManifestPolicy,
    scale: f32,
}

impl<'a> VideoAssembler<'a> {
    pub fn new(compositor: Compositor<'a>, policy: ManifestPolicy, scale: f32) -> Self {
        Self {
            compositor,
            policy,
            scale,
        }
    }

    pub fn assemble(
        &self,
        store: &ManifestStore,
        frame_count: usize,
        encoder: &mut dyn FrameEncoder,
    ) -> Result<AssemblyReport> {
        let (w, h) = self.compositor.output_size(self.scale);
        if (encoder.width(), encoder.height()) != (w, h) {
            return Err(MosaicError::Encode(format!(
                "encoder expects {}x{}, compositor renders {}x{}",
                encoder.width(),
                encoder.height(),
                w,
                h
            )));
        }
        info!("🎬 Assembling {} frames at {}x{}", frame_count, w, h);

        let mut report = AssemblyReport::default();
        for index in 0..frame_count {
            let manifest = match store.read(index) {
                Ok(m) => m,
                Err(e) => match self.policy {
                    ManifestPolicy::Skip => {
                        warn!("⚠️ Skipping frame {}: {}", index, e);
                        report.skipped.push(index);
                        continue;
                    }
                    ManifestPolicy::Strict => {
                        error!("❌ Aborting assembly at frame {}: {}", index, e);
                        return Err(e);
                    }
                },
            };
            let pixels = self.compositor.render(&manifest, self.scale);
            encoder.write_frame(&pixels)?;
            report.frames_written += 1;
        }
        encoder.finish()?;

        info!(
            "✅ Assembly done: {} written, {} skipped",
            report.frames_written,
            report.skipped.len()
        );
        Ok(report)
    }
}

/// 收集 manifest 引用到的全部库 id，读不出的帧留给合成阶段按策略处理
pub fn referenced_ids(store: &ManifestStore, frame_count: usize) -> BTreeSet<u32> {
    (0..frame_count)
        .filter_map(|i| store.read(i).ok())
        .flat_map(|m| m.library_ids().collect::<Vec<_>>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CanvasSize;
    use crate::core::video::codec::RawVideoWriter;
    use crate::core::video::frame::Rect;
    use crate::render::PageAtlas;
    use crate::solver::manifest::{ContentId, Manifest, ManifestEntry};
    use crate::testing::{graded_library, SyntheticRasterizer};

    fn canvas() -> CanvasSize {
        CanvasSize {
            width: 4,
            height: 2,
        }
    }

    fn setup() -> (tempfile::TempDir, ManifestStore, PageAtlas) {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::open(dir.path(), 6, canvas()).unwrap();
        for (i, id) in [(0usize, ContentId::SolidBlack), (2, ContentId::SolidWhite)] {
            store
                .write(&Manifest::new(
                    i,
                    vec![ManifestEntry::new(Rect::new(0, 0, 4, 2), id)],
                ))
                .unwrap();
        }
        let atlas = PageAtlas::build(
            &graded_library(2),
            &BTreeSet::new(),
            &SyntheticRasterizer::new(&[]),
            1.0,
        )
        .unwrap();
        (dir, store, atlas)
    }

    #[test]
    fn test_skip_policy_omits_missing_frame() {
        let (_dir, store, atlas) = setup();
        let assembler = VideoAssembler::new(
            Compositor::new(&atlas, canvas()),
            ManifestPolicy::Skip,
            1.0,
        );
        let mut encoder = RawVideoWriter::new(Vec::new(), 4, 2);
        let report = assembler.assemble(&store, 3, &mut encoder).unwrap();

        assert_eq!(report.frames_written, 2);
        assert_eq!(report.skipped, vec![1]);
        let mut expected = vec![0u8; 8];
        expected.extend([255u8; 8]);
        assert_eq!(encoder.into_inner(), expected);
    }

    #[test]
    fn test_strict_policy_aborts() {
        let (_dir, store, atlas) = setup();
        let assembler = VideoAssembler::new(
            Compositor::new(&atlas, canvas()),
            ManifestPolicy::Strict,
            1.0,
        );
        let mut encoder = RawVideoWriter::new(Vec::new(), 4, 2);
        assert!(matches!(
            assembler.assemble(&store, 3, &mut encoder),
            Err(MosaicError::MissingManifest(1))
        ));
    }

    #[test]
    fn test_encoder_size_mismatch() {
        let (_dir, store, atlas) = setup();
        let assembler = VideoAssembler::new(
            Compositor::new(&atlas, canvas()),
            ManifestPolicy::Skip,
            2.0,
        );
        let mut encoder = RawVideoWriter::new(Vec::new(), 4, 2);
        assert!(assembler.assemble(&store, 3, &mut encoder).is_err());
    }

    #[test]
    fn test_referenced_ids() {
        let (_dir, store, _atlas) = setup();
        store
            .write(&Manifest::new(
                3,
                vec![
                    ManifestEntry::new(Rect::new(0, 0, 2, 2), ContentId::Library(5)),
                    ManifestEntry::new(Rect::new(2, 0, 2, 2), ContentId::Library(1)),
                ],
            ))
            .unwrap();
        assert_eq!(
            referenced_ids(&store, 4).into_iter().collect::<Vec<_>>(),
            vec![1, 5]
        );
    }
}
