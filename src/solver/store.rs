//! 每帧一个 manifest 文件，文件名为补零帧号

use super::manifest::Manifest;
use crate::core::config::CanvasSize;
use crate::core::error::{MosaicError, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ManifestStore {
    dir: PathBuf,
    name_width: usize,
    canvas: CanvasSize,
}

impl ManifestStore {
    pub fn open(dir: &Path, name_width: usize, canvas: CanvasSize) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            name_width: name_width.max(1),
            canvas,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn path_for(&self, frame_index: usize) -> PathBuf {
        self.dir
            .join(format!("{:0width$}.bin", frame_index, width = self.name_width))
    }

    pub fn contains(&self, frame_index: usize) -> bool {
        self.path_for(frame_index).is_file()
    }

    /// 先写临时文件再改名，中断时不会留下半个 manifest
    pub fn write(&self, manifest: &Manifest) -> Result<()> {
        let bytes = manifest.to_bytes()?;
        let path = self.path_for(manifest.frame_index());
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &path)?;
        debug!("Manifest written: {:?} ({} tiles)", path, manifest.len());
        Ok(())
    }

    pub fn read(&self, frame_index: usize) -> Result<Manifest> {
        let path = self.path_for(frame_index);
        if !path.is_file() {
            return Err(MosaicError::MissingManifest(frame_index));
        }
        let bytes = fs::read(&path)?;
        let manifest =
            Manifest::from_bytes(frame_index, &bytes).map_err(|e| MosaicError::CorruptManifest {
                frame: frame_index,
                reason: e.to_string(),
            })?;
        manifest
            .validate_partition(self.canvas)
            .map_err(|reason| MosaicError::CorruptManifest {
                frame: frame_index,
                reason,
            })?;
        Ok(manifest)
    }

    /// alias 帧直接复制目标帧的文件
    pub fn copy(&self, from: usize, to: usize) -> Result<()> {
        let src = self.path_for(from);
        if !src.is_file() {
            return Err(MosaicError::MissingManifest(from));
        }
        let dst = self.path_for(to);
        let tmp = dst.with_extension("tmp");
        fs::copy(&src, &tmp)?;
        fs::rename(&tmp, &dst)?;
        Ok(())
    }

    /// 已存在的帧号（升序）
    pub fn indices(&self) -> Result<Vec<usize>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("bin") {
                continue;
            }
            if let Some(idx) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<usize>().ok())
            {
                out.push(idx);
            }
        }
        out.sort_unstable();
        Ok(out)
    }
}
