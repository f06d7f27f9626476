//! 媒体编解码协作者
//!
//! 真正的视频容器解码 / 编码交给外部（ffmpeg 等），这里只定义边界，
//! 并自带图片序列解码与原始像素流写出两个实现。

use super::frame::GrayFrame;
use crate::core::error::{MosaicError, Result};
use log::{debug, info};
use std::io::Write;
use std::path::{Path, PathBuf};

/// 按播放顺序产出灰度帧。
/// 单帧解码失败时返回 Err，但游标须越过该帧，下次调用继续读后续帧
pub trait FrameDecoder: Send {
    fn next_frame(&mut self) -> Result<Option<GrayFrame>>;

    fn frame_count_hint(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
        }
    }
}

/// 按声明的尺寸 / 像素格式接收原始帧缓冲
pub trait FrameEncoder {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn pixel_format(&self) -> PixelFormat;

    fn write_frame(&mut self, pixels: &[u8]) -> Result<()>;

    fn finish(&mut self) -> Result<()>;

    fn frame_len(&self) -> usize {
        self.width() as usize * self.height() as usize * self.pixel_format().bytes_per_pixel()
    }
}

/// 目录中按文件名排序的图片序列
pub struct ImageSequenceDecoder {
    files: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequenceDecoder {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file() && image::ImageFormat::from_path(p).is_ok()
            })
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(MosaicError::Decode(format!("no image frames in {:?}", dir)));
        }
        info!("🎞️ Image sequence: {} frames from {:?}", files.len(), dir);
        Ok(Self { files, cursor: 0 })
    }
}

impl FrameDecoder for ImageSequenceDecoder {
    fn next_frame(&mut self) -> Result<Option<GrayFrame>> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        let index = self.cursor;
        self.cursor += 1;
        let img = image::open(path)
            .map_err(|e| MosaicError::Decode(format!("{:?}: {}", path, e)))?
            .to_luma8();
        debug!("Decoded frame {} from {:?}", index, path);
        Ok(Some(GrayFrame::from_luma(img, index)))
    }

    fn frame_count_hint(&self) -> Option<usize> {
        Some(self.files.len())
    }
}

/// 原始 gray8 像素流（无帧头），可直接写进外部编码器的 stdin
pub struct RawVideoWriter<W: Write> {
    writer: W,
    width: u32,
    height: u32,
    frames_written: usize,
}

impl<W: Write> RawVideoWriter<W> {
    pub fn new(writer: W, width: u32, height: u32) -> Self {
        Self {
            writer,
            width,
            height,
            frames_written: 0,
        }
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameEncoder for RawVideoWriter<W> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Gray8
    }

    fn write_frame(&mut self, pixels: &[u8]) -> Result<()> {
        if pixels.len() != self.frame_len() {
            return Err(MosaicError::Encode(format!(
                "frame buffer has {} bytes, expected {} for {}x{} gray8",
                pixels.len(),
                self.frame_len(),
                self.width,
                self.height
            )));
        }
        self.writer.write_all(pixels)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        info!("🎬 Raw video finished: {} frames", self.frames_written);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_sequence_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, value) in [("0002.png", 200u8), ("0001.png", 10), ("0003.png", 90)] {
            image::GrayImage::from_pixel(8, 6, image::Luma([value]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();

        let mut decoder = ImageSequenceDecoder::open(dir.path()).unwrap();
        assert_eq!(decoder.frame_count_hint(), Some(3));

        let mut values = Vec::new();
        while let Some(frame) = decoder.next_frame().unwrap() {
            assert_eq!((frame.width, frame.height), (8, 6));
            values.push((frame.frame_number, frame.data[0]));
        }
        assert_eq!(values, vec![(0, 10), (1, 200), (2, 90)]);
    }

    #[test]
    fn test_empty_sequence_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageSequenceDecoder::open(dir.path()).is_err());
    }

    #[test]
    fn test_raw_writer_validates_length() {
        let mut writer = RawVideoWriter::new(Vec::new(), 4, 2);
        writer.write_frame(&[1u8; 8]).unwrap();
        assert!(writer.write_frame(&[1u8; 7]).is_err());
        writer.finish().unwrap();
        assert_eq!(writer.frames_written(), 1);
        assert_eq!(writer.into_inner(), vec![1u8; 8]);
    }
}
