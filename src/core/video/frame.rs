use crate::core::error::{MosaicError, Result};

/// 二值化阈值：灰度 > 127 视为白
pub const MIDPOINT: u8 = 127;

/// 画布上的矩形区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn max_side(&self) -> u32 {
        self.w.max(self.h)
    }

    pub fn min_side(&self) -> u32 {
        self.w.min(self.h)
    }

    /// 四等分（奇数边长时右/下半多一像素，保证完整覆盖）
    /// 顺序：左上、右上、左下、右下
    pub fn quadrants(&self) -> [Rect; 4] {
        let lw = self.w / 2;
        let th = self.h / 2;
        let rw = self.w - lw;
        let bh = self.h - th;
        [
            Rect::new(self.x, self.y, lw, th),
            Rect::new(self.x + lw, self.y, rw, th),
            Rect::new(self.x, self.y + th, lw, bh),
            Rect::new(self.x + lw, self.y + th, rw, bh),
        ]
    }
}

/// 区域灰度统计
#[derive(Debug, Clone, Copy)]
pub struct RegionStats {
    pub mean: f64,
    pub variance: f64,
}

impl RegionStats {
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// 均值低于中点视为黑
    pub fn is_dark(&self) -> bool {
        self.mean < MIDPOINT as f64
    }
}

/// 单通道灰度帧
#[derive(Debug, Clone)]
pub struct GrayFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub frame_number: usize,
}

impl GrayFrame {
    pub fn new(width: u32, height: u32, data: Vec<u8>, frame_number: usize) -> Result<Self> {
        let frame = Self {
            width,
            height,
            data,
            frame_number,
        };
        frame.check_buffer()?;
        Ok(frame)
    }

    /// 字段公开，像素访问前需确认缓冲长度与尺寸一致
    pub fn check_buffer(&self) -> Result<()> {
        if self.data.len() != self.pixel_count() {
            return Err(MosaicError::Decode(format!(
                "frame {} carries {} bytes, expected {} for {}x{}",
                self.frame_number,
                self.data.len(),
                self.pixel_count(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }

    pub fn filled(width: u32, height: u32, value: u8, frame_number: usize) -> Self {
        Self {
            width,
            height,
            data: vec![value; width as usize * height as usize],
            frame_number,
        }
    }

    pub fn from_luma(img: image::GrayImage, frame_number: usize) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            data: img.into_raw(),
            frame_number,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn row(&self, rect: &Rect, dy: u32) -> &[u8] {
        let start = (rect.y + dy) as usize * self.width as usize + rect.x as usize;
        &self.data[start..start + rect.w as usize]
    }

    /// 缩放到画布尺寸，尺寸一致时直接复用
    pub fn fit_to(self, width: u32, height: u32) -> Result<GrayFrame> {
        self.check_buffer()?;
        if self.width == width && self.height == height {
            return Ok(self);
        }
        let frame_number = self.frame_number;
        let img = image::GrayImage::from_raw(self.width, self.height, self.data).ok_or_else(
            || MosaicError::Decode(format!("frame {} has a truncated pixel buffer", frame_number)),
        )?;
        let resized = image::imageops::resize(
            &img,
            width,
            height,
            image::imageops::FilterType::Triangle,
        );
        Ok(GrayFrame::from_luma(resized, frame_number))
    }

    /// 区域均值与总体方差
    pub fn region_stats(&self, rect: &Rect) -> RegionStats {
        if rect.is_empty() {
            return RegionStats {
                mean: 0.0,
                variance: 0.0,
            };
        }
        let mut sum = 0u64;
        let mut sum_sq = 0u64;
        for dy in 0..rect.h {
            for &v in self.row(rect, dy) {
                sum += v as u64;
                sum_sq += v as u64 * v as u64;
            }
        }
        let n = rect.area() as f64;
        let mean = sum as f64 / n;
        let variance = (sum_sq as f64 / n - mean * mean).max(0.0);
        RegionStats { mean, variance }
    }

    /// 二值积分图（白 = 1）
    pub fn binary_integral(&self) -> IntegralImage {
        IntegralImage::from_binary(self)
    }
}

/// 积分图，O(1) 区域求和
pub struct IntegralImage {
    width: u32,
    table: Vec<u32>,
}

impl IntegralImage {
    fn from_binary(frame: &GrayFrame) -> Self {
        let stride = frame.width as usize + 1;
        let mut table = vec![0u32; stride * (frame.height as usize + 1)];
        for y in 0..frame.height as usize {
            let mut row_sum = 0u32;
            for x in 0..frame.width as usize {
                if frame.data[y * frame.width as usize + x] > MIDPOINT {
                    row_sum += 1;
                }
                table[(y + 1) * stride + x + 1] = table[y * stride + x + 1] + row_sum;
            }
        }
        Self {
            width: frame.width,
            table,
        }
    }

    pub fn sum(&self, rect: &Rect) -> u32 {
        let stride = self.width as usize + 1;
        let (x0, y0) = (rect.x as usize, rect.y as usize);
        let (x1, y1) = (x0 + rect.w as usize, y0 + rect.h as usize);
        self.table[y1 * stride + x1] + self.table[y0 * stride + x0]
            - self.table[y0 * stride + x1]
            - self.table[y1 * stride + x0]
    }

    /// 纯白：和等于面积；纯黑：和为 0
    pub fn is_pure(&self, rect: &Rect, white: bool) -> bool {
        let s = self.sum(rect) as u64;
        if white {
            s == rect.area()
        } else {
            s == 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_split_frame(width: u32, height: u32) -> GrayFrame {
        let mut frame = GrayFrame::filled(width, height, 0, 0);
        for y in 0..height {
            for x in width / 2..width {
                frame.data[(y * width + x) as usize] = 255;
            }
        }
        frame
    }

    #[test]
    fn test_frame_creation() {
        let frame = GrayFrame::new(100, 50, vec![7u8; 5000], 3).unwrap();
        assert_eq!(frame.pixel_count(), 5000);
        assert_eq!(frame.frame_number, 3);
        assert!(GrayFrame::new(100, 50, vec![0u8; 10], 0).is_err());
    }

    #[test]
    fn test_quadrants_cover_odd_rect() {
        let rect = Rect::new(3, 5, 7, 9);
        let quads = rect.quadrants();
        let area: u64 = quads.iter().map(|q| q.area()).sum();
        assert_eq!(area, rect.area());
        assert_eq!(quads[3], Rect::new(6, 9, 4, 5));
    }

    #[test]
    fn test_region_stats() {
        let frame = create_split_frame(8, 8);
        let left = frame.region_stats(&Rect::new(0, 0, 4, 8));
        assert_eq!(left.mean, 0.0);
        assert_eq!(left.variance, 0.0);
        assert!(left.is_dark());

        let whole = frame.region_stats(&frame.bounds());
        assert!((whole.mean - 127.5).abs() < 1e-9);
        assert!((whole.std_dev() - 127.5).abs() < 1e-9);
    }

    #[test]
    fn test_integral_purity() {
        let frame = create_split_frame(16, 8);
        let integral = frame.binary_integral();
        assert_eq!(integral.sum(&frame.bounds()), 64);
        assert!(integral.is_pure(&Rect::new(8, 0, 8, 8), true));
        assert!(integral.is_pure(&Rect::new(0, 0, 8, 8), false));
        assert!(!integral.is_pure(&Rect::new(4, 0, 8, 8), true));
        assert!(!integral.is_pure(&Rect::new(4, 0, 8, 8), false));
    }

    #[test]
    fn test_fit_to_resizes() {
        let frame = GrayFrame::filled(100, 100, 200, 1);
        let fitted = frame.fit_to(32, 24).unwrap();
        assert_eq!((fitted.width, fitted.height), (32, 24));
        assert_eq!(fitted.data.len(), 32 * 24);
        assert_eq!(fitted.frame_number, 1);
    }

    #[test]
    fn test_fit_to_rejects_short_buffer_at_canvas_size() {
        let frame = GrayFrame {
            width: 128,
            height: 96,
            data: vec![0u8; 10],
            frame_number: 4,
        };
        assert!(matches!(frame.fit_to(128, 96), Err(MosaicError::Decode(_))));
    }
}
