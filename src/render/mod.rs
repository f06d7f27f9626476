//! 渲染：把 manifest 还原成像素帧

pub mod atlas;
pub mod compositor;

pub use atlas::{stretch_contrast, PageAtlas};
pub use compositor::Compositor;
