pub mod codec;
pub mod deduplicator;
pub mod frame;

pub use codec::{FrameDecoder, FrameEncoder, ImageSequenceDecoder, PixelFormat, RawVideoWriter};
pub use deduplicator::{DedupDecision, TemporalDeduplicator};
pub use frame::{GrayFrame, IntegralImage, Rect, RegionStats, MIDPOINT};
