pub mod assembly;
pub mod pipeline;

pub use assembly::{AssemblyReport, VideoAssembler};
pub use pipeline::MosaicPipeline;
