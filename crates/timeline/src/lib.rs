pub mod formatter;
pub mod merger;
pub mod pipeline;
pub mod segmenter;

pub use formatter::{TimelineFormatter, COLLAPSE_THRESHOLD};
pub use merger::SegmentMerger;
pub use pipeline::AnalysisPipeline;
pub use segmenter::SegmentEstimator;
