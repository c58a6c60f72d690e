pub mod buffer;
pub mod config;
pub mod error;
pub mod segment;
pub mod timeline;

pub use crate::buffer::AudioBuffer;
pub use crate::config::{AnalysisConfig, AnalysisProfile};
pub use crate::error::DomainError;
pub use crate::segment::{MergedSegment, RawSegment, UNDETECTED_BPM};
pub use crate::timeline::{format_time, round_bpm, Timeline, UNDETECTED_REPORT};
