use std::fmt;

use serde::{Deserialize, Serialize};

use crate::segment::MergedSegment;

/// Report rendered when no window produced a segment.
pub const UNDETECTED_REPORT: &str = "无法检测到BPM信息";

/// Tempo report for one recording.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Timeline {
    Undetected,
    Global { bpm: f64, duration: f64 },
    Segmented { segments: Vec<MergedSegment> },
}

impl Timeline {
    pub fn is_detected(&self) -> bool {
        !matches!(self, Timeline::Undetected)
    }

    pub fn segments(&self) -> &[MergedSegment] {
        match self {
            Timeline::Segmented { segments } => segments,
            _ => &[],
        }
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeline::Undetected => f.write_str(UNDETECTED_REPORT),
            Timeline::Global { bpm, duration } => write!(
                f,
                "{} - {} Bpm{}",
                format_time(0.0),
                format_time(*duration),
                round_bpm(*bpm)
            ),
            Timeline::Segmented { segments } => {
                for (index, segment) in segments.iter().enumerate() {
                    if index > 0 {
                        f.write_str("\n")?;
                    }
                    write!(
                        f,
                        "{}到{} Bpm{}",
                        format_time(segment.start),
                        format_time(segment.end),
                        round_bpm(segment.bpm)
                    )?;
                }
                Ok(())
            }
        }
    }
}

/// Formats seconds as `<minutes>分<seconds>秒` with two-digit seconds.
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{minutes}分{secs:02}秒")
}

/// Nearest integer, ties to even.
pub fn round_bpm(bpm: f64) -> i64 {
    bpm.round_ties_even() as i64
}
