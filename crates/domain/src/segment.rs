use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Tempo value recorded for a window whose estimation failed.
pub const UNDETECTED_BPM: f64 = 0.0;

/// One fixed-duration analysis window and its tempo estimate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawSegment {
    /// Seconds from the start of the recording.
    pub start: f64,
    /// Seconds from the start of the recording, exclusive.
    pub end: f64,
    /// Beats per minute, `UNDETECTED_BPM` when estimation failed.
    pub bpm: f64,
}

impl RawSegment {
    pub fn new(start: f64, end: f64, bpm: f64) -> Result<Self, DomainError> {
        validate_span(start, end)?;
        if !bpm.is_finite() || bpm < 0.0 {
            return Err(DomainError::validation(
                "segment bpm must be a finite non-negative value",
            ));
        }
        Ok(Self { start, end, bpm })
    }

    pub fn undetected(start: f64, end: f64) -> Result<Self, DomainError> {
        Self::new(start, end, UNDETECTED_BPM)
    }

    pub fn is_undetected(&self) -> bool {
        self.bpm == UNDETECTED_BPM
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A run of consecutive windows reported under one tempo.
///
/// `bpm` is the tempo of the first window in the run, not an average.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MergedSegment {
    pub start: f64,
    pub end: f64,
    pub bpm: f64,
}

impl MergedSegment {
    /// Opens a run anchored on `segment`.
    pub fn anchored_at(segment: &RawSegment) -> Self {
        Self {
            start: segment.start,
            end: segment.end,
            bpm: segment.bpm,
        }
    }

    pub fn extend_to(&mut self, segment: &RawSegment) {
        self.end = segment.end;
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl From<MergedSegment> for RawSegment {
    fn from(segment: MergedSegment) -> Self {
        Self {
            start: segment.start,
            end: segment.end,
            bpm: segment.bpm,
        }
    }
}

fn validate_span(start: f64, end: f64) -> Result<(), DomainError> {
    if !start.is_finite() || !end.is_finite() {
        return Err(DomainError::validation("segment bounds must be finite"));
    }
    if start < 0.0 {
        return Err(DomainError::validation(
            "segments cannot start at negative time",
        ));
    }
    if start >= end {
        return Err(DomainError::validation(
            "segment start must precede its end",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_segment_validation() {
        assert!(RawSegment::new(-1.0, 10.0, 120.0).is_err());
        assert!(RawSegment::new(10.0, 10.0, 120.0).is_err());
        assert!(RawSegment::new(0.0, 10.0, -3.0).is_err());
        assert!(RawSegment::new(0.0, 10.0, f64::NAN).is_err());
        assert!(RawSegment::new(0.0, 10.0, 120.0).is_ok());
    }

    #[test]
    fn undetected_segment_uses_sentinel() {
        let segment = RawSegment::undetected(0.0, 10.0).unwrap();
        assert!(segment.is_undetected());
        assert_eq!(segment.bpm, UNDETECTED_BPM);
    }

    #[test]
    fn merged_segment_keeps_anchor_bpm() {
        let first = RawSegment::new(0.0, 10.0, 120.0).unwrap();
        let second = RawSegment::new(10.0, 20.0, 124.0).unwrap();
        let mut run = MergedSegment::anchored_at(&first);
        run.extend_to(&second);
        assert_eq!(run.start, 0.0);
        assert_eq!(run.end, 20.0);
        assert_eq!(run.bpm, 120.0);
        assert_eq!(run.duration(), 20.0);
    }
}
