use tracing::debug;

use bpmline_domain::{MergedSegment, RawSegment};

/// Folds consecutive windows with similar tempo into runs.
///
/// A run keeps the tempo of its first window. Later windows join while they
/// stay within `tolerance` of that anchor, so slow drift eventually opens a
/// new run instead of dragging the reported tempo along.
#[derive(Clone, Copy, Debug)]
pub struct SegmentMerger {
    tolerance: f64,
}

impl SegmentMerger {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn merge(&self, segments: &[RawSegment]) -> Vec<MergedSegment> {
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };

        let mut merged = Vec::new();
        let mut run = MergedSegment::anchored_at(first);
        for segment in rest {
            if (segment.bpm - run.bpm).abs() <= self.tolerance {
                run.extend_to(segment);
            } else {
                merged.push(run);
                run = MergedSegment::anchored_at(segment);
            }
        }
        merged.push(run);

        debug!(
            windows = segments.len(),
            runs = merged.len(),
            tolerance = self.tolerance,
            "merged window tempos"
        );
        merged
    }
}
