use tracing::debug;

use bpmline_domain::{MergedSegment, Timeline};

/// Largest spread from the first run's tempo still reported as one tempo.
pub const COLLAPSE_THRESHOLD: f64 = 5.0;

/// Chooses between a global tempo and a per-run timeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimelineFormatter;

impl TimelineFormatter {
    pub fn build(&self, segments: &[MergedSegment], total_duration: f64) -> Timeline {
        let Some(first) = segments.first() else {
            return Timeline::Undetected;
        };

        let collapses = segments
            .iter()
            .all(|segment| (segment.bpm - first.bpm).abs() <= COLLAPSE_THRESHOLD);
        if collapses {
            // every run counts once, whatever its length
            let bpm = segments.iter().map(|segment| segment.bpm).sum::<f64>()
                / segments.len() as f64;
            debug!(bpm, runs = segments.len(), "collapsed to a global tempo");
            return Timeline::Global {
                bpm,
                duration: total_duration,
            };
        }

        Timeline::Segmented {
            segments: segments.to_vec(),
        }
    }

    pub fn format(&self, segments: &[MergedSegment], total_duration: f64) -> String {
        self.build(segments, total_duration).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bpmline_domain::UNDETECTED_REPORT;

    fn merged(start: f64, end: f64, bpm: f64) -> MergedSegment {
        MergedSegment { start, end, bpm }
    }

    #[test]
    fn empty_timeline_is_undetected() {
        let formatter = TimelineFormatter;
        assert_eq!(formatter.build(&[], 42.0), Timeline::Undetected);
        assert_eq!(formatter.format(&[], 42.0), UNDETECTED_REPORT);
    }

    #[test]
    fn single_run_reports_whole_duration() {
        let formatter = TimelineFormatter;
        let report = formatter.format(&[merged(0.0, 180.0, 127.6)], 183.4);
        assert_eq!(report, "0分00秒 - 3分03秒 Bpm128");
    }

    #[test]
    fn close_runs_collapse_to_unweighted_mean() {
        let formatter = TimelineFormatter;
        let segments = [merged(0.0, 10.0, 120.0), merged(10.0, 20.0, 123.0)];
        match formatter.build(&segments, 20.0) {
            Timeline::Global { bpm, duration } => {
                assert_relative_eq!(bpm, 121.5);
                assert_relative_eq!(duration, 20.0);
            }
            other => panic!("expected global tempo, got {other:?}"),
        }
        assert_eq!(formatter.format(&segments, 20.0), "0分00秒 - 0分20秒 Bpm122");
    }

    #[test]
    fn mean_ignores_run_length() {
        let formatter = TimelineFormatter;
        let segments = [merged(0.0, 90.0, 100.0), merged(90.0, 100.0, 104.0)];
        assert_eq!(formatter.format(&segments, 100.0), "0分00秒 - 1分40秒 Bpm102");
    }

    #[test]
    fn collapse_threshold_is_inclusive() {
        let formatter = TimelineFormatter;
        let segments = [merged(0.0, 10.0, 100.0), merged(10.0, 20.0, 105.0)];
        // mean 102.5 rounds to even
        assert_eq!(formatter.format(&segments, 20.0), "0分00秒 - 0分20秒 Bpm102");
    }

    #[test]
    fn threshold_is_measured_from_first_run() {
        let formatter = TimelineFormatter;
        // 104 and 109 are within 5 of each other but 109 is not within 5 of 100
        let segments = [
            merged(0.0, 10.0, 100.0),
            merged(10.0, 20.0, 104.0),
            merged(20.0, 30.0, 109.0),
        ];
        assert!(matches!(
            formatter.build(&segments, 30.0),
            Timeline::Segmented { .. }
        ));
    }

    #[test]
    fn threshold_is_independent_of_merge_tolerance() {
        // runs 8 apart survive a tolerance-5 merge and stay separate here too
        let formatter = TimelineFormatter;
        let segments = [merged(0.0, 15.0, 120.0), merged(15.0, 30.0, 128.0)];
        assert_eq!(
            formatter.format(&segments, 30.0),
            "0分00秒到0分15秒 Bpm120\n0分15秒到0分30秒 Bpm128"
        );
    }

    #[test]
    fn distinct_runs_render_one_line_each() {
        let formatter = TimelineFormatter;
        let segments = [merged(0.0, 20.0, 120.0), merged(20.0, 30.0, 150.0)];
        assert_eq!(
            formatter.format(&segments, 30.0),
            "0分00秒到0分20秒 Bpm120\n0分20秒到0分30秒 Bpm150"
        );
    }

    #[test]
    fn undetected_runs_are_reported_as_zero() {
        let formatter = TimelineFormatter;
        let segments = [merged(0.0, 60.0, 0.0), merged(60.0, 75.0, 96.0)];
        assert_eq!(
            formatter.format(&segments, 75.0),
            "0分00秒到1分00秒 Bpm0\n1分00秒到1分15秒 Bpm96"
        );
    }
}
