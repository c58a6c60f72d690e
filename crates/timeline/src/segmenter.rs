use tracing::{debug, warn};

use bpmline_audio::TempoEstimate;
use bpmline_domain::{AudioBuffer, RawSegment, UNDETECTED_BPM};

/// Cuts a buffer into fixed-length windows and estimates each one.
#[derive(Clone, Copy, Debug)]
pub struct SegmentEstimator {
    window_duration: f64,
}

impl SegmentEstimator {
    pub fn new(window_duration: f64) -> Self {
        Self { window_duration }
    }

    pub fn window_duration(&self) -> f64 {
        self.window_duration
    }

    /// One segment per window holding at least a second of audio.
    ///
    /// Windows whose estimate fails, or is not a finite non-negative number,
    /// are kept with `UNDETECTED_BPM`.
    pub fn estimate(&self, buffer: &AudioBuffer, tempo: &dyn TempoEstimate) -> Vec<RawSegment> {
        let sample_rate = buffer.sample_rate();
        if sample_rate == 0 || self.window_duration.is_nan() || self.window_duration <= 0.0 {
            warn!(
                sample_rate,
                window_duration = self.window_duration,
                "cannot window audio"
            );
            return Vec::new();
        }

        let samples = buffer.samples();
        let total = buffer.duration();
        let rate = sample_rate as f64;
        let min_samples = sample_rate as usize;
        let mut segments = Vec::new();

        for index in 0usize.. {
            let start = index as f64 * self.window_duration;
            if start >= total {
                break;
            }
            let end = (start + self.window_duration).min(total);
            let first = (start * rate) as usize;
            let last = ((end * rate) as usize).min(samples.len());
            let window = &samples[first.min(last)..last];
            if window.len() < min_samples {
                debug!(start, end, samples = window.len(), "dropping short window");
                continue;
            }

            let bpm = match tempo.estimate(window, sample_rate) {
                Ok(bpm) if bpm.is_finite() && bpm >= 0.0 => bpm,
                Ok(bpm) => {
                    warn!(start, end, bpm, "discarding invalid tempo estimate");
                    UNDETECTED_BPM
                }
                Err(err) => {
                    warn!(start, end, error = %err, "tempo estimation failed");
                    UNDETECTED_BPM
                }
            };
            segments.push(RawSegment { start, end, bpm });
        }

        debug!(count = segments.len(), "estimated window tempos");
        segments
    }
}
