use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsp::{autocorrelate, onset_envelope, OnsetParams};

/// Estimates a single tempo for a block of mono samples.
///
/// Implementations return an error when the block does not carry enough
/// rhythmic signal to measure. Callers decide how to recover.
pub trait TempoEstimate: Send + Sync {
    fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<f64>;
}

/// Onset-envelope autocorrelation with a log-normal tempo prior.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct AutocorrelationTempo {
    pub onset: OnsetParams,
    pub min_bpm: f64,
    pub max_bpm: f64,
    /// Center of the tempo prior.
    pub prior_bpm: f64,
    /// Spread of the tempo prior, in octaves.
    pub prior_octaves: f64,
}

impl Default for AutocorrelationTempo {
    fn default() -> Self {
        Self {
            onset: OnsetParams::default(),
            min_bpm: 30.0,
            max_bpm: 300.0,
            prior_bpm: 120.0,
            prior_octaves: 1.0,
        }
    }
}

impl AutocorrelationTempo {
    fn prior_weight(&self, bpm: f64) -> f64 {
        let octaves = (bpm / self.prior_bpm).log2() / self.prior_octaves;
        (-0.5 * octaves * octaves).exp()
    }
}

impl TempoEstimate for AutocorrelationTempo {
    fn estimate(&self, samples: &[f32], sample_rate: u32) -> Result<f64> {
        if sample_rate == 0 {
            anyhow::bail!("sample rate must be non-zero");
        }
        let envelope = onset_envelope(samples, self.onset)?;
        let n = envelope.len();
        let mean = envelope.mean().unwrap_or(0.0);
        let centered = envelope.mapv(|v| v - mean);
        if centered.dot(&centered) <= f32::EPSILON {
            anyhow::bail!("no onset energy in {} samples", samples.len());
        }

        let frame_rate = self.onset.frame_rate(sample_rate) as f64;
        let min_lag = ((60.0 * frame_rate / self.max_bpm).ceil() as usize).max(1);
        let max_lag = ((60.0 * frame_rate / self.min_bpm).floor() as usize).min(n / 2);
        if min_lag > max_lag {
            anyhow::bail!(
                "envelope of {} frames too short for lags {}..={}",
                n,
                min_lag,
                max_lag
            );
        }

        let acf = autocorrelate(centered.view(), max_lag);
        let scores: Vec<f64> = (0..=max_lag)
            .map(|lag| {
                if lag < min_lag {
                    return f64::MIN;
                }
                let bpm = 60.0 * frame_rate / lag as f64;
                acf[lag] as f64 * self.prior_weight(bpm)
            })
            .collect();
        let (best_lag, best_score) = (min_lag..=max_lag)
            .map(|lag| (lag, scores[lag]))
            .fold((min_lag, f64::MIN), |best, candidate| {
                if candidate.1 > best.1 {
                    candidate
                } else {
                    best
                }
            });
        if best_score <= 0.0 {
            anyhow::bail!("no periodic onset pattern found");
        }

        // parabolic refinement around the peak
        let mut lag = best_lag as f64;
        if best_lag > min_lag && best_lag < max_lag {
            let (left, right) = (scores[best_lag - 1], scores[best_lag + 1]);
            let denom = left - 2.0 * best_score + right;
            if denom < 0.0 {
                lag += (0.5 * (left - right) / denom).clamp(-0.5, 0.5);
            }
        }

        let bpm = 60.0 * frame_rate / lag;
        debug!(bpm, lag, frames = n, "estimated window tempo");
        Ok(bpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_track(bpm: f64, seconds: f64, sample_rate: u32) -> Vec<f32> {
        let len = (seconds * sample_rate as f64) as usize;
        let period = (sample_rate as f64 * 60.0 / bpm) as usize;
        let mut samples = vec![0.0f32; len];
        for start in (0..len).step_by(period) {
            for (offset, sample) in samples[start..].iter_mut().take(64).enumerate() {
                *sample = (1.0 - offset as f32 / 64.0) * if offset % 2 == 0 { 1.0 } else { -1.0 };
            }
        }
        samples
    }

    #[test]
    fn detects_click_track_tempo() {
        let estimator = AutocorrelationTempo::default();
        let samples = click_track(120.0, 8.0, 22_050);
        let bpm = estimator.estimate(&samples, 22_050).unwrap();
        assert!((bpm - 120.0).abs() < 10.0, "tempo off: {bpm}");
    }

    #[test]
    fn silence_is_an_error() {
        let estimator = AutocorrelationTempo::default();
        assert!(estimator.estimate(&vec![0.0; 22_050 * 4], 22_050).is_err());
    }

    #[test]
    fn zero_sample_rate_is_an_error() {
        let estimator = AutocorrelationTempo::default();
        assert!(estimator.estimate(&[0.5; 4096], 0).is_err());
    }

    #[test]
    fn prior_prefers_center_tempo() {
        let estimator = AutocorrelationTempo::default();
        assert!(estimator.prior_weight(120.0) > estimator.prior_weight(60.0));
        assert!(estimator.prior_weight(120.0) > estimator.prior_weight(240.0));
    }
}
