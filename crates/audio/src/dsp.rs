use anyhow::Result;
use ndarray::{s, Array1, ArrayView1};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};

/// Framing of the onset strength envelope.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct OnsetParams {
    pub frame_size: usize,
    pub hop_size: usize,
}

impl Default for OnsetParams {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            hop_size: 512,
        }
    }
}

impl OnsetParams {
    /// Envelope frames per second for a given sample rate.
    pub fn frame_rate(&self, sample_rate: u32) -> f32 {
        sample_rate as f32 / self.hop_size as f32
    }
}

pub fn hann_window(len: usize) -> Vec<f32> {
    if len < 2 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|i| {
            let t = i as f32 / (len - 1) as f32;
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
        })
        .collect()
}

/// Log-compressed spectral flux, one value per hop.
///
/// Each value is the mean over frequency bins of the half-wave rectified rise
/// in `ln(1 + 100 * |X|)` from the previous frame. Returns an empty envelope
/// when `samples` is shorter than one frame.
pub fn onset_envelope(samples: &[f32], params: OnsetParams) -> Result<Array1<f32>> {
    let OnsetParams {
        frame_size,
        hop_size,
    } = params;
    if frame_size == 0 || hop_size == 0 {
        anyhow::bail!("frame and hop sizes must be non-zero");
    }
    if samples.len() < frame_size {
        return Ok(Array1::zeros(0));
    }

    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let window = hann_window(frame_size);
    let mut input = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();
    let bins = spectrum.len();

    let num_frames = (samples.len() - frame_size) / hop_size + 1;
    let mut envelope = Vec::with_capacity(num_frames);
    let mut previous: Option<Vec<f32>> = None;

    for frame_idx in 0..num_frames {
        let start = frame_idx * hop_size;
        let frame = &samples[start..start + frame_size];
        for ((slot, sample), weight) in input.iter_mut().zip(frame).zip(&window) {
            *slot = sample * weight;
        }
        fft.process(&mut input, &mut spectrum)
            .map_err(|err| anyhow::anyhow!("fft failed: {err:?}"))?;

        let magnitudes: Vec<f32> = spectrum
            .iter()
            .map(|c| (1.0 + 100.0 * c.norm()).ln())
            .collect();
        let flux = match &previous {
            Some(prev) => {
                magnitudes
                    .iter()
                    .zip(prev)
                    .map(|(current, prev)| (current - prev).max(0.0))
                    .sum::<f32>()
                    / bins as f32
            }
            None => 0.0,
        };
        envelope.push(flux);
        previous = Some(magnitudes);
    }

    Ok(Array1::from(envelope))
}

/// Unbiased autocorrelation for lags `0..=max_lag`.
pub fn autocorrelate(signal: ArrayView1<f32>, max_lag: usize) -> Array1<f32> {
    let n = signal.len();
    let max_lag = max_lag.min(n.saturating_sub(1));
    if n == 0 {
        return Array1::zeros(0);
    }
    Array1::from_iter((0..=max_lag).map(|lag| {
        let head = signal.slice(s![..n - lag]);
        let tail = signal.slice(s![lag..]);
        head.dot(&tail) / (n - lag) as f32
    }))
}
