use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

use bpmline_domain::AudioBuffer;

pub struct AudioDecoder;

impl AudioDecoder {
    /// Decodes the default track of `path` into a mono buffer at its native rate.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<AudioBuffer> {
        let path_ref = path.as_ref();
        let file =
            File::open(path_ref).with_context(|| format!("open audio file {:?}", path_ref))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let mut hint = Hint::new();
        if let Some(ext) = path_ref.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .with_context(|| format!("probe audio format of {:?}", path_ref))?;
        let mut format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| anyhow::anyhow!("no default track found in {:?}", path_ref))?;
        let track_id = track.id;
        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .with_context(|| format!("create decoder for {:?}", path_ref))?;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut samples = Vec::new();

        loop {
            match format.next_packet() {
                Ok(packet) => {
                    if packet.track_id() != track_id {
                        continue;
                    }
                    let decoded = match decoder.decode(&packet) {
                        Ok(decoded) => decoded,
                        Err(symphonia::core::errors::Error::DecodeError(err)) => {
                            warn!(%err, "skipping undecodable packet");
                            continue;
                        }
                        Err(err) => return Err(err.into()),
                    };
                    let spec = *decoded.spec();
                    if sample_rate == 0 {
                        sample_rate = spec.rate;
                    }
                    let mut interleaved = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    interleaved.copy_interleaved_ref(decoded);
                    samples.extend(downmix_interleaved(
                        interleaved.samples(),
                        spec.channels.count(),
                    ));
                }
                Err(err) => {
                    use symphonia::core::errors::Error as SymphError;
                    match err {
                        SymphError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                            break;
                        }
                        SymphError::DecodeError(_) => {
                            // skip undecodable packet
                        }
                        _ => return Err(err.into()),
                    }
                }
            }
        }

        if sample_rate == 0 {
            anyhow::bail!("unknown sample rate for {:?}", path_ref);
        }
        debug!(
            path = ?path_ref,
            sample_rate,
            sample_count = samples.len(),
            "decoded audio"
        );
        Ok(AudioBuffer::new(samples, sample_rate))
    }
}

/// Averages each interleaved frame into a single sample.
pub fn downmix_interleaved(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let scale = 1.0 / channels as f32;
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() * scale)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn decoder_handles_missing_file() {
        let result = AudioDecoder::open("does-not-exist.wav");
        assert!(result.is_err());
    }

    #[test]
    fn downmix_averages_frames() {
        let mono = downmix_interleaved(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
        assert_eq!(mono.len(), 3);
        assert_relative_eq!(mono[0], 0.5);
        assert_relative_eq!(mono[1], 0.5);
        assert_relative_eq!(mono[2], 0.0);
    }

    #[test]
    fn downmix_passes_mono_through() {
        let mono = downmix_interleaved(&[0.1, 0.2, 0.3], 1);
        assert_eq!(mono, vec![0.1, 0.2, 0.3]);
    }
}
