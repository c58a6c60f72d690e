pub mod analysis;
pub mod dsp;
pub mod io;

pub use analysis::{AutocorrelationTempo, TempoEstimate};
pub use dsp::{autocorrelate, onset_envelope, OnsetParams};
pub use io::AudioDecoder;
