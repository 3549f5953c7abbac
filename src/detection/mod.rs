//! Spectral detection of seasonal cycles.

mod fft;

pub use fft::{dominant_period, periodogram, SpectralPeak};
