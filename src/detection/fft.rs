//! FFT periodogram for spotting the dominant cycle of a weekly series.

use rustfft::{num_complex::Complex64, FftPlanner};

/// One ordinate of the periodogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// Cycle length in observations, `n / k`.
    pub period: f64,
    /// `|X_k|^2 / n` of the demeaned signal.
    pub power: f64,
}

/// Periodogram of the demeaned signal at the Fourier frequencies `k = 1..=n/2`.
///
/// Returned in order of increasing frequency (decreasing period).
pub fn periodogram(signal: &[f64]) -> Vec<SpectralPeak> {
    let n = signal.len();
    if n < 4 {
        return Vec::new();
    }

    let mean = signal.iter().sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex64> = signal
        .iter()
        .map(|&x| Complex64::new(x - mean, 0.0))
        .collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

    buffer
        .iter()
        .enumerate()
        .take(n / 2 + 1)
        .skip(1)
        .map(|(k, c)| SpectralPeak {
            period: n as f64 / k as f64,
            power: c.norm_sqr() / n as f64,
        })
        .collect()
}

/// Period with the highest power among periods in `[min_period, max_period]`.
///
/// # Example
///
/// ```
/// use avocado_forecast::detection::dominant_period;
///
/// let signal: Vec<f64> = (0..104)
///     .map(|t| (2.0 * std::f64::consts::PI * t as f64 / 52.0).sin())
///     .collect();
/// let period = dominant_period(&signal, 2.0, 104.0).unwrap();
/// assert!((period - 52.0).abs() < 1e-9);
/// ```
pub fn dominant_period(signal: &[f64], min_period: f64, max_period: f64) -> Option<f64> {
    periodogram(signal)
        .into_iter()
        .filter(|p| p.period >= min_period && p.period <= max_period)
        .filter(|p| p.power.is_finite())
        .max_by(|a, b| a.power.total_cmp(&b.power))
        .filter(|p| p.power > 0.0)
        .map(|p| p.period)
}
