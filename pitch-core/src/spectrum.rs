//! # Magnitude Spectrum Module
//!
//! Per-bin magnitudes of a half-spectrum, together with the bin ↔ frequency
//! mapping `f_k = k·f_s/N` and band restriction in bin terms.

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Converts a bin index to its centre frequency in Hz.
pub fn bin_to_frequency(bin: usize, fft_size: usize, sample_rate: f64) -> f64 {
    sample_rate * bin as f64 / fft_size as f64
}

/// `|X[k]| = sqrt(re² + im²)` for every bin.
pub fn magnitude(spectrum: &[Complex<f64>]) -> Vec<f64> {
    spectrum
        .iter()
        .map(|c| (c.re * c.re + c.im * c.im).sqrt())
        .collect()
}

/// A frequency band in Hz, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub low_hz: f64,
    pub high_hz: f64,
}

impl FrequencyBand {
    pub const fn new(low_hz: f64, high_hz: f64) -> Self {
        Self { low_hz, high_hz }
    }

    pub fn contains(&self, frequency: f64) -> bool {
        frequency >= self.low_hz && frequency <= self.high_hz
    }
}

/// Inclusive range of bin indices.
///
/// [`BinRange::from_band`] only builds non-empty ranges within `[0, N/2]`.
/// A hand-built range with `low > high` is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinRange {
    pub low: usize,
    pub high: usize,
}

impl BinRange {
    /// Converts a band in Hz to the bins whose centre frequencies fall inside it.
    ///
    /// Returns `None` when no bin centre lies in the band.
    pub fn from_band(band: FrequencyBand, fft_size: usize, sample_rate: f64) -> Option<Self> {
        let last_bin = fft_size / 2;
        let hz_per_bin = sample_rate / fft_size as f64;

        let low = (band.low_hz / hz_per_bin).ceil().max(0.0);
        let high = (band.high_hz / hz_per_bin).floor();
        if !low.is_finite() || !high.is_finite() || high < 0.0 {
            return None;
        }

        // `as usize` saturates, so a band far above Nyquist clamps cleanly.
        let low = low as usize;
        let high = (high as usize).min(last_bin);
        (low <= high).then_some(Self { low, high })
    }

    /// Number of bins in the range; zero when `low > high`.
    pub fn bin_count(&self) -> usize {
        (self.high + 1).saturating_sub(self.low)
    }

    pub fn contains(&self, bin: usize) -> bool {
        (self.low..=self.high).contains(&bin)
    }
}

/// Magnitudes of one frame plus the parameters needed to read them as frequencies.
///
/// Derived once per frame and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnitudeSpectrum {
    magnitudes: Vec<f64>,
    fft_size: usize,
    sample_rate: f64,
}

impl MagnitudeSpectrum {
    /// Builds the magnitude spectrum from a half-spectrum of an `fft_size`-point transform.
    ///
    /// # Returns
    /// * `Err(AnalysisError::DimensionMismatch)` - If `spectrum` does not hold `fft_size/2 + 1` bins
    /// * `Err(AnalysisError::InvalidSampleRate)` - If `sample_rate` is not positive and finite
    pub fn from_spectrum(
        spectrum: &[Complex<f64>],
        fft_size: usize,
        sample_rate: f64,
    ) -> Result<Self> {
        Self::from_magnitudes(magnitude(spectrum), fft_size, sample_rate)
    }

    /// Wraps precomputed magnitudes.
    pub fn from_magnitudes(magnitudes: Vec<f64>, fft_size: usize, sample_rate: f64) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        if magnitudes.len() != fft_size / 2 + 1 {
            return Err(AnalysisError::DimensionMismatch {
                expected: fft_size / 2 + 1,
                actual: magnitudes.len(),
            });
        }

        Ok(Self {
            magnitudes,
            fft_size,
            sample_rate,
        })
    }

    pub fn magnitudes(&self) -> &[f64] {
        &self.magnitudes
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Frequency spacing between adjacent bins, `f_s/N`.
    pub fn bin_width(&self) -> f64 {
        self.sample_rate / self.fft_size as f64
    }

    pub fn bin_frequency(&self, bin: usize) -> f64 {
        bin_to_frequency(bin, self.fft_size, self.sample_rate)
    }

    /// Centre frequency of every bin, in bin order.
    pub fn frequencies(&self) -> Vec<f64> {
        (0..self.magnitudes.len())
            .map(|k| self.bin_frequency(k))
            .collect()
    }

    /// Bin whose centre is closest to `frequency`, clamped to `[0, N/2]`.
    pub fn nearest_bin(&self, frequency: f64) -> usize {
        let bin = (frequency / self.bin_width()).round().max(0.0) as usize;
        bin.min(self.magnitudes.len() - 1)
    }

    /// The band expressed in this spectrum's bins.
    pub fn bin_range(&self, band: FrequencyBand) -> Option<BinRange> {
        BinRange::from_band(band, self.fft_size, self.sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_is_euclidean_norm() {
        let spectrum = [Complex::new(3.0, 4.0), Complex::new(0.0, -2.0), Complex::new(0.0, 0.0)];
        assert_eq!(magnitude(&spectrum), vec![5.0, 2.0, 0.0]);
    }

    #[test]
    fn bin_frequency_at_reference_configuration() {
        let width = bin_to_frequency(1, 4096, 44100.0);
        assert!((width - 10.766_601_562_5).abs() < 1e-9);
        assert_eq!(bin_to_frequency(2048, 4096, 44100.0), 22050.0);
        assert_eq!(bin_to_frequency(0, 4096, 44100.0), 0.0);
    }

    #[test]
    fn band_maps_to_inclusive_bin_range() {
        let range = BinRange::from_band(FrequencyBand::new(50.0, 2000.0), 4096, 44100.0).unwrap();
        // 50 / 10.77 = 4.64 -> 5, 2000 / 10.77 = 185.76 -> 185
        assert_eq!(range, BinRange { low: 5, high: 185 });
        assert_eq!(range.bin_count(), 181);
        assert!(range.contains(5) && range.contains(185) && !range.contains(186));
    }

    #[test]
    fn band_above_nyquist_is_clamped() {
        let range = BinRange::from_band(FrequencyBand::new(1000.0, 1e9), 1024, 8000.0).unwrap();
        assert_eq!(range.high, 512);
    }

    #[test]
    fn band_between_bins_is_empty() {
        // Bins are 10.77 Hz apart; nothing lies in [3, 7] Hz.
        assert_eq!(BinRange::from_band(FrequencyBand::new(3.0, 7.0), 4096, 44100.0), None);
        assert_eq!(BinRange::from_band(FrequencyBand::new(30000.0, 40000.0), 4096, 44100.0), None);
    }

    #[test]
    fn inverted_range_is_empty() {
        let range = BinRange { low: 5, high: 3 };
        assert_eq!(range.bin_count(), 0);
        assert!(!range.contains(4));
        assert_eq!(BinRange { low: 4, high: 3 }.bin_count(), 0);
        assert_eq!(BinRange { low: 3, high: 3 }.bin_count(), 1);
    }

    #[test]
    fn spectrum_checks_bin_count_and_rate() {
        let spectrum = vec![Complex::new(1.0, 0.0); 5];
        assert!(MagnitudeSpectrum::from_spectrum(&spectrum, 8, 8000.0).is_ok());
        assert_eq!(
            MagnitudeSpectrum::from_spectrum(&spectrum, 16, 8000.0),
            Err(AnalysisError::DimensionMismatch {
                expected: 9,
                actual: 5
            })
        );
        assert_eq!(
            MagnitudeSpectrum::from_spectrum(&spectrum, 8, 0.0),
            Err(AnalysisError::InvalidSampleRate(0.0))
        );
    }

    #[test]
    fn frequencies_and_nearest_bin() {
        let spectrum = MagnitudeSpectrum::from_magnitudes(vec![0.0; 5], 8, 800.0).unwrap();
        assert_eq!(spectrum.frequencies(), vec![0.0, 100.0, 200.0, 300.0, 400.0]);
        assert_eq!(spectrum.nearest_bin(149.0), 1);
        assert_eq!(spectrum.nearest_bin(151.0), 2);
        assert_eq!(spectrum.nearest_bin(10_000.0), 4);
    }
}
