//! # Peak Selection Module
//!
//! Finds spectral peaks inside a frequency band and ranks them by magnitude.
//!
//! A bin qualifies when it is a local maximum, is at least `min_height_frac`
//! of the band maximum, and stands out from its surrounding baseline by at
//! least `min_prominence_frac` of the band maximum. Survivors closer than
//! `min_distance_bins` collapse onto the strongest of them.
//!
//! An empty result means "no musically meaningful peak in this frame". It is
//! an expected outcome (silence, noise, out-of-band input), not an error.

use serde::{Deserialize, Serialize};

use crate::spectrum::{BinRange, FrequencyBand, MagnitudeSpectrum};

/// A spectral peak candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Bin index in `[0, N/2]`.
    pub bin: usize,
    pub magnitude: f64,
    /// Height above the higher of the two surrounding valley floors.
    pub prominence: f64,
}

/// Relative thresholds used to reject noise-level maxima.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCriteria {
    /// Minimum magnitude as a fraction of the band maximum.
    pub min_height_frac: f64,
    /// Minimum prominence as a fraction of the band maximum.
    pub min_prominence_frac: f64,
    /// Minimum spacing between retained peaks, in bins.
    pub min_distance_bins: usize,
}

impl Default for PeakCriteria {
    fn default() -> Self {
        Self {
            min_height_frac: 0.3,
            min_prominence_frac: 0.15,
            min_distance_bins: 10,
        }
    }
}

/// Finds the peaks of `spectrum` inside `band`, strongest first.
///
/// # Arguments
/// * `spectrum` - Magnitude spectrum of one frame
/// * `band` - Frequency band to search, inclusive
/// * `criteria` - Height, prominence and spacing thresholds
///
/// # Returns
/// * Peaks ordered by descending magnitude (ties: lower bin first); empty if none qualify
pub fn find_peaks(
    spectrum: &MagnitudeSpectrum,
    band: FrequencyBand,
    criteria: &PeakCriteria,
) -> Vec<Peak> {
    match spectrum.bin_range(band) {
        Some(range) => find_peaks_in_range(spectrum.magnitudes(), range, criteria),
        None => Vec::new(),
    }
}

/// Same as [`find_peaks`], with the band already converted to bins.
pub fn find_peaks_in_range(
    magnitudes: &[f64],
    range: BinRange,
    criteria: &PeakCriteria,
) -> Vec<Peak> {
    if magnitudes.is_empty() || range.low >= magnitudes.len() {
        return Vec::new();
    }
    let low = range.low;
    let high = range.high.min(magnitudes.len() - 1);
    if low > high {
        return Vec::new();
    }

    let max_magnitude = magnitudes[low..=high].iter().copied().fold(0.0, f64::max);
    if max_magnitude <= 0.0 {
        return Vec::new();
    }
    let height_threshold = max_magnitude * criteria.min_height_frac;
    let prominence_threshold = max_magnitude * criteria.min_prominence_frac;

    let mut candidates: Vec<Peak> = local_maxima(magnitudes, low, high)
        .into_iter()
        .filter_map(|(bin, plateau_end)| {
            let magnitude = magnitudes[bin];
            if magnitude < height_threshold {
                return None;
            }
            let prominence = prominence(magnitudes, low, high, bin, plateau_end);
            (prominence >= prominence_threshold).then_some(Peak {
                bin,
                magnitude,
                prominence,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.magnitude
            .total_cmp(&a.magnitude)
            .then_with(|| a.bin.cmp(&b.bin))
    });

    // Strongest first: a candidate survives only if it is far enough from
    // every peak already kept.
    let mut retained: Vec<Peak> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let clear = retained
            .iter()
            .all(|kept| kept.bin.abs_diff(candidate.bin) >= criteria.min_distance_bins);
        if clear {
            retained.push(candidate);
        }
    }

    tracing::trace!(peaks = retained.len(), max_magnitude, "peak search finished");
    retained
}

/// Local maxima with bins in `[low, high]`, as `(first_bin, plateau_end)`.
///
/// Both neighbours must exist in the full array. A flat top is reported once,
/// at its first bin, and only if the magnitude falls after it.
fn local_maxima(magnitudes: &[f64], low: usize, high: usize) -> Vec<(usize, usize)> {
    let last = magnitudes.len() - 1;
    let mut maxima = Vec::new();

    let mut k = low.max(1);
    while k <= high && k < last {
        if magnitudes[k] <= magnitudes[k - 1] {
            k += 1;
            continue;
        }

        let mut end = k;
        while end < last && magnitudes[end + 1] == magnitudes[k] {
            end += 1;
        }
        if end < last && magnitudes[end + 1] < magnitudes[k] {
            maxima.push((k, end));
        }
        k = end + 1;
    }

    maxima
}

/// Walks outwards from the peak until a bin at least as high, or the band
/// edge, and measures the peak against the higher of the two valley floors.
fn prominence(magnitudes: &[f64], low: usize, high: usize, bin: usize, plateau_end: usize) -> f64 {
    let height = magnitudes[bin];

    let mut left_min = height;
    let mut i = bin;
    while i > low {
        i -= 1;
        if magnitudes[i] >= height {
            break;
        }
        left_min = left_min.min(magnitudes[i]);
    }

    let mut right_min = height;
    let mut j = plateau_end;
    while j < high {
        j += 1;
        if magnitudes[j] >= height {
            break;
        }
        right_min = right_min.min(magnitudes[j]);
    }

    height - left_min.max(right_min)
}
