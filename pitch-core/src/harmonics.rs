//! Harmonic series lookup and inharmonicity estimation.
//!
//! Given a fundamental, reports where each partial actually landed in the
//! spectrum. This is measurement only: the pipeline never uses it to second
//! guess which peak is the fundamental.

use linreg::linear_regression;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::interpolation::refine_detailed;
use crate::spectrum::MagnitudeSpectrum;

/// One measured partial of a tone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Harmonic {
    /// Partial number (1 = fundamental).
    pub number: u32,
    /// Bin the partial was read from.
    pub bin: usize,
    /// Interpolated frequency in Hz.
    pub frequency_hz: f64,
    pub magnitude: f64,
}

/// Locates partials 1..=count of `fundamental_hz` in `spectrum`.
///
/// Each partial is read from the strongest bin within one bin of `n·f0` and
/// its frequency is refined like the fundamental's. Partials beyond Nyquist
/// are omitted.
pub fn find_harmonics(
    spectrum: &MagnitudeSpectrum,
    fundamental_hz: f64,
    count: u32,
) -> Result<Vec<Harmonic>> {
    if !(fundamental_hz.is_finite() && fundamental_hz > 0.0) {
        return Err(AnalysisError::InvalidFrequency(fundamental_hz));
    }

    let magnitudes = spectrum.magnitudes();
    let last_bin = magnitudes.len() - 1;
    let nyquist = spectrum.bin_frequency(last_bin);

    let harmonics = (1..=count)
        .map(|number| (number, fundamental_hz * number as f64))
        .take_while(|&(_, expected)| expected <= nyquist)
        .map(|(number, expected)| {
            let centre = spectrum.nearest_bin(expected);
            let bin = (centre.saturating_sub(1)..=(centre + 1).min(last_bin))
                .max_by(|&a, &b| magnitudes[a].total_cmp(&magnitudes[b]))
                .unwrap_or(centre);
            let refinement = refine_detailed(magnitudes, bin);
            Harmonic {
                number,
                bin,
                frequency_hz: refinement.frequency(bin, spectrum.bin_width()),
                magnitude: magnitudes[bin],
            }
        })
        .collect();

    Ok(harmonics)
}

/// Estimates the inharmonicity coefficient B from measured partials.
///
/// Stiff strings follow `f_n = n·f0·sqrt(1 + B·n²)`, so `(f_n/n)²` is linear
/// in `n²` with slope `f0²·B` and intercept `f0²`.
///
/// # Returns
/// * `Some(b)` - The fitted coefficient
/// * `None` - Fewer than three usable partials, or a degenerate fit
pub fn inharmonicity_coefficient(harmonics: &[Harmonic]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = harmonics
        .iter()
        .filter(|h| h.number > 0 && h.frequency_hz > 0.0)
        .map(|h| {
            let n = h.number as f64;
            let per_partial = h.frequency_hz / n;
            (n * n, per_partial * per_partial)
        })
        .unzip();

    if xs.len() < 3 {
        return None;
    }

    let (slope, intercept) = linear_regression::<_, _, f64>(&xs, &ys).ok()?;
    (intercept.abs() > 1e-6).then(|| slope / intercept)
}
