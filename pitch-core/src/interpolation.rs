//! # Sub-bin Interpolation Module
//!
//! Refines a peak's position below the resolution of one bin by fitting a
//! parabola through the peak bin and its two neighbours.
//!
//! With α, β, γ the magnitudes at bins k−1, k, k+1, the vertex of the parabola
//! through (−1,α), (0,β), (1,γ) sits at
//!
//! ```text
//! δ = 0.5·(α − γ) / (α − 2β + γ)
//! ```
//!
//! relative to k. The fit is an approximation of a windowed sinusoid's main
//! lobe, so δ is clamped to half a bin either side.

use serde::{Deserialize, Serialize};

/// Below this the three points are treated as collinear/flat.
pub const FLAT_PEAK_EPSILON: f64 = 1e-10;

/// How an offset was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefinementKind {
    /// Parabolic vertex, within half a bin.
    Interpolated,
    /// Parabolic vertex fell outside `[-0.5, 0.5]` and was clamped.
    Clamped,
    /// Curvature too small to fit; offset is 0.
    Flat,
    /// Peak at bin 0 or N/2 (or out of range) without two neighbours; offset is 0.
    Boundary,
}

/// Fractional-bin correction for one peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    /// Offset in bins, always within `[-0.5, 0.5]`.
    pub offset: f64,
    pub kind: RefinementKind,
}

impl Refinement {
    /// `(peak_bin + offset) · bin_width`.
    pub fn frequency(&self, peak_bin: usize, bin_width: f64) -> f64 {
        (peak_bin as f64 + self.offset) * bin_width
    }
}

/// Fractional-bin offset of the peak at `peak_bin`, in `[-0.5, 0.5]`.
///
/// Returns 0 at the spectrum boundary and for flat peaks.
pub fn refine(magnitudes: &[f64], peak_bin: usize) -> f64 {
    refine_detailed(magnitudes, peak_bin).offset
}

/// Like [`refine`], but also reports which branch produced the offset.
pub fn refine_detailed(magnitudes: &[f64], peak_bin: usize) -> Refinement {
    if peak_bin == 0 || peak_bin >= magnitudes.len().saturating_sub(1) {
        return Refinement {
            offset: 0.0,
            kind: RefinementKind::Boundary,
        };
    }

    let alpha = magnitudes[peak_bin - 1];
    let beta = magnitudes[peak_bin];
    let gamma = magnitudes[peak_bin + 1];

    let denominator = alpha - 2.0 * beta + gamma;
    // NaN would otherwise sail through the clamp.
    if denominator.is_nan() || denominator.abs() <= FLAT_PEAK_EPSILON {
        return Refinement {
            offset: 0.0,
            kind: RefinementKind::Flat,
        };
    }

    let delta = 0.5 * (alpha - gamma) / denominator;
    if !delta.is_finite() {
        return Refinement {
            offset: 0.0,
            kind: RefinementKind::Flat,
        };
    }

    let offset = delta.clamp(-0.5, 0.5);
    let kind = if offset == delta {
        RefinementKind::Interpolated
    } else {
        RefinementKind::Clamped
    };
    Refinement { offset, kind }
}

/// Refined peak frequency in Hz: `bin_frequency(peak_bin) + offset · f_s/N`.
pub fn refined_frequency(magnitudes: &[f64], peak_bin: usize, bin_width: f64) -> f64 {
    refine_detailed(magnitudes, peak_bin).frequency(peak_bin, bin_width)
}
