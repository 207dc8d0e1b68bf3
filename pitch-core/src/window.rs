//! # Window Function Module
//!
//! This module builds analysis windows and applies them to raw frames.
//! Every finite capture is implicitly a rectangular window; tapering the
//! frame to zero at both edges trades a wider main lobe for much lower
//! sidelobe leakage, which keeps weak partials from smearing over the band.
//!
//! ## Features
//! - Symmetric Hann window `w[n] = 0.5·(1 − cos(2πn/(N−1)))`
//! - Process-wide cache keyed by `(WindowType, N)`
//! - Length-checked application to a frame

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Supported analysis window shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Raised cosine, zero at both ends.
    #[default]
    Hann,
}

/// Immutable window coefficients for one `(WindowType, N)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    window_type: WindowType,
    coefficients: Vec<f64>,
}

/// Windows built so far, shared read-only by every analyzer in the process.
static WINDOW_CACHE: Lazy<RwLock<HashMap<(WindowType, usize), Arc<Window>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

impl Window {
    /// Computes the coefficients of a window of length `n`.
    ///
    /// # Arguments
    /// * `window_type` - Window shape
    /// * `n` - Number of coefficients (must be non-zero)
    ///
    /// # Returns
    /// * `Ok(window)` - The computed window
    /// * `Err(AnalysisError::InvalidSize)` - If `n` is zero
    pub fn build(window_type: WindowType, n: usize) -> Result<Self> {
        if n == 0 {
            return Err(AnalysisError::InvalidSize(n));
        }

        let coefficients = match window_type {
            WindowType::Hann => hann_coefficients(n),
        };

        Ok(Self {
            window_type,
            coefficients,
        })
    }

    /// Returns the shared instance for `(window_type, n)`, building it on first use.
    pub fn shared(window_type: WindowType, n: usize) -> Result<Arc<Self>> {
        if let Some(window) = WINDOW_CACHE.read().get(&(window_type, n)) {
            return Ok(Arc::clone(window));
        }

        let built = Arc::new(Self::build(window_type, n)?);
        let mut cache = WINDOW_CACHE.write();
        // Another thread may have raced us here; keep whichever landed first.
        let window = cache.entry((window_type, n)).or_insert_with(|| {
            tracing::debug!(?window_type, n, "cached analysis window");
            built
        });
        Ok(Arc::clone(window))
    }

    pub fn window_type(&self) -> WindowType {
        self.window_type
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Multiplies `frame` by the window, sample by sample.
    ///
    /// # Returns
    /// * `Ok(windowed)` - A new windowed frame
    /// * `Err(AnalysisError::DimensionMismatch)` - If the lengths differ
    pub fn apply(&self, frame: &[f64]) -> Result<Vec<f64>> {
        if frame.len() != self.coefficients.len() {
            return Err(AnalysisError::DimensionMismatch {
                expected: self.coefficients.len(),
                actual: frame.len(),
            });
        }

        Ok(frame
            .iter()
            .zip(&self.coefficients)
            .map(|(sample, w)| sample * w)
            .collect())
    }
}

/// Builds a Hann window of length `n`.
pub fn build_window(n: usize) -> Result<Window> {
    Window::build(WindowType::Hann, n)
}

/// Applies `window` to `frame`; fails if their lengths differ.
pub fn apply_window(frame: &[f64], window: &Window) -> Result<Vec<f64>> {
    window.apply(frame)
}

fn hann_coefficients(n: usize) -> Vec<f64> {
    // The symmetric form divides by N-1, which is undefined for a single tap.
    if n == 1 {
        return vec![1.0];
    }
    let n_minus_1 = (n - 1) as f64;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / n_minus_1).cos()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_tapers_to_zero_at_both_edges() {
        let window = build_window(4096).unwrap();
        let w = window.coefficients();
        assert_eq!(w.len(), 4096);
        assert!(w[0].abs() < 1e-15);
        assert!(w[4095].abs() < 1e-12);
        assert!(w.iter().all(|&c| (0.0..=1.0).contains(&c)));
    }

    #[test]
    fn hann_is_symmetric_with_unit_peak() {
        let window = build_window(9).unwrap();
        let w = window.coefficients();
        for i in 0..9 {
            assert!((w[i] - w[8 - i]).abs() < 1e-12);
        }
        assert!((w[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_length_is_rejected() {
        assert_eq!(build_window(0), Err(AnalysisError::InvalidSize(0)));
    }

    #[test]
    fn single_tap_window_passes_through() {
        let window = build_window(1).unwrap();
        assert_eq!(window.apply(&[0.7]).unwrap(), vec![0.7]);
    }

    #[test]
    fn apply_multiplies_elementwise() {
        let window = build_window(5).unwrap();
        let frame = [2.0; 5];
        let windowed = apply_window(&frame, &window).unwrap();
        for (out, w) in windowed.iter().zip(window.coefficients()) {
            assert!((out - 2.0 * w).abs() < 1e-15);
        }
    }

    #[test]
    fn apply_rejects_length_mismatch() {
        let window = build_window(8).unwrap();
        let err = window.apply(&[0.0; 7]).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::DimensionMismatch {
                expected: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn shared_windows_are_reused() {
        let a = Window::shared(WindowType::Hann, 256).unwrap();
        let b = Window::shared(WindowType::Hann, 256).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = Window::shared(WindowType::Hann, 512).unwrap();
        assert_eq!(c.len(), 512);
    }
}
