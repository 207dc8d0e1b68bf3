//! # Fast Fourier Transform (FFT) Module
//!
//! Iterative radix-2 decimation-in-time Cooley–Tukey transform, written out
//! rather than delegated, plus the real-input specialisation used by the
//! analysis pipeline.
//!
//! ## Features
//! - In-place complex forward FFT (bit-reversal permutation + log2(N) butterfly stages)
//! - Real-input transform returning only the N/2+1 non-redundant bins
//! - Precomputed twiddle and bit-reversal tables, cached per size
//!
//! ## Real input
//! A real frame of N samples is packed into N/2 complex values (even samples
//! in the real part, odd samples in the imaginary part) and transformed at
//! half size. Conjugate symmetry then separates the even and odd sub-spectra
//! and one final butterfly yields bins `0..=N/2`. The mirrored upper half is
//! never produced, so work and memory are both halved by construction.
//!
//! The forward transform is unnormalized, matching the textbook DFT
//! `X[k] = Σ x[n]·e^{-i2πkn/N}`.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustfft::num_complex::Complex;

use crate::error::{AnalysisError, Result};

/// Half-spectrum of a real frame: bins `0..=N/2`.
pub type Spectrum = Vec<Complex<f64>>;

/// Plans built so far, keyed by real transform size.
static PLAN_CACHE: Lazy<RwLock<HashMap<usize, Arc<FftPlan>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Tables for a complex radix-2 transform of one size.
#[derive(Debug, Clone)]
struct RadixTwoKernel {
    size: usize,
    bit_reverse: Vec<usize>,
    /// `e^{-i2πj/size}` for `j in 0..size/2`. Stage `len` uses every `size/len`-th entry.
    twiddles: Vec<Complex<f64>>,
}

impl RadixTwoKernel {
    fn new(size: usize) -> Self {
        let bits = size.trailing_zeros();
        let bit_reverse = (0..size).map(|i| bit_reverse(i, bits)).collect();
        let twiddles = (0..size / 2)
            .map(|j| Complex::from_polar(1.0, -2.0 * PI * j as f64 / size as f64))
            .collect();

        Self {
            size,
            bit_reverse,
            twiddles,
        }
    }

    /// Runs the transform in place. `buffer.len()` must equal `self.size`.
    fn process(&self, buffer: &mut [Complex<f64>]) {
        let n = self.size;

        for i in 0..n {
            let j = self.bit_reverse[i];
            if j > i {
                buffer.swap(i, j);
            }
        }

        let mut len = 2;
        while len <= n {
            let half = len / 2;
            let stride = n / len;
            for start in (0..n).step_by(len) {
                for j in 0..half {
                    let w = self.twiddles[j * stride];
                    let u = buffer[start + j];
                    let v = buffer[start + j + half] * w;
                    buffer[start + j] = u + v;
                    buffer[start + j + half] = u - v;
                }
            }
            len <<= 1;
        }
    }
}

/// Precomputed tables for the real-input transform of size N.
///
/// Immutable after construction; safe to share across threads.
#[derive(Debug, Clone)]
pub struct FftPlan {
    size: usize,
    half: RadixTwoKernel,
    /// `e^{-i2πk/N}` for `k in 0..=N/2`, used to merge the even/odd sub-spectra.
    split_twiddles: Vec<Complex<f64>>,
}

impl FftPlan {
    /// Builds a plan for real frames of `size` samples.
    ///
    /// # Returns
    /// * `Err(AnalysisError::InvalidSize)` - If `size` is zero or not a power of two
    pub fn new(size: usize) -> Result<Self> {
        check_size(size)?;

        let half_size = (size / 2).max(1);
        let split_twiddles = (0..=size / 2)
            .map(|k| Complex::from_polar(1.0, -2.0 * PI * k as f64 / size as f64))
            .collect();

        Ok(Self {
            size,
            half: RadixTwoKernel::new(half_size),
            split_twiddles,
        })
    }

    /// Returns the process-wide plan for `size`, building it on first use.
    pub fn shared(size: usize) -> Result<Arc<Self>> {
        if let Some(plan) = PLAN_CACHE.read().get(&size) {
            return Ok(Arc::clone(plan));
        }

        let built = Arc::new(Self::new(size)?);
        let mut cache = PLAN_CACHE.write();
        let plan = cache.entry(size).or_insert_with(|| {
            tracing::debug!(size, "cached FFT plan");
            built
        });
        Ok(Arc::clone(plan))
    }

    /// Real transform size N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of bins produced per frame, `N/2 + 1`.
    pub fn bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Transforms one real frame into its half-spectrum.
    ///
    /// # Arguments
    /// * `frame` - Exactly `size` real samples (normally already windowed)
    ///
    /// # Returns
    /// * `Ok(spectrum)` - `N/2 + 1` complex bins
    /// * `Err(AnalysisError::DimensionMismatch)` - If the frame length differs from the plan
    pub fn process(&self, frame: &[f64]) -> Result<Spectrum> {
        if frame.len() != self.size {
            return Err(AnalysisError::DimensionMismatch {
                expected: self.size,
                actual: frame.len(),
            });
        }

        if self.size == 1 {
            return Ok(vec![Complex::new(frame[0], 0.0)]);
        }

        let m = self.size / 2;
        let mut packed: Vec<Complex<f64>> = frame
            .chunks_exact(2)
            .map(|pair| Complex::new(pair[0], pair[1]))
            .collect();

        self.half.process(&mut packed);

        let spectrum = (0..=m)
            .map(|k| {
                let z = packed[k % m];
                let z_mirror = packed[(m - k) % m].conj();
                let even = (z + z_mirror) * 0.5;
                let odd = (z - z_mirror) * Complex::new(0.0, -0.5);
                even + self.split_twiddles[k] * odd
            })
            .collect();

        Ok(spectrum)
    }
}

/// Computes the half-spectrum of a real frame.
///
/// The frame length must be a non-zero power of two.
pub fn transform(frame: &[f64]) -> Result<Spectrum> {
    FftPlan::shared(frame.len())?.process(frame)
}

/// Forward complex FFT, in place.
///
/// This is the full-length transform (no symmetry assumptions); the buffer
/// length must be a non-zero power of two.
pub fn fft_in_place(buffer: &mut [Complex<f64>]) -> Result<()> {
    check_size(buffer.len())?;
    RadixTwoKernel::new(buffer.len()).process(buffer);
    Ok(())
}

fn check_size(size: usize) -> Result<()> {
    if size == 0 || !size.is_power_of_two() {
        return Err(AnalysisError::InvalidSize(size));
    }
    Ok(())
}

#[inline]
fn bit_reverse(mut x: usize, bits: u32) -> usize {
    let mut result = 0;
    for _ in 0..bits {
        result = (result << 1) | (x & 1);
        x >>= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::FftPlanner;

    /// Direct O(N²) DFT, bins 0..=N/2.
    fn reference_dft(x: &[f64]) -> Vec<Complex<f64>> {
        let n = x.len();
        (0..=n / 2)
            .map(|k| {
                x.iter().enumerate().fold(Complex::new(0.0, 0.0), |acc, (t, &v)| {
                    let angle = -2.0 * PI * (k * t % n) as f64 / n as f64;
                    acc + Complex::from_polar(v, angle)
                })
            })
            .collect()
    }

    fn test_signal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                (0.13 * t).sin() + 0.5 * (0.71 * t + 0.3).cos() + 0.01 * t
            })
            .collect()
    }

    fn assert_close(a: &[Complex<f64>], b: &[Complex<f64>], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (k, (x, y)) in a.iter().zip(b).enumerate() {
            let scale = y.norm().max(1.0);
            assert!(
                (x - y).norm() / scale < tol,
                "bin {}: got {}, expected {}",
                k,
                x,
                y
            );
        }
    }

    #[test]
    fn matches_reference_dft_for_all_small_sizes() {
        for log2 in 0..=10 {
            let n = 1usize << log2;
            let x = test_signal(n);
            let spectrum = transform(&x).unwrap();
            assert_eq!(spectrum.len(), n / 2 + 1);
            assert_close(&spectrum, &reference_dft(&x), 1e-9);
        }
    }

    #[test]
    fn matches_rustfft_at_reference_size() {
        let n = 4096;
        let x = test_signal(n);

        let mut expected: Vec<Complex<f64>> = x.iter().map(|&v| Complex::new(v, 0.0)).collect();
        FftPlanner::<f64>::new().plan_fft_forward(n).process(&mut expected);
        expected.truncate(n / 2 + 1);

        assert_close(&transform(&x).unwrap(), &expected, 1e-9);
    }

    #[test]
    fn complex_transform_matches_rustfft() {
        let n = 256;
        let input: Vec<Complex<f64>> = (0..n)
            .map(|i| Complex::new((i as f64 * 0.2).sin(), (i as f64 * 0.05).cos()))
            .collect();

        let mut ours = input.clone();
        fft_in_place(&mut ours).unwrap();

        let mut theirs = input;
        FftPlanner::<f64>::new().plan_fft_forward(n).process(&mut theirs);

        assert_close(&ours, &theirs, 1e-9);
    }

    #[test]
    fn dc_and_nyquist_bins_are_real() {
        let x = test_signal(64);
        let spectrum = transform(&x).unwrap();
        assert!(spectrum[0].im.abs() < 1e-12);
        assert!(spectrum[32].im.abs() < 1e-12);
        assert!((spectrum[0].re - x.iter().sum::<f64>()).abs() < 1e-9);
    }

    #[test]
    fn two_point_transform() {
        let spectrum = transform(&[3.0, 1.0]).unwrap();
        assert_close(
            &spectrum,
            &[Complex::new(4.0, 0.0), Complex::new(2.0, 0.0)],
            1e-15,
        );
    }

    #[test]
    fn pure_cosine_lands_in_its_bin() {
        let n = 128;
        let x: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 5.0 * i as f64 / n as f64).cos())
            .collect();
        let spectrum = transform(&x).unwrap();
        // Unnormalized: a unit cosine on bin k gives N/2 at k.
        assert!((spectrum[5].re - 64.0).abs() < 1e-9);
        for (k, c) in spectrum.iter().enumerate() {
            if k != 5 {
                assert!(c.norm() < 1e-9, "leakage at bin {}", k);
            }
        }
    }

    #[test]
    fn rejects_non_power_of_two() {
        assert_eq!(transform(&[0.0; 12]), Err(AnalysisError::InvalidSize(12)));
        assert_eq!(transform(&[]), Err(AnalysisError::InvalidSize(0)));

        let mut buffer = vec![Complex::new(0.0, 0.0); 6];
        assert_eq!(fft_in_place(&mut buffer), Err(AnalysisError::InvalidSize(6)));
    }

    #[test]
    fn plan_rejects_wrong_frame_length() {
        let plan = FftPlan::new(16).unwrap();
        assert_eq!(plan.bins(), 9);
        assert_eq!(
            plan.process(&[0.0; 8]),
            Err(AnalysisError::DimensionMismatch {
                expected: 16,
                actual: 8
            })
        );
    }

    #[test]
    fn output_is_deterministic() {
        let x = test_signal(1024);
        let a = transform(&x).unwrap();
        let b = transform(&x).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bit_reverse_permutes_indices() {
        assert_eq!(bit_reverse(1, 3), 4);
        assert_eq!(bit_reverse(3, 3), 6);
        assert_eq!(bit_reverse(0, 0), 0);
    }
}
