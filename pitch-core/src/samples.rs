//! Conversions from capture sample formats to analysis frames.
//!
//! Capture devices deliver 16-bit PCM or 32-bit float; the pipeline works in
//! `f64` in the nominal range `[-1.0, 1.0]`.

/// Full-scale value of signed 16-bit PCM.
const I16_FULL_SCALE: f64 = 32768.0;

/// Normalizes 16-bit PCM samples to `[-1.0, 1.0)`.
pub fn from_i16(samples: &[i16]) -> Vec<f64> {
    samples
        .iter()
        .map(|&s| f64::from(s) / I16_FULL_SCALE)
        .collect()
}

/// Widens 32-bit float samples.
pub fn from_f32(samples: &[f32]) -> Vec<f64> {
    samples.iter().map(|&s| f64::from(s)).collect()
}
