// pitch-core/src/lib.rs

//! The core analysis for a real-time monophonic tuner.
//! Each fixed-length frame is windowed, transformed, searched for its
//! strongest in-band peak, refined below bin resolution and mapped to a
//! note, octave and cents deviation. It is completely headless, keeps no
//! state between frames and contains no capture or GUI code.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fft;
pub mod harmonics;
pub mod interpolation;
pub mod peaks;
pub mod pipeline;
pub mod samples;
pub mod spectrum;
pub mod tuning;
pub mod window;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use config::{AnalysisConfig, DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE};
pub use error::{AnalysisError, Result};
pub use pipeline::{Analyzer, FrameAnalysis, analyze_frame};
pub use rustfft::num_complex::Complex;
pub use tuning::{NoteName, NotePosition};

/// The pitch detected in a single analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchEstimate {
    /// Refined frequency in Hz.
    pub frequency_hz: f64,
    /// Real-valued semitones from A4, before rounding.
    pub semitone_offset: f64,
    /// Chromatic index of the nearest note, C = 0 … B = 11.
    pub note_index: usize,
    /// `4 + floor(nearest semitone / 12)`; see [`PitchEstimate::scientific_octave`].
    pub octave: i32,
    /// Deviation from the nearest note, in cents.
    pub cents_deviation: f64,
}

impl PitchEstimate {
    pub(crate) fn new(frequency_hz: f64, position: &NotePosition) -> Self {
        Self {
            frequency_hz,
            semitone_offset: position.semitone_offset,
            note_index: position.note_index(),
            octave: position.octave,
            cents_deviation: position.cents_deviation,
        }
    }

    pub fn note(&self) -> NoteName {
        NoteName::from_index(self.note_index)
    }

    /// Equal-temperament frequency of the nearest note.
    pub fn target_frequency_hz(&self, reference_hz: f64) -> f64 {
        reference_hz * 2f64.powf(self.semitone_offset.round() / 12.0)
    }

    /// Octave in scientific pitch notation (changes at C, middle C is C4).
    pub fn scientific_octave(&self) -> i32 {
        tuning::scientific_octave(self.semitone_offset.round() as i64)
    }
}

impl fmt::Display for PitchEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} {:+.1} cents ({:.2} Hz)",
            self.note(),
            self.octave,
            self.cents_deviation,
            self.frequency_hz
        )
    }
}
