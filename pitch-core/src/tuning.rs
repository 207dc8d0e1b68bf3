//! # Musical Tuning Module
//!
//! Maps frequencies onto twelve-tone equal temperament.
//!
//! ## Features
//! - Semitone offset from the reference A4 (440 Hz unless configured)
//! - Nearest note name and octave
//! - Cent deviation from the nearest note
//! - Equal-temperament frequency of any note
//!
//! ## Octave numbering
//! [`NotePosition::octave`] counts whole octaves from A4:
//! `4 + floor(nearest / 12)`, so it changes at A. A4 through G#5 are all
//! octave 4 and middle C is octave 3. Scientific pitch notation, where the
//! octave changes at C and middle C is C4, is available through
//! [`NotePosition::scientific_octave`] and [`scientific_octave`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Concert pitch, in Hz.
pub const A4_FREQUENCY: f64 = 440.0;

const SEMITONES_PER_OCTAVE: i64 = 12;

/// Chromatic index of A when C is index 0.
const A_INDEX: i64 = 9;

/// The twelve pitch classes, C = 0 through B = 11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl NoteName {
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::CSharp,
        NoteName::D,
        NoteName::DSharp,
        NoteName::E,
        NoteName::F,
        NoteName::FSharp,
        NoteName::G,
        NoteName::GSharp,
        NoteName::A,
        NoteName::ASharp,
        NoteName::B,
    ];

    /// Pitch class for a chromatic index; wraps modulo 12.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Chromatic index, C = 0.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::CSharp => "C#",
            NoteName::D => "D",
            NoteName::DSharp => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::FSharp => "F#",
            NoteName::G => "G",
            NoteName::GSharp => "G#",
            NoteName::A => "A",
            NoteName::ASharp => "A#",
            NoteName::B => "B",
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frequency located on the equal-tempered scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NotePosition {
    /// `12·log2(f / A4)`, before rounding.
    pub semitone_offset: f64,
    /// Nearest pitch class.
    pub note: NoteName,
    /// Whole octaves from A4 to the nearest note, plus four.
    pub octave: i32,
    /// `100·(semitone_offset − nearest semitone)`, roughly `[-50, 50]`.
    pub cents_deviation: f64,
}

impl NotePosition {
    /// Chromatic index of the nearest note, `0..12` with C = 0.
    pub fn note_index(&self) -> usize {
        self.note.index()
    }

    /// Whole semitones from A4 to the nearest note.
    pub fn nearest_semitone(&self) -> i64 {
        self.semitone_offset.round() as i64
    }

    /// Equal-temperament frequency of the nearest note.
    pub fn target_frequency(&self, reference_hz: f64) -> f64 {
        reference_hz * 2f64.powf(self.nearest_semitone() as f64 / 12.0)
    }

    /// Octave of the nearest note in scientific pitch notation.
    pub fn scientific_octave(&self) -> i32 {
        scientific_octave(self.nearest_semitone())
    }

    /// Note name in scientific pitch notation, e.g. "C4" for middle C.
    pub fn scientific_name(&self) -> String {
        format!("{}{}", self.note, self.scientific_octave())
    }
}

impl fmt::Display for NotePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.note, self.octave)
    }
}

/// Maps `frequency` onto the scale with A4 = 440 Hz.
///
/// # Returns
/// * `Err(AnalysisError::InvalidFrequency)` - If `frequency` is not positive and finite
pub fn map_to_note(frequency: f64) -> Result<NotePosition> {
    map_to_note_with_reference(frequency, A4_FREQUENCY)
}

/// Maps `frequency` onto the scale with a custom A4.
pub fn map_to_note_with_reference(frequency: f64, reference_hz: f64) -> Result<NotePosition> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(AnalysisError::InvalidFrequency(frequency));
    }
    if !(reference_hz.is_finite() && reference_hz > 0.0) {
        return Err(AnalysisError::InvalidFrequency(reference_hz));
    }

    let semitone_offset = 12.0 * (frequency / reference_hz).log2();
    let nearest = semitone_offset.round() as i64;
    let cents_deviation = 100.0 * (semitone_offset - nearest as f64);

    let note = NoteName::from_index((nearest + A_INDEX).rem_euclid(SEMITONES_PER_OCTAVE) as usize);
    let octave = 4 + nearest.div_euclid(SEMITONES_PER_OCTAVE) as i32;

    Ok(NotePosition {
        semitone_offset,
        note,
        octave,
        cents_deviation,
    })
}

/// Scientific-pitch octave of the note `nearest_semitone` semitones from A4.
pub fn scientific_octave(nearest_semitone: i64) -> i32 {
    4 + (nearest_semitone + A_INDEX).div_euclid(SEMITONES_PER_OCTAVE) as i32
}

/// Equal-temperament frequency of `note` in `octave`, numbered as
/// [`map_to_note`] numbers them: octave 4 runs from A4 up to G#5.
pub fn note_frequency(note: NoteName, octave: i32, reference_hz: f64) -> f64 {
    let above_a = (note.index() as i64 - A_INDEX).rem_euclid(SEMITONES_PER_OCTAVE);
    let semitones_from_a4 = (octave as i64 - 4) * SEMITONES_PER_OCTAVE + above_a;
    reference_hz * 2f64.powf(semitones_from_a4 as f64 / 12.0)
}

/// Deviation of `frequency` from `target` in cents (positive = sharp).
pub fn cents_between(frequency: f64, target: f64) -> f64 {
    1200.0 * (frequency / target).log2()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concert_a_is_exact() {
        let position = map_to_note(440.0).unwrap();
        assert_eq!(position.semitone_offset, 0.0);
        assert_eq!(position.note, NoteName::A);
        assert_eq!(position.note_index(), 9);
        assert_eq!(position.octave, 4);
        assert_eq!(position.cents_deviation, 0.0);
        assert_eq!(position.to_string(), "A4");
    }

    #[test]
    fn octave_above_keeps_the_pitch_class() {
        let position = map_to_note(880.0).unwrap();
        assert_eq!(position.note, NoteName::A);
        assert_eq!(position.octave, 5);
        assert!(position.cents_deviation.abs() < 1e-9);
    }

    #[test]
    fn a_sharp_four() {
        let position = map_to_note(466.16).unwrap();
        assert_eq!(position.note, NoteName::ASharp);
        assert_eq!(position.octave, 4);
        assert!(position.cents_deviation.abs() < 0.1);
        assert_eq!(position.to_string(), "A#4");
    }

    #[test]
    fn octave_counts_whole_octaves_from_a4() {
        // Three semitones above A4.
        let c = map_to_note(523.25).unwrap();
        assert_eq!(c.note, NoteName::C);
        assert_eq!(c.note_index(), 0);
        assert_eq!(c.octave, 4);

        let g_sharp = map_to_note(830.61).unwrap();
        assert_eq!((g_sharp.note, g_sharp.octave), (NoteName::GSharp, 4));

        let middle_c = map_to_note(261.63).unwrap();
        assert_eq!((middle_c.note, middle_c.octave), (NoteName::C, 3));

        let g_sharp_below = map_to_note(415.30).unwrap();
        assert_eq!((g_sharp_below.note, g_sharp_below.octave), (NoteName::GSharp, 3));
    }

    #[test]
    fn scientific_octave_rolls_over_at_c() {
        let middle_c = map_to_note(261.63).unwrap();
        assert_eq!(middle_c.scientific_name(), "C4");

        let b3 = map_to_note(246.94).unwrap();
        assert_eq!(b3.scientific_name(), "B3");
        assert_eq!(b3.octave, 3);

        let c5 = map_to_note(523.25).unwrap();
        assert_eq!(c5.scientific_octave(), 5);
        assert_eq!(c5.to_string(), "C4");

        assert_eq!(scientific_octave(0), 4);
        assert_eq!(scientific_octave(-9), 4);
        assert_eq!(scientific_octave(-10), 3);
    }

    #[test]
    fn low_notes_have_positive_pitch_class() {
        let a0 = map_to_note(27.5).unwrap();
        assert_eq!(a0.note, NoteName::A);
        assert_eq!(a0.octave, 0);

        let e1 = map_to_note(41.2).unwrap();
        assert_eq!(e1.note, NoteName::E);
        assert_eq!(e1.octave, 0);
        assert_eq!(e1.scientific_name(), "E1");
    }

    #[test]
    fn cents_are_signed() {
        let sharp = map_to_note(445.0).unwrap();
        assert_eq!(sharp.note, NoteName::A);
        assert!((sharp.cents_deviation - cents_between(445.0, 440.0)).abs() < 1e-9);
        assert!(sharp.cents_deviation > 19.0 && sharp.cents_deviation < 20.0);

        let flat = map_to_note(435.0).unwrap();
        assert!(flat.cents_deviation < 0.0);
    }

    #[test]
    fn custom_reference_pitch() {
        let position = map_to_note_with_reference(432.0, 432.0).unwrap();
        assert_eq!(position.to_string(), "A4");
        assert_eq!(position.cents_deviation, 0.0);
        assert!((position.target_frequency(432.0) - 432.0).abs() < 1e-9);
    }

    #[test]
    fn non_positive_frequencies_are_rejected() {
        assert_eq!(map_to_note(0.0), Err(AnalysisError::InvalidFrequency(0.0)));
        assert_eq!(map_to_note(-3.0), Err(AnalysisError::InvalidFrequency(-3.0)));
        assert!(map_to_note(f64::NAN).is_err());
        assert!(map_to_note(f64::INFINITY).is_err());
    }

    #[test]
    fn note_frequency_inverts_mapping() {
        assert!((note_frequency(NoteName::A, 4, A4_FREQUENCY) - 440.0).abs() < 1e-9);
        assert!((note_frequency(NoteName::C, 4, A4_FREQUENCY) - 523.251_131).abs() < 1e-5);
        assert!((note_frequency(NoteName::C, 3, A4_FREQUENCY) - 261.625_565).abs() < 1e-5);
        assert!((note_frequency(NoteName::GSharp, 3, A4_FREQUENCY) - 415.304_698).abs() < 1e-5);
        for octave in 0..8 {
            for note in NoteName::ALL {
                let frequency = note_frequency(note, octave, A4_FREQUENCY);
                let position = map_to_note(frequency).unwrap();
                assert_eq!((position.note, position.octave), (note, octave));
                assert!(position.cents_deviation.abs() < 1e-6);
            }
        }
    }
}
