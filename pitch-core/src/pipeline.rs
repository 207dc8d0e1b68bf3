//! # Analysis Pipeline Module
//!
//! Runs one frame through window → transform → magnitude → peak search →
//! sub-bin refinement → note mapping.
//!
//! The pipeline keeps nothing between frames. An [`Analyzer`] only caches the
//! immutable tables for its frame size, so one instance can serve a consumer
//! thread for its whole lifetime, or be shared between threads.

use std::sync::Arc;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::fft::FftPlan;
use crate::harmonics::{Harmonic, find_harmonics};
use crate::interpolation::{Refinement, refine_detailed};
use crate::peaks::{Peak, PeakCriteria, find_peaks_in_range};
use crate::spectrum::{BinRange, MagnitudeSpectrum};
use crate::tuning::map_to_note_with_reference;
use crate::window::Window;
use crate::PitchEstimate;

/// Everything the pipeline derived from one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub spectrum: MagnitudeSpectrum,
    /// All qualifying peaks, strongest first.
    pub peaks: Vec<Peak>,
    /// Refinement of the strongest peak, if there was one.
    pub refinement: Option<Refinement>,
    pub estimate: Option<PitchEstimate>,
}

impl FrameAnalysis {
    /// Partials 1..=count of the estimated fundamental; empty without an estimate.
    pub fn harmonics(&self, count: u32) -> Result<Vec<Harmonic>> {
        match &self.estimate {
            Some(estimate) => find_harmonics(&self.spectrum, estimate.frequency_hz, count),
            None => Ok(Vec::new()),
        }
    }
}

/// Per-frame pitch estimator for a fixed frame size and sample rate.
#[derive(Debug, Clone)]
pub struct Analyzer {
    frame_size: usize,
    sample_rate: f64,
    config: AnalysisConfig,
    criteria: PeakCriteria,
    window: Arc<Window>,
    plan: Arc<FftPlan>,
    /// `None` when no bin centre falls inside the configured band.
    search_range: Option<BinRange>,
}

impl Analyzer {
    /// Validates the configuration and looks up the shared window and FFT plan.
    ///
    /// # Arguments
    /// * `frame_size` - Samples per frame; a non-zero power of two
    /// * `sample_rate` - Capture rate in Hz
    /// * `config` - Band, thresholds and reference pitch
    ///
    /// # Returns
    /// * `Err(AnalysisError::InvalidSize)` - If `frame_size` is not a power of two
    /// * `Err(AnalysisError::InvalidSampleRate)` - If `sample_rate` is not positive
    /// * `Err(AnalysisError::InvalidConfig)` - If `config` fails validation
    pub fn new(frame_size: usize, sample_rate: f64, config: AnalysisConfig) -> Result<Self> {
        let analyzer = Self::build(frame_size, sample_rate, config)?;
        if analyzer.band_exceeds_nyquist() {
            tracing::warn!(
                high_hz = config.band.high_hz,
                nyquist = sample_rate / 2.0,
                "search band extends past Nyquist; clamping"
            );
        }
        Ok(analyzer)
    }

    fn build(frame_size: usize, sample_rate: f64, config: AnalysisConfig) -> Result<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AnalysisError::InvalidSampleRate(sample_rate));
        }
        config.validate()?;

        let plan = FftPlan::shared(frame_size)?;
        let window = Window::shared(config.window, frame_size)?;

        let search_range = BinRange::from_band(config.band, frame_size, sample_rate);

        Ok(Self {
            frame_size,
            sample_rate,
            config,
            criteria: config.peak_criteria(),
            window,
            plan,
            search_range,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// True when the configured band reaches above `sample_rate / 2` and the
    /// search is clamped to the Nyquist bin.
    pub fn band_exceeds_nyquist(&self) -> bool {
        self.config.band.high_hz > self.sample_rate / 2.0
    }

    /// Estimates the pitch of one frame; `Ok(None)` when no peak qualifies.
    pub fn analyze(&self, frame: &[f64]) -> Result<Option<PitchEstimate>> {
        Ok(self.analyze_detailed(frame)?.estimate)
    }

    /// Like [`Analyzer::analyze`], but keeps the intermediate results.
    pub fn analyze_detailed(&self, frame: &[f64]) -> Result<FrameAnalysis> {
        let windowed = self.window.apply(frame)?;
        let spectrum = self.plan.process(&windowed)?;
        let spectrum = MagnitudeSpectrum::from_spectrum(&spectrum, self.frame_size, self.sample_rate)?;

        let peaks = match self.search_range {
            Some(range) => find_peaks_in_range(spectrum.magnitudes(), range, &self.criteria),
            None => Vec::new(),
        };

        let Some(strongest) = peaks.first().copied() else {
            tracing::trace!("no qualifying peak in frame");
            return Ok(FrameAnalysis {
                spectrum,
                peaks,
                refinement: None,
                estimate: None,
            });
        };

        let refinement = refine_detailed(spectrum.magnitudes(), strongest.bin);
        let frequency_hz = refinement.frequency(strongest.bin, spectrum.bin_width());
        let position = map_to_note_with_reference(frequency_hz, self.config.reference_hz)?;

        tracing::trace!(
            candidates = peaks.len(),
            bin = strongest.bin,
            offset = refinement.offset,
            kind = ?refinement.kind,
            frequency_hz,
            note = %position,
            "pitch estimated"
        );

        Ok(FrameAnalysis {
            spectrum,
            peaks,
            refinement: Some(refinement),
            estimate: Some(PitchEstimate::new(frequency_hz, &position)),
        })
    }
}

/// Estimates the pitch of a single frame.
///
/// The frame length is the transform size and must be a power of two.
/// Returns `Ok(None)` for frames without a qualifying peak (silence, noise,
/// out-of-band tones); errors are reserved for malformed input.
///
/// Hosts calling this once per frame get the Nyquist clamp reported at
/// `debug` level only. Build an [`Analyzer`] to have it warned about once.
pub fn analyze_frame(
    frame: &[f64],
    sample_rate: f64,
    config: &AnalysisConfig,
) -> Result<Option<PitchEstimate>> {
    let analyzer = Analyzer::build(frame.len(), sample_rate, *config)?;
    if analyzer.band_exceeds_nyquist() {
        tracing::debug!(
            high_hz = config.band.high_hz,
            nyquist = sample_rate / 2.0,
            "search band extends past Nyquist; clamping"
        );
    }
    analyzer.analyze(frame)
}
