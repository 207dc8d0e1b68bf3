//! Outcome counters for hosts that want to watch the analyzer.
//!
//! Frames without a pitch and peaks that could not be interpolated are
//! normal results, so the pipeline does not log them above `trace`. These
//! counters make their rates visible without changing any result.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::interpolation::RefinementKind;
use crate::pipeline::FrameAnalysis;

/// Lock-free counters, safe to update from the analysis thread while another
/// thread reads them.
#[derive(Debug, Default)]
pub struct Diagnostics {
    frames: AtomicU64,
    pitched: AtomicU64,
    no_pitch: AtomicU64,
    flat_refinements: AtomicU64,
    boundary_refinements: AtomicU64,
    clamped_refinements: AtomicU64,
}

/// Point-in-time copy of [`Diagnostics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    pub frames: u64,
    pub pitched: u64,
    pub no_pitch: u64,
    pub flat_refinements: u64,
    pub boundary_refinements: u64,
    pub clamped_refinements: u64,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts the outcome of one analyzed frame.
    pub fn record(&self, analysis: &FrameAnalysis) {
        self.frames.fetch_add(1, Ordering::Relaxed);

        if analysis.estimate.is_some() {
            self.pitched.fetch_add(1, Ordering::Relaxed);
        } else {
            self.no_pitch.fetch_add(1, Ordering::Relaxed);
        }

        let counter = match analysis.refinement.map(|r| r.kind) {
            Some(RefinementKind::Flat) => &self.flat_refinements,
            Some(RefinementKind::Boundary) => &self.boundary_refinements,
            Some(RefinementKind::Clamped) => &self.clamped_refinements,
            Some(RefinementKind::Interpolated) | None => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            pitched: self.pitched.load(Ordering::Relaxed),
            no_pitch: self.no_pitch.load(Ordering::Relaxed),
            flat_refinements: self.flat_refinements.load(Ordering::Relaxed),
            boundary_refinements: self.boundary_refinements.load(Ordering::Relaxed),
            clamped_refinements: self.clamped_refinements.load(Ordering::Relaxed),
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        for counter in [
            &self.frames,
            &self.pitched,
            &self.no_pitch,
            &self.flat_refinements,
            &self.boundary_refinements,
            &self.clamped_refinements,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
