//! Per-cycle diagnostics.

use std::fmt;
use std::time::Instant;

use moodlink_audio::{Normalization, SignalStats};
use moodlink_inference::ClassificationResult;
use serde::Serialize;

/// Wall time spent in each stage of one cycle, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageTimings {
    pub capture_ms: f64,
    pub normalize_ms: f64,
    pub features_ms: f64,
    pub inference_ms: f64,
    pub total_ms: f64,
}

impl fmt::Display for StageTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  capture:    {:>9.2} ms", self.capture_ms)?;
        writeln!(f, "  normalize:  {:>9.2} ms", self.normalize_ms)?;
        writeln!(f, "  features:   {:>9.2} ms", self.features_ms)?;
        writeln!(f, "  inference:  {:>9.2} ms", self.inference_ms)?;
        write!(f, "  total:      {:>9.2} ms", self.total_ms)
    }
}

/// Milliseconds elapsed since `start`.
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// What happened during one capture-to-classification cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Samples delivered by the capture source; the rest were zero-filled.
    pub captured: usize,
    /// Statistics of the raw capture.
    pub before: SignalStats,
    /// Statistics after normalization.
    pub after: SignalStats,
    pub normalization: Normalization,
    /// The capture was all zeros. Features and inference still ran.
    pub silent: bool,
    /// `None` when the cycle stopped after feature extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ClassificationResult>,
    pub timings: StageTimings,
}

impl CycleReport {
    /// Fraction of the buffer the capture filled.
    pub fn capture_ratio(&self, buffer_len: usize) -> f32 {
        if buffer_len == 0 {
            return 0.0;
        }
        self.captured as f32 / buffer_len as f32
    }
}
